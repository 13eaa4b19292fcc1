//! Category and product repositories over the in-memory store.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::ports::{
    CategoryRepository, CategoryRepositoryError, ProductRepository, ProductRepositoryError,
};
use crate::domain::{
    Category, CategoryChanges, CategoryDetails, CategoryId, CategoryName, CategoryRef,
    CategoryWithProductCount, NewCategory, NewProduct, Product, ProductChanges, ProductFilter,
    ProductId, ProductWithCategory,
};

use super::{InMemoryStore, State, advance, paginate, tally};

impl State {
    fn products_in(&self, id: CategoryId) -> usize {
        self.products
            .values()
            .filter(|product| product.category_id == id)
            .count()
    }

    fn with_category(&self, product: &Product) -> Result<ProductWithCategory, ProductRepositoryError> {
        let category = self.categories.get(&product.category_id).ok_or_else(|| {
            ProductRepositoryError::query(format!(
                "product {} references missing category {}",
                product.id, product.category_id
            ))
        })?;
        Ok(ProductWithCategory {
            product: product.clone(),
            category: CategoryRef {
                id: category.id,
                name: category.name.clone(),
            },
        })
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Page<CategoryWithProductCount>, CategoryRepositoryError> {
        let state = self.lock().map_err(CategoryRepositoryError::query)?;
        let mut rows: Vec<CategoryWithProductCount> = state
            .categories
            .values()
            .map(|category| CategoryWithProductCount {
                category: category.clone(),
                product_count: tally(state.products_in(category.id)),
            })
            .collect();
        rows.sort_by(|a, b| {
            a.category
                .name
                .as_str()
                .cmp(b.category.name.as_str())
                .then(a.category.id.cmp(&b.category.id))
        });
        Ok(paginate(rows, page))
    }

    async fn find_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let state = self.lock().map_err(CategoryRepositoryError::query)?;
        Ok(state.categories.get(&id).cloned())
    }

    async fn find_details(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategoryDetails>, CategoryRepositoryError> {
        let state = self.lock().map_err(CategoryRepositoryError::query)?;
        Ok(state.categories.get(&id).map(|category| CategoryDetails {
            category: category.clone(),
            products: state
                .products
                .values()
                .filter(|product| product.category_id == id)
                .cloned()
                .collect(),
        }))
    }

    async fn find_by_name(
        &self,
        name: &CategoryName,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let state = self.lock().map_err(CategoryRepositoryError::query)?;
        Ok(state
            .categories
            .values()
            .find(|category| &category.name == name)
            .cloned())
    }

    async fn create(&self, category: NewCategory) -> Result<Category, CategoryRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(CategoryRepositoryError::query)?;
        if state
            .categories
            .values()
            .any(|existing| existing.name == category.name)
        {
            return Err(CategoryRepositoryError::duplicate_name(
                category.name.as_str(),
            ));
        }
        let id = CategoryId::new(advance(&mut state.sequences.category));
        let stored = Category {
            id,
            name: category.name,
            description: category.description,
            image: category.image,
            created_at: now,
            updated_at: now,
        };
        state.categories.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(CategoryRepositoryError::query)?;
        if let Some(name) = &changes.name {
            let taken = state
                .categories
                .values()
                .any(|other| other.id != id && &other.name == name);
            if taken {
                return Err(CategoryRepositoryError::duplicate_name(name.as_str()));
            }
        }
        let Some(category) = state.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            category.name = name;
        }
        if let Some(description) = changes.description {
            category.description = description;
        }
        if let Some(image) = changes.image {
            category.image = Some(image);
        }
        category.updated_at = now;
        Ok(Some(category.clone()))
    }

    async fn count_products(&self, id: CategoryId) -> Result<u64, CategoryRepositoryError> {
        let state = self.lock().map_err(CategoryRepositoryError::query)?;
        Ok(tally(state.products_in(id)))
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, CategoryRepositoryError> {
        let mut state = self.lock().map_err(CategoryRepositoryError::query)?;
        let product_count = state.products_in(id);
        if product_count > 0 {
            return Err(CategoryRepositoryError::in_use(tally(product_count)));
        }
        Ok(state.categories.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn list(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Page<ProductWithCategory>, ProductRepositoryError> {
        let state = self.lock().map_err(ProductRepositoryError::query)?;
        let rows = state
            .products
            .values()
            .filter(|product| filter.matches(product))
            .map(|product| state.with_category(product))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paginate(rows, page))
    }

    async fn find_by_id(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductWithCategory>, ProductRepositoryError> {
        let state = self.lock().map_err(ProductRepositoryError::query)?;
        state
            .products
            .get(&id)
            .map(|product| state.with_category(product))
            .transpose()
    }

    async fn create(&self, product: NewProduct) -> Result<Product, ProductRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(ProductRepositoryError::query)?;
        if !state.categories.contains_key(&product.category_id) {
            return Err(ProductRepositoryError::missing_category(
                product.category_id.get(),
            ));
        }
        let id = ProductId::new(advance(&mut state.sequences.product));
        let stored = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image: product.image,
            category_id: product.category_id,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, ProductRepositoryError> {
        let now = self.now();
        let mut state = self.lock().map_err(ProductRepositoryError::query)?;
        if let Some(category_id) = changes.category_id {
            if !state.categories.contains_key(&category_id) {
                return Err(ProductRepositoryError::missing_category(category_id.get()));
            }
        }
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(image) = changes.image {
            product.image = Some(image);
        }
        if let Some(category_id) = changes.category_id {
            product.category_id = category_id;
        }
        product.updated_at = now;
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, ProductRepositoryError> {
        let mut state = self.lock().map_err(ProductRepositoryError::query)?;
        if !state.products.contains_key(&id) {
            return Ok(false);
        }
        if state.product_is_ordered(id) {
            return Err(ProductRepositoryError::referenced());
        }
        Ok(state.products.remove(&id).is_some())
    }
}
