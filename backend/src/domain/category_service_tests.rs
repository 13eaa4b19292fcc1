//! Tests for the category service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::MockCategoryRepository;
use crate::domain::test_fixtures::category;
use crate::domain::{CategoryName, ErrorCode};

fn service(repo: MockCategoryRepository) -> CategoryService {
    CategoryService::new(Arc::new(repo))
}

fn new_category(name: &str) -> NewCategory {
    NewCategory {
        name: CategoryName::new(name).expect("valid name"),
        description: String::new(),
        image: None,
    }
}

#[tokio::test]
async fn create_rejects_duplicate_name_before_insert() {
    let mut repo = MockCategoryRepository::new();
    repo.expect_find_by_name()
        .return_once(|_| Ok(Some(category(1, "Shoes"))));
    repo.expect_create().never();

    let err = service(repo)
        .create(new_category("Shoes"))
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), "Ya existe una categoría con este nombre");
}

#[tokio::test]
async fn create_inserts_unique_name() {
    let mut repo = MockCategoryRepository::new();
    repo.expect_find_by_name().return_once(|_| Ok(None));
    repo.expect_create()
        .return_once(|new| Ok(category(4, new.name.as_str())));

    let created = service(repo)
        .create(new_category("Hats"))
        .await
        .expect("created");

    assert_eq!(created.name.as_str(), "Hats");
}

#[tokio::test]
async fn update_rechecks_uniqueness_when_name_changes() {
    let mut repo = MockCategoryRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(category(1, "Shoes"))));
    repo.expect_find_by_name()
        .return_once(|_| Ok(Some(category(2, "Hats"))));
    repo.expect_update().never();

    let changes = CategoryChanges {
        name: Some(CategoryName::new("Hats").expect("valid name")),
        ..CategoryChanges::default()
    };
    let err = service(repo)
        .update(CategoryId::new(1), changes)
        .await
        .expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn update_skips_uniqueness_check_for_unchanged_name() {
    let mut repo = MockCategoryRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(category(1, "Shoes"))));
    repo.expect_find_by_name().never();
    repo.expect_update().return_once(|_, changes| {
        let mut updated = category(1, "Shoes");
        updated.description = changes.description.unwrap_or_default();
        Ok(Some(updated))
    });

    let changes = CategoryChanges {
        name: Some(CategoryName::new("Shoes").expect("valid name")),
        description: Some("Footwear".to_owned()),
        image: None,
    };
    let updated = service(repo)
        .update(CategoryId::new(1), changes)
        .await
        .expect("updated");

    assert_eq!(updated.description, "Footwear");
}

#[tokio::test]
async fn delete_is_blocked_while_products_reference_category() {
    let mut repo = MockCategoryRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(category(1, "Shoes"))));
    repo.expect_count_products().return_once(|_| Ok(2));
    repo.expect_delete().never();

    let err = service(repo)
        .delete(CategoryId::new(1))
        .await
        .expect_err("in use");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(
        err.details(),
        Some(&serde_json::json!({ "productCount": 2 }))
    );
}

#[tokio::test]
async fn delete_removes_empty_category() {
    let mut repo = MockCategoryRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(category(1, "Shoes"))));
    repo.expect_count_products().return_once(|_| Ok(0));
    repo.expect_delete().times(1).return_once(|_| Ok(true));

    service(repo)
        .delete(CategoryId::new(1))
        .await
        .expect("deleted");
}

#[tokio::test]
async fn get_reports_missing_category() {
    let mut repo = MockCategoryRepository::new();
    repo.expect_find_details().return_once(|_| Ok(None));

    let err = service(repo)
        .get(CategoryId::new(99))
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.message(), CATEGORY_NOT_FOUND_MESSAGE);
}
