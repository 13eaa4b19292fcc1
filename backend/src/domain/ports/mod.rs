//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod category_repository;
mod credential_hasher;
mod image_store;
mod order_repository;
mod product_repository;
mod site_config_repository;
mod token_codec;
mod user_repository;

#[cfg(test)]
pub use category_repository::MockCategoryRepository;
pub use category_repository::{CategoryRepository, CategoryRepositoryError};
#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHasher, CredentialHasherError};
#[cfg(test)]
pub use image_store::MockImageStore;
pub use image_store::{
    HostedImage, ImageFolder, ImageStore, ImageStoreError, UnconfiguredImageStore,
};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use product_repository::{ProductRepository, ProductRepositoryError};
#[cfg(test)]
pub use site_config_repository::MockSiteConfigRepository;
pub use site_config_repository::{SiteConfigRepository, SiteConfigRepositoryError};
#[cfg(test)]
pub use token_codec::MockTokenCodec;
pub use token_codec::{AccessToken, TokenCodec, TokenCodecError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};

#[cfg(test)]
mod tests;
