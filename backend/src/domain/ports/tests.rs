use super::*;
use std::path::Path;

use rstest::rstest;

#[rstest]
#[case(ImageFolder::Products, "ecommerce/products")]
#[case(ImageFolder::Categories, "ecommerce/categories")]
fn image_folders_map_to_host_paths(#[case] folder: ImageFolder, #[case] expected: &str) {
    assert_eq!(folder.as_str(), expected);
}

#[rstest]
#[tokio::test]
async fn unconfigured_store_refuses_every_upload() {
    let err = UnconfiguredImageStore
        .upload(Path::new("/tmp/missing.png"), ImageFolder::Products)
        .await
        .expect_err("no host configured");
    assert_eq!(err, ImageStoreError::not_configured());
}

#[rstest]
#[case(
    CategoryRepositoryError::in_use(3_u64).to_string(),
    "category still has 3 products"
)]
#[case(
    ImageStoreError::rejected(400_u16, "bad format").to_string(),
    "image host rejected upload (400): bad format"
)]
#[case(
    TokenCodecError::invalid("expired").to_string(),
    "access token rejected: expired"
)]
fn port_errors_render_their_fields(#[case] rendered: String, #[case] expected: &str) {
    assert_eq!(rendered, expected);
}
