//! Image hosting adapters.

mod cloudinary;

pub use cloudinary::{CloudinaryCredentials, CloudinaryImageStore};
