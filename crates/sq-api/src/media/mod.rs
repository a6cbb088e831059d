//! Signed direct uploads to a Cloudinary-style media host.
//!
//! The API never streams media itself: it signs upload parameters so the
//! browser uploads straight to the provider, and deletes assets through the
//! provider's admin endpoint.

pub mod routes;
mod service;

pub use routes::routes;
pub use service::{MediaService, ResourceType, SignedUpload};
