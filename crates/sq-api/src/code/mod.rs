//! Single-use access codes that let students open one piece of content.

pub mod generator;
pub mod model;
pub mod routes;

pub use model::{ContentKind, ContentRef, find_content, invalid_code, is_redeemable};
pub use routes::routes;
