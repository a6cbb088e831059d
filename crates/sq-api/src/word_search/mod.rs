pub mod model;
pub mod routes;

pub use model::{PuzzlePreview, PuzzleView, seed_for_code, validate_words};
pub use routes::routes;
