pub mod email;
pub mod routes;
pub mod token;

pub use routes::routes;
