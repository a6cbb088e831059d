pub mod bootstrap;
pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod role;
pub mod routes;
pub mod validation;

pub use middleware::{AdminUser, AuthUser};
pub use role::Role;
pub use routes::routes;
