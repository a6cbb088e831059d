//! Student-facing endpoints. Students have no account: redeeming an access
//! code opens a play session held in an encrypted cookie.

pub mod progress;
pub mod routes;
pub mod session;

pub use progress::MysteryBoxProgress;
pub use routes::routes;
pub use session::PlaySession;
