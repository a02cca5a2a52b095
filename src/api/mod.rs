pub mod error;
pub mod handlers;
pub mod pages;
pub mod routes;
pub mod views;

pub use handlers::AppState;
pub use routes::build_router;
