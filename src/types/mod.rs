pub mod agent;
pub mod error;
pub mod message;
pub mod request;

pub use agent::*;
pub use error::*;
pub use message::*;
pub use request::*;
