pub mod conversation;
pub mod driver;
pub mod session_manager;
pub mod session_store;

pub use conversation::ConversationState;
pub use driver::ConversationDriver;
pub use session_manager::{SessionManager, SubmitOutcome};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
