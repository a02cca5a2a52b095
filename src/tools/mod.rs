pub mod search;
pub mod tool_metadata;

pub use search::{render_results, BraveSearch, DisabledSearch, SearchHit, WebSearch};
pub use tool_metadata::{load_tool, web_search_schema, ToolSchema, WEB_SEARCH_TOOL_NAME};
