pub mod google;
pub mod traits;
pub mod util;
pub(crate) mod sse;

// Re-exports for convenience.
pub use google::GoogleProvider;
pub use traits::{ChatRequest, ChatResponse, LlmProvider};
pub use util::resolve_api_key;
