//! State module for tracking walk progress
//!
//! # Components
//!
//! - `WalkState` / `StopReason`: the traversal state machine and its terminal states
//! - `CrawlState`: visited set, ordered result and cursor owned by the driver

mod crawl_state;
mod walk_state;

// Re-export main types
pub use crawl_state::CrawlState;
pub use walk_state::{StopReason, WalkState};
