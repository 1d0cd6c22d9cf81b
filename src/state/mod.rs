//! State management module
//!
//! Holds the run state: the last committed cursor of every resource.
//! State is persisted between runs so extraction resumes where it stopped.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - singer-shaped `{"bookmarks": {stream: {key: value}}}` map
//! - `StateManager` - in-memory or file-backed state with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::State;
