//! Output module
//!
//! The record sink: an ordered, append-only channel of schema, record and
//! state messages.
//!
//! # Overview
//!
//! - `Message` - the three message kinds, serialised as tagged JSON
//! - `RecordSink` - the sink trait
//! - `JsonLinesSink` - newline-delimited JSON to any writer (stdout by default)
//! - `MemorySink` - collects messages in memory

mod message;
mod sink;

pub use message::Message;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
