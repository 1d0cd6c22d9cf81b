//! Sink implementations

use super::message::Message;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::io::{self, Stdout, Write};

/// Ordered, append-only destination for messages
pub trait RecordSink: Send {
    /// Append one message
    fn write(&mut self, message: Message) -> Result<()>;

    /// Declare a stream's schema
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &JsonValue,
        key_properties: &[String],
        bookmark_properties: &[String],
    ) -> Result<()> {
        self.write(Message::schema(
            stream,
            schema.clone(),
            key_properties.to_vec(),
            bookmark_properties.to_vec(),
        ))
    }

    /// Emit one record
    fn write_record(&mut self, stream: &str, record: JsonValue) -> Result<()> {
        self.write(Message::record(stream, record))
    }

    /// Emit the full state document
    fn write_state(&mut self, state: JsonValue) -> Result<()> {
        self.write(Message::state(state))
    }
}

/// Newline-delimited JSON sink
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl JsonLinesSink<Stdout> {
    /// Sink writing to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn write(&mut self, message: Message) -> Result<()> {
        let line = serde_json::to_string(&message)?;
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))
    }
}

/// Sink that keeps every message in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in emission order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Records emitted for `stream`
    pub fn records(&self, stream: &str) -> Vec<&JsonValue> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record { stream: s, record, .. } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// State documents in emission order
    pub fn states(&self) -> Vec<&JsonValue> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Streams that received a schema message, in order
    pub fn schema_streams(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.is_schema())
            .filter_map(Message::stream)
            .collect()
    }

    /// Last state emitted
    pub fn last_state(&self) -> Option<&JsonValue> {
        self.states().pop()
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, message: Message) -> Result<()> {
        self.messages.push(message);
        Ok(())
    }
}
