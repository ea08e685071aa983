use std::io::Write;

use crate::events::domain::event::Event;
use crate::events::domain::event_sink::{EventSink, SinkError};

/// One JSON object per line on any writer (stdout, a file, a socket).
pub struct JsonLinesEventSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesEventSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EventSink for JsonLinesEventSink<W> {
    fn publish(&mut self, event: &Event) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
