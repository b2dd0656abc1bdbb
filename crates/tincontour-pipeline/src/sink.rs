//! Output handoff: feed finished contour lines to a consumer.

use crate::types::{ContourError, ContourLine, ContourSet, SinkError};

/// Consumer of contour line records.
///
/// [`emit`] calls [`accept`](Self::accept) once per line in output order,
/// then [`finish`](Self::finish) exactly once. The first error stops the
/// handoff.
pub trait ContourSink {
    /// Take one contour line.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record cannot be persisted.
    fn accept(&mut self, line: &ContourLine) -> Result<(), SinkError>;

    /// Flush any buffered output after the last record.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if flushing fails.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl ContourSink for Vec<ContourLine> {
    fn accept(&mut self, line: &ContourLine) -> Result<(), SinkError> {
        self.push(line.clone());
        Ok(())
    }
}

/// Hand every line of `set` to `sink`, then finish it.
///
/// # Errors
///
/// Returns [`ContourError::Sink`] for the first sink failure. Nothing is
/// retried.
pub fn emit(set: &ContourSet, sink: &mut dyn ContourSink) -> Result<(), ContourError> {
    for line in &set.lines {
        sink.accept(line)?;
    }
    sink.finish()?;
    tracing::debug!(lines = set.len(), "contour lines handed to sink");
    Ok(())
}
