//! Error recording and the external reporting collaborator.
//!
//! Every failure the runtime catches at a boundary ends up in an
//! [`ErrorLog`]: it is logged, kept in a bounded list for inspection, emitted
//! as [`RuntimeEvent::Error`] and handed to the optional [`ErrorReporter`].
//! Reporting is fire-and-forget; a reporter cannot fail the caller.

use crate::domain::error::{ErrorRecord, LayerkitError};
use crate::domain::layer::{run_guarded, BoxError};
use crate::events::{EventBus, RuntimeEvent};
use crate::state::BoundedHistoryLog;

/// Maximum number of error records kept for inspection.
pub const MAX_ERROR_RECORDS: usize = 50;

/// External sink for recorded failures (remote logging, telemetry, ...).
pub trait ErrorReporter {
    fn report(&self, record: &ErrorRecord);
}

/// Reporter that writes records to the `tracing` pipeline at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, record: &ErrorRecord) {
        tracing::error!(
            context = %record.context,
            kind = ?record.kind,
            message = %record.message,
            "error reported"
        );
    }
}

pub struct ErrorLog {
    records: BoundedHistoryLog<ErrorRecord>,
    reporter: Option<Box<dyn ErrorReporter>>,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLog")
            .field("records", &self.records.len())
            .field("reporter", &self.reporter.is_some())
            .finish()
    }
}

impl ErrorLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: BoundedHistoryLog::new(MAX_ERROR_RECORDS),
            reporter: None,
        }
    }

    pub fn set_reporter(&mut self, reporter: Option<Box<dyn ErrorReporter>>) {
        self.reporter = reporter;
    }

    /// Records `error` raised during `context` and emits it on `bus`.
    pub fn record(&mut self, bus: &mut EventBus<RuntimeEvent>, context: &str, error: &LayerkitError) -> ErrorRecord {
        let record = self.note(context, error);
        bus.emit(&RuntimeEvent::Error(record.clone()));
        record
    }

    /// Records `error` without emitting an event.
    ///
    /// Used for failures raised while an event was being delivered.
    pub fn note(&mut self, context: &str, error: &LayerkitError) -> ErrorRecord {
        tracing::warn!(context, error = %error, "caught failure");
        let record = ErrorRecord::new(context, error);
        self.records.push(record.clone());
        if let Some(reporter) = &self.reporter {
            let reported = run_guarded("reporter", || {
                reporter.report(&record);
                Ok::<(), BoxError>(())
            });
            if let Err(e) = reported {
                tracing::warn!(error = %e, "error reporter failed");
            }
        }
        record
    }

    /// Recorded failures, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records.to_vec()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
