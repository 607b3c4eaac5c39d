//! Error Classifier
//!
//! Turns service errors into what the UI needs: a severity, a friendly
//! message and a retry decision. Also keeps a bounded history of recent
//! errors for the error log panel.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use plexiglass_core::{Error, ErrorKind, Severity};

/// Default number of records kept in history
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// A formatted error, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// User-facing message
    pub message: String,
    pub severity: Severity,
    pub kind: ErrorKind,
    /// Original error text for diagnostics
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Classifies errors and records them in a ring buffer
pub struct ErrorClassifier {
    history: Mutex<VecDeque<ErrorRecord>>,
    max_history: usize,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(max_history)),
            max_history,
        }
    }

    pub fn classify(&self, error: &Error) -> Severity {
        match error {
            Error::Configuration(_) => Severity::Critical,
            Error::Connection { .. } => Severity::Warning,
            Error::ServerNotFound(_) => Severity::Info,
            Error::Service(_) | Error::Cancelled => Severity::Warning,
        }
    }

    /// Whether retrying could plausibly succeed.
    ///
    /// Rejected credentials and configuration problems need the user, not
    /// another attempt.
    pub fn is_retryable(&self, error: &Error) -> bool {
        match error {
            Error::Configuration(_) | Error::ServerNotFound(_) | Error::Cancelled => false,
            Error::Connection { .. } => !error.is_unauthorized(),
            Error::Service(_) => true,
        }
    }

    pub fn user_message(&self, error: &Error) -> String {
        match error {
            Error::Connection { .. } if error.is_unauthorized() => {
                "The Plex server rejected your token. Please check your server credentials."
                    .to_string()
            }
            Error::Connection { .. } => "Unable to connect to the Plex server. \
                 Please check that the server is running and accessible."
                .to_string(),
            Error::ServerNotFound(_) => "The requested server doesn't exist in your configuration. \
                 Please check your server settings."
                .to_string(),
            Error::Configuration(_) => "There's a problem with your configuration file. \
                 Please check your settings and try again."
                .to_string(),
            Error::Service(_) => {
                "A service error occurred. The operation couldn't be completed at this time."
                    .to_string()
            }
            Error::Cancelled => "The operation was cancelled.".to_string(),
        }
    }

    /// Format an error for display without recording it
    pub fn format(&self, error: &Error) -> ErrorRecord {
        ErrorRecord {
            message: self.user_message(error),
            severity: self.classify(error),
            kind: error.kind(),
            detail: error.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Append a formatted record, dropping the oldest past capacity
    pub fn record(&self, error: &Error) -> ErrorRecord {
        let record = self.format(error);
        debug!(
            kind = %record.kind,
            severity = record.severity.as_str(),
            "[ErrorClassifier] Recorded: {}",
            record.detail
        );

        let mut history = self.history.lock();
        if self.max_history == 0 {
            return record;
        }
        while history.len() >= self.max_history {
            history.pop_front();
        }
        history.push_back(record.clone());
        record
    }

    /// Recorded errors in insertion order; `limit` keeps only the newest ones
    pub fn history(&self, limit: Option<usize>) -> Vec<ErrorRecord> {
        let history = self.history.lock();
        let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
        history.iter().skip(skip).cloned().collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}
