//! Explicit diagnostic sink for one analysis run.
//!
//! A [`Diagnostics`] value is created at run start and handed `&mut` to the
//! loader, cleaner and metrics engine. Each entry is kept in emission order and
//! forwarded to the `log` facade at its severity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn level(self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Line had more fields than the two-column schema (1-based line number).
    MalformedRow { line: u64, fields: usize },
    /// Row dropped because a cell failed numeric coercion (0-based row index).
    NonNumericValue { row: usize },
    /// At least one voltage exceeded the configured magnitude bound.
    OutOfRangeVoltage { source: String },
    /// No input path was supplied; the default sample was used instead.
    DefaultInput { path: String },
    /// Mean heart rate falls outside the plausible range.
    ImplausibleHeartRate { bpm: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, severity: Severity, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::log!(severity.level(), "{}", message);
        self.entries.push(Diagnostic {
            severity,
            kind,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries at or above `severity`.
    pub fn at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.severity >= severity)
    }

    #[cfg(test)]
    pub(crate) fn count_where(&self, pred: impl Fn(&DiagnosticKind) -> bool) -> usize {
        self.entries.iter().filter(|d| pred(&d.kind)).count()
    }

    /// Logs a warning/error tally and ends the run's log stream.
    pub fn flush(&self) {
        let errors = self.at_least(Severity::Error).count();
        let warnings = self.at_least(Severity::Warning).count() - errors;
        log::info!("Run finished with {} warnings, {} errors", warnings, errors);
        log::logger().flush();
    }
}
