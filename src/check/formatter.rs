//! Nagios plugin output
//!
//! This module renders a check outcome as the single status line expected
//! by Nagios-compatible supervisors.
//!
//! # Format
//!
//! ```text
//! <STATUS> - <message>[ | <label>=<value>[<unit>];[warn];[crit];[min];[max] ...]
//! ```

use super::thresholds::SampleValue;
use super::Status;
use crate::error::CheckError;

/// Unit of measurement attached to a perf data value
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Plain number
    None,
    /// Number of items (queue messages, threads, connections)
    Count,
    /// Megabytes
    Megabytes,
    /// Milliseconds
    Milliseconds,
    /// Percentage
    Percent,
}

impl Unit {
    /// Unit-of-measurement suffix as understood by Nagios
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::None | Unit::Count => "",
            Unit::Megabytes => "MB",
            Unit::Milliseconds => "ms",
            Unit::Percent => "%",
        }
    }
}

/// One `label=value;warn;crit;min;max` entry
#[derive(Debug, Clone, PartialEq)]
pub struct PerfData {
    pub label: String,
    pub value: SampleValue,
    pub unit: Unit,
    pub warning: Option<f64>,
    pub critical: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PerfData {
    /// Entry without thresholds or bounds
    pub fn new(label: impl Into<String>, value: SampleValue, unit: Unit) -> Self {
        Self {
            label: label.into(),
            value,
            unit,
            warning: None,
            critical: None,
            min: None,
            max: None,
        }
    }

    /// Set warning and critical watermarks
    pub fn with_levels(mut self, warning: Option<f64>, critical: Option<f64>) -> Self {
        self.warning = warning;
        self.critical = critical;
        self
    }

    /// Set the value range
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

impl std::fmt::Display for PerfData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match &self.value {
            SampleValue::Number(n) => format_number(*n),
            SampleValue::Text(s) => s.clone(),
        };

        let mut fields: Vec<String> = [self.warning, self.critical, self.min, self.max]
            .iter()
            .map(|v| v.map(format_number).unwrap_or_default())
            .collect();
        while fields.last().is_some_and(String::is_empty) {
            fields.pop();
        }

        write!(f, "{}={}{}", quote_label(&self.label), value, self.unit.suffix())?;
        for field in fields {
            write!(f, ";{}", field)?;
        }
        Ok(())
    }
}

/// Terminal result of one check run
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub status: Status,
    pub message: String,
    pub perf_data: Vec<PerfData>,
}

impl CheckOutcome {
    /// Outcome without perf data
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            perf_data: Vec::new(),
        }
    }

    /// Attach a perf data entry
    pub fn with_perf_data(mut self, perf: PerfData) -> Self {
        self.perf_data.push(perf);
        self
    }

    /// Outcome reporting a failed run
    pub fn from_error(err: &CheckError) -> Self {
        Self::new(err.status(), err.to_string())
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

/// Status line formatter
#[derive(Debug, Clone, Default)]
pub struct StatusFormatter {
    /// Append perf data after `|`
    include_perf_data: bool,
}

impl StatusFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether perf data is appended
    pub fn with_perf_data(mut self, include: bool) -> Self {
        self.include_perf_data = include;
        self
    }

    /// Render `outcome` as one line (no trailing newline)
    pub fn format(&self, outcome: &CheckOutcome) -> String {
        // Status line must stay single-line
        let message = outcome.message.replace(['\n', '\r'], " ");
        let mut line = format!("{} - {}", outcome.status, message);

        if self.include_perf_data && !outcome.perf_data.is_empty() {
            let perf: Vec<String> = outcome.perf_data.iter().map(ToString::to_string).collect();
            line.push_str(" | ");
            line.push_str(&perf.join(" "));
        }

        line
    }
}

/// Format a number with at most two decimals
pub fn format_number(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    if rounded == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", rounded)
}

fn quote_label(label: &str) -> String {
    let label = label.replace('=', "_").replace('\'', "''");
    if label.contains(' ') {
        format!("'{}'", label)
    } else {
        label
    }
}
