//! Threshold evaluation
//!
//! A check is classified against a warning and a critical level. Levels
//! are either numeric watermarks (`value >= level` triggers) or sets of
//! labels (membership triggers).
//!
//! # Precedence
//!
//! CRITICAL is tested first, then WARNING, then OK. A value that matches
//! nothing in set-based mode is UNKNOWN.

use super::Status;
use crate::error::{CheckError, CheckResult};

/// Value read from the management API
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    /// Numeric reading
    Number(f64),
    /// Enumerated reading such as a server state
    Text(String),
}

impl SampleValue {
    /// Numeric view of the sample, parsing text when possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SampleValue::Number(n) => Some(*n),
            SampleValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for SampleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleValue::Number(n) => write!(f, "{}", n),
            SampleValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for SampleValue {
    fn from(n: f64) -> Self {
        SampleValue::Number(n)
    }
}

impl From<&str> for SampleValue {
    fn from(s: &str) -> Self {
        SampleValue::Text(s.to_string())
    }
}

/// A single warning or critical level
#[derive(Debug, Clone, PartialEq)]
pub enum Level {
    /// Triggers when `value >= watermark`
    Numeric(f64),
    /// Triggers when the value is one of the labels
    Labels(Vec<String>),
}

impl Level {
    /// Parse a numeric watermark
    ///
    /// # Errors
    /// `InvalidParameter` if `raw` is not a finite number
    pub fn parse_numeric(raw: &str) -> CheckResult<Self> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Level::Numeric)
            .ok_or_else(|| CheckError::invalid(format!("The threshold '{}' is not a number", raw)))
    }

    /// Parse a comma-separated label list
    pub fn parse_labels(raw: &str) -> Self {
        Level::Labels(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    /// Build a label level from static strings
    pub fn labels(labels: &[&str]) -> Self {
        Level::Labels(labels.iter().map(|s| s.to_string()).collect())
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Level::Numeric(_))
    }

    fn contains(&self, text: &str) -> bool {
        match self {
            Level::Labels(labels) => labels.iter().any(|l| l == text),
            Level::Numeric(_) => false,
        }
    }

    /// Watermark for perf data output
    pub fn watermark(&self) -> Option<f64> {
        match self {
            Level::Numeric(n) => Some(*n),
            Level::Labels(_) => None,
        }
    }
}

/// Warning/critical pair with an optional set of acceptable labels
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Thresholds {
    pub warning: Option<Level>,
    pub critical: Option<Level>,
    /// Only consulted by set-based evaluation
    pub ok: Option<Vec<String>>,
}

impl Thresholds {
    /// Numeric warning/critical watermarks
    pub fn numeric(warning: f64, critical: f64) -> Self {
        Self {
            warning: Some(Level::Numeric(warning)),
            critical: Some(Level::Numeric(critical)),
            ok: None,
        }
    }

    /// Label sets
    pub fn labels(warning: &[&str], critical: &[&str], ok: Option<&[&str]>) -> Self {
        Self {
            warning: Some(Level::labels(warning)),
            critical: Some(Level::labels(critical)),
            ok: ok.map(|o| o.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Both levels numeric or absent
    pub fn is_numeric(&self) -> bool {
        let numeric_or_absent = |level: &Option<Level>| level.as_ref().map_or(true, Level::is_numeric);
        numeric_or_absent(&self.warning) && numeric_or_absent(&self.critical)
    }

    /// One level numeric, the other label based
    fn is_mixed(&self) -> bool {
        let kinds: Vec<bool> = [&self.warning, &self.critical]
            .into_iter()
            .flatten()
            .map(Level::is_numeric)
            .collect();
        kinds.contains(&true) && kinds.contains(&false)
    }

    /// Classify `value`
    pub fn evaluate(&self, value: &SampleValue) -> Status {
        if self.is_numeric() {
            self.evaluate_numeric(value)
        } else {
            self.evaluate_membership(value)
        }
    }

    fn evaluate_numeric(&self, value: &SampleValue) -> Status {
        let Some(n) = value.as_number() else {
            return Status::Unknown;
        };

        let reached = |level: &Option<Level>| {
            level
                .as_ref()
                .and_then(Level::watermark)
                .is_some_and(|watermark| n >= watermark)
        };

        if reached(&self.critical) {
            Status::Critical
        } else if reached(&self.warning) {
            Status::Warning
        } else {
            Status::Ok
        }
    }

    fn evaluate_membership(&self, value: &SampleValue) -> Status {
        let text = value.to_string();
        let member = |level: &Option<Level>| level.as_ref().is_some_and(|l| l.contains(&text));

        if member(&self.critical) {
            return Status::Critical;
        }
        if member(&self.warning) {
            return Status::Warning;
        }

        match &self.ok {
            Some(ok) if ok.iter().any(|l| *l == text) => Status::Ok,
            Some(_) => Status::Unknown,
            // Numbers coerced into a membership check have no implicit OK
            None if !self.is_mixed() && matches!(value, SampleValue::Text(_)) => Status::Ok,
            None => Status::Unknown,
        }
    }
}
