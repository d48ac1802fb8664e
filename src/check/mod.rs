//! Check pipeline
//!
//! An [`Action`] selects a row of the action table; the engine fetches the
//! management resource, extracts one sample, evaluates it against the
//! thresholds and renders a Nagios status line.
//!
//! # Example
//!
//! ```ignore
//! use check_wildfly::check::{Action, CheckEngine, CheckRequest, StatusFormatter};
//! use check_wildfly::config::Config;
//!
//! let mut engine = CheckEngine::new(&Config::default())?;
//! let outcome = engine.run(&CheckRequest::new(Action::HeapUsage)).await;
//! println!("{}", StatusFormatter::new().with_perf_data(true).format(&outcome));
//! std::process::exit(outcome.exit_code());
//! ```

mod actions;
mod engine;
mod extract;
mod formatter;
mod status;
mod thresholds;

pub use actions::{
    Action, ActionSpec, DefaultLevels, Metric, StatSource, ACTIONS, DS_STAT_TYPES,
    THREAD_STAT_TYPES,
};
pub use engine::{CheckEngine, CheckRequest, Plan};
pub use extract::{extract, percent, to_megabytes, Extracted, Reading};
pub use formatter::{format_number, CheckOutcome, PerfData, StatusFormatter, Unit};
pub use status::Status;
pub use thresholds::{Level, SampleValue, Thresholds};
