//! Check Engine - request validation, fetch, extraction and evaluation
//!
//! The engine is the single place where a failure of any stage is turned
//! into a terminal [`CheckOutcome`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, warn};

use super::actions::{
    Action, ActionSpec, Metric, StatSource, DS_STAT_TYPES, THREAD_STAT_TYPES,
};
use super::extract::{extract, Extracted, Reading};
use super::formatter::{format_number, CheckOutcome, PerfData, Unit};
use super::thresholds::{Level, SampleValue, Thresholds};
use super::Status;
use crate::collector::ManagementClient;
use crate::config::Config;
use crate::error::{CheckError, CheckResult};
use crate::state::{Delta, StateStore, StoredSample};

/// User supplied parameters of one check run
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub action: Action,
    /// Raw `-W` value
    pub warning: Option<String>,
    /// Raw `-C` value
    pub critical: Option<String>,
    pub memory_pool: Option<String>,
    pub queue_name: Option<String>,
    pub datasource: Option<String>,
    pub ds_stat_type: Option<String>,
    pub thread_stat_type: Option<String>,
}

/// Validated request, ready to be fetched
#[derive(Debug, Clone)]
pub struct Plan {
    pub spec: &'static ActionSpec,
    /// Path below the management base URL
    pub path: String,
    pub payload: Value,
    pub thresholds: Thresholds,
    /// Pool, collector, queue or statistic name handed to the extractor
    pub selector: Option<String>,
}

impl CheckRequest {
    /// Request for `action` with default thresholds
    pub fn new(action: Action) -> Self {
        Self {
            action,
            ..Default::default()
        }
    }

    /// Validate parameters and resolve thresholds
    ///
    /// Performs no I/O; every `InvalidParameter` is raised here, before
    /// any request is sent.
    pub fn plan(&self) -> CheckResult<Plan> {
        let spec = self.action.spec();
        let thresholds = self.thresholds(spec)?;

        let mut queue = None;
        let mut datasource = None;
        let selector = match spec.metric {
            Metric::State { .. } | Metric::Deployments | Metric::Memory { .. } => None,
            Metric::MemoryPool { .. } | Metric::GcTime { .. } => match &self.memory_pool {
                Some(pool) if pool.trim().is_empty() => {
                    return Err(CheckError::invalid(format!(
                        "The memory pool '{}' is not valid",
                        pool
                    )))
                }
                Some(pool) => Some(pool.trim().to_string()),
                None => None,
            },
            Metric::Counter { .. } => {
                let name = required_name("queue name", self.queue_name.as_deref())?;
                queue = Some(name.clone());
                Some(name)
            }
            Metric::Statistic {
                source: StatSource::Datasource,
                ..
            } => {
                datasource = Some(required_name("datasource name", self.datasource.as_deref())?);
                Some(one_of(
                    "datasource statistics type",
                    self.ds_stat_type.as_deref(),
                    &DS_STAT_TYPES,
                )?)
            }
            Metric::Statistic {
                source: StatSource::Thread,
                ..
            } => Some(one_of(
                "thread statistics value type",
                self.thread_stat_type.as_deref(),
                &THREAD_STAT_TYPES,
            )?),
        };

        Ok(Plan {
            spec,
            path: spec.path_for(queue.as_deref(), datasource.as_deref()),
            payload: spec.payload_json(),
            thresholds,
            selector,
        })
    }

    fn thresholds(&self, spec: &ActionSpec) -> CheckResult<Thresholds> {
        let mut thresholds = spec.defaults.thresholds();
        let parse = |raw: &str| {
            if spec.defaults.is_label_based() {
                Ok(Level::parse_labels(raw))
            } else {
                Level::parse_numeric(raw)
            }
        };

        if let Some(raw) = given(&self.warning) {
            thresholds.warning = Some(parse(raw)?);
        }
        if let Some(raw) = given(&self.critical) {
            thresholds.critical = Some(parse(raw)?);
        }

        Ok(thresholds)
    }
}

/// Trimmed threshold argument, `None` when absent or blank
fn given(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Characters that would change the meaning of the request URL
const URL_RESERVED: [char; 4] = ['/', '?', '#', '%'];

fn required_name(what: &str, value: Option<&str>) -> CheckResult<String> {
    match value.map(str::trim) {
        Some(name) if !name.is_empty() && !name.contains(&URL_RESERVED[..]) => {
            Ok(name.to_string())
        }
        other => Err(CheckError::invalid(format!(
            "The {} '{}' is not valid",
            what,
            other.unwrap_or_default()
        ))),
    }
}

fn one_of(what: &str, value: Option<&str>, allowed: &[&str]) -> CheckResult<String> {
    match value {
        Some(v) if allowed.contains(&v) => Ok(v.to_string()),
        other => Err(CheckError::invalid(format!(
            "The {} of '{}' is not valid",
            what,
            other.unwrap_or_default()
        ))),
    }
}

/// Runs checks against one management endpoint
pub struct CheckEngine {
    client: ManagementClient,
    /// Identifies the endpoint in state keys
    endpoint_key: String,
    store: Option<Box<dyn StateStore>>,
}

impl CheckEngine {
    /// Create an engine for the configured endpoint
    pub fn new(config: &Config) -> CheckResult<Self> {
        config.validate()?;
        let client = ManagementClient::new(&config.endpoint)?;
        let mut endpoint_key = format!("{}_{}", config.endpoint.host, config.endpoint.port);
        if let Some(prefix) = config.endpoint.server_prefix() {
            endpoint_key.push_str(&prefix);
        }

        Ok(Self {
            client,
            endpoint_key,
            store: None,
        })
    }

    /// Enable delta tracking
    pub fn with_state_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run a check; failures become an outcome as well
    pub async fn run(&mut self, request: &CheckRequest) -> CheckOutcome {
        match self.execute(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(action = %request.action, error = ?err, "Check failed");
                CheckOutcome::from_error(&err)
            }
        }
    }

    /// Run a check, propagating failures
    pub async fn execute(&mut self, request: &CheckRequest) -> CheckResult<CheckOutcome> {
        let plan = request.plan()?;
        let data = self
            .client
            .fetch(&plan.path, &plan.payload, plan.spec.method)
            .await?;

        match extract(&plan.spec.metric, plan.selector.as_deref(), &data)? {
            Extracted::Single(reading) => Ok(self.evaluate_reading(&plan, reading)),
            Extracted::Deployments(states) => Ok(evaluate_deployments(&plan.thresholds, &states)),
        }
    }

    fn evaluate_reading(&mut self, plan: &Plan, reading: Reading) -> CheckOutcome {
        let label = plan.spec.label;
        let status = plan.thresholds.evaluate(&reading.value);

        let mut message = reading.message;
        if status == Status::Unknown {
            message = format!("Unexpected value '{}'; {}", reading.value, message);
        }

        let mut perf = PerfData::new(label, reading.value.clone(), reading.unit)
            .with_bounds(reading.min, reading.max);
        if let SampleValue::Number(_) = reading.value {
            perf = perf.with_levels(
                plan.thresholds.warning.as_ref().and_then(Level::watermark),
                plan.thresholds.critical.as_ref().and_then(Level::watermark),
            );
        }

        let mut outcome = CheckOutcome::new(status, message).with_perf_data(perf);

        if let SampleValue::Number(value) = reading.value {
            let key = self.state_key(plan);
            if let Some(delta) = self.track(&key, value) {
                outcome.message.push_str(&format!(
                    " (delta={}{} over {}s)",
                    if delta.change >= 0.0 { "+" } else { "" },
                    format_number(delta.change),
                    delta.elapsed_secs
                ));
                outcome = outcome.with_perf_data(PerfData::new(
                    format!("{}_delta", label),
                    SampleValue::Number(delta.change),
                    Unit::None,
                ));
            }
        }

        outcome
    }

    fn state_key(&self, plan: &Plan) -> String {
        match &plan.selector {
            Some(selector) => format!("{}_{}_{}", self.endpoint_key, plan.spec.label, selector),
            None => format!("{}_{}", self.endpoint_key, plan.spec.label),
        }
    }

    /// Record `value` and return the change since the previous run
    fn track(&mut self, key: &str, value: f64) -> Option<Delta> {
        let store = self.store.as_mut()?;
        let current = StoredSample {
            value,
            timestamp: unix_now(),
        };

        let previous = store.last_sample(key).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Failed to read previous sample");
            None
        });

        if let Err(e) = store.record(key, current) {
            warn!(key = %key, error = %e, "Failed to record sample");
        }

        previous.map(|previous| Delta::between(&previous, &current))
    }
}

/// Evaluate every deployment and keep the worst state
fn evaluate_deployments(thresholds: &Thresholds, states: &[(String, String)]) -> CheckOutcome {
    if states.is_empty() {
        return CheckOutcome::new(Status::Ok, "No deployments found");
    }

    let mut overall = Status::Ok;
    let mut parts = Vec::with_capacity(states.len());
    for (name, state) in states {
        let status = thresholds.evaluate(&SampleValue::Text(state.clone()));
        overall = overall.worst(status);
        parts.push(format!("{}={}", name, state));
    }

    CheckOutcome::new(overall, format!("Deployments: {}", parts.join(", ")))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
