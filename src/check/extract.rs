//! Sample extraction
//!
//! Pulls the value to evaluate out of a management response, converting
//! bytes to megabytes and used/max pairs to percentages.

use serde_json::Value;

use super::actions::Metric;
use super::formatter::{format_number, Unit};
use super::thresholds::SampleValue;
use crate::collector::{field, number_at, text_at};
use crate::error::{CheckError, CheckResult};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// A single extracted value with its presentation
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: SampleValue,
    pub unit: Unit,
    /// Human readable description for the status line
    pub message: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Reading {
    fn new(value: SampleValue, unit: Unit, message: String) -> Self {
        Self {
            value,
            unit,
            message,
            min: None,
            max: None,
        }
    }

    fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

/// Result of extraction
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// One value to evaluate
    Single(Reading),
    /// One state per deployment, `(name, state)`
    Deployments(Vec<(String, String)>),
}

/// Convert bytes to megabytes
pub fn to_megabytes(bytes: f64) -> f64 {
    bytes / BYTES_PER_MEGABYTE
}

/// `round(used * 100 / max, 2)`
///
/// A non-positive `max` means the pool has no limit; the utilisation is
/// reported as 0.
pub fn percent(used: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    round2(used * 100.0 / max)
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Extract the sample described by `metric` from `data`
///
/// `selector` is the user chosen name the metric needs: memory pool,
/// garbage collector, queue or statistic type.
pub fn extract(metric: &Metric, selector: Option<&str>, data: &Value) -> CheckResult<Extracted> {
    let reading = match *metric {
        Metric::State { field, title } => {
            // Some versions answer with the bare attribute value
            let state = match data {
                Value::String(s) => s.clone(),
                other => text_at(other, &[field])?,
            };
            let message = format!("{} '{}'", title, state);
            Reading::new(SampleValue::Text(state), Unit::None, message)
        }
        Metric::Deployments => return deployments(data).map(Extracted::Deployments),
        Metric::Memory { area, title } => usage(data, &[area], title)?,
        Metric::MemoryPool {
            default_pool,
            title,
        } => {
            let pool = selector.unwrap_or(default_pool);
            let title = format!("{} '{}'", title, pool);
            usage(data, &["name", pool, "usage"], &title)?
        }
        Metric::GcTime { default_collector } => {
            let collector = selector.unwrap_or(default_collector);
            let total = number_at(data, &["name", collector, "collection-time"])?;
            let count = number_at(data, &["name", collector, "collection-count"])?;
            let average = if count > 0.0 { round2(total / count) } else { 0.0 };
            let message = format!(
                "GC '{}' total-time={}ms count={} avg-time={:.2}ms",
                collector,
                format_number(total),
                format_number(count),
                average
            );
            Reading::new(SampleValue::Number(average), Unit::Milliseconds, message)
        }
        Metric::Counter { field, title, unit } => {
            let value = number_at(data, &[field])?;
            let message = match selector {
                Some(name) => format!("{} '{}' {}={}", title, name, field, format_number(value)),
                None => format!("{} {}={}", title, field, format_number(value)),
            };
            Reading::new(SampleValue::Number(value), unit, message)
        }
        Metric::Statistic { title, .. } => {
            let stat = selector
                .ok_or_else(|| CheckError::invalid(format!("{} requires a statistics type", title)))?;
            let value = number_at(data, &[stat])?;
            let message = format!("{} '{}': {}", title, stat, format_number(value));
            Reading::new(SampleValue::Number(value), statistic_unit(stat), message)
        }
    };

    Ok(Extracted::Single(reading))
}

/// Used/max utilisation below `base`
fn usage(data: &Value, base: &[&str], title: &str) -> CheckResult<Reading> {
    let used_path: Vec<&str> = base.iter().copied().chain(["used"]).collect();
    let max_path: Vec<&str> = base.iter().copied().chain(["max"]).collect();

    // both readings come from the same snapshot
    let used_bytes = number_at(data, &used_path)?;
    let max_bytes = number_at(data, &max_path)?;
    let utilisation = percent(used_bytes, max_bytes);
    let used = to_megabytes(used_bytes);

    let message = if max_bytes <= 0.0 {
        format!("{} Utilization {:.2} MB (no max limit)", title, used)
    } else {
        format!(
            "{} Utilization {:.2} MB of {:.2} MB ({:.2}%)",
            title,
            used,
            to_megabytes(max_bytes),
            utilisation
        )
    };

    Ok(Reading::new(SampleValue::Number(utilisation), Unit::Percent, message).with_bounds(0.0, 100.0))
}

/// `(deployment, status)` pairs of a wildcard read
fn deployments(data: &Value) -> CheckResult<Vec<(String, String)>> {
    let entries = match data {
        Value::Array(entries) => entries,
        Value::Object(_) => field(data, &["result"])?
            .as_array()
            .ok_or_else(|| CheckError::missing("result"))?,
        _ => return Err(CheckError::missing("result")),
    };

    entries
        .iter()
        .map(|entry| -> CheckResult<(String, String)> {
            let name = entry
                .get("address")
                .and_then(Value::as_array)
                .and_then(|address| address.iter().find_map(|step| step.get("deployment")))
                .and_then(Value::as_str)
                .ok_or_else(|| CheckError::missing("address.deployment"))?;
            let status = text_at(entry, &["result"])?;
            Ok((name.to_string(), status))
        })
        .collect()
}

/// Time based pool statistics are reported in milliseconds
fn statistic_unit(stat: &str) -> Unit {
    if stat.ends_with("Time") {
        Unit::Milliseconds
    } else {
        Unit::Count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::actions::{Action, StatSource};
    use serde_json::json;

    fn memory(heap_used: i64, non_heap_max: i64) -> Value {
        json!({
            "heap-memory-usage": {"init": 268435456, "used": heap_used, "committed": 587726848, "max": 1037959168},
            "non-heap-memory-usage": {"init": 2555904, "used": 217580768, "committed": 236462080, "max": non_heap_max},
            "object-name": "java.lang:type=Memory",
            "object-pending-finalization-count": 0,
            "verbose": false
        })
    }

    fn single(extracted: Extracted) -> Reading {
        match extracted {
            Extracted::Single(reading) => reading,
            other => panic!("Expected single reading, got {other:?}"),
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(439564992.0, 1037959168.0), 42.35);
        assert_eq!(percent(986061209.0, 1037959168.0), 95.0);
        assert_eq!(percent(50.0, 0.0), 0.0);
        assert_eq!(percent(50.0, -1.0), 0.0);
    }

    #[test]
    fn test_percent_is_deterministic() {
        for (used, max) in [(1.0, 3.0), (2.0, 7.0), (123456789.0, 987654321.0)] {
            let expected = ((used * 100.0 / max) * 100.0_f64).round() / 100.0;
            assert_eq!(percent(used, max), expected);
            assert_eq!(percent(used, max), percent(used, max));
        }
    }

    #[test]
    fn test_to_megabytes() {
        assert_eq!(to_megabytes(1_048_576.0), 1.0);
        assert_eq!(to_megabytes(536870912.0), 512.0);
    }

    #[test]
    fn test_heap_usage() {
        let reading = single(
            extract(&Action::HeapUsage.spec().metric, None, &memory(439564992, 536870912)).unwrap(),
        );
        assert_eq!(reading.value, SampleValue::Number(42.35));
        assert_eq!(reading.unit, Unit::Percent);
        assert!(reading
            .message
            .starts_with("Heap Memory Utilization 419.20 MB of 989."));
        assert!(reading.message.ends_with("MB (42.35%)"));
        assert_eq!((reading.min, reading.max), (Some(0.0), Some(100.0)));
    }

    #[test]
    fn test_non_heap_unlimited() {
        let reading = single(
            extract(&Action::NonHeapUsage.spec().metric, None, &memory(439564992, -1)).unwrap(),
        );
        assert_eq!(reading.value, SampleValue::Number(0.0));
        assert!(reading.message.contains("no max limit"));
    }

    #[test]
    fn test_memory_pool() {
        let data = json!({
            "name": {
                "PS_Eden_Space": {"usage": {"used": 52428800, "max": 104857600}},
                "Code_Cache": {"usage": {"used": 10485760, "max": 251658240}}
            }
        });
        let metric = Action::EdenSpaceUsage.spec().metric;
        let reading = single(extract(&metric, None, &data).unwrap());
        assert_eq!(reading.value, SampleValue::Number(50.0));
        assert!(reading.message.starts_with("Eden Space 'PS_Eden_Space' Utilization"));

        let metric = Action::CodeCacheUsage.spec().metric;
        let reading = single(extract(&metric, None, &data).unwrap());
        assert_eq!(reading.value, SampleValue::Number(4.17));
    }

    #[test]
    fn test_missing_memory_pool() {
        let data = json!({"name": {"G1_Eden_Space": {"usage": {"used": 1, "max": 2}}}});
        let metric = Action::EdenSpaceUsage.spec().metric;
        let err = extract(&metric, Some("PS_Eden_Space"), &data).unwrap_err();
        assert!(matches!(err, CheckError::MissingField { .. }));
    }

    #[test]
    fn test_gc_time() {
        let data = json!({
            "name": {"PS_MarkSweep": {"collection-count": 4, "collection-time": 130}}
        });
        let reading = single(extract(&Action::Gctime.spec().metric, None, &data).unwrap());
        assert_eq!(reading.value, SampleValue::Number(32.5));
        assert_eq!(reading.unit, Unit::Milliseconds);
        assert_eq!(
            reading.message,
            "GC 'PS_MarkSweep' total-time=130ms count=4 avg-time=32.50ms"
        );
    }

    #[test]
    fn test_gc_time_without_collections() {
        let data = json!({"name": {"G1": {"collection-count": 0, "collection-time": 0}}});
        let reading = single(extract(&Action::Gctime.spec().metric, Some("G1"), &data).unwrap());
        assert_eq!(reading.value, SampleValue::Number(0.0));
    }

    #[test]
    fn test_queue_depth() {
        let data = json!({"message-count": 17, "consumer-count": 2});
        let reading =
            single(extract(&Action::QueueDepth.spec().metric, Some("orders"), &data).unwrap());
        assert_eq!(reading.value, SampleValue::Number(17.0));
        assert_eq!(reading.message, "Queue 'orders' message-count=17");
    }

    #[test]
    fn test_statistics() {
        let data = json!({"ActiveCount": 3, "MaxWaitTime": 250, "thread-count": 42});
        let metric = Metric::Statistic {
            source: StatSource::Datasource,
            title: "DataSource",
        };
        let reading = single(extract(&metric, Some("ActiveCount"), &data).unwrap());
        assert_eq!(reading.message, "DataSource 'ActiveCount': 3");
        assert_eq!(reading.unit, Unit::Count);

        let reading = single(extract(&metric, Some("MaxWaitTime"), &data).unwrap());
        assert_eq!(reading.unit, Unit::Milliseconds);

        let reading = single(
            extract(&Action::Threading.spec().metric, Some("thread-count"), &data).unwrap(),
        );
        assert_eq!(reading.message, "Threading Statistics 'thread-count': 42");
    }

    #[test]
    fn test_server_state_wrapped_and_bare() {
        let metric = Action::ServerStatus.spec().metric;
        let reading = single(
            extract(&metric, None, &json!({"outcome": "success", "result": "running"})).unwrap(),
        );
        assert_eq!(reading.value, SampleValue::Text("running".to_string()));
        assert_eq!(reading.message, "Server Status 'running'");

        let reading = single(extract(&metric, None, &json!("reload-required")).unwrap());
        assert_eq!(reading.value, SampleValue::Text("reload-required".to_string()));
    }

    #[test]
    fn test_deployments() {
        let data = json!([
            {"address": [{"deployment": "deployment-one.war"}], "outcome": "success", "result": "OK"},
            {"address": [{"deployment": "deployment-two.ear"}], "outcome": "success", "result": "STOPPED"}
        ]);
        let extracted = extract(&Metric::Deployments, None, &data).unwrap();
        assert_eq!(
            extracted,
            Extracted::Deployments(vec![
                ("deployment-one.war".to_string(), "OK".to_string()),
                ("deployment-two.ear".to_string(), "STOPPED".to_string()),
            ])
        );
    }

    #[test]
    fn test_deployments_wrapped_in_result() {
        let data = json!({
            "outcome": "success",
            "result": [{"address": [{"deployment": "app.war"}], "result": "FAILED"}]
        });
        let extracted = extract(&Metric::Deployments, None, &data).unwrap();
        assert_eq!(
            extracted,
            Extracted::Deployments(vec![("app.war".to_string(), "FAILED".to_string())])
        );
    }

    #[test]
    fn test_deployment_without_address() {
        let data = json!([{"result": "OK"}]);
        assert!(matches!(
            extract(&Metric::Deployments, None, &data),
            Err(CheckError::MissingField { .. })
        ));
    }
}
