//! Check actions
//!
//! Every action is described by one [`ActionSpec`] entry: which management
//! resource to read, how to turn the response into a sample and which
//! thresholds apply when none are given on the command line.

use clap::ValueEnum;

use super::formatter::Unit;
use super::thresholds::Thresholds;
use crate::collector::FetchMethod;

/// Datasource pool statistics that can be checked
pub const DS_STAT_TYPES: [&str; 12] = [
    "ActiveCount",
    "AvailableCount",
    "AverageBlockingTime",
    "AverageCreationTime",
    "CreatedCount",
    "DestroyedCount",
    "MaxCreationTime",
    "MaxUsedCount",
    "MaxWaitTime",
    "TimedOut",
    "TotalBlockingTime",
    "TotalCreationTime",
];

/// Threading statistics that can be checked
pub const THREAD_STAT_TYPES: [&str; 4] = [
    "thread-count",
    "peak-thread-count",
    "total-started-thread-count",
    "daemon-thread-count",
];

/// Available checks
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Action {
    #[default]
    ServerStatus,
    DeploymentStatus,
    HeapUsage,
    NonHeapUsage,
    EdenSpaceUsage,
    OldGenUsage,
    PermGenUsage,
    CodeCacheUsage,
    Gctime,
    QueueDepth,
    Datasource,
    XaDatasource,
    Threading,
}

impl Action {
    /// All actions in table order
    pub const ALL: [Action; 13] = [
        Action::ServerStatus,
        Action::DeploymentStatus,
        Action::HeapUsage,
        Action::NonHeapUsage,
        Action::EdenSpaceUsage,
        Action::OldGenUsage,
        Action::PermGenUsage,
        Action::CodeCacheUsage,
        Action::Gctime,
        Action::QueueDepth,
        Action::Datasource,
        Action::XaDatasource,
        Action::Threading,
    ];

    /// Table entry for this action
    pub fn spec(self) -> &'static ActionSpec {
        // ACTIONS is ordered like the enum
        &ACTIONS[self as usize]
    }

    /// Action name as accepted by `-A`
    pub fn name(self) -> &'static str {
        self.spec().label
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Built-in thresholds of an action
#[derive(Debug, Clone, Copy)]
pub enum DefaultLevels {
    /// Numeric watermarks
    Numeric { warning: f64, critical: f64 },
    /// Label sets
    Labels {
        warning: &'static [&'static str],
        critical: &'static [&'static str],
        ok: &'static [&'static str],
    },
}

impl DefaultLevels {
    /// Materialize as [`Thresholds`]
    pub fn thresholds(self) -> Thresholds {
        match self {
            DefaultLevels::Numeric { warning, critical } => Thresholds::numeric(warning, critical),
            DefaultLevels::Labels {
                warning,
                critical,
                ok,
            } => Thresholds::labels(warning, critical, Some(ok)),
        }
    }

    /// Whether `-W`/`-C` are parsed as label lists
    pub fn is_label_based(self) -> bool {
        matches!(self, DefaultLevels::Labels { .. })
    }
}

/// Which user supplied value selects the field to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatSource {
    /// `-s`, one of [`DS_STAT_TYPES`]
    Datasource,
    /// `-t`, one of [`THREAD_STAT_TYPES`]
    Thread,
}

/// How a response is turned into a sample
#[derive(Debug, Clone, Copy)]
pub enum Metric {
    /// Text field, e.g. `result` of a read-attribute operation
    State { field: &'static str, title: &'static str },
    /// Per-deployment `result` entries of a wildcard read
    Deployments,
    /// `{area}.used / {area}.max` of the memory MXBean
    Memory { area: &'static str, title: &'static str },
    /// `name.{pool}.usage.used / max` of a memory pool
    MemoryPool {
        default_pool: &'static str,
        title: &'static str,
    },
    /// Average collection time of a garbage collector
    GcTime { default_collector: &'static str },
    /// Fixed numeric field
    Counter {
        field: &'static str,
        title: &'static str,
        unit: Unit,
    },
    /// Numeric field named by a user supplied statistic type
    Statistic { source: StatSource, title: &'static str },
}

/// Declarative description of a check action
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub action: Action,
    /// Name used for `-A` and as perf data label
    pub label: &'static str,
    pub method: FetchMethod,
    /// Path below `/management`; `{queue}` and `{datasource}` are substituted
    pub path: &'static str,
    /// Query parameters (GET) or body fields (POST)
    pub payload: &'static [(&'static str, &'static str)],
    pub metric: Metric,
    pub defaults: DefaultLevels,
}

const RUNTIME: &[(&str, &str)] = &[("include-runtime", "true")];
const RUNTIME_RECURSIVE: &[(&str, &str)] = &[("include-runtime", "true"), ("recursive", "true")];

const MEMORY_PATH: &str = "/core-service/platform-mbean/type/memory";
const MEMORY_POOL_PATH: &str = "/core-service/platform-mbean/type/memory-pool";

const USAGE_LEVELS: DefaultLevels = DefaultLevels::Numeric {
    warning: 80.0,
    critical: 90.0,
};
const STATIC_POOL_LEVELS: DefaultLevels = DefaultLevels::Numeric {
    warning: 90.0,
    critical: 95.0,
};

/// The action table, in [`Action`] order
pub static ACTIONS: [ActionSpec; 13] = [
    ActionSpec {
        action: Action::ServerStatus,
        label: "server_status",
        method: FetchMethod::Post,
        path: "",
        payload: &[("operation", "read-attribute"), ("name", "server-state")],
        metric: Metric::State {
            field: "result",
            title: "Server Status",
        },
        defaults: DefaultLevels::Labels {
            warning: &["restart-required", "reload-required"],
            critical: &["stopped", "stopping"],
            ok: &["running"],
        },
    },
    ActionSpec {
        action: Action::DeploymentStatus,
        label: "deployment_status",
        method: FetchMethod::Get,
        path: "/deployment/*",
        payload: &[("operation", "attribute"), ("name", "status")],
        metric: Metric::Deployments,
        defaults: DefaultLevels::Labels {
            warning: &["STOPPED"],
            critical: &["FAILED"],
            ok: &["OK"],
        },
    },
    ActionSpec {
        action: Action::HeapUsage,
        label: "heap_usage",
        method: FetchMethod::Get,
        path: MEMORY_PATH,
        payload: RUNTIME,
        metric: Metric::Memory {
            area: "heap-memory-usage",
            title: "Heap Memory",
        },
        defaults: USAGE_LEVELS,
    },
    ActionSpec {
        action: Action::NonHeapUsage,
        label: "non_heap_usage",
        method: FetchMethod::Get,
        path: MEMORY_PATH,
        payload: RUNTIME,
        metric: Metric::Memory {
            area: "non-heap-memory-usage",
            title: "Non Heap Memory",
        },
        defaults: USAGE_LEVELS,
    },
    ActionSpec {
        action: Action::EdenSpaceUsage,
        label: "eden_space_usage",
        method: FetchMethod::Get,
        path: MEMORY_POOL_PATH,
        payload: RUNTIME_RECURSIVE,
        metric: Metric::MemoryPool {
            default_pool: "PS_Eden_Space",
            title: "Eden Space",
        },
        defaults: USAGE_LEVELS,
    },
    ActionSpec {
        action: Action::OldGenUsage,
        label: "old_gen_usage",
        method: FetchMethod::Get,
        path: MEMORY_POOL_PATH,
        payload: RUNTIME_RECURSIVE,
        metric: Metric::MemoryPool {
            default_pool: "PS_Old_Gen",
            title: "Old Gen",
        },
        defaults: USAGE_LEVELS,
    },
    ActionSpec {
        action: Action::PermGenUsage,
        label: "perm_gen_usage",
        method: FetchMethod::Get,
        path: MEMORY_POOL_PATH,
        payload: RUNTIME_RECURSIVE,
        metric: Metric::MemoryPool {
            default_pool: "PS_Perm_Gen",
            title: "Perm Gen",
        },
        defaults: STATIC_POOL_LEVELS,
    },
    ActionSpec {
        action: Action::CodeCacheUsage,
        label: "code_cache_usage",
        method: FetchMethod::Get,
        path: MEMORY_POOL_PATH,
        payload: RUNTIME_RECURSIVE,
        metric: Metric::MemoryPool {
            default_pool: "Code_Cache",
            title: "Code Cache",
        },
        defaults: STATIC_POOL_LEVELS,
    },
    ActionSpec {
        action: Action::Gctime,
        label: "gctime",
        method: FetchMethod::Get,
        path: "/core-service/platform-mbean/type/garbage-collector",
        payload: RUNTIME_RECURSIVE,
        metric: Metric::GcTime {
            default_collector: "PS_MarkSweep",
        },
        defaults: DefaultLevels::Numeric {
            warning: 500.0,
            critical: 1000.0,
        },
    },
    ActionSpec {
        action: Action::QueueDepth,
        label: "queue_depth",
        method: FetchMethod::Get,
        path: "/subsystem/messaging/hornetq-server/default/jms-queue/{queue}",
        payload: RUNTIME_RECURSIVE,
        metric: Metric::Counter {
            field: "message-count",
            title: "Queue",
            unit: Unit::Count,
        },
        defaults: DefaultLevels::Numeric {
            warning: 100.0,
            critical: 200.0,
        },
    },
    ActionSpec {
        action: Action::Datasource,
        label: "datasource",
        method: FetchMethod::Get,
        path: "/subsystem/datasources/data-source/{datasource}/statistics/pool/",
        payload: RUNTIME_RECURSIVE,
        metric: Metric::Statistic {
            source: StatSource::Datasource,
            title: "DataSource",
        },
        defaults: DefaultLevels::Numeric {
            warning: 5.0,
            critical: 10.0,
        },
    },
    ActionSpec {
        action: Action::XaDatasource,
        label: "xa_datasource",
        method: FetchMethod::Get,
        path: "/subsystem/datasources/xa-data-source/{datasource}/statistics/pool/",
        payload: RUNTIME_RECURSIVE,
        metric: Metric::Statistic {
            source: StatSource::Datasource,
            title: "XA DataSource",
        },
        defaults: DefaultLevels::Numeric {
            warning: 5.0,
            critical: 10.0,
        },
    },
    ActionSpec {
        action: Action::Threading,
        label: "threading",
        method: FetchMethod::Get,
        path: "/core-service/platform-mbean/type/threading",
        payload: RUNTIME,
        metric: Metric::Statistic {
            source: StatSource::Thread,
            title: "Threading Statistics",
        },
        defaults: DefaultLevels::Numeric {
            warning: 100.0,
            critical: 200.0,
        },
    },
];

impl ActionSpec {
    /// Request payload as a JSON object
    pub fn payload_json(&self) -> serde_json::Value {
        self.payload
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect::<serde_json::Map<_, _>>()
            .into()
    }

    /// Request path with `{queue}` / `{datasource}` filled in
    pub fn path_for(&self, queue: Option<&str>, datasource: Option<&str>) -> String {
        self.path
            .replace("{queue}", queue.unwrap_or_default())
            .replace("{datasource}", datasource.unwrap_or_default())
    }
}
