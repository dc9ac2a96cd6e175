//! Usage catalog
//!
//! Every billable dimension is described once in [`FIELD_SPECS`]. Validation,
//! sanitization, cost calculation and display all iterate that table instead
//! of matching on field names.

mod sanitize;


use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

pub use sanitize::sanitize_usage_record;

pub const FIELD_COUNT: usize = 14;

/// One billable dimension of a monthly usage record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UsageField {
    RuntimeCpuHours,
    RuntimeMemoryGbHours,
    BrowserToolCpuHours,
    BrowserToolMemoryGbHours,
    CodeInterpreterCpuHours,
    CodeInterpreterMemoryGbHours,
    GatewayApiInvocations,
    GatewaySearchApiCalls,
    GatewayToolIndexing,
    IdentityTokenRequests,
    MemoryShortTermEvents,
    MemoryLongTermStorageBuiltIn,
    MemoryLongTermStorageCustom,
    MemoryLongTermRetrievals,
}

/// How a usage quantity is turned into money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitConvention {
    /// Rate is quoted per 1,000 units (requests, events, records).
    CountPer1000,
    /// Rate is quoted per unit (GB, vCPU-hour, GB-hour).
    LinearAmount,
    /// Rate is quoted per 100 units.
    CountPer100,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ServiceCategory {
    Runtime,
    BrowserTool,
    CodeInterpreter,
    Gateway,
    Identity,
    Memory,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 6] = [
        ServiceCategory::Runtime,
        ServiceCategory::BrowserTool,
        ServiceCategory::CodeInterpreter,
        ServiceCategory::Gateway,
        ServiceCategory::Identity,
        ServiceCategory::Memory,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Runtime => "Runtime",
            ServiceCategory::BrowserTool => "Browser Tool",
            ServiceCategory::CodeInterpreter => "Code Interpreter",
            ServiceCategory::Gateway => "Gateway",
            ServiceCategory::Identity => "Identity",
            ServiceCategory::Memory => "Memory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub max_decimal_places: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: UsageField,
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub category: ServiceCategory,
    pub convention: UnitConvention,
    pub bounds: FieldBounds,
}

const CPU_HOURS: FieldBounds = FieldBounds {
    min: 0.0,
    max: 100_000.0,
    max_decimal_places: 2,
};

const MEMORY_GB_HOURS: FieldBounds = FieldBounds {
    min: 0.0,
    max: 1_000_000.0,
    max_decimal_places: 2,
};

const REQUEST_COUNT: FieldBounds = FieldBounds {
    min: 0.0,
    max: 1_000_000_000.0,
    max_decimal_places: 0,
};

const STORED_RECORDS: FieldBounds = FieldBounds {
    min: 0.0,
    max: 100_000_000.0,
    max_decimal_places: 0,
};

const INDEXED_TOOLS: FieldBounds = FieldBounds {
    min: 0.0,
    max: 1_000_000.0,
    max_decimal_places: 0,
};

/// Ordered to match the `UsageField` discriminants.
pub const FIELD_SPECS: [FieldSpec; FIELD_COUNT] = [
    FieldSpec {
        field: UsageField::RuntimeCpuHours,
        key: "runtimeCpuHours",
        label: "Runtime CPU",
        unit: "vCPU-hours",
        category: ServiceCategory::Runtime,
        convention: UnitConvention::LinearAmount,
        bounds: CPU_HOURS,
    },
    FieldSpec {
        field: UsageField::RuntimeMemoryGbHours,
        key: "runtimeMemoryGBHours",
        label: "Runtime memory",
        unit: "GB-hours",
        category: ServiceCategory::Runtime,
        convention: UnitConvention::LinearAmount,
        bounds: MEMORY_GB_HOURS,
    },
    FieldSpec {
        field: UsageField::BrowserToolCpuHours,
        key: "browserToolCpuHours",
        label: "Browser tool CPU",
        unit: "vCPU-hours",
        category: ServiceCategory::BrowserTool,
        convention: UnitConvention::LinearAmount,
        bounds: CPU_HOURS,
    },
    FieldSpec {
        field: UsageField::BrowserToolMemoryGbHours,
        key: "browserToolMemoryGBHours",
        label: "Browser tool memory",
        unit: "GB-hours",
        category: ServiceCategory::BrowserTool,
        convention: UnitConvention::LinearAmount,
        bounds: MEMORY_GB_HOURS,
    },
    FieldSpec {
        field: UsageField::CodeInterpreterCpuHours,
        key: "codeInterpreterCpuHours",
        label: "Code interpreter CPU",
        unit: "vCPU-hours",
        category: ServiceCategory::CodeInterpreter,
        convention: UnitConvention::LinearAmount,
        bounds: CPU_HOURS,
    },
    FieldSpec {
        field: UsageField::CodeInterpreterMemoryGbHours,
        key: "codeInterpreterMemoryGBHours",
        label: "Code interpreter memory",
        unit: "GB-hours",
        category: ServiceCategory::CodeInterpreter,
        convention: UnitConvention::LinearAmount,
        bounds: MEMORY_GB_HOURS,
    },
    FieldSpec {
        field: UsageField::GatewayApiInvocations,
        key: "gatewayApiInvocations",
        label: "Gateway API invocations",
        unit: "requests",
        category: ServiceCategory::Gateway,
        convention: UnitConvention::CountPer1000,
        bounds: REQUEST_COUNT,
    },
    FieldSpec {
        field: UsageField::GatewaySearchApiCalls,
        key: "gatewaySearchApiCalls",
        label: "Gateway search API",
        unit: "requests",
        category: ServiceCategory::Gateway,
        convention: UnitConvention::CountPer1000,
        bounds: REQUEST_COUNT,
    },
    FieldSpec {
        field: UsageField::GatewayToolIndexing,
        key: "gatewayToolIndexing",
        label: "Gateway tool indexing",
        unit: "tools",
        category: ServiceCategory::Gateway,
        convention: UnitConvention::CountPer100,
        bounds: INDEXED_TOOLS,
    },
    FieldSpec {
        field: UsageField::IdentityTokenRequests,
        key: "identityTokenRequests",
        label: "Identity token requests",
        unit: "requests",
        category: ServiceCategory::Identity,
        convention: UnitConvention::CountPer1000,
        bounds: REQUEST_COUNT,
    },
    FieldSpec {
        field: UsageField::MemoryShortTermEvents,
        key: "memoryShortTermEvents",
        label: "Short-term memory events",
        unit: "events",
        category: ServiceCategory::Memory,
        convention: UnitConvention::CountPer1000,
        bounds: REQUEST_COUNT,
    },
    FieldSpec {
        field: UsageField::MemoryLongTermStorageBuiltIn,
        key: "memoryLongTermStorageBuiltIn",
        label: "Long-term memory (built-in)",
        unit: "records",
        category: ServiceCategory::Memory,
        convention: UnitConvention::CountPer1000,
        bounds: STORED_RECORDS,
    },
    FieldSpec {
        field: UsageField::MemoryLongTermStorageCustom,
        key: "memoryLongTermStorageCustom",
        label: "Long-term memory (custom)",
        unit: "records",
        category: ServiceCategory::Memory,
        convention: UnitConvention::CountPer1000,
        bounds: STORED_RECORDS,
    },
    FieldSpec {
        field: UsageField::MemoryLongTermRetrievals,
        key: "memoryLongTermRetrievals",
        label: "Long-term memory retrievals",
        unit: "retrievals",
        category: ServiceCategory::Memory,
        convention: UnitConvention::CountPer1000,
        bounds: REQUEST_COUNT,
    },
];

impl UsageField {
    pub const ALL: [UsageField; FIELD_COUNT] = [
        UsageField::RuntimeCpuHours,
        UsageField::RuntimeMemoryGbHours,
        UsageField::BrowserToolCpuHours,
        UsageField::BrowserToolMemoryGbHours,
        UsageField::CodeInterpreterCpuHours,
        UsageField::CodeInterpreterMemoryGbHours,
        UsageField::GatewayApiInvocations,
        UsageField::GatewaySearchApiCalls,
        UsageField::GatewayToolIndexing,
        UsageField::IdentityTokenRequests,
        UsageField::MemoryShortTermEvents,
        UsageField::MemoryLongTermStorageBuiltIn,
        UsageField::MemoryLongTermStorageCustom,
        UsageField::MemoryLongTermRetrievals,
    ];

    pub fn spec(&self) -> &'static FieldSpec {
        &FIELD_SPECS[self.index()]
    }

    /// External camelCase key, e.g. `runtimeCpuHours`.
    pub fn key(&self) -> &'static str {
        self.spec().key
    }

    pub fn label(&self) -> &'static str {
        self.spec().label
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for UsageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown usage field: {0}")]
pub struct UnknownField(pub String);

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for UsageField {
    type Err = UnknownField;

    /// Accepts `runtimeCpuHours`, `runtime_cpu_hours` or `runtime-cpu-hours`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s.trim());
        UsageField::ALL
            .into_iter()
            .find(|field| normalize_key(field.key()) == wanted)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

impl Serialize for UsageField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for UsageField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

/// Untrusted, possibly incomplete usage values. Only
/// [`sanitize_usage_record`] turns one into a [`UsageRecord`].
pub type PartialUsage = BTreeMap<UsageField, f64>;

/// Extract a [`PartialUsage`] from an arbitrary JSON value.
///
/// Unknown keys and non-numeric values are skipped.
pub fn partial_from_json(value: &serde_json::Value) -> PartialUsage {
    let mut partial = PartialUsage::new();
    let Some(object) = value.as_object() else {
        warn!("usage input is not a JSON object, ignoring it");
        return partial;
    };

    for (key, raw) in object {
        let Ok(field) = key.parse::<UsageField>() else {
            warn!(key = %key, "ignoring unknown usage field");
            continue;
        };
        match raw.as_f64() {
            Some(value) => {
                partial.insert(field, value);
            }
            None => warn!(field = %field, "ignoring non-numeric usage value"),
        }
    }
    partial
}

/// A complete monthly usage record: every field finite and within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UsageRecord {
    values: [f64; FIELD_COUNT],
}

impl UsageRecord {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a record from `(field, value)` pairs, sanitizing on the way.
    pub fn from_pairs(pairs: &[(UsageField, f64)]) -> Self {
        let partial: PartialUsage = pairs.iter().copied().collect();
        sanitize_usage_record(&partial)
    }

    pub fn get(&self, field: UsageField) -> f64 {
        self.values[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (UsageField, f64)> + '_ {
        UsageField::ALL
            .into_iter()
            .map(move |field| (field, self.get(field)))
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn to_partial(&self) -> PartialUsage {
        self.iter().collect()
    }

    /// This record with `overrides` applied on top.
    ///
    /// Overridden values go through [`sanitize_usage_record`] like any other
    /// untrusted input; a non-finite override keeps the current value.
    pub fn with_overrides(&self, overrides: &PartialUsage) -> Self {
        let mut merged = self.to_partial();
        for (&field, &value) in overrides {
            if value.is_finite() {
                merged.insert(field, value);
            } else {
                warn!(field = %field, "ignoring non-finite usage override");
            }
        }
        sanitize_usage_record(&merged)
    }

    /// Every field multiplied by `factor`. The result is not re-bounded.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            values: self.values.map(|v| v * factor),
        }
    }

    pub(crate) fn from_values(values: [f64; FIELD_COUNT]) -> Self {
        Self { values }
    }
}

/// Serialize a per-field value array as a `{fieldKey: value}` map.
pub(crate) fn serialize_field_values<S: Serializer>(
    values: &[f64; FIELD_COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
    for field in UsageField::ALL {
        map.serialize_entry(field.key(), &values[field.index()])?;
    }
    map.end()
}

impl Serialize for UsageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_field_values(&self.values, serializer)
    }
}
