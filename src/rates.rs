use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::usage::{serialize_field_values, UsageField, FIELD_COUNT};

pub const DEFAULT_SOURCE_URL: &str = "https://aws.amazon.com/bedrock/agentcore/pricing/";

const DEFAULT_LAST_UPDATED: (i32, u32, u32) = (2025, 10, 13);

// USD. Hour fields per vCPU-hour or GB-hour, tool indexing per 100 tools,
// everything else per 1,000 units.
const DEFAULT_RATES: &[(UsageField, f64)] = &[
    (UsageField::RuntimeCpuHours, 0.0895),
    (UsageField::RuntimeMemoryGbHours, 0.00945),
    (UsageField::BrowserToolCpuHours, 0.0895),
    (UsageField::BrowserToolMemoryGbHours, 0.00945),
    (UsageField::CodeInterpreterCpuHours, 0.0895),
    (UsageField::CodeInterpreterMemoryGbHours, 0.00945),
    (UsageField::GatewayApiInvocations, 0.005),
    (UsageField::GatewaySearchApiCalls, 0.025),
    (UsageField::GatewayToolIndexing, 0.02),
    (UsageField::IdentityTokenRequests, 0.010),
    (UsageField::MemoryShortTermEvents, 0.25),
    (UsageField::MemoryLongTermStorageBuiltIn, 0.75),
    (UsageField::MemoryLongTermStorageCustom, 0.25),
    (UsageField::MemoryLongTermRetrievals, 0.50),
];

/// Partial rate override, merged over a [`RateTable`] with
/// [`RateTable::with_overrides`].
pub type RateOverrides = BTreeMap<UsageField, f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    #[serde(serialize_with = "serialize_field_values")]
    rates: [f64; FIELD_COUNT],
    pub last_updated: NaiveDate,
    pub source_url: String,
}

impl Default for RateTable {
    fn default() -> Self {
        let mut rates = [0.0; FIELD_COUNT];
        for (field, rate) in DEFAULT_RATES {
            rates[field.index()] = *rate;
        }
        let (year, month, day) = DEFAULT_LAST_UPDATED;
        Self {
            rates,
            last_updated: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }
}

impl RateTable {
    pub fn rate(&self, field: UsageField) -> f64 {
        self.rates[field.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (UsageField, f64)> + '_ {
        UsageField::ALL
            .into_iter()
            .map(move |field| (field, self.rate(field)))
    }

    /// A new table with `overrides` applied. Negative or non-finite
    /// override values are skipped so every rate stays >= 0.
    pub fn with_overrides(&self, overrides: &RateOverrides) -> RateTable {
        let mut table = self.clone();
        for (&field, &rate) in overrides {
            if !rate.is_finite() || rate < 0.0 {
                warn!(field = %field, rate, "ignoring invalid rate override");
                continue;
            }
            table.rates[field.index()] = rate;
        }
        table
    }

    /// Fields whose rate differs from the built-in default.
    pub fn overridden_fields(&self) -> Vec<UsageField> {
        let defaults = RateTable::default();
        self.iter()
            .filter(|(field, rate)| *rate != defaults.rate(*field))
            .map(|(field, _)| field)
            .collect()
    }
}
