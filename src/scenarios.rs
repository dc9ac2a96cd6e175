//! Built-in usage presets

use serde::Serialize;

use crate::usage::{UsageField, UsageRecord};

/// Id of the per-unit profile used by break-even analysis.
pub const PER_SESSION_ID: &str = "per-session";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub usage: UsageRecord,
}

fn template(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    pairs: &[(UsageField, f64)],
) -> ScenarioTemplate {
    ScenarioTemplate {
        id,
        name,
        description,
        usage: UsageRecord::from_pairs(pairs),
    }
}

fn prototype() -> ScenarioTemplate {
    use UsageField::*;
    template(
        "prototype",
        "Prototype",
        "Single agent under development, a handful of testers",
        &[
            (RuntimeCpuHours, 10.0),
            (RuntimeMemoryGbHours, 20.0),
            (GatewayApiInvocations, 10_000.0),
            (GatewaySearchApiCalls, 1_000.0),
            (GatewayToolIndexing, 50.0),
            (IdentityTokenRequests, 5_000.0),
            (MemoryShortTermEvents, 10_000.0),
            (MemoryLongTermStorageBuiltIn, 1_000.0),
            (MemoryLongTermRetrievals, 5_000.0),
        ],
    )
}

fn startup() -> ScenarioTemplate {
    use UsageField::*;
    template(
        "startup",
        "Startup",
        "A few agents in production with early customers",
        &[
            (RuntimeCpuHours, 150.0),
            (RuntimeMemoryGbHours, 300.0),
            (BrowserToolCpuHours, 20.0),
            (BrowserToolMemoryGbHours, 40.0),
            (CodeInterpreterCpuHours, 15.0),
            (CodeInterpreterMemoryGbHours, 30.0),
            (GatewayApiInvocations, 250_000.0),
            (GatewaySearchApiCalls, 25_000.0),
            (GatewayToolIndexing, 200.0),
            (IdentityTokenRequests, 100_000.0),
            (MemoryShortTermEvents, 200_000.0),
            (MemoryLongTermStorageBuiltIn, 20_000.0),
            (MemoryLongTermStorageCustom, 5_000.0),
            (MemoryLongTermRetrievals, 100_000.0),
        ],
    )
}

fn production() -> ScenarioTemplate {
    use UsageField::*;
    template(
        "production",
        "Production",
        "Customer-facing agents with steady daily traffic",
        &[
            (RuntimeCpuHours, 1_200.0),
            (RuntimeMemoryGbHours, 2_400.0),
            (BrowserToolCpuHours, 150.0),
            (BrowserToolMemoryGbHours, 300.0),
            (CodeInterpreterCpuHours, 100.0),
            (CodeInterpreterMemoryGbHours, 200.0),
            (GatewayApiInvocations, 2_000_000.0),
            (GatewaySearchApiCalls, 200_000.0),
            (GatewayToolIndexing, 1_000.0),
            (IdentityTokenRequests, 1_000_000.0),
            (MemoryShortTermEvents, 2_000_000.0),
            (MemoryLongTermStorageBuiltIn, 150_000.0),
            (MemoryLongTermStorageCustom, 50_000.0),
            (MemoryLongTermRetrievals, 1_000_000.0),
        ],
    )
}

fn enterprise() -> ScenarioTemplate {
    use UsageField::*;
    template(
        "enterprise",
        "Enterprise",
        "Fleet of agents across business units",
        &[
            (RuntimeCpuHours, 10_000.0),
            (RuntimeMemoryGbHours, 20_000.0),
            (BrowserToolCpuHours, 1_500.0),
            (BrowserToolMemoryGbHours, 3_000.0),
            (CodeInterpreterCpuHours, 1_000.0),
            (CodeInterpreterMemoryGbHours, 2_000.0),
            (GatewayApiInvocations, 25_000_000.0),
            (GatewaySearchApiCalls, 2_500_000.0),
            (GatewayToolIndexing, 5_000.0),
            (IdentityTokenRequests, 12_000_000.0),
            (MemoryShortTermEvents, 20_000_000.0),
            (MemoryLongTermStorageBuiltIn, 1_500_000.0),
            (MemoryLongTermStorageCustom, 500_000.0),
            (MemoryLongTermRetrievals, 10_000_000.0),
        ],
    )
}

/// Usage of one typical user session: about 36 seconds of runtime, a few
/// tool calls and memory reads.
pub fn per_session_profile() -> ScenarioTemplate {
    use UsageField::*;
    template(
        PER_SESSION_ID,
        "Per session",
        "One user session, used as the unit for break-even analysis",
        &[
            (RuntimeCpuHours, 0.01),
            (RuntimeMemoryGbHours, 0.02),
            (GatewayApiInvocations, 5.0),
            (GatewaySearchApiCalls, 1.0),
            (IdentityTokenRequests, 1.0),
            (MemoryShortTermEvents, 4.0),
            (MemoryLongTermRetrievals, 2.0),
        ],
    )
}

/// Every template, smallest first, with the per-session profile last.
pub fn templates() -> Vec<ScenarioTemplate> {
    vec![
        prototype(),
        startup(),
        production(),
        enterprise(),
        per_session_profile(),
    ]
}

pub fn find_template(id: &str) -> Option<ScenarioTemplate> {
    let wanted = id.trim().to_ascii_lowercase();
    templates().into_iter().find(|t| t.id == wanted)
}
