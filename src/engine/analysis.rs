//! Analyses built on [`compute_breakdown`]: batch runs, scenario comparison,
//! optimization hints, growth projection and break-even search.

use serde::Serialize;
use tracing::debug;

use super::{compute_breakdown, round_to_precision, CostBreakdown, COST_PRECISION};
use crate::rates::RateTable;
use crate::usage::{
    sanitize_usage_record, PartialUsage, ServiceCategory, UsageField, UsageRecord,
};

// --- Batch ---

/// Sanitize and price each scenario independently.
pub fn batch_compute(scenarios: &[PartialUsage], rates: &RateTable) -> Vec<CostBreakdown> {
    scenarios
        .iter()
        .map(|partial| compute_breakdown(&sanitize_usage_record(partial), rates))
        .collect()
}

// --- Comparison ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDelta {
    pub field: UsageField,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub baseline: CostBreakdown,
    pub comparison: CostBreakdown,
    pub per_field_delta: Vec<FieldDelta>,
    pub total_delta: f64,
    /// Unrounded share of the baseline total; 0 when the baseline costs nothing.
    pub percent_change: f64,
    pub is_more_expensive: bool,
}

pub fn compare_scenarios(
    baseline: &UsageRecord,
    comparison: &UsageRecord,
    rates: &RateTable,
) -> ScenarioComparison {
    let base = compute_breakdown(baseline, rates);
    let other = compute_breakdown(comparison, rates);

    let per_field_delta = UsageField::ALL
        .into_iter()
        .map(|field| FieldDelta {
            field,
            delta: round_to_precision(other.cost(field) - base.cost(field), COST_PRECISION),
        })
        .collect();

    let total_delta = round_to_precision(
        other.total_monthly_cost - base.total_monthly_cost,
        COST_PRECISION,
    );
    let percent_change = if base.total_monthly_cost > 0.0 {
        (total_delta / base.total_monthly_cost) * 100.0
    } else {
        0.0
    };

    ScenarioComparison {
        baseline: base,
        comparison: other,
        per_field_delta,
        total_delta,
        percent_change,
        is_more_expensive: total_delta > 0.0,
    }
}

// --- Optimization hints ---

/// Run a fixed battery of independent heuristics over `usage`.
///
/// Each triggered heuristic contributes one suggestion; the order of the
/// returned list is always the order of the checks below.
pub fn suggest_optimizations(usage: &UsageRecord, rates: &RateTable) -> Vec<String> {
    let breakdown = compute_breakdown(usage, rates);
    let share =
        |category: ServiceCategory| breakdown.share_of_total(breakdown.category_total(category));
    let mut suggestions = Vec::new();

    if share(ServiceCategory::Runtime) > 0.5 {
        suggestions.push(
            "Runtime compute is over half of the monthly cost. Shorter idle timeouts or \
             smaller vCPU allocations reduce it directly."
                .to_string(),
        );
    }

    let runtime_cpu = usage.get(UsageField::RuntimeCpuHours);
    let runtime_memory = usage.get(UsageField::RuntimeMemoryGbHours);
    if runtime_cpu > 0.0 && runtime_memory / runtime_cpu > 8.0 {
        suggestions.push(
            "Runtime memory exceeds 8 GB per vCPU-hour. Check whether agents are \
             over-provisioned on memory."
                .to_string(),
        );
    }

    if share(ServiceCategory::BrowserTool) > 0.25 {
        suggestions.push(
            "Browser tool sessions are over 25% of the monthly cost. Close browser \
             sessions as soon as a task completes."
                .to_string(),
        );
    }

    let interpreter_cpu = usage.get(UsageField::CodeInterpreterCpuHours);
    if interpreter_cpu > 0.0 && interpreter_cpu > runtime_cpu {
        suggestions.push(
            "Code interpreter compute exceeds agent runtime compute. Reuse interpreter \
             sessions across related tool calls."
                .to_string(),
        );
    }

    let invocations = usage.get(UsageField::GatewayApiInvocations);
    let searches = usage.get(UsageField::GatewaySearchApiCalls);
    if searches > 0.0 && searches > invocations {
        suggestions.push(
            "Gateway search calls outnumber tool invocations. Cache semantic tool \
             search results per session."
                .to_string(),
        );
    }

    let retrievals = usage.get(UsageField::MemoryLongTermRetrievals);
    let events = usage.get(UsageField::MemoryShortTermEvents);
    if retrievals > 0.0 && retrievals > events * 10.0 {
        suggestions.push(
            "Long-term memory retrievals are more than 10x short-term events. Cache \
             retrieved memories within a session."
                .to_string(),
        );
    }

    let built_in = usage.get(UsageField::MemoryLongTermStorageBuiltIn);
    let custom = usage.get(UsageField::MemoryLongTermStorageCustom);
    let built_in_cost = breakdown.cost(UsageField::MemoryLongTermStorageBuiltIn);
    if built_in > custom && breakdown.share_of_total(built_in_cost) > 0.2 {
        suggestions.push(
            "Built-in memory strategies cost three times as much per stored record as \
             custom strategies. Consider a custom strategy for high-volume memories."
                .to_string(),
        );
    }

    let tokens = usage.get(UsageField::IdentityTokenRequests);
    if tokens > 0.0 && tokens > invocations * 10.0 {
        suggestions.push(
            "Identity token requests exceed 10x gateway invocations. Reuse access \
             tokens until they expire."
                .to_string(),
        );
    }

    debug!(count = suggestions.len(), "optimization suggestions");
    suggestions
}

// --- Growth projection ---

pub const PROJECTION_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProjection {
    pub month: u32,
    pub usage: UsageRecord,
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthProjection {
    pub monthly_growth_rate: f64,
    pub monthly_projections: Vec<MonthlyProjection>,
    pub total_annual_cost: f64,
    pub average_monthly_cost: f64,
}

/// Project twelve months of compounding growth from `current`.
///
/// Month `m` scales every field by `(1 + growth)^(m - 1)` and rounds it to a
/// whole number before sanitizing, so fields pushed past their bound drop to 0.
pub fn project_growth(
    current: &UsageRecord,
    monthly_growth_rate: f64,
    rates: &RateTable,
) -> GrowthProjection {
    let monthly_projections: Vec<MonthlyProjection> = (1..=PROJECTION_MONTHS)
        .map(|month| {
            let factor = (1.0 + monthly_growth_rate).powi(month as i32 - 1);
            let grown: PartialUsage = current
                .iter()
                .map(|(field, value)| (field, (value * factor).round()))
                .collect();
            let usage = sanitize_usage_record(&grown);
            let breakdown = compute_breakdown(&usage, rates);
            MonthlyProjection {
                month,
                usage,
                breakdown,
            }
        })
        .collect();

    let annual: f64 = monthly_projections
        .iter()
        .map(|p| p.breakdown.total_monthly_cost)
        .sum();
    let total_annual_cost = round_to_precision(annual, COST_PRECISION);

    GrowthProjection {
        monthly_growth_rate,
        monthly_projections,
        total_annual_cost,
        average_monthly_cost: round_to_precision(
            total_annual_cost / PROJECTION_MONTHS as f64,
            COST_PRECISION,
        ),
    }
}

// --- Break-even ---

pub const BREAK_EVEN_MAX_UNITS: u64 = 10_000_000;
pub const BREAK_EVEN_MAX_ITERATIONS: u32 = 50;
pub const BREAK_EVEN_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct BreakEvenInput {
    pub fixed_costs: f64,
    pub revenue_per_unit: f64,
    /// Profit the second search aims for.
    pub target_profit: f64,
    /// Usage consumed by one unit (a session, a customer request, ...).
    pub unit_profile: UsageRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakEvenAnalysis {
    pub break_even_units: u64,
    pub profitable_at_target_units: u64,
    pub target_profit: f64,
    pub marginal_cost_per_unit: f64,
}

/// Monthly profit at `units` units of the input's profile.
pub fn profit_at(units: u64, input: &BreakEvenInput, rates: &RateTable) -> f64 {
    let usage = input.unit_profile.scaled(units as f64);
    let cost = compute_breakdown(&usage, rates).total_monthly_cost;
    units as f64 * input.revenue_per_unit - cost - input.fixed_costs
}

/// Binary search for the unit count whose profit reaches `target`.
///
/// Returns the first midpoint within [`BREAK_EVEN_TOLERANCE`] of the target,
/// otherwise the final lower bound once the range or iteration budget is
/// exhausted.
fn search_units(input: &BreakEvenInput, rates: &RateTable, target: f64) -> u64 {
    let mut low = 0u64;
    let mut high = BREAK_EVEN_MAX_UNITS;

    for _ in 0..BREAK_EVEN_MAX_ITERATIONS {
        if low > high {
            break;
        }
        let mid = low + (high - low) / 2;
        let profit = profit_at(mid, input, rates);
        if (profit - target).abs() < BREAK_EVEN_TOLERANCE {
            return mid;
        }
        if profit < target {
            low = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }
    low.min(BREAK_EVEN_MAX_UNITS)
}

pub fn find_break_even(input: &BreakEvenInput, rates: &RateTable) -> BreakEvenAnalysis {
    let break_even_units = search_units(input, rates, 0.0);
    let profitable_at_target_units = search_units(input, rates, input.target_profit);

    // priced over 1,000 units so per-line rounding does not swamp tiny costs
    let thousand = compute_breakdown(&input.unit_profile.scaled(1000.0), rates);
    let marginal_cost_per_unit = round_to_precision(thousand.total_monthly_cost / 1000.0, 6);

    debug!(
        break_even_units,
        profitable_at_target_units, "break-even search finished"
    );

    BreakEvenAnalysis {
        break_even_units,
        profitable_at_target_units,
        target_profit: input.target_profit,
        marginal_cost_per_unit,
    }
}
