//! Cost calculation engine
//!
//! Pure functions from a sanitized [`UsageRecord`] and a [`RateTable`] to a
//! [`CostBreakdown`], plus the analyses built on top of them in [`analysis`].

pub mod analysis;


use serde::Serialize;
use tracing::debug;

use crate::format::{format_currency, CurrencyOptions};
use crate::rates::{RateOverrides, RateTable};
use crate::usage::{ServiceCategory, UnitConvention, UsageField, UsageRecord};

/// Decimal places kept on every computed cost.
pub const COST_PRECISION: u32 = 4;

/// Decimal places used when costs are shown to people.
pub const DISPLAY_PRECISION: u32 = 2;

/// Monthly total above which a breakdown is flagged for a second look.
pub const DEFAULT_HIGH_COST_THRESHOLD: f64 = 100_000.0;

/// Round half away from zero at `places` decimal places.
pub fn round_to_precision(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Cost of a count-like quantity priced per 1,000 units.
pub fn cost_for_count(count: f64, rate: f64) -> f64 {
    if count < 0.0 {
        return 0.0;
    }
    (count / 1000.0) * rate
}

/// Cost of a GB or hour quantity priced per unit.
pub fn cost_for_amount(amount: f64, rate: f64) -> f64 {
    if amount < 0.0 {
        return 0.0;
    }
    amount * rate
}

/// Cost of indexed tools, priced per 100 tools.
pub fn cost_for_tool_indexing(count: f64, rate: f64) -> f64 {
    if count < 0.0 {
        return 0.0;
    }
    (count / 100.0) * rate
}

fn apply_convention(convention: UnitConvention, quantity: f64, rate: f64) -> f64 {
    match convention {
        UnitConvention::CountPer1000 => cost_for_count(quantity, rate),
        UnitConvention::LinearAmount => cost_for_amount(quantity, rate),
        UnitConvention::CountPer100 => cost_for_tool_indexing(quantity, rate),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLineItem {
    pub field: UsageField,
    pub quantity: f64,
    pub rate: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    /// One entry per usage field, in catalog order.
    pub line_items: Vec<CostLineItem>,
    pub total_monthly_cost: f64,
}

impl CostBreakdown {
    pub fn cost(&self, field: UsageField) -> f64 {
        self.line_items
            .iter()
            .find(|item| item.field == field)
            .map(|item| item.cost)
            .unwrap_or(0.0)
    }

    /// Subtotal per service category, in [`ServiceCategory::ALL`] order.
    pub fn category_totals(&self) -> Vec<(ServiceCategory, f64)> {
        ServiceCategory::ALL
            .into_iter()
            .map(|category| {
                let subtotal: f64 = self
                    .line_items
                    .iter()
                    .filter(|item| item.field.spec().category == category)
                    .map(|item| item.cost)
                    .sum();
                (category, round_to_precision(subtotal, COST_PRECISION))
            })
            .collect()
    }

    pub fn category_total(&self, category: ServiceCategory) -> f64 {
        self.category_totals()
            .into_iter()
            .find(|(c, _)| *c == category)
            .map(|(_, total)| total)
            .unwrap_or(0.0)
    }

    /// Share of the total spent on `cost`, or 0 for an empty bill.
    pub fn share_of_total(&self, cost: f64) -> f64 {
        if self.total_monthly_cost > 0.0 {
            cost / self.total_monthly_cost
        } else {
            0.0
        }
    }
}

/// Price every field of `usage` with `rates`.
///
/// Each line is rounded to [`COST_PRECISION`] before summing, so the total is
/// exactly the rounded sum of the lines shown.
pub fn compute_breakdown(usage: &UsageRecord, rates: &RateTable) -> CostBreakdown {
    let line_items: Vec<CostLineItem> = usage
        .iter()
        .map(|(field, quantity)| {
            let rate = rates.rate(field);
            let raw = apply_convention(field.spec().convention, quantity, rate);
            CostLineItem {
                field,
                quantity,
                rate,
                cost: round_to_precision(raw, COST_PRECISION),
            }
        })
        .collect();

    let total = line_items.iter().map(|item| item.cost).sum::<f64>();
    let total_monthly_cost = round_to_precision(total, COST_PRECISION);
    debug!(total_monthly_cost, "computed cost breakdown");

    CostBreakdown {
        line_items,
        total_monthly_cost,
    }
}

/// [`compute_breakdown`] against the default rates, with `overrides` merged
/// over them first.
pub fn estimate(usage: &UsageRecord, overrides: Option<&RateOverrides>) -> CostBreakdown {
    let defaults = RateTable::default();
    match overrides {
        Some(overrides) => compute_breakdown(usage, &defaults.with_overrides(overrides)),
        None => compute_breakdown(usage, &defaults),
    }
}

/// Marginal rate for usage above `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingTier {
    pub threshold: f64,
    /// Per 1,000 units.
    pub rate: f64,
}

/// Cost of `usage` under marginal `tiers`, which must be sorted by
/// ascending threshold. The last tier is unbounded.
pub fn tiered_cost(usage: f64, tiers: &[PricingTier]) -> f64 {
    if usage.is_nan() || usage <= 0.0 || tiers.is_empty() {
        return 0.0;
    }

    let mut remaining = usage;
    let mut total = 0.0;
    for (i, tier) in tiers.iter().enumerate() {
        if remaining <= 0.0 {
            break;
        }
        let tier_usage = match tiers.get(i + 1) {
            Some(next) => remaining.min(next.threshold - tier.threshold),
            None => remaining,
        };
        total += (tier_usage / 1000.0) * tier.rate;
        remaining -= tier_usage;
    }
    total
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownCheck {
    pub valid: bool,
    pub warnings: Vec<String>,
}

/// Consistency check on a computed breakdown.
///
/// A total above `high_cost_threshold` only warns. A negative, NaN or
/// infinite cost anywhere makes the breakdown invalid; sanitized input never
/// produces one, so seeing it points at a bad rate or a calculation bug.
pub fn validate_breakdown(breakdown: &CostBreakdown, high_cost_threshold: f64) -> BreakdownCheck {
    let mut valid = true;
    let mut warnings = Vec::new();

    for item in &breakdown.line_items {
        if !item.cost.is_finite() || item.cost < 0.0 {
            valid = false;
            warnings.push(format!("Invalid cost for {}: {}", item.field.label(), item.cost));
        }
    }

    let total = breakdown.total_monthly_cost;
    if !total.is_finite() || total < 0.0 {
        valid = false;
        warnings.push(format!("Invalid total monthly cost: {total}"));
    } else if total > high_cost_threshold {
        let options = CurrencyOptions::default();
        warnings.push(format!(
            "Total monthly cost {} exceeds {}; double-check the usage inputs",
            format_currency(total, &options),
            format_currency(high_cost_threshold, &options),
        ));
    }

    BreakdownCheck { valid, warnings }
}
