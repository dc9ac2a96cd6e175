use std::path::Path;

use anyhow::Result;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::config::Settings;
use crate::engine::analysis::{BreakEvenAnalysis, GrowthProjection, ScenarioComparison};
use crate::engine::{BreakdownCheck, CostBreakdown, PricingTier};
use crate::format::{
    format_currency, format_large_number, format_number, format_percentage, CurrencyOptions,
};
use crate::rates::RateTable;
use crate::scenarios::ScenarioTemplate;
use crate::usage::{UnitConvention, UsageField};
use crate::validation::{RealTimeValidation, RecordValidation};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Everything `estimate` reports, in one JSON document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateReport {
    pub breakdown: CostBreakdown,
    pub check: BreakdownCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

// --- Helper formatting ---

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Rate with its unit, e.g. `$0.00500 / 1K requests`.
pub fn rate_label(field: UsageField, rate: f64) -> String {
    let spec = field.spec();
    let per = match spec.convention {
        UnitConvention::LinearAmount => spec.unit.trim_end_matches('s').to_string(),
        UnitConvention::CountPer1000 => format!("1K {}", spec.unit),
        UnitConvention::CountPer100 => format!("100 {}", spec.unit),
    };
    format!("${rate:.5} / {per}")
}

fn quantity_label(field: UsageField, quantity: f64) -> String {
    match field.spec().convention {
        UnitConvention::LinearAmount => format!("{quantity:.2}"),
        _ => format_large_number(quantity, 1),
    }
}

fn delta_cell(delta: f64, options: &CurrencyOptions) -> Cell {
    let text = format_currency(delta, options);
    if delta > 0.0 {
        right(format!("+{text}")).fg(Color::Red)
    } else if delta < 0.0 {
        right(text).fg(Color::Green)
    } else {
        right(text)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

// --- Table builders ---

/// Non-zero lines only; an all-zero bill shows a single placeholder row.
pub fn breakdown_table(breakdown: &CostBreakdown, options: &CurrencyOptions) -> Table {
    let mut table = new_table(vec!["Service", "Usage", "Unit", "Rate", "Monthly cost"]);
    let mut shown = 0;
    for item in breakdown.line_items.iter().filter(|i| i.quantity > 0.0) {
        let spec = item.field.spec();
        table.add_row(vec![
            Cell::new(spec.label),
            right(quantity_label(item.field, item.quantity)),
            Cell::new(spec.unit),
            Cell::new(rate_label(item.field, item.rate)),
            right(format_currency(item.cost, options)),
        ]);
        shown += 1;
    }
    if shown == 0 {
        table.add_row(vec![
            Cell::new("No usage"),
            right("-".to_string()),
            Cell::new("-"),
            Cell::new("-"),
            right(format_currency(0.0, options)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        right(format_currency(breakdown.total_monthly_cost, options))
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn category_table(breakdown: &CostBreakdown, options: &CurrencyOptions) -> Table {
    let mut table = new_table(vec!["Category", "Monthly cost", "Share"]);
    for (category, subtotal) in breakdown.category_totals() {
        if subtotal == 0.0 {
            continue;
        }
        table.add_row(vec![
            Cell::new(category.label()),
            right(format_currency(subtotal, options)),
            right(format_percentage(breakdown.share_of_total(subtotal) * 100.0, 1)),
        ]);
    }
    table
}

pub fn comparison_table(comparison: &ScenarioComparison, options: &CurrencyOptions) -> Table {
    let mut table = new_table(vec!["Service", "Baseline", "Comparison", "Delta"]);
    for delta in &comparison.per_field_delta {
        let base = comparison.baseline.cost(delta.field);
        let other = comparison.comparison.cost(delta.field);
        if base == 0.0 && other == 0.0 {
            continue;
        }
        table.add_row(vec![
            Cell::new(delta.field.label()),
            right(format_currency(base, options)),
            right(format_currency(other, options)),
            delta_cell(delta.delta, options),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        right(format_currency(comparison.baseline.total_monthly_cost, options)),
        right(format_currency(comparison.comparison.total_monthly_cost, options)),
        delta_cell(comparison.total_delta, options),
    ]);
    table
}

pub fn projection_table(projection: &GrowthProjection, options: &CurrencyOptions) -> Table {
    let mut table = new_table(vec![
        "Month",
        "Gateway invocations",
        "Runtime vCPU-h",
        "Monthly cost",
    ]);
    for month in &projection.monthly_projections {
        table.add_row(vec![
            right(month.month.to_string()),
            right(format_large_number(
                month.usage.get(UsageField::GatewayApiInvocations),
                1,
            )),
            right(format_number(
                month.usage.get(UsageField::RuntimeCpuHours),
                0,
                options.locale,
            )),
            right(format_currency(month.breakdown.total_monthly_cost, options)),
        ]);
    }
    table
}

pub fn batch_table(breakdowns: &[CostBreakdown], options: &CurrencyOptions) -> Table {
    let mut table = new_table(vec!["#", "Largest line", "Monthly cost"]);
    for (i, breakdown) in breakdowns.iter().enumerate() {
        let largest = breakdown
            .line_items
            .iter()
            .filter(|item| item.cost > 0.0)
            .max_by(|a, b| a.cost.total_cmp(&b.cost))
            .map(|item| item.field.label())
            .unwrap_or("-");
        table.add_row(vec![
            right((i + 1).to_string()),
            Cell::new(largest),
            right(format_currency(breakdown.total_monthly_cost, options)),
        ]);
    }
    table
}

pub fn rates_table(rates: &RateTable) -> Table {
    let overridden = rates.overridden_fields();
    let mut table = new_table(vec!["Field", "Service", "Rate"]);
    for (field, rate) in rates.iter() {
        let mut rate_cell = Cell::new(rate_label(field, rate));
        if overridden.contains(&field) {
            rate_cell = rate_cell.fg(Color::Yellow);
        }
        table.add_row(vec![Cell::new(field.key()), Cell::new(field.label()), rate_cell]);
    }
    table
}

pub fn scenarios_table(
    templates: &[ScenarioTemplate],
    totals: &[f64],
    options: &CurrencyOptions,
) -> Table {
    let mut table = new_table(vec!["Id", "Name", "Description", "Monthly cost"]);
    for (template, total) in templates.iter().zip(totals) {
        table.add_row(vec![
            Cell::new(template.id).fg(Color::Cyan),
            Cell::new(template.name),
            Cell::new(template.description),
            right(format_currency(*total, options)),
        ]);
    }
    table
}

// --- Output functions ---

fn print_warnings(check: &BreakdownCheck) {
    for warning in &check.warnings {
        if check.valid {
            println!("{} {}", "warning:".yellow().bold(), warning);
        } else {
            println!("{} {}", "error:".red().bold(), warning);
        }
    }
}

pub fn output_estimate(
    report: &EstimateReport,
    options: &CurrencyOptions,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(report)?),
        OutputFormat::Table => {
            println!("{}", breakdown_table(&report.breakdown, options));
            if report.breakdown.total_monthly_cost > 0.0 {
                println!("{}", category_table(&report.breakdown, options));
            }
            print_warnings(&report.check);
            if let Some(suggestions) = &report.suggestions {
                if suggestions.is_empty() {
                    println!("{}", "No optimization suggestions.".dimmed());
                }
                for suggestion in suggestions {
                    println!("{} {}", "tip:".cyan().bold(), suggestion);
                }
            }
        }
    }
    Ok(())
}

pub fn output_check(
    field: UsageField,
    result: &RealTimeValidation,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(result)?),
        OutputFormat::Table => match (&result.error, result.sanitized_value) {
            (None, Some(value)) => {
                println!("{} {} = {}", "✓".green(), field.key(), value);
            }
            (Some(error), _) if result.show_error => {
                println!("{} {}: {} ({})", "✗".red(), field.key(), error, error.code().dimmed());
            }
            (Some(error), _) => {
                println!("{} {}: {}", "…".dimmed(), field.key(), error.to_string().dimmed());
            }
            (None, None) => println!("{} {}", "?".dimmed(), field.key()),
        },
    }
    Ok(())
}

/// Field errors go to stderr; stdout stays reserved for reports.
pub fn output_validation_errors(validation: &RecordValidation) {
    for (field, error) in &validation.errors {
        eprintln!(
            "{} {}: {} ({})",
            "invalid".red().bold(),
            field.key(),
            error,
            error.code()
        );
    }
}

pub fn output_comparison(
    comparison: &ScenarioComparison,
    options: &CurrencyOptions,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(comparison)?),
        OutputFormat::Table => {
            println!("{}", comparison_table(comparison, options));
            let change = format_percentage(comparison.percent_change, 2);
            if comparison.is_more_expensive {
                let delta = format_currency(comparison.total_delta, options);
                println!("Comparison costs {} more ({change})", delta.red());
            } else if comparison.total_delta < 0.0 {
                let delta = format_currency(-comparison.total_delta, options);
                println!("Comparison saves {} ({change})", delta.green());
            } else {
                println!("No cost difference");
            }
        }
    }
    Ok(())
}

pub fn output_projection(
    projection: &GrowthProjection,
    options: &CurrencyOptions,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(projection)?),
        OutputFormat::Table => {
            println!(
                "Monthly growth: {}",
                format_percentage(projection.monthly_growth_rate * 100.0, 1)
            );
            println!("{}", projection_table(projection, options));
            println!(
                "  {} {}",
                "Annual:".dimmed(),
                format_currency(projection.total_annual_cost, options).bold()
            );
            println!(
                "  {} {}",
                "Average month:".dimmed(),
                format_currency(projection.average_monthly_cost, options)
            );
        }
    }
    Ok(())
}

pub fn output_break_even(
    analysis: &BreakEvenAnalysis,
    unit_name: &str,
    options: &CurrencyOptions,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(analysis)?),
        OutputFormat::Table => {
            let marginal = CurrencyOptions {
                precision: 6,
                show_cents: true,
                ..*options
            };
            println!("  {} {}", "Unit:".dimmed(), unit_name);
            println!(
                "  {} {}",
                "Marginal cost:".dimmed(),
                format_currency(analysis.marginal_cost_per_unit, &marginal)
            );
            println!(
                "  {} {}",
                "Break-even:".dimmed(),
                format_number(analysis.break_even_units as f64, 0, options.locale).bold()
            );
            println!(
                "  {} {} units for {} profit",
                "Target:".dimmed(),
                format_number(analysis.profitable_at_target_units as f64, 0, options.locale),
                format_currency(analysis.target_profit, options)
            );
        }
    }
    Ok(())
}

pub fn output_batch(
    breakdowns: &[CostBreakdown],
    options: &CurrencyOptions,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(breakdowns)?),
        OutputFormat::Table => {
            if breakdowns.is_empty() {
                println!("No scenarios found.");
                return Ok(());
            }
            println!("{}", batch_table(breakdowns, options));
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct TieredReport<'a> {
    usage: f64,
    tiers: &'a [PricingTier],
    cost: f64,
}

pub fn output_tiered(
    usage: f64,
    tiers: &[PricingTier],
    cost: f64,
    options: &CurrencyOptions,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(&TieredReport { usage, tiers, cost })?),
        OutputFormat::Table => {
            let mut table = new_table(vec!["From", "Rate / 1K"]);
            for tier in tiers {
                table.add_row(vec![
                    right(format_number(tier.threshold, 0, options.locale)),
                    right(format!("${:.5}", tier.rate)),
                ]);
            }
            println!("{table}");
            println!(
                "{} units cost {}",
                format_number(usage, 0, options.locale),
                format_currency(cost, options).bold()
            );
        }
    }
    Ok(())
}

pub fn output_rates(rates: &RateTable, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(rates)?),
        OutputFormat::Table => {
            println!("{}", rates_table(rates));
            println!("  {} {}", "Last updated:".dimmed(), rates.last_updated);
            println!("  {} {}", "Source:".dimmed(), rates.source_url);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ScenarioSummary<'a> {
    #[serde(flatten)]
    template: &'a ScenarioTemplate,
    #[serde(rename = "totalMonthlyCost")]
    total_monthly_cost: f64,
}

pub fn output_scenarios(
    templates: &[ScenarioTemplate],
    totals: &[f64],
    options: &CurrencyOptions,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let summaries: Vec<ScenarioSummary> = templates
                .iter()
                .zip(totals)
                .map(|(template, total)| ScenarioSummary {
                    template,
                    total_monthly_cost: *total,
                })
                .collect();
            println!("{}", to_json(&summaries)?);
        }
        OutputFormat::Table => println!("{}", scenarios_table(templates, totals, options)),
    }
    Ok(())
}

pub fn output_settings(settings: &Settings, path: &Path, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": path.display().to_string(),
                "loaded": path.exists(),
                "settings": settings,
            });
            println!("{}", to_json(&json)?);
        }
        OutputFormat::Table => {
            let state = if path.exists() { "" } else { " (not found, using defaults)" };
            println!("Settings file: {}{}", path.display(), state.dimmed());
            let threshold =
                format_currency(settings.high_cost_threshold, &settings.currency_options());
            println!("High cost threshold: {threshold}");
            println!("Precision: {}", settings.display.precision);
            println!("Show cents: {}", settings.display.show_cents);
            println!("Locale: {}", settings.display.locale);
            if settings.rates.is_empty() {
                println!("Rate overrides: none");
            } else {
                println!("Rate overrides:");
                for (field, rate) in &settings.rates {
                    println!("  {} = {}", field.key(), rate);
                }
            }
        }
    }
    Ok(())
}
