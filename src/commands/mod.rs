use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info};

use crate::cli::{Command, UsageArgs};
use crate::config::{default_settings_path, load_settings, Settings};
use crate::display::{self, EstimateReport, OutputFormat};
use crate::engine::analysis::{
    batch_compute, compare_scenarios, find_break_even, project_growth, suggest_optimizations,
    BreakEvenInput,
};
use crate::engine::{compute_breakdown, tiered_cost, validate_breakdown, PricingTier};
use crate::rates::{RateOverrides, RateTable};
use crate::scenarios::{find_template, templates};
use crate::usage::{
    partial_from_json, sanitize_usage_record, PartialUsage, UsageField, UsageRecord,
};
use crate::validation::{validate_real_time, validate_record};


pub fn run(cmd: Command, config_path: Option<&Path>) -> Result<()> {
    let settings = load_settings(config_path)?;
    match cmd {
        Command::Estimate {
            usage,
            rates,
            suggest,
            json,
        } => cmd_estimate(&settings, &usage, &rates, suggest, json),
        Command::Check {
            field,
            text,
            required,
            json,
        } => cmd_check(&field, &text, required, json),
        Command::Compare {
            baseline,
            comparison,
            rates,
            json,
        } => cmd_compare(&settings, &baseline, &comparison, &rates, json),
        Command::Project {
            usage,
            growth,
            rates,
            json,
        } => cmd_project(&settings, &usage, growth, &rates, json),
        Command::BreakEven {
            fixed_costs,
            revenue_per_unit,
            target_profit,
            profile,
            rates,
            json,
        } => {
            let input = BreakEvenArgs {
                fixed_costs,
                revenue_per_unit,
                target_profit,
                profile,
            };
            cmd_break_even(&settings, &input, &rates, json)
        }
        Command::Batch { file, rates, json } => cmd_batch(&settings, &file, &rates, json),
        Command::Tiered { usage, tiers, json } => cmd_tiered(&settings, usage, &tiers, json),
        Command::Rates { rates, json } => cmd_rates(&settings, &rates, json),
        Command::Scenarios { json } => cmd_scenarios(&settings, json),
        Command::Config { json } => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(default_settings_path);
            display::output_settings(&settings, &path, &get_format(json))
        }
    }
}

fn get_format(json: bool) -> OutputFormat {
    OutputFormat::from_json_flag(json)
}

// --- Argument parsing ---

/// Split `FIELD=VALUE`.
pub fn parse_assignment(arg: &str) -> Result<(String, String)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{arg}'"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("missing field name in '{arg}'");
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// `--rate` arguments merged over `base` (the configured overrides).
pub fn parse_rate_overrides(args: &[String], base: &RateOverrides) -> Result<RateOverrides> {
    let mut overrides = base.clone();
    for arg in args {
        let (key, value) = parse_assignment(arg)?;
        let field: UsageField = key.parse()?;
        let rate: f64 = value
            .parse()
            .with_context(|| format!("rate for {field} is not a number: '{value}'"))?;
        if !rate.is_finite() || rate < 0.0 {
            bail!("rate for {field} must be a non-negative number");
        }
        overrides.insert(field, rate);
    }
    Ok(overrides)
}

fn rate_table(settings: &Settings, args: &[String]) -> Result<RateTable> {
    let overrides = parse_rate_overrides(args, &settings.rates)?;
    Ok(RateTable::default().with_overrides(&overrides))
}

/// Parse `THRESHOLD:RATE`.
pub fn parse_tier(arg: &str) -> Result<PricingTier> {
    let (threshold, rate) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("expected THRESHOLD:RATE, got '{arg}'"))?;
    let threshold: f64 = threshold
        .trim()
        .parse()
        .with_context(|| format!("invalid tier threshold in '{arg}'"))?;
    let rate: f64 = rate
        .trim()
        .parse()
        .with_context(|| format!("invalid tier rate in '{arg}'"))?;
    if !threshold.is_finite() || threshold < 0.0 || !rate.is_finite() || rate < 0.0 {
        bail!("tier values must be non-negative numbers: '{arg}'");
    }
    Ok(PricingTier { threshold, rate })
}

/// Tiers sorted by ascending threshold.
pub fn parse_tiers(args: &[String]) -> Result<Vec<PricingTier>> {
    let mut tiers = args
        .iter()
        .map(|arg| parse_tier(arg))
        .collect::<Result<Vec<_>>>()?;
    tiers.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
    Ok(tiers)
}

// --- Usage input ---

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Usage values from a JSON object file. Unknown keys and non-numeric values
/// are skipped.
pub fn load_usage_file(path: &Path) -> Result<PartialUsage> {
    let value = read_json(path)?;
    if !value.is_object() {
        bail!("{} must contain a JSON object", path.display());
    }
    Ok(partial_from_json(&value))
}

/// One usage object per element of a JSON array file.
pub fn load_batch_file(path: &Path) -> Result<Vec<PartialUsage>> {
    let value = read_json(path)?;
    let items = value
        .as_array()
        .ok_or_else(|| anyhow!("{} must contain a JSON array", path.display()))?;
    Ok(items.iter().map(partial_from_json).collect())
}

fn template_usage(id: &str) -> Result<UsageRecord> {
    find_template(id)
        .map(|t| t.usage)
        .ok_or_else(|| anyhow!("unknown scenario '{id}' (see `agentcost scenarios`)"))
}

/// Build the usage record for a report.
///
/// Scenario and file values are sanitized. `--set` values are validated
/// strictly; any invalid one prints every field error and fails.
pub fn resolve_usage(args: &UsageArgs) -> Result<UsageRecord> {
    let mut partial = PartialUsage::new();
    if let Some(id) = &args.scenario {
        partial.extend(template_usage(id)?.to_partial());
    }
    if let Some(path) = &args.file {
        partial.extend(load_usage_file(path)?);
    }
    let record = sanitize_usage_record(&partial);

    if args.set.is_empty() {
        return Ok(record);
    }

    let raw = args
        .set
        .iter()
        .map(|arg| parse_assignment(arg))
        .collect::<Result<BTreeMap<String, String>>>()?;
    let validation = validate_record(&raw);
    if !validation.unknown_fields.is_empty() {
        bail!("unknown usage field(s): {}", validation.unknown_fields.join(", "));
    }
    if !validation.valid {
        display::output_validation_errors(&validation);
        bail!("{} invalid usage value(s)", validation.errors.len());
    }

    let overrides: PartialUsage = raw
        .keys()
        .filter_map(|key| key.parse::<UsageField>().ok())
        .map(|field| (field, validation.record.get(field)))
        .collect();
    debug!(fields = overrides.len(), "applying --set values");
    Ok(record.with_overrides(&overrides))
}

/// A scenario id, or else a path to a JSON usage file.
pub fn resolve_side(source: &str) -> Result<UsageRecord> {
    if let Some(template) = find_template(source) {
        return Ok(template.usage);
    }
    let path = PathBuf::from(source);
    if path.exists() {
        return Ok(sanitize_usage_record(&load_usage_file(&path)?));
    }
    bail!("'{source}' is neither a scenario id nor an existing file")
}

// --- Commands ---

fn cmd_estimate(
    settings: &Settings,
    usage: &UsageArgs,
    rate_args: &[String],
    suggest: bool,
    json: bool,
) -> Result<()> {
    let record = resolve_usage(usage)?;
    let rates = rate_table(settings, rate_args)?;
    let breakdown = compute_breakdown(&record, &rates);
    let check = validate_breakdown(&breakdown, settings.high_cost_threshold);
    let suggestions = suggest.then(|| suggest_optimizations(&record, &rates));
    info!(total = breakdown.total_monthly_cost, "estimate");

    let valid = check.valid;
    let report = EstimateReport {
        breakdown,
        check,
        suggestions,
    };
    display::output_estimate(&report, &settings.currency_options(), &get_format(json))?;
    if !valid {
        bail!("cost breakdown failed consistency checks");
    }
    Ok(())
}

fn cmd_check(field: &str, text: &str, required: bool, json: bool) -> Result<()> {
    let field: UsageField = field.parse()?;
    let result = validate_real_time(text, field, required);
    display::output_check(field, &result, &get_format(json))?;
    if !result.valid {
        bail!("invalid value for {field}");
    }
    Ok(())
}

fn cmd_compare(
    settings: &Settings,
    baseline: &str,
    comparison: &str,
    rate_args: &[String],
    json: bool,
) -> Result<()> {
    let base = resolve_side(baseline)?;
    let other = resolve_side(comparison)?;
    let rates = rate_table(settings, rate_args)?;
    let result = compare_scenarios(&base, &other, &rates);
    display::output_comparison(&result, &settings.currency_options(), &get_format(json))
}

fn cmd_project(
    settings: &Settings,
    usage: &UsageArgs,
    growth: f64,
    rate_args: &[String],
    json: bool,
) -> Result<()> {
    if !growth.is_finite() || growth <= -1.0 {
        bail!("growth rate must be greater than -1");
    }
    let record = resolve_usage(usage)?;
    let rates = rate_table(settings, rate_args)?;
    let projection = project_growth(&record, growth, &rates);
    display::output_projection(&projection, &settings.currency_options(), &get_format(json))
}

pub(crate) struct BreakEvenArgs {
    pub fixed_costs: f64,
    pub revenue_per_unit: f64,
    pub target_profit: f64,
    pub profile: String,
}

pub(crate) fn break_even_input(args: &BreakEvenArgs) -> Result<BreakEvenInput> {
    if !args.fixed_costs.is_finite() || args.fixed_costs < 0.0 {
        bail!("fixed costs must be a non-negative number");
    }
    if !args.revenue_per_unit.is_finite() || args.revenue_per_unit < 0.0 {
        bail!("revenue per unit must be a non-negative number");
    }
    if !args.target_profit.is_finite() {
        bail!("target profit must be a finite number");
    }
    Ok(BreakEvenInput {
        fixed_costs: args.fixed_costs,
        revenue_per_unit: args.revenue_per_unit,
        target_profit: args.target_profit,
        unit_profile: resolve_side(&args.profile)?,
    })
}

fn cmd_break_even(
    settings: &Settings,
    args: &BreakEvenArgs,
    rate_args: &[String],
    json: bool,
) -> Result<()> {
    let input = break_even_input(args)?;
    let rates = rate_table(settings, rate_args)?;
    let analysis = find_break_even(&input, &rates);
    display::output_break_even(
        &analysis,
        &args.profile,
        &settings.currency_options(),
        &get_format(json),
    )
}

fn cmd_batch(settings: &Settings, file: &Path, rate_args: &[String], json: bool) -> Result<()> {
    let scenarios = load_batch_file(file)?;
    let rates = rate_table(settings, rate_args)?;
    let breakdowns = batch_compute(&scenarios, &rates);
    display::output_batch(&breakdowns, &settings.currency_options(), &get_format(json))
}

fn cmd_tiered(settings: &Settings, usage: f64, tier_args: &[String], json: bool) -> Result<()> {
    let tiers = parse_tiers(tier_args)?;
    let cost = tiered_cost(usage, &tiers);
    display::output_tiered(
        usage,
        &tiers,
        cost,
        &settings.currency_options(),
        &get_format(json),
    )
}

fn cmd_rates(settings: &Settings, rate_args: &[String], json: bool) -> Result<()> {
    let rates = rate_table(settings, rate_args)?;
    display::output_rates(&rates, &get_format(json))
}

fn cmd_scenarios(settings: &Settings, json: bool) -> Result<()> {
    let rates = settings.rate_table();
    let all = templates();
    let totals: Vec<f64> = all
        .iter()
        .map(|t| compute_breakdown(&t.usage, &rates).total_monthly_cost)
        .collect();
    display::output_scenarios(&all, &totals, &settings.currency_options(), &get_format(json))
}
