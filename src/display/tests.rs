use super::*;
use crate::engine::analysis::{compare_scenarios, find_break_even, project_growth, BreakEvenInput};
use crate::engine::{compute_breakdown, validate_breakdown};
use crate::scenarios::{find_template, per_session_profile, templates};
use crate::usage::UsageRecord;
use crate::validation::{validate_real_time, validate_record};
use std::collections::BTreeMap;

fn sample_usage() -> UsageRecord {
    UsageRecord::from_pairs(&[
        (UsageField::RuntimeCpuHours, 100.0),
        (UsageField::GatewayApiInvocations, 1_500_000.0),
        (UsageField::GatewayToolIndexing, 200.0),
    ])
}

fn sample_breakdown() -> CostBreakdown {
    compute_breakdown(&sample_usage(), &RateTable::default())
}

#[test]
fn output_format_from_flag() {
    assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Json);
    assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Table);
    assert_eq!(OutputFormat::default(), OutputFormat::Table);
}

#[test]
fn rate_label_units() {
    assert_eq!(
        rate_label(UsageField::RuntimeCpuHours, 0.0895),
        "$0.08950 / vCPU-hour"
    );
    assert_eq!(
        rate_label(UsageField::GatewayApiInvocations, 0.005),
        "$0.00500 / 1K requests"
    );
    assert_eq!(
        rate_label(UsageField::GatewayToolIndexing, 0.02),
        "$0.02000 / 100 tools"
    );
}

#[test]
fn breakdown_table_shows_used_lines_and_total() {
    let rendered = breakdown_table(&sample_breakdown(), &CurrencyOptions::default()).to_string();
    assert!(rendered.contains("Runtime CPU"));
    assert!(rendered.contains("1.5M"));
    assert!(rendered.contains("$8.95"));
    assert!(rendered.contains("Total"));
    assert!(!rendered.contains("Identity token requests"));
}

#[test]
fn breakdown_table_empty_usage() {
    let breakdown = compute_breakdown(&UsageRecord::zero(), &RateTable::default());
    let rendered = breakdown_table(&breakdown, &CurrencyOptions::default()).to_string();
    assert!(rendered.contains("No usage"));
    assert!(rendered.contains("$0.00"));
}

#[test]
fn category_table_skips_empty_categories() {
    let rendered = category_table(&sample_breakdown(), &CurrencyOptions::default()).to_string();
    assert!(rendered.contains("Runtime"));
    assert!(rendered.contains("Gateway"));
    assert!(!rendered.contains("Memory"));
    assert!(rendered.contains('%'));
}

#[test]
fn comparison_table_marks_increase() {
    let rates = RateTable::default();
    let base = UsageRecord::from_pairs(&[(UsageField::RuntimeCpuHours, 10.0)]);
    let bigger = UsageRecord::from_pairs(&[(UsageField::RuntimeCpuHours, 30.0)]);
    let comparison = compare_scenarios(&base, &bigger, &rates);
    let rendered = comparison_table(&comparison, &CurrencyOptions::default()).to_string();
    assert!(rendered.contains("+$1.79"));
    assert!(rendered.contains("Runtime CPU"));
}

#[test]
fn projection_table_has_twelve_months() {
    let projection = project_growth(&sample_usage(), 0.1, &RateTable::default());
    let rendered = projection_table(&projection, &CurrencyOptions::default()).to_string();
    assert!(rendered.contains("12"));
    assert!(rendered.contains("Monthly cost"));
}

#[test]
fn batch_table_names_largest_line() {
    let rendered = batch_table(&[sample_breakdown()], &CurrencyOptions::default()).to_string();
    assert!(rendered.contains("Runtime CPU"));
}

#[test]
fn rates_table_lists_every_field() {
    let rendered = rates_table(&RateTable::default()).to_string();
    for field in UsageField::ALL {
        assert!(rendered.contains(field.key()), "missing {field}");
    }
}

#[test]
fn scenarios_table_lists_templates() {
    let all = templates();
    let totals = vec![0.0; all.len()];
    let rendered = scenarios_table(&all, &totals, &CurrencyOptions::default()).to_string();
    assert!(rendered.contains("prototype"));
    assert!(rendered.contains("enterprise"));
}

// --- Output functions ---

#[test]
fn output_estimate_both_formats() {
    let breakdown = sample_breakdown();
    let report = EstimateReport {
        check: validate_breakdown(&breakdown, 100_000.0),
        suggestions: Some(vec!["Cache things".to_string()]),
        breakdown,
    };
    let options = CurrencyOptions::default();
    assert!(output_estimate(&report, &options, &OutputFormat::Table).is_ok());
    assert!(output_estimate(&report, &options, &OutputFormat::Json).is_ok());
}

#[test]
fn estimate_report_json_shape() {
    let breakdown = sample_breakdown();
    let report = EstimateReport {
        check: validate_breakdown(&breakdown, 100_000.0),
        suggestions: None,
        breakdown,
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["breakdown"]["totalMonthlyCost"], 16.49);
    assert_eq!(json["check"]["valid"], true);
    assert!(json.get("suggestions").is_none());
}

#[test]
fn output_check_all_states() {
    let field = UsageField::RuntimeCpuHours;
    for text in ["12.5", "12.345", ""] {
        let result = validate_real_time(text, field, true);
        assert!(output_check(field, &result, &OutputFormat::Table).is_ok());
        assert!(output_check(field, &result, &OutputFormat::Json).is_ok());
    }
}

#[test]
fn output_validation_errors_prints() {
    let raw: BTreeMap<String, String> = [("runtimeCpuHours".to_string(), "abc".to_string())]
        .into_iter()
        .collect();
    output_validation_errors(&validate_record(&raw));
}

#[test]
fn output_comparison_both_formats() {
    let rates = RateTable::default();
    let base = find_template("prototype").unwrap().usage;
    let other = find_template("startup").unwrap().usage;
    let options = CurrencyOptions::default();
    for comparison in [
        compare_scenarios(&base, &other, &rates),
        compare_scenarios(&other, &base, &rates),
        compare_scenarios(&base, &base, &rates),
    ] {
        assert!(output_comparison(&comparison, &options, &OutputFormat::Table).is_ok());
        assert!(output_comparison(&comparison, &options, &OutputFormat::Json).is_ok());
    }
}

#[test]
fn output_projection_both_formats() {
    let projection = project_growth(&sample_usage(), 0.05, &RateTable::default());
    let options = CurrencyOptions::default();
    assert!(output_projection(&projection, &options, &OutputFormat::Table).is_ok());
    assert!(output_projection(&projection, &options, &OutputFormat::Json).is_ok());
}

#[test]
fn output_break_even_both_formats() {
    let input = BreakEvenInput {
        fixed_costs: 100.0,
        revenue_per_unit: 0.05,
        target_profit: 50.0,
        unit_profile: per_session_profile().usage,
    };
    let analysis = find_break_even(&input, &RateTable::default());
    let options = CurrencyOptions::default();
    assert!(output_break_even(&analysis, "per-session", &options, &OutputFormat::Table).is_ok());
    assert!(output_break_even(&analysis, "per-session", &options, &OutputFormat::Json).is_ok());
}

#[test]
fn output_batch_formats() {
    let options = CurrencyOptions::default();
    assert!(output_batch(&[], &options, &OutputFormat::Table).is_ok());
    assert!(output_batch(&[sample_breakdown()], &options, &OutputFormat::Table).is_ok());
    assert!(output_batch(&[sample_breakdown()], &options, &OutputFormat::Json).is_ok());
}

#[test]
fn output_tiered_formats() {
    let tiers = [
        PricingTier { threshold: 0.0, rate: 1.0 },
        PricingTier { threshold: 1000.0, rate: 0.5 },
    ];
    let options = CurrencyOptions::default();
    assert!(output_tiered(1500.0, &tiers, 1.25, &options, &OutputFormat::Table).is_ok());
    assert!(output_tiered(1500.0, &tiers, 1.25, &options, &OutputFormat::Json).is_ok());
}

#[test]
fn output_rates_formats() {
    let rates = RateTable::default();
    assert!(output_rates(&rates, &OutputFormat::Table).is_ok());
    assert!(output_rates(&rates, &OutputFormat::Json).is_ok());
}

#[test]
fn output_scenarios_formats() {
    let all = templates();
    let totals = vec![1.0; all.len()];
    let options = CurrencyOptions::default();
    assert!(output_scenarios(&all, &totals, &options, &OutputFormat::Table).is_ok());
    assert!(output_scenarios(&all, &totals, &options, &OutputFormat::Json).is_ok());
}

#[test]
fn output_settings_formats() {
    let settings = Settings::default();
    let path = Path::new("/nonexistent/agentcost/settings.toml");
    assert!(output_settings(&settings, path, &OutputFormat::Table).is_ok());
    assert!(output_settings(&settings, path, &OutputFormat::Json).is_ok());
}
