use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::scenarios::PER_SESSION_ID;

#[derive(Parser, Debug)]
#[command(name = "agentcost")]
#[command(about = "Monthly cost estimator for managed AI agent infrastructure", long_about = None)]
#[command(version)]
#[command(after_help = "\x1b[2mExamples:\x1b[0m
    agentcost estimate -s startup                  \x1b[2m# Price a preset\x1b[0m
    agentcost estimate --set runtimeCpuHours=120   \x1b[2m# Price one field\x1b[0m
    agentcost compare prototype usage.json         \x1b[2m# Preset vs file\x1b[0m
    agentcost project -s production -g 0.15        \x1b[2m# 12 months at 15%/month\x1b[0m
    agentcost break-even --fixed-costs 500 --revenue-per-unit 0.02
    agentcost check identityTokenRequests 10.5     \x1b[2m# Validate one value\x1b[0m")]
pub struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file (default: ~/.config/agentcost/settings.toml)
    #[arg(short, long, global = true, env = "AGENTCOST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Where the usage for a report comes from. Sources stack: scenario first,
/// then the file, then individual `--set` values.
#[derive(Args, Debug, Default, Clone)]
pub struct UsageArgs {
    /// Start from a scenario template (see `agentcost scenarios`)
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// JSON file with a usage object
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Set one field, e.g. --set gatewayApiInvocations=250000
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Estimate the monthly cost of a usage profile
    Estimate {
        #[command(flatten)]
        usage: UsageArgs,

        /// Override a rate, e.g. --rate runtimeCpuHours=0.09
        #[arg(short, long = "rate", value_name = "FIELD=RATE")]
        rates: Vec<String>,

        /// Include optimization suggestions
        #[arg(long)]
        suggest: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Validate a single field value as it would be typed
    Check {
        /// Usage field key
        field: String,

        /// Raw text to validate
        #[arg(allow_hyphen_values = true)]
        text: String,

        /// Treat empty text as an error
        #[arg(long)]
        required: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Compare two usage profiles (scenario ids or JSON files)
    Compare {
        baseline: String,
        comparison: String,

        #[arg(short, long = "rate", value_name = "FIELD=RATE")]
        rates: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Project twelve months of compounding growth
    Project {
        #[command(flatten)]
        usage: UsageArgs,

        /// Monthly growth rate as a fraction (0.1 = 10%)
        #[arg(short, long, default_value = "0.1", allow_hyphen_values = true)]
        growth: f64,

        #[arg(short, long = "rate", value_name = "FIELD=RATE")]
        rates: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Find the unit volume where revenue covers cost
    #[command(name = "break-even", alias = "breakeven")]
    BreakEven {
        /// Fixed monthly costs
        #[arg(long)]
        fixed_costs: f64,

        /// Revenue per unit
        #[arg(long)]
        revenue_per_unit: f64,

        /// Monthly profit to aim for
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        target_profit: f64,

        /// Scenario used as the per-unit usage profile
        #[arg(short, long, default_value = PER_SESSION_ID)]
        profile: String,

        #[arg(short, long = "rate", value_name = "FIELD=RATE")]
        rates: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Price every usage object in a JSON array
    Batch {
        file: PathBuf,

        #[arg(short, long = "rate", value_name = "FIELD=RATE")]
        rates: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Price a quantity under marginal pricing tiers
    Tiered {
        usage: f64,

        /// Tier as threshold:rate-per-1000, repeatable
        #[arg(short, long = "tier", value_name = "THRESHOLD:RATE", required = true)]
        tiers: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the effective rate table
    Rates {
        #[arg(short, long = "rate", value_name = "FIELD=RATE")]
        rates: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List scenario templates
    Scenarios {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show effective settings
    Config {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}
