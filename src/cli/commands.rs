use clap::{Args, Parser, Subcommand};

use crate::clock::ClockKind;

#[derive(Parser, Debug)]
#[command(name = "tallybook")]
#[command(version, about = "An on-ledger record book for weighted decisions and forecasts")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Act as this principal (defaults to TALLYBOOK_CALLER, then the configured identity)
    #[arg(long = "as", global = true, value_name = "PRINCIPAL")]
    pub caller: Option<String>,

    /// Output as JSON receipts
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new tallybook project in the current directory
    Init {
        /// Default caller identity written to the config
        #[arg(long)]
        identity: Option<String>,

        /// Timestamp source: block-height or system
        #[arg(long, default_value = "block-height")]
        clock: ClockKind,
    },

    /// Weighted decision scoring
    Decision(DecisionCommand),

    /// Periodic financial forecasts
    Forecast(ForecastCommand),

    /// Regenerate the markdown snapshot of the ledger
    Snapshot {
        /// Output directory (defaults to the configured snapshot_dir)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct DecisionCommand {
    #[command(subcommand)]
    pub action: DecisionAction,
}

#[derive(Subcommand, Debug)]
pub enum DecisionAction {
    /// Create a draft decision
    Create {
        title: String,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Decision type, e.g. "investment"
        #[arg(long = "type", short = 't', default_value = "general")]
        decision_type: String,
    },

    /// Add a weighted criterion to a draft decision
    AddCriteria {
        decision_id: u64,

        name: String,

        /// Weight in 0..=100
        #[arg(long, short = 'w')]
        weight: u32,

        /// Score in 0..=100
        #[arg(long, short = 's')]
        score: u32,

        #[arg(long, short = 'n', default_value = "")]
        notes: String,
    },

    /// Change the score of a criterion
    UpdateScore {
        decision_id: u64,
        criterion_id: u64,
        score: u32,
    },

    /// Change the weight of a criterion
    UpdateWeight {
        decision_id: u64,
        criterion_id: u64,
        weight: u32,
    },

    /// Compute the final score and lock the decision
    Finalize {
        decision_id: u64,
        recommendation: String,
    },

    /// Show a decision
    Get { decision_id: u64 },

    /// List all decisions
    List,

    /// Show the criteria of a decision, or a single criterion
    Criteria {
        decision_id: u64,
        criterion_id: Option<u64>,
    },
}

#[derive(Args, Debug)]
pub struct ForecastCommand {
    #[command(subcommand)]
    pub action: ForecastAction,
}

#[derive(Subcommand, Debug)]
pub enum ForecastAction {
    /// Create an active forecast over an inclusive period range
    Create {
        title: String,

        #[arg(long, allow_negative_numbers = true)]
        start: i64,

        #[arg(long, allow_negative_numbers = true)]
        end: i64,

        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Forecast type, e.g. "revenue"
        #[arg(long = "type", short = 't', default_value = "revenue")]
        forecast_type: String,
    },

    /// Record revenue, expenses and confidence for one period
    AddData {
        forecast_id: u64,

        #[arg(allow_negative_numbers = true)]
        period: i64,

        #[arg(long)]
        revenue: u64,

        #[arg(long)]
        expenses: u64,

        /// Confidence percentage in 0..=100
        #[arg(long)]
        confidence: u32,
    },

    /// Change the status (active, closed, cancelled)
    Status { forecast_id: u64, status: String },

    /// Show a forecast
    Get { forecast_id: u64 },

    /// List all forecasts
    List,

    /// Show the data of every recorded period, or of one period
    Data {
        forecast_id: u64,

        #[arg(allow_negative_numbers = true)]
        period: Option<i64>,
    },

    /// Totals over the recorded periods
    Summary { forecast_id: u64 },
}
