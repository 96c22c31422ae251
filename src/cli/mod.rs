mod commands;
mod handlers;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use commands::{Cli, Commands, DecisionAction, DecisionCommand, ForecastAction, ForecastCommand};
pub use handlers::{
    find_project_root, handle_decision_add_criteria, handle_decision_create,
    handle_decision_criteria, handle_decision_finalize, handle_decision_get, handle_decision_list,
    handle_decision_update_score, handle_decision_update_weight, handle_forecast_add_data,
    handle_forecast_create, handle_forecast_data, handle_forecast_get, handle_forecast_list,
    handle_forecast_status, handle_forecast_summary, handle_init, handle_snapshot, CALLER_ENV,
};

/// Install the stderr subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(verbose: bool, level: &str) {
    let filter = if verbose { "debug" } else { level };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}
