use clap::Parser;
use tallybook::cli::{
    find_project_root, handle_decision_add_criteria, handle_decision_create,
    handle_decision_criteria, handle_decision_finalize, handle_decision_get, handle_decision_list,
    handle_decision_update_score, handle_decision_update_weight, handle_forecast_add_data,
    handle_forecast_create, handle_forecast_data, handle_forecast_get, handle_forecast_list,
    handle_forecast_status, handle_forecast_summary, handle_init, handle_snapshot, init_tracing,
    Cli, Commands, DecisionAction, ForecastAction,
};
use tallybook::storage::TALLY_DIR;
use tallybook::{Receipt, TallyConfig};

fn main() {
    let cli = Cli::parse();

    let config = TallyConfig::load(&find_project_root().join(TALLY_DIR)).unwrap_or_default();
    init_tracing(cli.verbose, &config.log_level);

    let caller = cli.caller.as_deref();
    let json = cli.json;

    let result = match cli.command {
        Commands::Init { identity, clock } => handle_init(identity, clock, json),
        Commands::Decision(cmd) => match cmd.action {
            DecisionAction::Create {
                title,
                description,
                decision_type,
            } => handle_decision_create(title, description, decision_type, caller, json),
            DecisionAction::AddCriteria {
                decision_id,
                name,
                weight,
                score,
                notes,
            } => handle_decision_add_criteria(decision_id, name, weight, score, notes, caller, json),
            DecisionAction::UpdateScore {
                decision_id,
                criterion_id,
                score,
            } => handle_decision_update_score(decision_id, criterion_id, score, caller, json),
            DecisionAction::UpdateWeight {
                decision_id,
                criterion_id,
                weight,
            } => handle_decision_update_weight(decision_id, criterion_id, weight, caller, json),
            DecisionAction::Finalize {
                decision_id,
                recommendation,
            } => handle_decision_finalize(decision_id, recommendation, caller, json),
            DecisionAction::Get { decision_id } => handle_decision_get(decision_id, json),
            DecisionAction::List => handle_decision_list(json),
            DecisionAction::Criteria {
                decision_id,
                criterion_id,
            } => handle_decision_criteria(decision_id, criterion_id, json),
        },
        Commands::Forecast(cmd) => match cmd.action {
            ForecastAction::Create {
                title,
                start,
                end,
                description,
                forecast_type,
            } => handle_forecast_create(title, description, forecast_type, start, end, caller, json),
            ForecastAction::AddData {
                forecast_id,
                period,
                revenue,
                expenses,
                confidence,
            } => handle_forecast_add_data(forecast_id, period, revenue, expenses, confidence, caller, json),
            ForecastAction::Status { forecast_id, status } => {
                handle_forecast_status(forecast_id, status, caller, json)
            }
            ForecastAction::Get { forecast_id } => handle_forecast_get(forecast_id, json),
            ForecastAction::List => handle_forecast_list(json),
            ForecastAction::Data { forecast_id, period } => {
                handle_forecast_data(forecast_id, period, json)
            }
            ForecastAction::Summary { forecast_id } => handle_forecast_summary(forecast_id, json),
        },
        Commands::Snapshot { output } => handle_snapshot(output, json),
    };

    if let Err(e) = result {
        if json {
            if let Ok(receipt) = serde_json::to_string(&Receipt::<()>::Err(e.code())) {
                println!("{}", receipt);
            }
        }
        eprintln!("Error [{}]: {}", e.code(), e);
        std::process::exit(1);
    }
}
