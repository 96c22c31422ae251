use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::auth::Principal;
use crate::clock::{Clock, ClockKind, ManualClock, SystemClock};
use crate::config::TallyConfig;
use crate::entity::{Criterion, Decision, Forecast, ForecastPeriodData};
use crate::error::{Result, TallyError};
use crate::ledger::Ledger;
use crate::receipt::Receipt;
use crate::registry::{CallContext, ForecastSummary};
use crate::snapshot::{format_amount, generate_snapshot};
use crate::storage::{LoroStore, TALLY_DIR};

/// Environment variable consulted when `--as` is not given
pub const CALLER_ENV: &str = "TALLYBOOK_CALLER";

/// Find the project root by looking for .tallybook/ or .git/
pub fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(TALLY_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

/// An opened project: the document, the ledger rebuilt from it and the config.
struct Session {
    root: PathBuf,
    store: LoroStore,
    ledger: Ledger,
    config: TallyConfig,
}

impl Session {
    fn open() -> Result<Self> {
        let root = find_project_root();
        let store = LoroStore::open(&root)?;
        let config = TallyConfig::load(store.tally_dir())?;
        let ledger = store.load()?;
        debug!(root = %root.display(), records = ledger.record_count(), "project opened");
        Ok(Self {
            root,
            store,
            ledger,
            config,
        })
    }

    /// Resolve who is calling and stamp the call.
    fn context(&self, caller: Option<&str>) -> Result<CallContext> {
        let caller = resolve_caller(caller, &self.config)?;
        let height = self.store.height();
        let ctx = match self.config.clock {
            ClockKind::BlockHeight => {
                let clock = ManualClock::new(height);
                clock.advance(1);
                CallContext::from_clock(caller, &clock)
            }
            ClockKind::System => CallContext::new(caller, SystemClock.now().max(height)),
        };
        Ok(ctx)
    }

    /// Persist the ledger after a successful mutation.
    fn commit(&self, ctx: &CallContext) -> Result<()> {
        self.store.store(&self.ledger)?;
        self.store.set_height(ctx.at)?;
        self.store.save()
    }
}

/// Caller resolution order: explicit flag, environment, configured identity,
/// then the git author.
fn resolve_caller(flag: Option<&str>, config: &TallyConfig) -> Result<Principal> {
    if let Some(id) = flag {
        return Principal::new(id);
    }
    if let Ok(id) = env::var(CALLER_ENV) {
        if !id.trim().is_empty() {
            return Principal::new(id);
        }
    }
    if let Some(principal) = config.identity()? {
        return Ok(principal);
    }
    get_git_author()
        .map(Principal::new)
        .transpose()?
        .ok_or(TallyError::MissingCaller)
}

fn get_git_author() -> Option<String> {
    std::process::Command::new("git")
        .args(["config", "user.name"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            } else {
                None
            }
        })
}

fn print_receipt<T: Serialize>(value: T) -> Result<()> {
    println!("{}", serde_json::to_string(&Receipt::Ok(value))?);
    Ok(())
}

pub fn handle_init(identity: Option<String>, clock: ClockKind, json: bool) -> Result<()> {
    let root = env::current_dir()?;

    if let Some(id) = &identity {
        Principal::new(id.as_str())?;
    }

    let store = LoroStore::init(&root)?;
    let config = TallyConfig {
        identity,
        clock,
        ..TallyConfig::default()
    };
    config.save(store.tally_dir())?;

    if json {
        print_receipt(root.display().to_string())?;
    } else {
        println!("Initialized tallybook project in {}", root.display());
        println!("  clock: {}", config.clock);
        if let Some(id) = &config.identity {
            println!("  identity: {}", id);
        }
    }

    Ok(())
}

// Decisions

pub fn handle_decision_create(
    title: String,
    description: String,
    decision_type: String,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let id = session
        .ledger
        .decisions
        .create_decision(&ctx, &title, &description, &decision_type)?;
    session.commit(&ctx)?;

    if json {
        print_receipt(id)
    } else {
        println!("Created decision {:03} - {}", id, title);
        Ok(())
    }
}

pub fn handle_decision_add_criteria(
    decision_id: u64,
    name: String,
    weight: u32,
    score: u32,
    notes: String,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let criterion_id = session
        .ledger
        .decisions
        .add_criteria(&ctx, decision_id, &name, weight, score, &notes)?;
    session.commit(&ctx)?;

    if json {
        return print_receipt(criterion_id);
    }

    let criterion = session.ledger.decisions.get_criteria(decision_id, criterion_id)?;
    println!(
        "Added criterion {} to decision {:03} - {} (weighted score {})",
        criterion_id,
        decision_id,
        name,
        criterion.weighted_score()
    );
    Ok(())
}

pub fn handle_decision_update_score(
    decision_id: u64,
    criterion_id: u64,
    score: u32,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let updated = session
        .ledger
        .decisions
        .update_criteria_score(&ctx, decision_id, criterion_id, score)?;
    session.commit(&ctx)?;

    if json {
        return print_receipt(updated);
    }

    let criterion = session.ledger.decisions.get_criteria(decision_id, criterion_id)?;
    println!(
        "Updated criterion {} of decision {:03}: score {} (weighted score {})",
        criterion_id,
        decision_id,
        score,
        criterion.weighted_score()
    );
    Ok(())
}

pub fn handle_decision_update_weight(
    decision_id: u64,
    criterion_id: u64,
    weight: u32,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let updated = session
        .ledger
        .decisions
        .update_criteria_weight(&ctx, decision_id, criterion_id, weight)?;
    session.commit(&ctx)?;

    if json {
        return print_receipt(updated);
    }

    let criterion = session.ledger.decisions.get_criteria(decision_id, criterion_id)?;
    println!(
        "Updated criterion {} of decision {:03}: weight {} (weighted score {})",
        criterion_id,
        decision_id,
        weight,
        criterion.weighted_score()
    );
    Ok(())
}

pub fn handle_decision_finalize(
    decision_id: u64,
    recommendation: String,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let finalized = session
        .ledger
        .decisions
        .finalize_decision(&ctx, decision_id, &recommendation)?;
    session.commit(&ctx)?;

    if json {
        return print_receipt(finalized);
    }

    let decision = session.ledger.decisions.get_decision(decision_id)?;
    println!(
        "Finalized decision {:03} - {} (final score {})",
        decision_id, decision.base.title, decision.final_score
    );
    println!("  Recommendation: {}", decision.recommendation);
    Ok(())
}

pub fn handle_decision_get(decision_id: u64, json: bool) -> Result<()> {
    let session = Session::open()?;
    let decision = session.ledger.decisions.get_decision(decision_id)?;

    if json {
        return print_receipt(decision);
    }

    print_decision(decision);
    if decision.is_draft() {
        if let Some(score) = session.ledger.decisions.preview_score(decision_id)? {
            println!("Preview score: {}", score);
        }
    }
    Ok(())
}

pub fn handle_decision_list(json: bool) -> Result<()> {
    let session = Session::open()?;
    let decisions: Vec<&Decision> = session.ledger.decisions.list_decisions().collect();

    if json {
        return print_receipt(decisions);
    }

    if decisions.is_empty() {
        println!("No decisions found.");
        return Ok(());
    }

    for decision in decisions {
        println!(
            "{:03}  {:<9}  {:>6}  {}",
            decision.base.id,
            decision.status.to_string(),
            decision.final_score,
            decision.base.title
        );
    }
    Ok(())
}

pub fn handle_decision_criteria(
    decision_id: u64,
    criterion_id: Option<u64>,
    json: bool,
) -> Result<()> {
    let session = Session::open()?;
    let registry = &session.ledger.decisions;

    if let Some(criterion_id) = criterion_id {
        let criterion = registry.get_criteria(decision_id, criterion_id)?;
        if json {
            return print_receipt(criterion);
        }
        print_criteria(&[criterion]);
        if !criterion.notes.is_empty() {
            println!("\n{}", criterion.notes);
        }
        return Ok(());
    }

    registry.get_decision(decision_id)?;
    let criteria: Vec<&Criterion> = registry.criteria_for(decision_id).collect();

    if json {
        return print_receipt(criteria);
    }

    if criteria.is_empty() {
        println!("No criteria for decision {:03}.", decision_id);
    } else {
        print_criteria(&criteria);
    }
    Ok(())
}

fn print_decision(decision: &Decision) {
    println!("Decision {:03}: {}", decision.base.id, decision.base.title);
    println!("  Type:       {}", decision.decision_type);
    println!("  Status:     {}", decision.status);
    println!("  Creator:    {}", decision.base.creator);
    println!("  Created at: {}", decision.base.created_at);
    println!("  Updated at: {}", decision.base.updated_at);
    if !decision.is_draft() {
        println!("  Final score:    {}", decision.final_score);
        println!("  Recommendation: {}", decision.recommendation);
    }
    if !decision.base.description.is_empty() {
        println!("\n{}", decision.base.description);
    }
}

fn print_criteria(criteria: &[&Criterion]) {
    println!("{:>3}  {:<24}  {:>6}  {:>5}  {:>8}", "#", "Name", "Weight", "Score", "Weighted");
    for criterion in criteria {
        println!(
            "{:>3}  {:<24}  {:>6}  {:>5}  {:>8}",
            criterion.criterion_id,
            criterion.name,
            criterion.weight(),
            criterion.score(),
            criterion.weighted_score()
        );
    }
}

// Forecasts

pub fn handle_forecast_create(
    title: String,
    description: String,
    forecast_type: String,
    start: i64,
    end: i64,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let id = session.ledger.forecasts.create_forecast(
        &ctx,
        &title,
        &description,
        &forecast_type,
        start,
        end,
    )?;
    session.commit(&ctx)?;

    if json {
        print_receipt(id)
    } else {
        println!(
            "Created forecast {:03} - {} (periods {} to {})",
            id, title, start, end
        );
        Ok(())
    }
}

pub fn handle_forecast_add_data(
    forecast_id: u64,
    period: i64,
    revenue: u64,
    expenses: u64,
    confidence: u32,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let recorded = session.ledger.forecasts.add_forecast_data(
        &ctx,
        forecast_id,
        period,
        revenue,
        expenses,
        confidence,
    )?;
    session.commit(&ctx)?;

    if json {
        return print_receipt(recorded);
    }

    let data = session.ledger.forecasts.get_forecast_data(forecast_id, period)?;
    println!(
        "Recorded period {} of forecast {:03}: profit {}",
        period,
        forecast_id,
        format_amount(data.profit())
    );
    Ok(())
}

pub fn handle_forecast_status(
    forecast_id: u64,
    status: String,
    caller: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut session = Session::open()?;
    let ctx = session.context(caller)?;

    let updated = session
        .ledger
        .forecasts
        .update_status(&ctx, forecast_id, &status)?;
    session.commit(&ctx)?;

    if json {
        return print_receipt(updated);
    }

    let forecast = session.ledger.forecasts.get_forecast(forecast_id)?;
    println!("Forecast {:03} is now {}", forecast_id, forecast.status);
    Ok(())
}

pub fn handle_forecast_get(forecast_id: u64, json: bool) -> Result<()> {
    let session = Session::open()?;
    let forecast = session.ledger.forecasts.get_forecast(forecast_id)?;

    if json {
        return print_receipt(forecast);
    }

    print_forecast(forecast);
    Ok(())
}

pub fn handle_forecast_list(json: bool) -> Result<()> {
    let session = Session::open()?;
    let forecasts: Vec<&Forecast> = session.ledger.forecasts.list_forecasts().collect();

    if json {
        return print_receipt(forecasts);
    }

    if forecasts.is_empty() {
        println!("No forecasts found.");
        return Ok(());
    }

    for forecast in forecasts {
        println!(
            "{:03}  {:<9}  {:>5}..{:<5}  {}",
            forecast.base.id,
            forecast.status.to_string(),
            forecast.start_period,
            forecast.end_period,
            forecast.base.title
        );
    }
    Ok(())
}

pub fn handle_forecast_data(forecast_id: u64, period: Option<i64>, json: bool) -> Result<()> {
    let session = Session::open()?;
    let registry = &session.ledger.forecasts;

    if let Some(period) = period {
        let data = registry.get_forecast_data(forecast_id, period)?;
        if json {
            return print_receipt(data);
        }
        print_periods(&[data]);
        return Ok(());
    }

    registry.get_forecast(forecast_id)?;
    let periods: Vec<&ForecastPeriodData> = registry.periods_for(forecast_id).collect();

    if json {
        return print_receipt(periods);
    }

    if periods.is_empty() {
        println!("No data recorded for forecast {:03}.", forecast_id);
    } else {
        print_periods(&periods);
    }
    Ok(())
}

pub fn handle_forecast_summary(forecast_id: u64, json: bool) -> Result<()> {
    let session = Session::open()?;
    let summary = session.ledger.forecasts.summary(forecast_id)?;

    if json {
        return print_receipt(summary);
    }

    print_summary(&summary);
    Ok(())
}

fn print_forecast(forecast: &Forecast) {
    println!("Forecast {:03}: {}", forecast.base.id, forecast.base.title);
    println!("  Type:       {}", forecast.forecast_type);
    println!("  Status:     {}", forecast.status);
    println!(
        "  Periods:    {} to {} ({} total)",
        forecast.start_period,
        forecast.end_period,
        forecast.period_count()
    );
    println!("  Creator:    {}", forecast.base.creator);
    println!("  Created at: {}", forecast.base.created_at);
    println!("  Updated at: {}", forecast.base.updated_at);
    if !forecast.base.description.is_empty() {
        println!("\n{}", forecast.base.description);
    }
}

fn print_periods(periods: &[&ForecastPeriodData]) {
    println!(
        "{:>6}  {:>16}  {:>16}  {:>17}  {:>10}",
        "Period", "Revenue", "Expenses", "Profit", "Confidence"
    );
    for data in periods {
        println!(
            "{:>6}  {:>16}  {:>16}  {:>17}  {:>9}%",
            data.period,
            format_amount(data.revenue() as i128),
            format_amount(data.expenses() as i128),
            format_amount(data.profit()),
            data.confidence
        );
    }
}

fn print_summary(summary: &ForecastSummary) {
    println!("Forecast {:03} summary", summary.forecast_id);
    println!(
        "  Periods recorded: {} of {}",
        summary.periods_recorded, summary.periods_total
    );
    println!("  Total revenue:    {}", format_amount(summary.total_revenue as i128));
    println!("  Total expenses:   {}", format_amount(summary.total_expenses as i128));
    println!("  Total profit:     {}", format_amount(summary.total_profit));
    match summary.mean_confidence {
        Some(confidence) => println!("  Mean confidence:  {}%", confidence),
        None => println!("  Mean confidence:  -"),
    }
}

// Snapshot

pub fn handle_snapshot(output: Option<String>, json: bool) -> Result<()> {
    let session = Session::open()?;
    let dir = snapshot_dir(&session.root, &session.config, output);

    let stats = generate_snapshot(&session.ledger, &dir)?;

    if json {
        return print_receipt(&stats.files_generated);
    }

    println!(
        "Generated snapshot in {} ({} records, {} files)",
        dir.display(),
        stats.total_records(),
        stats.files_generated.len()
    );
    println!(
        "  decisions: {} ({} finalized)",
        stats.decisions, stats.decisions_finalized
    );
    println!(
        "  forecasts: {} ({} active)",
        stats.forecasts, stats.forecasts_active
    );
    Ok(())
}

fn snapshot_dir(root: &Path, config: &TallyConfig, output: Option<String>) -> PathBuf {
    match output {
        Some(dir) => PathBuf::from(dir),
        None => root.join(&config.snapshot_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_caller_wins() {
        let config = TallyConfig {
            identity: Some("ST1CONFIGURED".to_string()),
            ..TallyConfig::default()
        };
        let caller = resolve_caller(Some("ST1FLAG"), &config).unwrap();
        assert_eq!(caller.as_str(), "ST1FLAG");
    }

    #[test]
    fn test_blank_explicit_caller_is_rejected() {
        let err = resolve_caller(Some("  "), &TallyConfig::default()).unwrap_err();
        assert_eq!(err.code(), 902);
    }

    #[test]
    fn test_snapshot_dir_defaults_to_config() {
        let root = Path::new("/work/project");
        let config = TallyConfig::default();
        assert_eq!(
            snapshot_dir(root, &config, None),
            PathBuf::from("/work/project/snapshot")
        );
        assert_eq!(
            snapshot_dir(root, &config, Some("out".to_string())),
            PathBuf::from("out")
        );
    }
}
