use std::fs;
use std::path::{Path, PathBuf};

use loro::{LoroDoc, LoroMap, LoroMapValue, LoroValue};
use tracing::debug;

use crate::auth::{CreatorOnly, Principal};
use crate::entity::{
    Criterion, Decision, DecisionStatus, Forecast, ForecastPeriodData, ForecastStatus, RecordBase,
};
use crate::error::{Result, TallyError};
use crate::ledger::Ledger;
use crate::registry::{DecisionRegistry, ForecastRegistry};
use crate::validate::{check_score, check_weight};

pub const TALLY_DIR: &str = ".tallybook";
const LORO_DB: &str = "ledger.loro";

pub struct LoroStore {
    doc: LoroDoc,
    dir: PathBuf,
}

impl LoroStore {
    /// Initialize a new tallybook project
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(TALLY_DIR);

        if dir.join(LORO_DB).exists() {
            return Err(TallyError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;

        let store = Self {
            doc: LoroDoc::new(),
            dir,
        };
        store.save()?;

        Ok(store)
    }

    /// Open an existing tallybook project
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(TALLY_DIR);
        let path = dir.join(LORO_DB);

        if !path.exists() {
            return Err(TallyError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        Ok(Self { doc, dir })
    }

    /// Save the document to disk
    pub fn save(&self) -> Result<()> {
        let bytes = self.doc.export(loro::ExportMode::Snapshot)?;
        fs::write(self.dir.join(LORO_DB), bytes)?;
        Ok(())
    }

    /// The `.tallybook` directory
    pub fn tally_dir(&self) -> &Path {
        &self.dir
    }

    /// Last stamp handed out by the host clock
    pub fn height(&self) -> u64 {
        match self.doc.get_map("_meta").get_deep_value() {
            LoroValue::Map(meta) => match meta.get("height") {
                Some(LoroValue::I64(n)) => (*n).max(0) as u64,
                _ => 0,
            },
            _ => 0,
        }
    }

    pub fn set_height(&self, height: u64) -> Result<()> {
        let meta = self.doc.get_map("_meta");
        meta.insert("height", height as i64)?;
        self.doc.commit();
        Ok(())
    }

    /// Write every record of `ledger` into the document.
    pub fn store(&self, ledger: &Ledger) -> Result<()> {
        for decision in ledger.decisions.list_decisions() {
            self.write_decision(decision)?;
        }
        for criterion in ledger.decisions.all_criteria() {
            self.write_criterion(criterion)?;
        }
        for forecast in ledger.forecasts.list_forecasts() {
            self.write_forecast(forecast)?;
        }
        for data in ledger.forecasts.all_periods() {
            self.write_period(data)?;
        }

        // Update sequence counters
        let meta = self.doc.get_map("_meta");
        let sequences = meta.get_or_create_container("type_sequences", LoroMap::new())?;
        sequences.insert("decisions", ledger.decisions.sequence().last() as i64)?;
        sequences.insert("forecasts", ledger.forecasts.sequence().last() as i64)?;

        self.doc.commit();
        debug!(records = ledger.record_count(), "ledger stored");
        Ok(())
    }

    /// Rebuild the ledger from the document, verifying every invariant.
    pub fn load(&self) -> Result<Ledger> {
        let decisions = self.read_all("decisions", parse_decision)?;
        let criteria = self.read_all("criteria", parse_criterion)?;
        let forecasts = self.read_all("forecasts", parse_forecast)?;
        let periods = self.read_all("periods", parse_period)?;

        let ledger = Ledger {
            decisions: DecisionRegistry::restore(
                CreatorOnly,
                decisions,
                criteria,
                self.sequence_last("decisions"),
            )?,
            forecasts: ForecastRegistry::restore(
                CreatorOnly,
                forecasts,
                periods,
                self.sequence_last("forecasts"),
            )?,
        };
        debug!(records = ledger.record_count(), "ledger loaded");
        Ok(ledger)
    }

    fn sequence_last(&self, entity_type: &str) -> u64 {
        let LoroValue::Map(meta) = self.doc.get_map("_meta").get_deep_value() else {
            return 0;
        };
        match meta.get("type_sequences") {
            Some(LoroValue::Map(sequences)) => match sequences.get(entity_type) {
                Some(LoroValue::I64(n)) => (*n).max(0) as u64,
                _ => 0,
            },
            _ => 0,
        }
    }

    fn read_all<T>(&self, name: &str, parse: fn(&LoroMapValue) -> Result<T>) -> Result<Vec<T>> {
        let mut records = Vec::new();
        if let LoroValue::Map(map) = self.doc.get_map(name).get_deep_value() {
            for (key, value) in map.iter() {
                match value {
                    LoroValue::Map(entity_map) => records.push(parse(entity_map)?),
                    _ => {
                        return Err(TallyError::Storage(format!(
                            "{} entry {} is not a map",
                            name, key
                        )))
                    }
                }
            }
        }
        Ok(records)
    }

    fn write_base(entity_map: &LoroMap, base: &RecordBase) -> Result<()> {
        entity_map.insert("id", base.id as i64)?;
        entity_map.insert("creator", base.creator.as_str())?;
        entity_map.insert("title", base.title.clone())?;
        entity_map.insert("description", base.description.clone())?;
        entity_map.insert("created_at", base.created_at as i64)?;
        entity_map.insert("updated_at", base.updated_at as i64)?;
        Ok(())
    }

    fn write_decision(&self, decision: &Decision) -> Result<()> {
        let decisions = self.doc.get_map("decisions");
        let entity_map =
            decisions.get_or_create_container(&decision.base.id.to_string(), LoroMap::new())?;

        Self::write_base(&entity_map, &decision.base)?;
        entity_map.insert("decision_type", decision.decision_type.clone())?;
        entity_map.insert("status", decision.status.to_string())?;
        entity_map.insert("final_score", decision.final_score as i64)?;
        entity_map.insert("recommendation", decision.recommendation.clone())?;
        Ok(())
    }

    fn write_criterion(&self, criterion: &Criterion) -> Result<()> {
        let criteria = self.doc.get_map("criteria");
        let key = format!("{}:{}", criterion.decision_id, criterion.criterion_id);
        let entity_map = criteria.get_or_create_container(&key, LoroMap::new())?;

        entity_map.insert("decision_id", criterion.decision_id as i64)?;
        entity_map.insert("criterion_id", criterion.criterion_id as i64)?;
        entity_map.insert("name", criterion.name.clone())?;
        entity_map.insert("weight", criterion.weight() as i64)?;
        entity_map.insert("score", criterion.score() as i64)?;
        entity_map.insert("weighted_score", criterion.weighted_score() as i64)?;
        entity_map.insert("notes", criterion.notes.clone())?;
        Ok(())
    }

    fn write_forecast(&self, forecast: &Forecast) -> Result<()> {
        let forecasts = self.doc.get_map("forecasts");
        let entity_map =
            forecasts.get_or_create_container(&forecast.base.id.to_string(), LoroMap::new())?;

        Self::write_base(&entity_map, &forecast.base)?;
        entity_map.insert("forecast_type", forecast.forecast_type.clone())?;
        entity_map.insert("start_period", forecast.start_period)?;
        entity_map.insert("end_period", forecast.end_period)?;
        entity_map.insert("status", forecast.status.to_string())?;
        Ok(())
    }

    fn write_period(&self, data: &ForecastPeriodData) -> Result<()> {
        let periods = self.doc.get_map("periods");
        let key = format!("{}:{}", data.forecast_id, data.period);
        let entity_map = periods.get_or_create_container(&key, LoroMap::new())?;

        // Amounts are stored as decimal strings; they do not fit an i64.
        entity_map.insert("forecast_id", data.forecast_id as i64)?;
        entity_map.insert("period", data.period)?;
        entity_map.insert("revenue", data.revenue().to_string())?;
        entity_map.insert("expenses", data.expenses().to_string())?;
        entity_map.insert("profit", data.profit().to_string())?;
        entity_map.insert("confidence", data.confidence as i64)?;
        Ok(())
    }
}

fn malformed(kind: &str, field: &str) -> TallyError {
    TallyError::Storage(format!("{} record has missing or malformed field '{}'", kind, field))
}

fn int_field(map: &LoroMapValue, kind: &str, field: &str) -> Result<i64> {
    match map.get(field) {
        Some(LoroValue::I64(n)) => Ok(*n),
        _ => Err(malformed(kind, field)),
    }
}

fn uint_field<T: TryFrom<i64>>(map: &LoroMapValue, kind: &str, field: &str) -> Result<T> {
    T::try_from(int_field(map, kind, field)?).map_err(|_| malformed(kind, field))
}

fn string_field(map: &LoroMapValue, kind: &str, field: &str) -> Result<String> {
    match map.get(field) {
        Some(LoroValue::String(s)) => Ok(s.to_string()),
        _ => Err(malformed(kind, field)),
    }
}

fn parsed_field<T: std::str::FromStr>(map: &LoroMapValue, kind: &str, field: &str) -> Result<T> {
    string_field(map, kind, field)?
        .parse()
        .map_err(|_| malformed(kind, field))
}

fn parse_base(map: &LoroMapValue, kind: &str) -> Result<RecordBase> {
    let creator = Principal::new(string_field(map, kind, "creator")?)
        .map_err(|_| malformed(kind, "creator"))?;

    Ok(RecordBase {
        id: uint_field(map, kind, "id")?,
        creator,
        title: string_field(map, kind, "title")?,
        description: string_field(map, kind, "description")?,
        created_at: uint_field(map, kind, "created_at")?,
        updated_at: uint_field(map, kind, "updated_at")?,
    })
}

fn parse_decision(map: &LoroMapValue) -> Result<Decision> {
    const KIND: &str = "decision";
    let status: DecisionStatus = parsed_field(map, KIND, "status")?;

    Ok(Decision {
        base: parse_base(map, KIND)?,
        decision_type: string_field(map, KIND, "decision_type")?,
        status,
        final_score: uint_field(map, KIND, "final_score")?,
        recommendation: string_field(map, KIND, "recommendation")?,
    })
}

fn parse_criterion(map: &LoroMapValue) -> Result<Criterion> {
    const KIND: &str = "criterion";
    let decision_id = uint_field(map, KIND, "decision_id")?;
    let criterion_id = uint_field(map, KIND, "criterion_id")?;
    let weight = uint_field(map, KIND, "weight")?;
    let score = uint_field(map, KIND, "score")?;

    if check_weight(weight).is_err() || check_score(score).is_err() {
        return Err(TallyError::InvariantViolation(format!(
            "criterion {} of decision {} holds out-of-range inputs (weight {}, score {})",
            criterion_id, decision_id, weight, score
        )));
    }

    Criterion::restore(
        decision_id,
        criterion_id,
        string_field(map, KIND, "name")?,
        weight,
        score,
        uint_field(map, KIND, "weighted_score")?,
        string_field(map, KIND, "notes")?,
    )
    .ok_or_else(|| {
        TallyError::InvariantViolation(format!(
            "stored weighted score of criterion {} on decision {} does not equal weight * score",
            criterion_id, decision_id
        ))
    })
}

fn parse_forecast(map: &LoroMapValue) -> Result<Forecast> {
    const KIND: &str = "forecast";
    let status: ForecastStatus = parsed_field(map, KIND, "status")?;

    Ok(Forecast {
        base: parse_base(map, KIND)?,
        forecast_type: string_field(map, KIND, "forecast_type")?,
        start_period: int_field(map, KIND, "start_period")?,
        end_period: int_field(map, KIND, "end_period")?,
        status,
    })
}

fn parse_period(map: &LoroMapValue) -> Result<ForecastPeriodData> {
    const KIND: &str = "forecast period";
    let forecast_id = uint_field(map, KIND, "forecast_id")?;
    let period = int_field(map, KIND, "period")?;

    ForecastPeriodData::restore(
        forecast_id,
        period,
        parsed_field(map, KIND, "revenue")?,
        parsed_field(map, KIND, "expenses")?,
        parsed_field(map, KIND, "profit")?,
        uint_field(map, KIND, "confidence")?,
    )
    .ok_or_else(|| {
        TallyError::InvariantViolation(format!(
            "stored profit of period {} on forecast {} does not equal revenue - expenses",
            period, forecast_id
        ))
    })
}
