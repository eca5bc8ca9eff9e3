use std::path::PathBuf;

use polars::prelude::DataFrame;
use tracing::info;
use uuid::Uuid;

use crate::aggregation::{aggregate, AggregateResult, AggregationContext, GroupInput};
use crate::config::InsightsConfig;
use crate::effective::EffectivePointsIndex;
use crate::error::InsightsError;
use crate::frame;
use crate::metric::MetricKind;
use crate::record::LeafRecord;

/// Holds one loaded dataset and everything derived from it.
///
/// Every load gets a fresh version id. The effective-points index is built
/// lazily and reused for as long as the version does not change, so the
/// grid can regroup as often as it likes without repeating the pre-pass.
pub struct InsightsModel {
    base_path: PathBuf,
    config: InsightsConfig,
    frame: Option<DataFrame>,
    records: Option<Vec<LeafRecord>>,
    version: Option<Uuid>,
    index: Option<EffectivePointsIndex>,
    index_builds: usize,
}

impl InsightsModel {
    pub fn new(base_path: impl Into<PathBuf>, config: InsightsConfig) -> Self {
        Self {
            base_path: base_path.into(),
            config,
            frame: None,
            records: None,
            version: None,
            index: None,
            index_builds: 0,
        }
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load a rows CSV relative to the base path. All columns are read as
    /// strings and coerced when converted into records.
    pub fn load_rows(&mut self, filename: &str) -> Result<&DataFrame, InsightsError> {
        let path = self.base_path.join(filename);
        let df = frame::read_csv_as_strings(&path)?;
        info!(file = %path.display(), rows = df.height(), "loaded rows");
        self.set_frame(df)?;
        self.frame
            .as_ref()
            .ok_or_else(|| InsightsError::NotLoaded("rows".into()))
    }

    /// Replace the dataset with an in-memory frame.
    pub fn set_frame(&mut self, df: DataFrame) -> Result<Uuid, InsightsError> {
        let records = frame::records_from_frame(&df, &self.config.identifier_column)?;
        self.frame = Some(df);
        Ok(self.replace_records(records))
    }

    /// Replace the dataset with records that have no frame behind them.
    pub fn set_records(&mut self, records: Vec<LeafRecord>) -> Uuid {
        self.frame = None;
        self.replace_records(records)
    }

    fn replace_records(&mut self, records: Vec<LeafRecord>) -> Uuid {
        let version = Uuid::new_v4();
        self.records = Some(records);
        self.version = Some(version);
        self.index = None;
        version
    }

    pub fn records(&self) -> Result<&[LeafRecord], InsightsError> {
        self.records
            .as_deref()
            .ok_or_else(|| InsightsError::NotLoaded("rows".into()))
    }

    pub fn frame(&self) -> Option<&DataFrame> {
        self.frame.as_ref()
    }

    pub fn version(&self) -> Option<Uuid> {
        self.version
    }

    /// How many times the effective-points pre-pass has run.
    pub fn index_builds(&self) -> usize {
        self.index_builds
    }

    // ── Effective points ────────────────────────────────────────────────────

    /// Build the effective-points index unless one for the current version
    /// already exists.
    pub fn effective_index(&mut self) -> Result<&EffectivePointsIndex, InsightsError> {
        let records = self
            .records
            .as_ref()
            .ok_or_else(|| InsightsError::NotLoaded("rows".into()))?;
        let version = self
            .version
            .ok_or_else(|| InsightsError::NotLoaded("rows".into()))?;

        let fresh = matches!(&self.index, Some(index) if index.version() == version);
        if !fresh {
            self.index = Some(EffectivePointsIndex::build(
                records,
                self.config.goals.classifier,
                version,
            ));
            self.index_builds += 1;
        }
        self.index
            .as_ref()
            .ok_or_else(|| InsightsError::General("effective points index missing".into()))
    }

    /// Loaded rows with the `effectivePoints` column appended.
    pub fn effective_points_frame(&mut self) -> Result<DataFrame, InsightsError> {
        self.effective_index()?;
        let df = self
            .frame
            .as_ref()
            .ok_or_else(|| InsightsError::NotLoaded("rows frame".into()))?;
        let (records, index) = match (&self.records, &self.index) {
            (Some(records), Some(index)) => (records, index),
            _ => return Err(InsightsError::NotLoaded("rows".into())),
        };
        frame::with_effective_points(df, records, index)
    }

    // ── Aggregation ─────────────────────────────────────────────────────────

    /// Context for the current dataset, building the pre-pass if enabled.
    pub fn context(&mut self) -> Result<AggregationContext<'_>, InsightsError> {
        if self.config.effective_points {
            self.effective_index()?;
        }
        Ok(self.config.context(self.index.as_ref()))
    }

    /// Reduce one group handed over by the grid engine.
    pub fn aggregate_group(
        &mut self,
        metric: MetricKind,
        input: GroupInput<'_>,
    ) -> Result<AggregateResult, InsightsError> {
        let ctx = self.context()?;
        Ok(aggregate(metric, input, &ctx))
    }

    /// Roll the loaded rows up by `group_by` (the configured grouping when
    /// `None`).
    pub fn aggregate_loaded(
        &mut self,
        metrics: &[MetricKind],
        group_by: Option<&[String]>,
    ) -> Result<DataFrame, InsightsError> {
        if self.config.effective_points {
            self.effective_index()?;
        }
        let df = self
            .frame
            .as_ref()
            .ok_or_else(|| InsightsError::NotLoaded("rows frame".into()))?;
        let records = self
            .records
            .as_ref()
            .ok_or_else(|| InsightsError::NotLoaded("rows".into()))?;
        let group_by = group_by.unwrap_or(self.config.group_by.as_slice());
        let ctx = self.config.context(self.index.as_ref());

        frame::aggregate_frame(df, records.to_vec(), metrics, group_by, &ctx)
    }
}
