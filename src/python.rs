use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::config::InsightsConfig;
use crate::error::InsightsError;
use crate::goal::GoalSettings;
use crate::metric::MetricKind;
use crate::model::InsightsModel;
use crate::record::ClassifierField;

#[pyclass(name = "InsightsModel", unsendable)]
pub struct PyInsightsModel {
    inner: InsightsModel,
}

#[pymethods]
impl PyInsightsModel {
    #[new]
    #[pyo3(signature = (
        base_path,
        direct_goal_pph = crate::goal::DEFAULT_DIRECT_GOAL_PPH,
        effective_points = true,
        classifier = "laborType",
        group_by = None,
        identifier_column = None,
    ))]
    fn new(
        base_path: String,
        direct_goal_pph: f64,
        effective_points: bool,
        classifier: &str,
        group_by: Option<Vec<String>>,
        identifier_column: Option<String>,
    ) -> PyResult<Self> {
        let classifier: ClassifierField = classifier.parse()?;
        let defaults = InsightsConfig::default();
        let config = InsightsConfig {
            goals: GoalSettings {
                direct_goal_pph,
                classifier,
            },
            effective_points,
            group_by: group_by.unwrap_or_default(),
            identifier_column: identifier_column.unwrap_or(defaults.identifier_column),
            classifier_overrides: defaults.classifier_overrides,
        };
        Ok(Self {
            inner: InsightsModel::new(base_path, config),
        })
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load the rows CSV. Columns are kept as strings; numeric fields are
    /// coerced (bad values count as 0) when aggregated.
    #[pyo3(signature = (filename=None))]
    fn load_rows(&mut self, filename: Option<&str>) -> PyResult<PyDataFrame> {
        let df = self.inner.load_rows(filename.unwrap_or("rows.csv"))?;
        Ok(PyDataFrame(df.clone()))
    }

    /// Replace the dataset with a DataFrame. Returns the new dataset version.
    fn set_rows(&mut self, df: PyDataFrame) -> PyResult<String> {
        let version = self.inner.set_frame(df.0)?;
        Ok(version.to_string())
    }

    // ── Effective points ────────────────────────────────────────────────────

    /// Loaded rows with an `effectivePoints` column.
    fn effective_points(&mut self) -> PyResult<PyDataFrame> {
        let df = self.inner.effective_points_frame()?;
        Ok(PyDataFrame(df))
    }

    // ── Aggregation ─────────────────────────────────────────────────────────

    /// Aggregate the loaded rows.
    ///
    /// `metrics`: metric column ids, e.g. `["pph", "directPercent"]`.
    /// `group_by`: grouping columns, outermost first.
    #[pyo3(signature = (metrics, group_by=None))]
    fn aggregate(
        &mut self,
        metrics: Vec<String>,
        group_by: Option<Vec<String>>,
    ) -> PyResult<PyDataFrame> {
        let metrics = metrics
            .iter()
            .map(|m| m.parse::<MetricKind>())
            .collect::<Result<Vec<_>, InsightsError>>()?;
        let df = self
            .inner
            .aggregate_loaded(&metrics, group_by.as_deref())?;
        Ok(PyDataFrame(df))
    }

    #[staticmethod]
    fn metric_names() -> Vec<&'static str> {
        MetricKind::ALL.iter().map(|m| m.name()).collect()
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn rows_df(&self) -> PyResult<Option<PyDataFrame>> {
        Ok(self.inner.frame().cloned().map(PyDataFrame))
    }

    #[getter]
    fn version(&self) -> Option<String> {
        self.inner.version().map(|v| v.to_string())
    }
}
