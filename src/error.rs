#[cfg(feature = "python")]
use pyo3::exceptions::PyRuntimeError;
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unknown metric: '{0}'")]
    UnknownMetric(String),

    #[error("Unknown classifier field: '{0}'")]
    UnknownClassifier(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    General(String),
}

#[cfg(feature = "python")]
impl From<InsightsError> for PyErr {
    fn from(err: InsightsError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<PyErr> for InsightsError {
    fn from(err: PyErr) -> Self {
        InsightsError::General(err.to_string())
    }
}
