pub mod aggregation;
pub mod config;
pub mod effective;
pub mod error;
pub mod frame;
pub mod goal;
pub mod metric;
pub mod model;
pub mod ordering;
pub mod record;
pub mod rollup;
pub mod schema;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{aggregate, combine, AggregateResult, AggregationContext, GroupInput, Partials};
pub use config::InsightsConfig;
pub use effective::EffectivePointsIndex;
pub use error::InsightsError;
pub use goal::{GoalSettings, GoalStatus, RateUnit};
pub use metric::MetricKind;
pub use model::InsightsModel;
pub use record::{ClassifierField, LaborClass, LeafRecord};

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::PyModule;

/// Export schema constants as Python submodules
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classifier
    let classifier = PyModule::new(m.py(), "classifier")?;
    classifier.add("LABOR_TYPE", schema::classifier::LABOR_TYPE)?;
    classifier.add("TYPE", schema::classifier::TYPE)?;
    classifier.add("JOB_TYPE", schema::classifier::JOB_TYPE)?;
    m.add_submodule(&classifier)?;

    // Quantity
    let quantity = PyModule::new(m.py(), "quantity")?;
    quantity.add("HOURS", schema::quantity::HOURS)?;
    quantity.add("POINTS", schema::quantity::POINTS)?;
    m.add_submodule(&quantity)?;

    // Assignments
    let assignments = PyModule::new(m.py(), "assignments")?;
    assignments.add("KIOSK", schema::assignments::KIOSK)?;
    assignments.add("PROACTIVE", schema::assignments::PROACTIVE)?;
    assignments.add("REACTIVE", schema::assignments::REACTIVE)?;
    assignments.add("TOTAL", schema::assignments::TOTAL)?;
    m.add_submodule(&assignments)?;

    // Bucket
    let bucket = PyModule::new(m.py(), "bucket")?;
    bucket.add("AREA", schema::bucket::AREA)?;
    bucket.add("AREA_ID", schema::bucket::AREA_ID)?;
    bucket.add("DEPARTMENT", schema::bucket::DEPARTMENT)?;
    bucket.add("DEPARTMENT_ID", schema::bucket::DEPARTMENT_ID)?;
    m.add_submodule(&bucket)?;

    // Goal
    let goal = PyModule::new(m.py(), "goal")?;
    goal.add("SUPPORT_GOAL_PPH", schema::goal::SUPPORT_GOAL_PPH)?;
    goal.add("SUPPORT_PPH_GOAL", schema::goal::SUPPORT_PPH_GOAL)?;
    m.add_submodule(&goal)?;

    // Output
    let output = PyModule::new(m.py(), "output")?;
    output.add("EFFECTIVE_POINTS", schema::output::EFFECTIVE_POINTS)?;
    output.add("LEVEL", schema::output::LEVEL)?;
    m.add_submodule(&output)?;

    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
#[pyo3(name = "_core")]
fn core_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyInsightsModel>()?;
    add_schema_exports(m)?;
    Ok(())
}
