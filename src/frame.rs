//! DataFrame boundary: CSV loading, row conversion and tabular output.

use std::path::Path;

use polars::prelude::*;

use crate::aggregation::AggregationContext;
use crate::effective::EffectivePointsIndex;
use crate::error::InsightsError;
use crate::metric::MetricKind;
use crate::record::{coerce_number, coerce_optional, LeafRecord};
use crate::rollup::{rollup, GroupNode, KeyedRecord};
use crate::schema::{assignments, bucket, classifier, goal, output, quantity};

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame, InsightsError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

/// A column materialised as optional strings; absent columns read as null.
struct TextColumn(Option<Vec<Option<String>>>);

impl TextColumn {
    fn load(df: &DataFrame, name: &str) -> Result<Self, InsightsError> {
        let Ok(column) = df.column(name) else {
            return Ok(Self(None));
        };
        let as_text = column.cast(&DataType::String)?;
        let values = as_text
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(Self(Some(values)))
    }

    fn get(&self, row: usize) -> Option<&str> {
        self.0
            .as_ref()
            .and_then(|values| values.get(row))
            .and_then(|v| v.as_deref())
    }

    fn owned(&self, row: usize) -> Option<String> {
        self.get(row).map(str::to_string)
    }
}

/// Convert every row into a [`LeafRecord`].
///
/// Missing columns are treated as absent fields and every numeric cell is
/// coerced, so this only fails on a broken frame, never on bad values.
pub fn records_from_frame(
    df: &DataFrame,
    identifier_column: &str,
) -> Result<Vec<LeafRecord>, InsightsError> {
    let labor_type = TextColumn::load(df, classifier::LABOR_TYPE)?;
    let record_type = TextColumn::load(df, classifier::TYPE)?;
    let job_type = TextColumn::load(df, classifier::JOB_TYPE)?;
    let hours = TextColumn::load(df, quantity::HOURS)?;
    let points = TextColumn::load(df, quantity::POINTS)?;
    let kiosk = TextColumn::load(df, assignments::KIOSK)?;
    let proactive = TextColumn::load(df, assignments::PROACTIVE)?;
    let reactive = TextColumn::load(df, assignments::REACTIVE)?;
    let total = TextColumn::load(df, assignments::TOTAL)?;
    let area = TextColumn::load(df, bucket::AREA)?;
    let area_id = TextColumn::load(df, bucket::AREA_ID)?;
    let department = TextColumn::load(df, bucket::DEPARTMENT)?;
    let department_id = TextColumn::load(df, bucket::DEPARTMENT_ID)?;
    let goal_pph = TextColumn::load(df, goal::SUPPORT_GOAL_PPH)?;
    let legacy_goal_pph = TextColumn::load(df, goal::SUPPORT_PPH_GOAL)?;
    let identifier = TextColumn::load(df, identifier_column)?;

    let records = (0..df.height())
        .map(|i| LeafRecord {
            labor_type: labor_type.owned(i),
            record_type: record_type.owned(i),
            job_type: job_type.owned(i),
            hours: coerce_number(hours.get(i)),
            points: coerce_number(points.get(i)),
            kiosk_assignments: coerce_number(kiosk.get(i)),
            proactive_assignments: coerce_number(proactive.get(i)),
            reactive_assignments: coerce_number(reactive.get(i)),
            total_assignments: coerce_number(total.get(i)),
            area: area.owned(i),
            area_id: area_id.owned(i),
            department: department.owned(i),
            department_id: department_id.owned(i),
            support_goal_pph: coerce_optional(goal_pph.get(i).or_else(|| legacy_goal_pph.get(i))),
            identifier: identifier.owned(i),
        })
        .collect();

    Ok(records)
}

/// Append the `effectivePoints` column.
pub fn with_effective_points(
    df: &DataFrame,
    records: &[LeafRecord],
    index: &EffectivePointsIndex,
) -> Result<DataFrame, InsightsError> {
    if records.len() != df.height() {
        return Err(InsightsError::General(format!(
            "{} records for a frame of {} rows",
            records.len(),
            df.height()
        )));
    }
    let values: Vec<f64> = records.iter().map(|r| index.effective_points(r)).collect();
    let mut out = df.clone();
    out.with_column(Series::new(output::EFFECTIVE_POINTS.into(), values))?;
    Ok(out)
}

/// Group `records` by the `group_by` columns of `df` and roll every metric
/// up level by level.
///
/// Returns one row per group per level, parents before children: the
/// grouping columns (null below the group's level, and null for the group
/// of missing values), `level`, and for every metric its value plus
/// `_numerator` / `_denominator` partials.
pub fn aggregate_frame(
    df: &DataFrame,
    records: Vec<LeafRecord>,
    metrics: &[MetricKind],
    group_by: &[String],
    ctx: &AggregationContext<'_>,
) -> Result<DataFrame, InsightsError> {
    if records.len() != df.height() {
        return Err(InsightsError::General(format!(
            "{} records for a frame of {} rows",
            records.len(),
            df.height()
        )));
    }

    let mut key_columns = Vec::with_capacity(group_by.len());
    for name in group_by {
        if df.column(name).is_err() {
            return Err(InsightsError::MissingColumn(name.clone()));
        }
        key_columns.push(TextColumn::load(df, name)?);
    }

    let rows: Vec<KeyedRecord> = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| KeyedRecord {
            keys: key_columns.iter().map(|c| c.owned(i)).collect(),
            record,
        })
        .collect();

    let root = rollup(rows, group_by.len(), metrics, ctx);
    tree_to_frame(&root, metrics, group_by)
}

fn tree_to_frame(
    root: &GroupNode,
    metrics: &[MetricKind],
    group_by: &[String],
) -> Result<DataFrame, InsightsError> {
    let nodes = root.flatten();

    let mut key_values: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(nodes.len()); group_by.len()];
    let mut levels: Vec<i64> = Vec::with_capacity(nodes.len());
    let mut values: Vec<[Vec<f64>; 3]> = vec![Default::default(); metrics.len()];

    for node in &nodes {
        for (i, column) in key_values.iter_mut().enumerate() {
            column.push(node.path.get(i).cloned().flatten());
        }
        levels.push(node.level() as i64);
        for (i, result) in node.results.iter().enumerate() {
            values[i][0].push(result.value());
            values[i][1].push(result.numerator());
            values[i][2].push(result.denominator());
        }
    }

    let mut columns: Vec<Column> = Vec::new();
    for (name, column) in group_by.iter().zip(key_values) {
        columns.push(Series::new(name.into(), column).into());
    }
    columns.push(Series::new(output::LEVEL.into(), levels).into());
    for (metric, [value, numerator, denominator]) in metrics.iter().zip(values) {
        let name = metric.name();
        columns.push(Series::new(name.into(), value).into());
        columns.push(
            Series::new(
                format!("{name}{}", output::NUMERATOR_SUFFIX).into(),
                numerator,
            )
            .into(),
        );
        columns.push(
            Series::new(
                format!("{name}{}", output::DENOMINATOR_SUFFIX).into(),
                denominator,
            )
            .into(),
        );
    }

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::record::ClassifierField;
    use crate::schema::identity;

    fn sample() -> DataFrame {
        df!(
            "location" => ["Katy", "Katy", "Mesa"],
            "laborType" => ["Direct", "Support", "Direct"],
            "hours" => ["10", "5", "not a number"],
            "points" => ["600", "", "50"],
            "area" => ["A", "A", "B"],
            "department" => ["D", "D", "D"],
            "supportPPHGoal" => [None, Some("150"), None::<&str>],
        )
        .unwrap()
    }

    #[test]
    fn rows_are_coerced_into_records() {
        let records = records_from_frame(&sample(), identity::EMPLOYEE).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].hours, 10.0);
        assert_eq!(records[1].points, 0.0);
        assert_eq!(records[2].hours, 0.0);
        assert_eq!(records[1].support_goal_pph, Some(150.0));
        assert_eq!(records[0].support_goal_pph, None);
        assert_eq!(records[0].identifier, None);
        assert_eq!(records[0].job_type, None);
    }

    #[test]
    fn effective_points_column_is_appended() {
        let df = sample();
        let records = records_from_frame(&df, identity::EMPLOYEE).unwrap();
        let index = EffectivePointsIndex::build(&records, ClassifierField::LaborType, Uuid::new_v4());
        let out = with_effective_points(&df, &records, &index).unwrap();

        let column = out.column(output::EFFECTIVE_POINTS).unwrap().f64().unwrap();
        assert_eq!(column.get(0), Some(600.0));
        assert_eq!(column.get(1), Some(600.0));
        assert_eq!(column.get(2), Some(50.0));
    }

    #[test]
    fn grouped_output_has_one_row_per_group_and_level() {
        let df = sample();
        let records = records_from_frame(&df, identity::EMPLOYEE).unwrap();
        let index = EffectivePointsIndex::build(&records, ClassifierField::LaborType, Uuid::new_v4());
        let ctx = AggregationContext::default().with_effective_points(&index);

        let out = aggregate_frame(
            &df,
            records,
            &[MetricKind::Points, MetricKind::LocationPointsPerHour],
            &["location".to_string()],
            &ctx,
        )
        .unwrap();

        // root, Katy, Mesa
        assert_eq!(out.height(), 3);
        let levels = out.column(output::LEVEL).unwrap().i64().unwrap();
        assert_eq!(levels.get(0), Some(0));
        assert_eq!(levels.get(1), Some(1));

        let location = out.column("location").unwrap().str().unwrap();
        assert_eq!(location.get(0), None);
        assert_eq!(location.get(1), Some("Katy"));

        let pph = out.column("locationPph").unwrap().f64().unwrap();
        assert!((pph.get(1).unwrap() - 40.0).abs() < 1e-9);
        // Mesa has no hours: rate is zero, not infinite.
        assert_eq!(pph.get(2), Some(0.0));

        let points = out.column("points_numerator").unwrap().f64().unwrap();
        assert_eq!(points.get(0), Some(650.0));
    }

    #[test]
    fn missing_group_values_stay_null() {
        let df = df!(
            "location" => [Some("Katy"), None::<&str>, Some("")],
            "hours" => ["1", "2", "3"],
        )
        .unwrap();
        let records = records_from_frame(&df, identity::EMPLOYEE).unwrap();
        let out = aggregate_frame(
            &df,
            records,
            &[MetricKind::Count],
            &["location".to_string()],
            &AggregationContext::default(),
        )
        .unwrap();

        // root, <missing>, "", Katy
        assert_eq!(out.height(), 4);
        let levels = out.column(output::LEVEL).unwrap().i64().unwrap();
        let location = out.column("location").unwrap().str().unwrap();
        assert_eq!(levels.get(1), Some(1));
        assert_eq!(location.get(1), None);
        assert_eq!(location.get(2), Some(""));
        assert_eq!(location.get(3), Some("Katy"));
    }

    #[test]
    fn unknown_group_column_is_reported() {
        let df = sample();
        let records = records_from_frame(&df, identity::EMPLOYEE).unwrap();
        let err = aggregate_frame(
            &df,
            records,
            &[MetricKind::Count],
            &["supervisor".to_string()],
            &AggregationContext::default(),
        )
        .unwrap_err();

        assert!(matches!(err, InsightsError::MissingColumn(name) if name == "supervisor"));
    }
}
