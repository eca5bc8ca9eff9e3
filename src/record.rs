use std::fmt;
use std::str::FromStr;

use crate::error::InsightsError;
use crate::schema::{bucket, classifier};

/// Labor classification of a leaf record.
///
/// Source data is inconsistent about case ("Direct" vs "gap"), so parsing
/// trims and ignores case. Anything unrecognised, including a missing
/// value, is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LaborClass {
    Direct,
    Support,
    Indirect,
    Admin,
    Gap,
    Total,
    Other,
}

impl LaborClass {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Other;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "direct" => Self::Direct,
            "support" => Self::Support,
            "indirect" => Self::Indirect,
            "admin" => Self::Admin,
            "gap" => Self::Gap,
            "total" => Self::Total,
            _ => Self::Other,
        }
    }
}

/// Which classifier column a metric reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierField {
    LaborType,
    Type,
    JobType,
}

impl ClassifierField {
    pub fn column(self) -> &'static str {
        match self {
            Self::LaborType => classifier::LABOR_TYPE,
            Self::Type => classifier::TYPE,
            Self::JobType => classifier::JOB_TYPE,
        }
    }
}

impl FromStr for ClassifierField {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            classifier::LABOR_TYPE => Ok(Self::LaborType),
            classifier::TYPE => Ok(Self::Type),
            classifier::JOB_TYPE => Ok(Self::JobType),
            other => Err(InsightsError::UnknownClassifier(other.to_string())),
        }
    }
}

/// One observed unit of work.
///
/// Numeric fields are already coerced: anything missing or unparseable in
/// the source is stored as `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafRecord {
    pub labor_type: Option<String>,
    pub record_type: Option<String>,
    pub job_type: Option<String>,
    pub hours: f64,
    pub points: f64,
    pub kiosk_assignments: f64,
    pub proactive_assignments: f64,
    pub reactive_assignments: f64,
    pub total_assignments: f64,
    pub area: Option<String>,
    pub area_id: Option<String>,
    pub department: Option<String>,
    pub department_id: Option<String>,
    /// Goal for Support labor in points per hour. `None` when unset.
    pub support_goal_pph: Option<f64>,
    /// Identifier used by distinct counts (employee by default).
    pub identifier: Option<String>,
}

impl LeafRecord {
    /// Record classified through `laborType`.
    pub fn labor(labor_type: &str, hours: f64, points: f64) -> Self {
        Self {
            labor_type: Some(labor_type.to_string()),
            hours: finite_or_zero(hours),
            points: finite_or_zero(points),
            ..Default::default()
        }
    }

    pub fn with_job_type(mut self, job_type: &str) -> Self {
        self.job_type = Some(job_type.to_string());
        self
    }

    pub fn with_type(mut self, record_type: &str) -> Self {
        self.record_type = Some(record_type.to_string());
        self
    }

    pub fn with_bucket(mut self, area: &str, department: &str) -> Self {
        self.area = Some(area.to_string());
        self.department = Some(department.to_string());
        self
    }

    pub fn with_bucket_ids(mut self, area_id: &str, department_id: &str) -> Self {
        self.area_id = Some(area_id.to_string());
        self.department_id = Some(department_id.to_string());
        self
    }

    pub fn with_support_goal(mut self, pph: f64) -> Self {
        self.support_goal_pph = Some(pph);
        self
    }

    pub fn with_assignments(mut self, kiosk: f64, proactive: f64, reactive: f64, total: f64) -> Self {
        self.kiosk_assignments = finite_or_zero(kiosk);
        self.proactive_assignments = finite_or_zero(proactive);
        self.reactive_assignments = finite_or_zero(reactive);
        self.total_assignments = finite_or_zero(total);
        self
    }

    pub fn with_identifier(mut self, id: &str) -> Self {
        self.identifier = Some(id.to_string());
        self
    }

    pub fn classifier(&self, field: ClassifierField) -> Option<&str> {
        match field {
            ClassifierField::LaborType => self.labor_type.as_deref(),
            ClassifierField::Type => self.record_type.as_deref(),
            ClassifierField::JobType => self.job_type.as_deref(),
        }
    }

    pub fn class(&self, field: ClassifierField) -> LaborClass {
        LaborClass::parse(self.classifier(field))
    }
}

/// Coerce a raw cell into a number. Missing, blank, unparseable and
/// non-finite input all become `0.0`.
pub fn coerce_number(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .map(finite_or_zero)
        .unwrap_or(0.0)
}

/// Like [`coerce_number`] but keeps "absent" distinguishable from zero.
pub fn coerce_optional(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// (area, department) key used by the effective-points redistribution and
/// by the labor-bucket rollup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    area: String,
    department: String,
}

impl BucketKey {
    /// Ids win over names; names are trimmed and lowercased. A record that
    /// lacks either component has no key.
    pub fn for_record(record: &LeafRecord) -> Option<Self> {
        let area = key_part(
            bucket::AREA_ID,
            record.area_id.as_deref(),
            bucket::AREA,
            record.area.as_deref(),
        )?;
        let department = key_part(
            bucket::DEPARTMENT_ID,
            record.department_id.as_deref(),
            bucket::DEPARTMENT,
            record.department.as_deref(),
        )?;
        Some(Self { area, department })
    }

    /// Key built component by component, so records missing a part still
    /// land in a bucket of their own (`areaId:7|department:`). Used by the
    /// labor-bucket rollup; the redistribution only trusts complete keys.
    pub fn partial(record: &LeafRecord) -> Self {
        let area = key_part(
            bucket::AREA_ID,
            record.area_id.as_deref(),
            bucket::AREA,
            record.area.as_deref(),
        )
        .unwrap_or_else(|| format!("{}:", bucket::AREA));
        let department = key_part(
            bucket::DEPARTMENT_ID,
            record.department_id.as_deref(),
            bucket::DEPARTMENT,
            record.department.as_deref(),
        )
        .unwrap_or_else(|| format!("{}:", bucket::DEPARTMENT));
        Self { area, department }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.area, self.department)
    }
}

fn key_part(
    id_label: &str,
    id: Option<&str>,
    name_label: &str,
    name: Option<&str>,
) -> Option<String> {
    if let Some(id) = id.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(format!("{id_label}:{id}"));
    }
    name.map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .map(|n| format!("{name_label}:{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_parsing_ignores_case_and_whitespace() {
        assert_eq!(LaborClass::parse(Some(" Direct ")), LaborClass::Direct);
        assert_eq!(LaborClass::parse(Some("gap")), LaborClass::Gap);
        assert_eq!(LaborClass::parse(Some("SUPPORT")), LaborClass::Support);
        assert_eq!(LaborClass::parse(Some("Forklift")), LaborClass::Other);
        assert_eq!(LaborClass::parse(None), LaborClass::Other);
    }

    #[test]
    fn coercion_never_yields_nan() {
        assert_eq!(coerce_number(Some(" 12.5 ")), 12.5);
        assert_eq!(coerce_number(Some("")), 0.0);
        assert_eq!(coerce_number(Some("n/a")), 0.0);
        assert_eq!(coerce_number(Some("NaN")), 0.0);
        assert_eq!(coerce_number(Some("inf")), 0.0);
        assert_eq!(coerce_number(None), 0.0);
        assert_eq!(coerce_optional(Some("abc")), None);
        assert_eq!(coerce_optional(Some("0")), Some(0.0));
    }

    #[test]
    fn bucket_key_prefers_ids_and_normalises_names() {
        let by_name = LeafRecord::labor("Direct", 1.0, 1.0).with_bucket(" Dock ", "RECEIVING");
        let same = LeafRecord::labor("Support", 1.0, 0.0).with_bucket("dock", "receiving");
        assert_eq!(BucketKey::for_record(&by_name), BucketKey::for_record(&same));

        let by_id = by_name.clone().with_bucket_ids("7", "12");
        let key = BucketKey::for_record(&by_id).unwrap();
        assert_eq!(key.to_string(), "areaId:7|departmentId:12");
    }

    #[test]
    fn classifier_fields_parse_from_column_names() {
        for field in [ClassifierField::LaborType, ClassifierField::Type, ClassifierField::JobType] {
            assert_eq!(field.column().parse::<ClassifierField>().unwrap(), field);
        }
        assert!(matches!(
            "role".parse::<ClassifierField>(),
            Err(InsightsError::UnknownClassifier(name)) if name == "role"
        ));
    }

    #[test]
    fn bucket_key_requires_both_parts() {
        let mut record = LeafRecord::labor("Support", 1.0, 0.0);
        record.area = Some("Dock".into());
        assert!(BucketKey::for_record(&record).is_none());

        record.department = Some("   ".into());
        assert!(BucketKey::for_record(&record).is_none());
    }

    #[test]
    fn partial_keys_keep_the_parts_they_have() {
        let mut record = LeafRecord::labor("Direct", 1.0, 1.0);
        record.area_id = Some("7".into());
        assert_eq!(BucketKey::partial(&record).to_string(), "areaId:7|department:");

        let nothing = LeafRecord::labor("Direct", 1.0, 1.0);
        assert_eq!(BucketKey::partial(&nothing).to_string(), "area:|department:");

        let full = LeafRecord::labor("Direct", 1.0, 1.0).with_bucket("Dock", "Receiving");
        assert_eq!(Some(BucketKey::partial(&full)), BucketKey::for_record(&full));
    }
}
