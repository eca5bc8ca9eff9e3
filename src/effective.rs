use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::record::{BucketKey, ClassifierField, LaborClass, LeafRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BucketStats {
    direct_points: f64,
    has_direct: bool,
    support_count: usize,
}

/// Support-labor redistribution over (area, department) buckets.
///
/// Support records carry no reliable output of their own. Their effective
/// points are the bucket's Direct points split evenly across the bucket's
/// Support records, so the Support rows of a bucket together hold exactly
/// the bucket's Direct points.
///
/// The index only depends on the full row set, never on the active grouping;
/// build it once per dataset version.
#[derive(Debug, Clone)]
pub struct EffectivePointsIndex {
    version: Uuid,
    classifier: ClassifierField,
    buckets: HashMap<BucketKey, BucketStats>,
    unkeyed: usize,
}

impl EffectivePointsIndex {
    pub fn build(records: &[LeafRecord], classifier: ClassifierField, version: Uuid) -> Self {
        let mut buckets: HashMap<BucketKey, BucketStats> = HashMap::new();
        let mut unkeyed = 0usize;

        for record in records {
            let class = record.class(classifier);
            if !matches!(class, LaborClass::Direct | LaborClass::Support) {
                continue;
            }
            let Some(key) = BucketKey::for_record(record) else {
                unkeyed += 1;
                continue;
            };
            let stats = buckets.entry(key).or_default();
            match class {
                LaborClass::Direct => {
                    stats.direct_points += record.points;
                    stats.has_direct = true;
                }
                LaborClass::Support => stats.support_count += 1,
                _ => {}
            }
        }

        debug!(
            %version,
            buckets = buckets.len(),
            unkeyed,
            "built effective points index"
        );

        Self {
            version,
            classifier,
            buckets,
            unkeyed,
        }
    }

    /// Dataset version this index was built from.
    pub fn version(&self) -> Uuid {
        self.version
    }

    /// Column the index read Direct/Support from.
    pub fn classifier(&self) -> ClassifierField {
        self.classifier
    }

    /// Direct/Support records skipped because their bucket key was incomplete.
    pub fn unkeyed(&self) -> usize {
        self.unkeyed
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Points used for rate calculations.
    ///
    /// Falls back to the record's raw points for non-Support labor, for
    /// records without a bucket key, and for buckets with no Direct records.
    pub fn effective_points(&self, record: &LeafRecord) -> f64 {
        if record.class(self.classifier) != LaborClass::Support {
            return record.points;
        }
        let Some(key) = BucketKey::for_record(record) else {
            return record.points;
        };
        match self.buckets.get(&key) {
            Some(stats) if stats.has_direct => {
                stats.direct_points / stats.support_count.max(1) as f64
            }
            _ => record.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(records: &[LeafRecord]) -> EffectivePointsIndex {
        EffectivePointsIndex::build(records, ClassifierField::LaborType, Uuid::new_v4())
    }

    #[test]
    fn support_rows_split_direct_points_evenly() {
        let records = vec![
            LeafRecord::labor("Direct", 8.0, 400.0).with_bucket("Dock", "Receiving"),
            LeafRecord::labor("Direct", 8.0, 200.0).with_bucket("Dock", "Receiving"),
            LeafRecord::labor("Support", 4.0, 0.0).with_bucket("Dock", "Receiving"),
            LeafRecord::labor("Support", 4.0, 7.0).with_bucket("Dock", "Receiving"),
            LeafRecord::labor("Support", 4.0, 0.0).with_bucket("Dock", "Receiving"),
        ];
        let index = build(&records);

        let support: Vec<f64> = records
            .iter()
            .filter(|r| r.class(ClassifierField::LaborType) == LaborClass::Support)
            .map(|r| index.effective_points(r))
            .collect();

        assert_eq!(support.len(), 3);
        for value in &support {
            assert!((value - 200.0).abs() < 1e-9);
        }
        let total: f64 = support.iter().sum();
        assert!((total - 600.0).abs() < 1e-9);
    }

    #[test]
    fn direct_and_other_rows_keep_raw_points() {
        let records = vec![
            LeafRecord::labor("Direct", 8.0, 400.0).with_bucket("Dock", "Receiving"),
            LeafRecord::labor("Admin", 8.0, 3.0).with_bucket("Dock", "Receiving"),
        ];
        let index = build(&records);

        assert_eq!(index.effective_points(&records[0]), 400.0);
        assert_eq!(index.effective_points(&records[1]), 3.0);
    }

    #[test]
    fn buckets_do_not_leak_into_each_other() {
        let records = vec![
            LeafRecord::labor("Direct", 8.0, 400.0).with_bucket("Dock", "Receiving"),
            LeafRecord::labor("Direct", 8.0, 90.0).with_bucket("Dock", "Shipping"),
            LeafRecord::labor("Support", 4.0, 0.0).with_bucket("Dock", "Shipping"),
        ];
        let index = build(&records);

        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.effective_points(&records[2]), 90.0);
    }

    #[test]
    fn incomplete_keys_fall_back_to_raw_points() {
        let mut orphan = LeafRecord::labor("Support", 4.0, 12.0);
        orphan.area = Some("Dock".into());
        let records = vec![
            LeafRecord::labor("Direct", 8.0, 400.0).with_bucket("Dock", "Receiving"),
            orphan.clone(),
        ];
        let index = build(&records);

        assert_eq!(index.unkeyed(), 1);
        assert_eq!(index.effective_points(&orphan), 12.0);
    }

    #[test]
    fn support_without_direct_bucket_keeps_raw_points() {
        let records =
            vec![LeafRecord::labor("Support", 4.0, 15.0).with_bucket("Yard", "Returns")];
        let index = build(&records);

        assert_eq!(index.effective_points(&records[0]), 15.0);
    }
}
