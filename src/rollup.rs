use std::collections::BTreeMap;

use crate::aggregation::{aggregate, AggregateResult, AggregationContext, GroupInput};
use crate::metric::MetricKind;
use crate::record::LeafRecord;

/// A leaf record together with its grouping key values, outermost first.
/// `None` is a missing (null) cell.
#[derive(Debug, Clone)]
pub struct KeyedRecord {
    pub keys: Vec<Option<String>>,
    pub record: LeafRecord,
}

/// One group of the grouping tree.
#[derive(Debug, Clone)]
pub struct GroupNode {
    /// Key values from the root down to this group; empty for the root.
    pub path: Vec<Option<String>>,
    /// One result per requested metric, in request order.
    pub results: Vec<AggregateResult>,
    pub children: Vec<GroupNode>,
    pub leaf_count: usize,
}

impl GroupNode {
    pub fn level(&self) -> usize {
        self.path.len()
    }

    pub fn result(&self, metric: MetricKind) -> Option<&AggregateResult> {
        self.results.iter().find(|r| r.metric() == metric)
    }

    /// Child group for `key`; `None` finds the group of missing values.
    pub fn child(&self, key: Option<&str>) -> Option<&GroupNode> {
        self.children
            .iter()
            .find(|c| c.path.last().map(Option::as_deref) == Some(key))
    }

    /// Pre-order walk: parent before its children, children in key order.
    pub fn flatten(&self) -> Vec<&GroupNode> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}

/// Build the grouping tree bottom-up, the way the grid engine drives the
/// aggregator: the deepest groups are reduced from their leaf records and
/// every shallower group from its children's results.
///
/// `depth` is the number of grouping levels. Missing key values, and records
/// with fewer key values than levels, fall into a `None` group that sorts
/// before every named group.
pub fn rollup(
    rows: Vec<KeyedRecord>,
    depth: usize,
    metrics: &[MetricKind],
    ctx: &AggregationContext<'_>,
) -> GroupNode {
    build_node(Vec::new(), rows, depth, metrics, ctx)
}

fn build_node(
    path: Vec<Option<String>>,
    rows: Vec<KeyedRecord>,
    depth: usize,
    metrics: &[MetricKind],
    ctx: &AggregationContext<'_>,
) -> GroupNode {
    let level = path.len();

    if level >= depth {
        let records: Vec<LeafRecord> = rows.into_iter().map(|r| r.record).collect();
        let results = metrics
            .iter()
            .map(|metric| aggregate(*metric, GroupInput::Leaves(&records), ctx))
            .collect();
        return GroupNode {
            path,
            results,
            children: Vec::new(),
            leaf_count: records.len(),
        };
    }

    let mut groups: BTreeMap<Option<String>, Vec<KeyedRecord>> = BTreeMap::new();
    for row in rows {
        let key = row.keys.get(level).cloned().flatten();
        groups.entry(key).or_default().push(row);
    }

    let children: Vec<GroupNode> = groups
        .into_iter()
        .map(|(key, rows)| {
            let mut child_path = path.clone();
            child_path.push(key);
            build_node(child_path, rows, depth, metrics, ctx)
        })
        .collect();

    let results = metrics
        .iter()
        .enumerate()
        .map(|(i, metric)| {
            let child_results: Vec<AggregateResult> =
                children.iter().map(|c| c.results[i].clone()).collect();
            aggregate(*metric, GroupInput::Children(&child_results), ctx)
        })
        .collect();

    GroupNode {
        path,
        results,
        leaf_count: children.iter().map(|c| c.leaf_count).sum(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(location: &str, supervisor: &str, record: LeafRecord) -> KeyedRecord {
        KeyedRecord {
            keys: vec![Some(location.to_string()), Some(supervisor.to_string())],
            record,
        }
    }

    #[test]
    fn parents_match_a_flat_reduction_of_their_leaves() {
        let rows = vec![
            keyed("Katy", "Jose", LeafRecord::labor("", 10.0, 500.0).with_job_type("Direct")),
            keyed("Katy", "Jose", LeafRecord::labor("", 90.0, 0.0).with_job_type("Indirect")),
            keyed("Katy", "Sheena", LeafRecord::labor("", 100.0, 900.0).with_job_type("Direct")),
            keyed("Mesa", "Usman", LeafRecord::labor("", 20.0, 100.0).with_job_type("Direct")),
        ];
        let flat: Vec<LeafRecord> = rows.iter().map(|r| r.record.clone()).collect();
        let metrics = [MetricKind::DirectPercent, MetricKind::PointsPerHour];
        let ctx = AggregationContext::default();

        let root = rollup(rows, 2, &metrics, &ctx);

        assert_eq!(root.leaf_count, 4);
        assert_eq!(root.children.len(), 2);
        for metric in metrics {
            let flat_result = aggregate(metric, GroupInput::Leaves(&flat), &ctx);
            let rolled = root.result(metric).unwrap();
            assert!((rolled.value() - flat_result.value()).abs() < 1e-9, "{metric}");
            assert!(!rolled.is_leaf());
        }

        let jose = root.child(Some("Katy")).and_then(|k| k.child(Some("Jose"))).unwrap();
        assert!(jose.result(MetricKind::DirectPercent).unwrap().is_leaf());
        assert!((jose.result(MetricKind::DirectPercent).unwrap().value() - 10.0).abs() < 1e-9);

        // (10 + 100) / (100 + 100) rather than the mean of 10% and 100%.
        let katy = root.child(Some("Katy")).unwrap();
        assert!((katy.result(MetricKind::DirectPercent).unwrap().value() - 55.0).abs() < 1e-9);
    }

    #[test]
    fn flatten_walks_parents_first() {
        let rows = vec![
            keyed("Mesa", "Usman", LeafRecord::default()),
            keyed("Katy", "Jose", LeafRecord::default()),
        ];
        let root = rollup(rows, 2, &[MetricKind::Count], &AggregationContext::default());
        let paths: Vec<Vec<Option<&str>>> = root
            .flatten()
            .iter()
            .map(|n| n.path.iter().map(Option::as_deref).collect())
            .collect();

        assert_eq!(
            paths,
            vec![
                vec![],
                vec![Some("Katy")],
                vec![Some("Katy"), Some("Jose")],
                vec![Some("Mesa")],
                vec![Some("Mesa"), Some("Usman")],
            ]
        );
    }

    #[test]
    fn missing_keys_group_apart_from_blank_ones() {
        let rows = vec![
            KeyedRecord {
                keys: vec![None],
                record: LeafRecord::default(),
            },
            KeyedRecord {
                keys: vec![Some(String::new())],
                record: LeafRecord::default(),
            },
            KeyedRecord {
                keys: vec![],
                record: LeafRecord::default(),
            },
        ];
        let root = rollup(rows, 1, &[MetricKind::Count], &AggregationContext::default());

        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].path, vec![None]);
        assert_eq!(root.child(None).unwrap().leaf_count, 2);
        assert_eq!(root.child(Some("")).unwrap().leaf_count, 1);
    }

    #[test]
    fn zero_depth_reduces_leaves_at_the_root() {
        let rows = vec![keyed("Katy", "Jose", LeafRecord::default())];
        let root = rollup(rows, 0, &[MetricKind::Count], &AggregationContext::default());

        assert!(root.children.is_empty());
        assert_eq!(root.result(MetricKind::Count).unwrap().value(), 1.0);
    }
}
