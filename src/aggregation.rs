use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

use crate::effective::EffectivePointsIndex;
use crate::goal::{GoalSettings, GoalStatus};
use crate::metric::{AssignmentKind, MetricKind, MetricRule, Quantity, Rollup};
use crate::record::{BucketKey, ClassifierField, LaborClass, LeafRecord};

/// Points, hours and goal hours of one labor class inside a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaborTotals {
    pub points: f64,
    pub hours: f64,
    pub goal_hours: f64,
}

impl LaborTotals {
    fn add(&mut self, other: &LaborTotals) {
        self.points += other.points;
        self.hours += other.hours;
        self.goal_hours += other.goal_hours;
    }
}

/// Per-class sums of one (area, department) bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketTotals {
    pub direct: LaborTotals,
    pub support: LaborTotals,
    pub total: LaborTotals,
    pub other: LaborTotals,
}

impl BucketTotals {
    fn add(&mut self, class: LaborClass, totals: &LaborTotals) {
        match class {
            LaborClass::Direct => self.direct.add(totals),
            LaborClass::Support => self.support.add(totals),
            LaborClass::Total => self.total.add(totals),
            _ => self.other.add(totals),
        }
    }

    fn merge(&mut self, other: &BucketTotals) {
        self.direct.add(&other.direct);
        self.support.add(&other.support);
        self.total.add(&other.total);
        self.other.add(&other.other);
    }

    /// Collapse the classes without double counting.
    ///
    /// Support points mirror the bucket's Direct points after redistribution
    /// and "Total" rows restate Direct + Support, so points take the largest
    /// class and hours take the larger of the Total rows and Direct + Support.
    /// Anything else is added on top.
    pub fn rolled_up(&self) -> LaborTotals {
        LaborTotals {
            points: self
                .direct
                .points
                .max(self.support.points)
                .max(self.total.points)
                + self.other.points,
            hours: self.total.hours.max(self.direct.hours + self.support.hours) + self.other.hours,
            goal_hours: self
                .total
                .goal_hours
                .max(self.direct.goal_hours + self.support.goal_hours)
                + self.other.goal_hours,
        }
    }
}

/// Raw partial sums carried between grouping levels.
///
/// Parents always merge these, never the children's finished values.
#[derive(Debug, Clone, PartialEq)]
pub enum Partials {
    Sums { numerator: f64, denominator: f64 },
    Distinct(BTreeSet<String>),
    /// Keyed by bucket; incomplete keys are kept per component.
    Buckets(BTreeMap<BucketKey, BucketTotals>),
}

impl Partials {
    pub fn empty(rollup: Rollup) -> Self {
        match rollup {
            Rollup::Sums => Self::Sums {
                numerator: 0.0,
                denominator: 0.0,
            },
            Rollup::Distinct => Self::Distinct(BTreeSet::new()),
            Rollup::LaborBuckets => Self::Buckets(BTreeMap::new()),
        }
    }

    fn accumulate(&mut self, rule: &MetricRule, record: &LeafRecord, ctx: &AggregationContext<'_>) {
        match self {
            Self::Sums {
                numerator,
                denominator,
            } => {
                *numerator += ctx.leaf_quantity(rule.numerator, rule.classifier, record);
                *denominator += ctx.leaf_quantity(rule.denominator, rule.classifier, record);
            }
            Self::Distinct(ids) => {
                if let Some(id) = record
                    .identifier
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                {
                    ids.insert(id.to_string());
                }
            }
            Self::Buckets(buckets) => {
                let points = ctx.effective_points(record);
                let totals = LaborTotals {
                    points,
                    hours: record.hours,
                    goal_hours: ctx.goals.goal_hours(record, points),
                };
                buckets
                    .entry(BucketKey::partial(record))
                    .or_default()
                    .add(record.class(rule.classifier), &totals);
            }
        }
    }

    /// Fold another set of partials in. Returns false on a shape mismatch,
    /// in which case nothing is merged.
    fn merge(&mut self, other: &Partials) -> bool {
        match (self, other) {
            (
                Self::Sums {
                    numerator,
                    denominator,
                },
                Self::Sums {
                    numerator: n,
                    denominator: d,
                },
            ) => {
                *numerator += n;
                *denominator += d;
            }
            (Self::Distinct(ids), Self::Distinct(other_ids)) => {
                ids.extend(other_ids.iter().cloned());
            }
            (Self::Buckets(buckets), Self::Buckets(other_buckets)) => {
                for (key, totals) in other_buckets {
                    buckets.entry(key.clone()).or_default().merge(totals);
                }
            }
            _ => return false,
        }
        true
    }

    fn pair(&self, rule: &MetricRule) -> (f64, f64) {
        match self {
            Self::Sums {
                numerator,
                denominator,
            } => (*numerator, *denominator),
            Self::Distinct(ids) => (ids.len() as f64, 0.0),
            Self::Buckets(buckets) => {
                let mut rolled = LaborTotals::default();
                for totals in buckets.values() {
                    rolled.add(&totals.rolled_up());
                }
                (
                    bucket_quantity(rule.numerator, &rolled),
                    bucket_quantity(rule.denominator, &rolled),
                )
            }
        }
    }
}

fn bucket_quantity(quantity: Quantity, rolled: &LaborTotals) -> f64 {
    match quantity {
        Quantity::Points(_) | Quantity::EffectivePoints => rolled.points,
        Quantity::Hours(_) => rolled.hours,
        Quantity::GoalHours => rolled.goal_hours,
        Quantity::Assignments(_) | Quantity::Records | Quantity::Nothing => 0.0,
    }
}

/// Result of reducing one group for one metric.
///
/// `Leaf` results were computed from leaf records, `Combined` results from
/// child results. Both carry the partials so a parent can keep combining.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateResult {
    Leaf {
        metric: MetricKind,
        partials: Partials,
        value: f64,
    },
    Combined {
        metric: MetricKind,
        partials: Partials,
        value: f64,
        /// Child results that were folded in.
        groups: usize,
    },
}

impl AggregateResult {
    pub fn metric(&self) -> MetricKind {
        match self {
            Self::Leaf { metric, .. } | Self::Combined { metric, .. } => *metric,
        }
    }

    pub fn partials(&self) -> &Partials {
        match self {
            Self::Leaf { partials, .. } | Self::Combined { partials, .. } => partials,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Leaf { value, .. } | Self::Combined { value, .. } => *value,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    pub fn numerator(&self) -> f64 {
        self.partials().pair(&self.metric().rule()).0
    }

    pub fn denominator(&self) -> f64 {
        self.partials().pair(&self.metric().rule()).1
    }

    /// Goal indicator for goal-comparison metrics; `None` for the rest.
    pub fn goal_status(&self) -> Option<GoalStatus> {
        self.metric()
            .is_goal_comparison()
            .then(|| GoalStatus::evaluate(self.numerator(), self.denominator()))
    }
}

/// What the grid engine hands over for one group.
#[derive(Debug, Clone, Copy)]
pub enum GroupInput<'a> {
    Leaves(&'a [LeafRecord]),
    Children(&'a [AggregateResult]),
}

/// Settings resolved once per configuration and shared by every call.
#[derive(Debug, Clone, Default)]
pub struct AggregationContext<'a> {
    pub goals: GoalSettings,
    pub effective: Option<&'a EffectivePointsIndex>,
    classifiers: HashMap<MetricKind, ClassifierField>,
}

impl<'a> AggregationContext<'a> {
    pub fn new(goals: GoalSettings) -> Self {
        Self {
            goals,
            effective: None,
            classifiers: HashMap::new(),
        }
    }

    /// Use `index` for effective points. The index's classifier becomes the
    /// context's labor classifier.
    pub fn with_effective_points(mut self, index: &'a EffectivePointsIndex) -> Self {
        self.effective = Some(index);
        self.goals.classifier = index.classifier();
        self
    }

    /// Column that decides Direct/Support/Total for goals and labor buckets.
    pub fn labor_classifier(&self) -> ClassifierField {
        self.goals.classifier
    }

    /// Read `metric`'s labor class from a different column.
    ///
    /// Labor-bucket metrics always follow [`Self::labor_classifier`]; an
    /// override for one of them is ignored.
    pub fn with_classifier(mut self, metric: MetricKind, field: ClassifierField) -> Self {
        if metric.rule().rollup == Rollup::LaborBuckets {
            warn!(
                %metric,
                classifier = field.column(),
                "labor bucket metrics follow the labor classifier; override ignored"
            );
            return self;
        }
        self.classifiers.insert(metric, field);
        self
    }

    pub fn rule(&self, metric: MetricKind) -> MetricRule {
        let rule = metric.rule();
        if rule.rollup == Rollup::LaborBuckets {
            return rule.with_classifier(self.labor_classifier());
        }
        match self.classifiers.get(&metric) {
            Some(field) => rule.with_classifier(*field),
            None => rule,
        }
    }

    pub fn effective_points(&self, record: &LeafRecord) -> f64 {
        match self.effective {
            Some(index) => index.effective_points(record),
            None => record.points,
        }
    }

    fn leaf_quantity(&self, quantity: Quantity, classifier: ClassifierField, record: &LeafRecord) -> f64 {
        let matches = |class: Option<LaborClass>| match class {
            Some(class) => record.class(classifier) == class,
            None => true,
        };
        match quantity {
            Quantity::Points(class) if matches(class) => self.effective_points(record),
            Quantity::Hours(class) if matches(class) => record.hours,
            Quantity::Points(_) | Quantity::Hours(_) => 0.0,
            Quantity::EffectivePoints => self.effective_points(record),
            Quantity::Assignments(kind) => match kind {
                AssignmentKind::Kiosk => record.kiosk_assignments,
                AssignmentKind::Proactive => record.proactive_assignments,
                AssignmentKind::Reactive => record.reactive_assignments,
                AssignmentKind::Total => record.total_assignments,
            },
            Quantity::GoalHours => self.goals.goal_hours(record, self.effective_points(record)),
            Quantity::Records => 1.0,
            Quantity::Nothing => 0.0,
        }
    }
}

/// Reduce one group for one metric.
///
/// Leaves are accumulated into partials; children have their partials
/// merged. Division happens once, on the merged partials. Children of
/// another metric are skipped. This never fails: bad input only ever
/// contributes zero.
pub fn aggregate(
    metric: MetricKind,
    input: GroupInput<'_>,
    ctx: &AggregationContext<'_>,
) -> AggregateResult {
    let rule = ctx.rule(metric);
    let mut partials = Partials::empty(rule.rollup);

    match input {
        GroupInput::Leaves(records) => {
            for record in records {
                partials.accumulate(&rule, record, ctx);
            }
            let (numerator, denominator) = partials.pair(&rule);
            AggregateResult::Leaf {
                metric,
                value: rule.finish(numerator, denominator),
                partials,
            }
        }
        GroupInput::Children(children) => {
            let mut groups = 0usize;
            for child in children {
                if child.metric() != metric || !partials.merge(child.partials()) {
                    warn!(
                        expected = %metric,
                        found = %child.metric(),
                        "skipping child aggregate of a different metric"
                    );
                    continue;
                }
                groups += 1;
            }
            let (numerator, denominator) = partials.pair(&rule);
            AggregateResult::Combined {
                metric,
                value: rule.finish(numerator, denominator),
                partials,
                groups,
            }
        }
    }
}

/// Combine two sibling results of the same metric.
pub fn combine(a: &AggregateResult, b: &AggregateResult) -> AggregateResult {
    let metric = a.metric();
    let rule = metric.rule();
    let mut partials = Partials::empty(rule.rollup);
    let mut groups = 0usize;

    for child in [a, b] {
        if child.metric() == metric && partials.merge(child.partials()) {
            groups += 1;
        } else {
            warn!(
                expected = %metric,
                found = %child.metric(),
                "skipping child aggregate of a different metric"
            );
        }
    }

    let (numerator, denominator) = partials.pair(&rule);
    AggregateResult::Combined {
        metric,
        value: rule.finish(numerator, denominator),
        partials,
        groups,
    }
}
