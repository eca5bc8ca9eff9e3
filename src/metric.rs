use std::fmt;
use std::str::FromStr;

use crate::error::InsightsError;
use crate::record::{ClassifierField, LaborClass};

/// Every metric the aggregator knows how to reduce.
///
/// The first group sums plain per-record quantities. The location group
/// (`Points` onwards) works on effective points and rolls up through
/// (area, department) labor buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    PointsPerHour,
    MinutesPerPoint,
    SecondsPerPoint,
    DirectPercent,
    IndirectPercent,
    AdminPercent,
    GapPercent,
    KioskPercent,
    ProactivePercent,
    ReactivePercent,
    DistinctCount,
    Count,
    Points,
    LocationPointsPerHour,
    ActualMinutesPerPoint,
    GoalMinutesPerPoint,
    GoalHours,
    HoursDelta,
    PercentToGoal,
}

impl MetricKind {
    pub const ALL: [MetricKind; 19] = [
        Self::PointsPerHour,
        Self::MinutesPerPoint,
        Self::SecondsPerPoint,
        Self::DirectPercent,
        Self::IndirectPercent,
        Self::AdminPercent,
        Self::GapPercent,
        Self::KioskPercent,
        Self::ProactivePercent,
        Self::ReactivePercent,
        Self::DistinctCount,
        Self::Count,
        Self::Points,
        Self::LocationPointsPerHour,
        Self::ActualMinutesPerPoint,
        Self::GoalMinutesPerPoint,
        Self::GoalHours,
        Self::HoursDelta,
        Self::PercentToGoal,
    ];

    /// Column id the host grid uses for this metric.
    pub fn name(self) -> &'static str {
        match self {
            Self::PointsPerHour => "pph",
            Self::MinutesPerPoint => "mpp",
            Self::SecondsPerPoint => "spp",
            Self::DirectPercent => "directPercent",
            Self::IndirectPercent => "indirectPercent",
            Self::AdminPercent => "adminPercent",
            Self::GapPercent => "gapPercent",
            Self::KioskPercent => "kioskPercent",
            Self::ProactivePercent => "proactivePercent",
            Self::ReactivePercent => "reactivePercent",
            Self::DistinctCount => "distinctCount",
            Self::Count => "count",
            Self::Points => "points",
            Self::LocationPointsPerHour => "locationPph",
            Self::ActualMinutesPerPoint => "actualRateMPP",
            Self::GoalMinutesPerPoint => "goalRateMPP",
            Self::GoalHours => "goalHours",
            Self::HoursDelta => "hoursDelta",
            Self::PercentToGoal => "pctToGoal",
        }
    }

    /// The (numerator, denominator, finish, rollup) rule for this metric.
    pub fn rule(self) -> MetricRule {
        use Quantity::*;

        let sums = |numerator, denominator, classifier, finish| MetricRule {
            numerator,
            denominator,
            classifier,
            finish,
            rollup: Rollup::Sums,
        };
        let buckets = |numerator, denominator, finish| MetricRule {
            numerator,
            denominator,
            classifier: ClassifierField::LaborType,
            finish,
            rollup: Rollup::LaborBuckets,
        };
        let hours_share = |class, classifier| {
            sums(
                Hours(Some(class)),
                Hours(None),
                classifier,
                Finish::Percent,
            )
        };
        let assignment_share = |kind| {
            sums(
                Assignments(kind),
                Assignments(AssignmentKind::Total),
                ClassifierField::JobType,
                Finish::Percent,
            )
        };

        match self {
            Self::PointsPerHour => sums(
                Points(Some(LaborClass::Direct)),
                Hours(Some(LaborClass::Direct)),
                ClassifierField::JobType,
                Finish::Ratio { scale: 1.0 },
            ),
            Self::MinutesPerPoint => sums(
                Hours(None),
                Points(None),
                ClassifierField::JobType,
                Finish::Ratio { scale: 60.0 },
            ),
            Self::SecondsPerPoint => sums(
                Hours(None),
                Points(None),
                ClassifierField::JobType,
                Finish::Ratio { scale: 3600.0 },
            ),
            Self::DirectPercent => hours_share(LaborClass::Direct, ClassifierField::JobType),
            Self::IndirectPercent => hours_share(LaborClass::Indirect, ClassifierField::JobType),
            Self::AdminPercent => hours_share(LaborClass::Admin, ClassifierField::JobType),
            Self::GapPercent => hours_share(LaborClass::Gap, ClassifierField::Type),
            Self::KioskPercent => assignment_share(AssignmentKind::Kiosk),
            Self::ProactivePercent => assignment_share(AssignmentKind::Proactive),
            Self::ReactivePercent => assignment_share(AssignmentKind::Reactive),
            Self::DistinctCount => MetricRule {
                numerator: Nothing,
                denominator: Nothing,
                classifier: ClassifierField::JobType,
                finish: Finish::Numerator,
                rollup: Rollup::Distinct,
            },
            Self::Count => sums(
                Records,
                Nothing,
                ClassifierField::JobType,
                Finish::Numerator,
            ),
            Self::Points => buckets(EffectivePoints, Nothing, Finish::Numerator),
            Self::LocationPointsPerHour => {
                buckets(EffectivePoints, Hours(None), Finish::Ratio { scale: 1.0 })
            }
            Self::ActualMinutesPerPoint => {
                buckets(Hours(None), EffectivePoints, Finish::Ratio { scale: 60.0 })
            }
            Self::GoalMinutesPerPoint => {
                buckets(GoalHours, EffectivePoints, Finish::Ratio { scale: 60.0 })
            }
            Self::GoalHours => buckets(GoalHours, Nothing, Finish::Numerator),
            Self::HoursDelta => buckets(GoalHours, Hours(None), Finish::Difference),
            Self::PercentToGoal => buckets(GoalHours, Hours(None), Finish::Percent),
        }
    }

    /// Whether the value compares goal hours against actual hours.
    pub fn is_goal_comparison(self) -> bool {
        matches!(self, Self::HoursDelta | Self::PercentToGoal)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InsightsError::UnknownMetric(s.to_string()))
    }
}

/// Assignment counter a percentage reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentKind {
    Kiosk,
    Proactive,
    Reactive,
    Total,
}

/// What a single leaf contributes to one side of a ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    /// Points (effective when an index is available), optionally only for
    /// one labor class.
    Points(Option<LaborClass>),
    /// Effective points without a class filter; bucket rollups only.
    EffectivePoints,
    Hours(Option<LaborClass>),
    Assignments(AssignmentKind),
    GoalHours,
    /// One per leaf.
    Records,
    Nothing,
}

/// How the displayed value is derived from the rolled-up partials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Finish {
    /// `numerator * scale / denominator`, 0 on an empty denominator.
    Ratio { scale: f64 },
    /// `numerator / denominator * 100`, 0 on an empty denominator.
    Percent,
    /// `numerator - denominator`.
    Difference,
    Numerator,
}

/// Shape of the partials a metric carries between grouping levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollup {
    Sums,
    Distinct,
    /// Per (area, department) sums per labor class; combined with the
    /// max-not-sum policy only when the value is finished.
    LaborBuckets,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRule {
    pub numerator: Quantity,
    pub denominator: Quantity,
    pub classifier: ClassifierField,
    pub finish: Finish,
    pub rollup: Rollup,
}

impl MetricRule {
    pub fn with_classifier(mut self, classifier: ClassifierField) -> Self {
        self.classifier = classifier;
        self
    }

    /// Apply the finish rule. Never yields NaN or infinity.
    pub fn finish(&self, numerator: f64, denominator: f64) -> f64 {
        let value = match self.finish {
            Finish::Ratio { scale } if denominator > 0.0 => numerator * scale / denominator,
            Finish::Percent if denominator > 0.0 => numerator / denominator * 100.0,
            Finish::Ratio { .. } | Finish::Percent => 0.0,
            Finish::Difference => numerator - denominator,
            Finish::Numerator => numerator,
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}
