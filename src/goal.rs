use std::str::FromStr;

use crate::error::InsightsError;
use crate::record::{ClassifierField, LaborClass, LeafRecord};

/// Direct labor goal when nothing else is configured: 100 points per hour,
/// i.e. 0.6 minutes or 36 seconds per point.
pub const DEFAULT_DIRECT_GOAL_PPH: f64 = 100.0;

/// Unit family a rate is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateUnit {
    PointsPerHour,
    MinutesPerPoint,
    SecondsPerPoint,
}

impl RateUnit {
    /// Time units per hour; the factor between hours and this unit's time.
    pub fn per_hour(self) -> f64 {
        match self {
            Self::PointsPerHour => 1.0,
            Self::MinutesPerPoint => 60.0,
            Self::SecondsPerPoint => 3600.0,
        }
    }
}

impl FromStr for RateUnit {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pph" => Ok(Self::PointsPerHour),
            "mpp" => Ok(Self::MinutesPerPoint),
            "spp" => Ok(Self::SecondsPerPoint),
            other => Err(InsightsError::General(format!(
                "Invalid rate unit: '{}'. Must be 'pph', 'mpp' or 'spp'",
                other
            ))),
        }
    }
}

/// Goal parameters shared by every goal metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalSettings {
    pub direct_goal_pph: f64,
    /// Column holding the labor class that decides which goal applies.
    pub classifier: ClassifierField,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            direct_goal_pph: DEFAULT_DIRECT_GOAL_PPH,
            classifier: ClassifierField::LaborType,
        }
    }
}

impl GoalSettings {
    /// Goal in points per hour. `0.0` means no goal applies.
    pub fn goal_pph(&self, record: &LeafRecord) -> f64 {
        match record.class(self.classifier) {
            LaborClass::Direct => self.direct_goal_pph.max(0.0),
            LaborClass::Support => record
                .support_goal_pph
                .filter(|pph| pph.is_finite() && *pph > 0.0)
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Goal rate converted to `unit`. Zero stays zero in every unit.
    pub fn goal_rate(&self, record: &LeafRecord, unit: RateUnit) -> f64 {
        let pph = self.goal_pph(record);
        if pph <= 0.0 {
            return 0.0;
        }
        match unit {
            RateUnit::PointsPerHour => pph,
            RateUnit::MinutesPerPoint | RateUnit::SecondsPerPoint => unit.per_hour() / pph,
        }
    }

    /// Hours the given points should have taken at goal pace.
    ///
    /// Equivalent to `points * goal_rate(unit) / unit.per_hour()` for the
    /// time-per-point units.
    pub fn goal_hours(&self, record: &LeafRecord, points: f64) -> f64 {
        let pph = self.goal_pph(record);
        if points > 0.0 && pph > 0.0 {
            points / pph
        } else {
            0.0
        }
    }
}

/// Outcome of comparing actual hours against goal hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    /// No goal applies; goal styling must be suppressed.
    NoGoal,
    Met,
    Missed,
}

impl GoalStatus {
    pub fn evaluate(goal_hours: f64, hours: f64) -> Self {
        if !(goal_hours > 0.0) {
            Self::NoGoal
        } else if hours <= goal_hours {
            Self::Met
        } else {
            Self::Missed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn direct_goal_converts_between_units() {
        let goals = GoalSettings::default();
        let direct = LeafRecord::labor("Direct", 8.0, 500.0);

        assert!(close(goals.goal_rate(&direct, RateUnit::PointsPerHour), 100.0));
        assert!(close(goals.goal_rate(&direct, RateUnit::MinutesPerPoint), 0.6));
        assert!(close(goals.goal_rate(&direct, RateUnit::SecondsPerPoint), 36.0));
        assert!(close(goals.goal_hours(&direct, 500.0), 5.0));
    }

    #[test]
    fn support_goal_comes_from_the_record() {
        let goals = GoalSettings::default();
        let support = LeafRecord::labor("Support", 4.0, 0.0).with_support_goal(120.0);

        assert!(close(goals.goal_rate(&support, RateUnit::MinutesPerPoint), 0.5));
        assert!(close(goals.goal_rate(&support, RateUnit::SecondsPerPoint), 30.0));
        assert!(close(goals.goal_hours(&support, 240.0), 2.0));
    }

    #[test]
    fn unset_or_non_positive_goal_is_no_goal() {
        let goals = GoalSettings::default();
        let unset = LeafRecord::labor("Support", 4.0, 100.0);
        let zero = unset.clone().with_support_goal(0.0);
        let negative = unset.clone().with_support_goal(-5.0);
        let other = LeafRecord::labor("Admin", 4.0, 100.0);

        for record in [&unset, &zero, &negative, &other] {
            assert_eq!(goals.goal_rate(record, RateUnit::MinutesPerPoint), 0.0);
            assert_eq!(goals.goal_hours(record, 100.0), 0.0);
        }
        assert_eq!(GoalStatus::evaluate(0.0, 4.0), GoalStatus::NoGoal);
    }

    #[test]
    fn goal_status_compares_hours() {
        assert_eq!(GoalStatus::evaluate(5.0, 4.0), GoalStatus::Met);
        assert_eq!(GoalStatus::evaluate(5.0, 5.0), GoalStatus::Met);
        assert_eq!(GoalStatus::evaluate(5.0, 6.0), GoalStatus::Missed);
        assert_eq!(GoalStatus::evaluate(f64::NAN, 6.0), GoalStatus::NoGoal);
    }

    #[test]
    fn rate_unit_parses_host_names() {
        assert_eq!("MPP".parse::<RateUnit>().unwrap(), RateUnit::MinutesPerPoint);
        assert!("per-day".parse::<RateUnit>().is_err());
    }
}
