use crate::aggregation::AggregationContext;
use crate::effective::EffectivePointsIndex;
use crate::goal::GoalSettings;
use crate::metric::MetricKind;
use crate::record::ClassifierField;
use crate::schema::identity;

/// Configuration for one dashboard dataset.
#[derive(Debug, Clone)]
pub struct InsightsConfig {
    /// Goal parameters. `goals.classifier` is the labor classifier: it
    /// decides goals, the Support redistribution and the labor buckets.
    pub goals: GoalSettings,
    /// Run the Support-labor redistribution before aggregating
    /// (location-level datasets).
    pub effective_points: bool,
    /// Per-metric classifier column overrides. Labor-bucket metrics ignore
    /// these and follow `goals.classifier`.
    pub classifier_overrides: Vec<(MetricKind, ClassifierField)>,
    /// Default grouping columns, outermost first.
    pub group_by: Vec<String>,
    /// Column whose values distinct counts collect.
    pub identifier_column: String,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            goals: GoalSettings::default(),
            effective_points: true,
            classifier_overrides: Vec::new(),
            group_by: Vec::new(),
            identifier_column: identity::EMPLOYEE.to_string(),
        }
    }
}

impl InsightsConfig {
    /// Resolve the aggregation context. The index is ignored when
    /// redistribution is switched off.
    pub fn context<'a>(&self, index: Option<&'a EffectivePointsIndex>) -> AggregationContext<'a> {
        let mut ctx = AggregationContext::new(self.goals);
        if let Some(index) = index.filter(|_| self.effective_points) {
            ctx = ctx.with_effective_points(index);
        }
        for (metric, field) in &self.classifier_overrides {
            ctx = ctx.with_classifier(*metric, *field);
        }
        ctx
    }
}
