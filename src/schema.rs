/// Column-name constants for the workforce row shape.
/// Single source of truth - exported to Python via PyO3.

// ── Classifier columns ──────────────────────────────────────────────────────
pub mod classifier {
    pub const LABOR_TYPE: &str = "laborType";
    pub const TYPE: &str = "type";
    pub const JOB_TYPE: &str = "jobType";
}

// ── Quantity columns ────────────────────────────────────────────────────────
pub mod quantity {
    pub const HOURS: &str = "hours";
    pub const POINTS: &str = "points";
}

// ── Assignment count columns ────────────────────────────────────────────────
pub mod assignments {
    pub const KIOSK: &str = "kioskAssignments";
    pub const PROACTIVE: &str = "proactiveAssignments";
    pub const REACTIVE: &str = "reactiveAssignments";
    pub const TOTAL: &str = "totalAssignments";
}

// ── Effective-points bucket columns ─────────────────────────────────────────
pub mod bucket {
    pub const AREA: &str = "area";
    pub const AREA_ID: &str = "areaId";
    pub const DEPARTMENT: &str = "department";
    pub const DEPARTMENT_ID: &str = "departmentId";
}

// ── Goal parameter columns ──────────────────────────────────────────────────
pub mod goal {
    pub const SUPPORT_GOAL_PPH: &str = "supportGoalPointsPerHour";
    /// Older datasets carry the goal under this name.
    pub const SUPPORT_PPH_GOAL: &str = "supportPPHGoal";
}

// ── Identifier columns ──────────────────────────────────────────────────────
pub mod identity {
    pub const EMPLOYEE: &str = "employee";
}

// ── Output columns ──────────────────────────────────────────────────────────
pub mod output {
    pub const EFFECTIVE_POINTS: &str = "effectivePoints";
    pub const LEVEL: &str = "level";
    pub const NUMERATOR_SUFFIX: &str = "_numerator";
    pub const DENOMINATOR_SUFFIX: &str = "_denominator";
}
