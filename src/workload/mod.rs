//! 周负荷核心逻辑：ISO 周、配额台账、负荷分级、状态流转

pub mod classifier;
pub mod ledger;
pub mod lifecycle;
pub mod week;

pub use classifier::{
    ClassStatus, DashboardOverview, GradeSummary, LoadClassification, LoadTier, aggregate_by_grade,
    classify_class, empty_grade, summarize,
};
pub use ledger::{
    ClassUsage, QuotaCheck, QuotaLedger, QuotaLimits, QuotaUsage, QuotaViolation, QuotaWrite,
    WeeklyQuota, find_violations,
};
pub use lifecycle::{Transition, display_status, plan_transition};
pub use week::{WeekInfo, current_week_info};
