use common::feature::Feature;
use serde::Serialize;

/// Limits of one feature granted by a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimit {
    pub feature: Feature,
    pub create_limit: i32,
    pub update_limit: i32,
}
