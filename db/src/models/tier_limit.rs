use common::feature::LimitKind;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TierLimit {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub feature: String,
    pub create_limit: i32,
    pub create_usage: i32,
    pub update_limit: i32,
    pub update_usage: i32,
}

impl TierLimit {
    /// `limit - usage` for the given counter pair; may be negative when a plan was downgraded.
    pub fn remaining(&self, kind: LimitKind) -> i32 {
        match kind {
            LimitKind::Create => self.create_limit - self.create_usage,
            LimitKind::Update => self.update_limit - self.update_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_is_limit_minus_usage() {
        let limit = TierLimit {
            id: Uuid::nil(),
            subscription_id: Uuid::nil(),
            feature: "GA4Properties".to_string(),
            create_limit: 5,
            create_usage: 4,
            update_limit: 3,
            update_usage: 5,
        };
        assert_eq!(limit.remaining(LimitKind::Create), 1);
        assert_eq!(limit.remaining(LimitKind::Update), -2);
    }
}
