use middleware::global::GlobalLimiter;

pub mod middleware {
    pub mod global;
}
pub mod throttle;
pub mod tier;

pub use throttle::ProviderThrottle;
pub use tier::{Admission, PgLedger, TierGate, UsageLedger};

pub fn global_middleware(permits_per_second: u32) -> GlobalLimiter {
    GlobalLimiter::new(permits_per_second)
}
