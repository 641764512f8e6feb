// Request governance module
// Author: kelexine (https://github.com/kelexine)

pub mod limiter;
pub mod models;

pub use limiter::{RequestGovernor, DAILY_STATE_KEY};
pub use models::{DenialReason, Permission, UsageStats};
