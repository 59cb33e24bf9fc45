//! Price-target watch engine
//!
//! Arms on a target price, samples the trend once the target is crossed
//! and decides whether to sell or hold.

mod manager;
mod sampler;
mod session;
mod types;

pub use manager::SessionManager;
pub use sampler::{decide, TrendSampler};
pub use session::{SessionDeps, WatchSession};
pub use types::{
    Decision, DecisionAction, Sample, SellExecution, SessionConfig, SessionOutcome, WatchError,
    WatchState, WatchStatus,
};
