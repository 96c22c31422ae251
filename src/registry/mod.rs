//! Registries own their records and enforce authorization and numeric
//! invariants on every mutation.
//!
//! Each mutating operation runs in two phases: a validation phase that only
//! reads state and may fail, then a commit phase that cannot fail. A rejected
//! call therefore leaves the registry exactly as it was.

mod decision;
mod forecast;

pub use decision::DecisionRegistry;
pub use forecast::{ForecastRegistry, ForecastSummary};

use tracing::{error, warn};

use crate::auth::Principal;
use crate::clock::Clock;
use crate::error::Result;

/// Identity and timestamp the host resolved for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Principal,
    pub at: u64,
}

impl CallContext {
    pub fn new(caller: Principal, at: u64) -> Self {
        Self { caller, at }
    }

    pub fn from_clock(caller: Principal, clock: &dyn Clock) -> Self {
        Self::new(caller, clock.now())
    }
}

/// Log a rejected validation phase before handing the result back.
fn audited<T>(op: &'static str, ctx: &CallContext, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        if err.is_fatal() {
            error!(op, caller = %ctx.caller, code = err.code(), "{}", err);
        } else {
            warn!(op, caller = %ctx.caller, code = err.code(), "rejected: {}", err);
        }
    }
    result
}
