pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod receipt;
pub mod registry;
pub mod sequence;
pub mod snapshot;
pub mod storage;
pub mod validate;

pub use auth::{AuthorizationPolicy, CreatorOnly, Principal};
pub use clock::{Clock, ClockKind, ManualClock, SystemClock};
pub use config::TallyConfig;
pub use error::{Result, TallyError};
pub use ledger::Ledger;
pub use receipt::Receipt;
pub use registry::{CallContext, DecisionRegistry, ForecastRegistry};
pub use storage::LoroStore;
