//! Resilient read access to an upstream employee catalog.
//!
//! This crate provides:
//!
//! - Read-through cache keyed by "all" and by id, with TTL and size bound
//! - Permit gate bounding concurrent upstream calls
//! - Upstream HTTP client with failure classification and retry
//! - SQLite replica used as fallback whenever the upstream cannot answer
//! - Scheduled cache reset
//!
//! # Quick Start
//!
//! ```no_run
//! use roster_core::{EmployeeResolver, RosterConfig};
//!
//! # async fn example() -> Result<(), roster_core::RosterError> {
//! let resolver = EmployeeResolver::from_config(&RosterConfig::from_env())?;
//!
//! for employee in resolver.resolve_all().await? {
//!     println!("{} {:?}", employee.id, employee.annual_salary);
//! }
//!
//! let annual = resolver.calculate_annual_salary("7").await?;
//! println!("annual salary: {annual}");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ROSTER_UPSTREAM_URL` | Upstream base URL (default: `https://dummy.restapiexample.com/api/v1`) |
//! | `ROSTER_UPSTREAM_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `ROSTER_UPSTREAM_MAX_RETRIES` | Max retries for transport failures (default: 2, so 3 attempts) |
//! | `ROSTER_CACHE_MAX_ENTRIES` | Cache size bound (default: 100) |
//! | `ROSTER_CACHE_TTL_MINUTES` | Cache expire-after-write (default: 60) |
//! | `ROSTER_CACHE_RESET_INTERVAL` | Reset interval in seconds (default: daily at 00:00 UTC) |
//! | `ROSTER_GATE_PERMITS` | Concurrent upstream permits (default: 5) |
//! | `ROSTER_GATE_TIMEOUT_MS` | Permit wait before proceeding anyway (default: 2000) |
//! | `ROSTER_DB_PATH` | Local replica path (default: `roster.db`) |

pub mod cache;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod maintenance;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export main types
pub use cache::{CacheKey, CachedValue, RecordCache};
pub use classify::classify;
pub use client::{HttpUpstream, UpstreamClient};
pub use config::{CacheConfig, GateConfig, RosterConfig, StoreConfig, UpstreamConfig};
pub use error::{
    ErrorKind, RosterError, RosterResult, StoreError, StoreResult, UpstreamError, UpstreamResult,
};
pub use gate::{GateStats, PermitGate, PermitGuard};
pub use maintenance::{spawn_cache_reset, until_next_midnight, CacheResetSchedule, CacheResetTask};
pub use resolver::{parse_id, EmployeeResolver, ResolveSource, UpstreamOutcome};
pub use store::{LocalStore, SqliteStore};
pub use types::{annualize, Employee, Envelope, RawEmployee, MONTHS_PER_YEAR};
