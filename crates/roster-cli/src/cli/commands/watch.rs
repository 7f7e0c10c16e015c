//! Long-running mode: resolve on an interval while the scheduled cache reset runs.

use std::time::Duration;

use roster_core::{spawn_cache_reset, CacheResetSchedule, EmployeeResolver, RosterConfig};
use tracing::{info, warn};

use super::super::args::WatchArgs;
use crate::exit_codes;

pub async fn run(config: RosterConfig, args: WatchArgs) -> anyhow::Result<i32> {
    let resolver = EmployeeResolver::from_config(&config)?;
    let schedule = match args.reset_secs {
        Some(secs) => CacheResetSchedule::Every(Duration::from_secs(secs)),
        None => config.cache.reset_schedule(),
    };
    let reset = spawn_cache_reset(resolver.cache().clone(), schedule);

    let mut ticker = tokio::time::interval(Duration::from_secs(args.refresh_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match resolver.resolve_all_with_source().await {
                    Ok((employees, source)) => {
                        let stats = resolver.gate().stats();
                        info!(
                            count = employees.len(),
                            %source,
                            cached_entries = resolver.cache().entry_count(),
                            permits_bypassed = stats.bypassed,
                            "resolved employees"
                        );
                    }
                    Err(e) => warn!(error = %e, "resolution failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    reset.shutdown();
    Ok(exit_codes::SUCCESS)
}
