//! Employee resolution.
//!
//! Resolves reads in this order:
//! 1. Read-through cache (hit returns immediately)
//! 2. Upstream, behind the permit gate
//! 3. Local replica, when the upstream fails or answers without data
//!
//! Upstream failures never reach the caller of a read. They select the fallback and
//! are logged with the reason. Only a malformed id and an uncomputable annual salary
//! are caller-visible errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::cache::RecordCache;
use crate::client::{HttpUpstream, UpstreamClient};
use crate::config::RosterConfig;
use crate::error::{
    RosterError, RosterResult, StoreError, StoreResult, UpstreamError, UpstreamResult,
};
use crate::gate::PermitGate;
use crate::store::{LocalStore, SqliteStore};
use crate::types::{Employee, RawEmployee};

/// What one gated upstream call produced.
#[derive(Debug)]
pub enum UpstreamOutcome<T> {
    /// Data was returned.
    Fresh(T),
    /// The upstream answered without data.
    Miss,
    /// The call failed; the error is already classified.
    Failed(UpstreamError),
}

impl<T> UpstreamOutcome<T> {
    fn from_result(result: UpstreamResult<Option<T>>) -> Self {
        match result {
            Ok(Some(data)) => Self::Fresh(data),
            Ok(None) => Self::Miss,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Where a resolution was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    Cache,
    Upstream,
    LocalStore,
}

impl std::fmt::Display for ResolveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Upstream => write!(f, "upstream"),
            Self::LocalStore => write!(f, "local-store"),
        }
    }
}

/// Parse the external id form.
pub fn parse_id(input: &str) -> RosterResult<i64> {
    input.parse::<i64>().map_err(|_| RosterError::InvalidId {
        input: input.to_string(),
    })
}

/// Orchestrates cache, permit gate, upstream, fallback and persistence.
#[derive(Clone)]
pub struct EmployeeResolver {
    client: Arc<dyn UpstreamClient>,
    store: Arc<dyn LocalStore>,
    cache: RecordCache,
    gate: PermitGate,
}

impl std::fmt::Debug for EmployeeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmployeeResolver")
            .field("cache", &self.cache)
            .field("gate", &self.gate.stats())
            .finish_non_exhaustive()
    }
}

impl EmployeeResolver {
    /// Build from explicitly constructed components.
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        store: Arc<dyn LocalStore>,
        cache: RecordCache,
        gate: PermitGate,
    ) -> Self {
        Self {
            client,
            store,
            cache,
            gate,
        }
    }

    /// Wire the HTTP upstream, SQLite replica, cache and gate from configuration.
    pub fn from_config(config: &RosterConfig) -> RosterResult<Self> {
        config.validate()?;

        let client = HttpUpstream::new(&config.upstream)?;
        let store = SqliteStore::open(&config.store.path)?;
        let cache = RecordCache::new(config.cache.max_entries, config.cache.ttl());
        let gate = PermitGate::new(config.gate.permits, config.gate.acquire_timeout());

        info!(
            upstream = %client.base_url(),
            store = %config.store.path.display(),
            permits = config.gate.permits,
            "employee resolver ready"
        );

        Ok(Self::new(Arc::new(client), Arc::new(store), cache, gate))
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn gate(&self) -> &PermitGate {
        &self.gate
    }

    /// Resolve every employee. Never fails because of the upstream.
    pub async fn resolve_all(&self) -> RosterResult<Vec<Employee>> {
        self.resolve_all_with_source().await.map(|(list, _)| list)
    }

    pub async fn resolve_all_with_source(&self) -> RosterResult<(Vec<Employee>, ResolveSource)> {
        if let Some(cached) = self.cache.get_all() {
            debug!(count = cached.len(), "all employees served from cache");
            return Ok((cached, ResolveSource::Cache));
        }

        let outcome = {
            let _permit = self.gate.acquire("get_all").await;
            UpstreamOutcome::from_result(self.client.get_all().await)
        };

        match outcome {
            UpstreamOutcome::Fresh(raw) if !raw.is_empty() => {
                let employees = self.refresh_all(raw, Utc::now()).await;
                Ok((employees, ResolveSource::Upstream))
            }
            UpstreamOutcome::Fresh(_) | UpstreamOutcome::Miss => {
                warn!("null or empty response when retrieving all employees");
                self.fallback_all().await.map(|list| (list, ResolveSource::LocalStore))
            }
            UpstreamOutcome::Failed(err) => {
                log_degradation(&err, None);
                self.fallback_all().await.map(|list| (list, ResolveSource::LocalStore))
            }
        }
    }

    /// Resolve one employee by its external id. `Ok(None)` means not found anywhere.
    pub async fn resolve_by_id(&self, id: &str) -> RosterResult<Option<Employee>> {
        self.resolve_by_id_with_source(id)
            .await
            .map(|found| found.map(|(employee, _)| employee))
    }

    pub async fn resolve_by_id_with_source(
        &self,
        id: &str,
    ) -> RosterResult<Option<(Employee, ResolveSource)>> {
        let id = parse_id(id)?;

        if let Some(cached) = self.cache.get_one(id) {
            debug!(id, "employee served from cache");
            return Ok(Some((cached, ResolveSource::Cache)));
        }

        let outcome = {
            let _permit = self.gate.acquire("get_by_id").await;
            UpstreamOutcome::from_result(self.client.get_by_id(id).await)
        };

        match outcome {
            UpstreamOutcome::Fresh(raw) => {
                let employee = self.refresh_one(raw, Utc::now()).await;
                Ok(Some((employee, ResolveSource::Upstream)))
            }
            UpstreamOutcome::Miss => {
                warn!(id, "employee not returned by upstream");
                self.fallback_one(id)
                    .await
                    .map(|found| found.map(|e| (e, ResolveSource::LocalStore)))
            }
            UpstreamOutcome::Failed(err) => {
                log_degradation(&err, Some(id));
                self.fallback_one(id)
                    .await
                    .map(|found| found.map(|e| (e, ResolveSource::LocalStore)))
            }
        }
    }

    /// Annual salary for one employee, recomputed from the monthly base.
    pub async fn calculate_annual_salary(&self, id: &str) -> RosterResult<f64> {
        let parsed = parse_id(id)?;
        let employee = self.resolve_by_id(id).await?;

        match employee.and_then(|e| e.salary) {
            Some(monthly) => Ok(monthly * crate::types::MONTHS_PER_YEAR),
            None => Err(RosterError::NotFound { id: parsed }),
        }
    }

    /// Clear every cached resolution.
    pub fn clear_cache(&self) {
        info!("clearing employee cache");
        self.cache.evict_all();
    }

    /// Case-(in)sensitive name search over the local replica only.
    pub fn search_by_name(
        &self,
        needle: &str,
        case_insensitive: bool,
    ) -> RosterResult<Vec<Employee>> {
        Ok(self.store.find_by_name_containing(needle, case_insensitive)?)
    }

    /// Records refreshed from the upstream after `since`, from the local replica only.
    pub fn updated_since(&self, since: DateTime<Utc>) -> RosterResult<Vec<Employee>> {
        Ok(self.store.find_updated_after(since)?)
    }

    /// Run a replica call on the blocking pool.
    async fn with_store<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn LocalStore) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn refresh_all(&self, raw: Vec<RawEmployee>, now: DateTime<Utc>) -> Vec<Employee> {
        let employees: Vec<Employee> = raw
            .into_iter()
            .map(|r| Employee::from_raw(r).refreshed(now))
            .collect();

        let batch = employees.clone();
        match self.with_store(move |store| store.save_all(&batch)).await {
            Ok(saved) => info!(count = saved.len(), "saved employees to local store"),
            Err(e) => error!(error = %e, "failed to persist employees to local store"),
        }

        self.cache.put_all(&employees);
        employees
    }

    async fn refresh_one(&self, raw: RawEmployee, now: DateTime<Utc>) -> Employee {
        let employee = Employee::from_raw(raw).refreshed(now);

        let record = employee.clone();
        match self.with_store(move |store| store.save(&record)).await {
            Ok(saved) => info!(id = saved.id, "saved employee to local store"),
            Err(e) => error!(id = employee.id, error = %e, "failed to persist employee"),
        }

        self.cache.put_one(employee.clone());
        employee
    }

    async fn fallback_all(&self) -> RosterResult<Vec<Employee>> {
        info!("using local store for all employees");
        let employees = self.with_store(|store| store.find_all()).await?;

        if employees.is_empty() {
            warn!("no employees found in local store");
            return Ok(employees);
        }

        self.cache.put_all(&employees);
        Ok(employees)
    }

    async fn fallback_one(&self, id: i64) -> RosterResult<Option<Employee>> {
        info!(id, "using local store for employee");

        match self.with_store(move |store| store.find_by_id(id)).await? {
            Some(employee) => {
                self.cache.put_one(employee.clone());
                Ok(Some(employee))
            }
            None => {
                warn!(id, "no employee found in local store");
                Ok(None)
            }
        }
    }
}

fn log_degradation(err: &UpstreamError, id: Option<i64>) {
    let kind = err.kind();
    match err {
        UpstreamError::RateLimited { .. } => {
            warn!(?id, %kind, error = %err, "upstream rate limited; falling back to local store")
        }
        UpstreamError::NotFound { .. } => {
            warn!(?id, %kind, error = %err, "upstream reported not found; falling back to local store")
        }
        _ => error!(?id, %kind, error = %err, "upstream call failed; falling back to local store"),
    }
}
