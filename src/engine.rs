use crate::activity::{ActivityLog, ActivityLogEntry};
use crate::collaborators::{
    AuditSink, Clock, DemoModeProvider, DiscardDownload, DownloadSurface, StaticDemoMode,
    SystemClock, TracingAuditSink,
};
use crate::config::EngineConfig;
use crate::error::InterchangeResult;
use crate::persistence::{PersistenceResult, StoreKey, TaskStore, load_typed, save_typed};
use crate::project::ProjectConfig;
use crate::quota::{QuotaTracker, QuotaUsage};
use crate::task::Task;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// One mutex per project id, created on first use and dropped again once the last
/// guard for that project is released.
///
/// Held across each pipeline's read-modify-write sequence so two requests against the
/// same project cannot interleave their reads and writes.
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Guard returned by [`ProjectLocks::lock`]; owns its `Arc` so it can outlive the table lock.
pub struct ProjectGuard<'a> {
    table: &'a ProjectLocks,
    project_id: String,
    guard: Option<parking_lot::ArcMutexGuard<parking_lot::RawMutex, ()>>,
}

impl ProjectLocks {
    pub fn lock(&self, project_id: &str) -> ProjectGuard<'_> {
        let lock = {
            let mut table: MutexGuard<'_, _> = self.locks.lock();
            table
                .entry(project_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        ProjectGuard {
            table: self,
            project_id: project_id.to_string(),
            guard: Some(lock.lock_arc()),
        }
    }

    fn release(&self, project_id: &str) {
        let mut table = self.locks.lock();
        // Waiters clone the entry under this same table lock, so a count of one means
        // nobody else holds or is queued on it.
        if table
            .get(project_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            table.remove(project_id);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Drop for ProjectGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.table.release(&self.project_id);
    }
}

/// Entry point for imports and exports.
///
/// Holds only collaborators and configuration; all project data is read from and
/// written to the [`TaskStore`] on every call.
pub struct InterchangeEngine {
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) demo_mode: Arc<dyn DemoModeProvider>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) download: Arc<dyn DownloadSurface>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: EngineConfig,
    pub(crate) locks: ProjectLocks,
}

impl InterchangeEngine {
    /// Engine with a static demo flag taken from `config`, tracing audit output, no
    /// download delivery and the system clock.
    pub fn new(store: Arc<dyn TaskStore>, config: EngineConfig) -> Self {
        Self {
            store,
            demo_mode: Arc::new(StaticDemoMode::new(config.demo_mode)),
            audit: Arc::new(TracingAuditSink),
            download: Arc::new(DiscardDownload),
            clock: Arc::new(SystemClock),
            config,
            locks: ProjectLocks::default(),
        }
    }

    pub fn with_demo_mode(mut self, provider: Arc<dyn DemoModeProvider>) -> Self {
        self.demo_mode = provider;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn with_download(mut self, download: Arc<dyn DownloadSurface>) -> Self {
        self.download = download;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    pub fn is_demo_mode_active(&self) -> bool {
        self.demo_mode.is_demo_mode_active()
    }

    pub(crate) fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub(crate) fn quota(&self) -> QuotaTracker<'_> {
        QuotaTracker::new(&self.config.demo_limits)
    }

    pub(crate) fn activity_log(&self, project_id: &str) -> ActivityLog<'_> {
        ActivityLog::new(self.store.as_ref(), self.namespace(), project_id)
    }

    pub fn tasks(&self, project_id: &str) -> PersistenceResult<Vec<Task>> {
        load_typed(self.store(), &StoreKey::tasks(project_id), self.namespace())
    }

    pub fn project_config(&self, project_id: &str) -> PersistenceResult<ProjectConfig> {
        load_typed(self.store(), &StoreKey::project(project_id), self.namespace())
    }

    /// Replaces the project settings document, keeping `lastImport` when the caller
    /// omits it.
    pub fn update_project_config(
        &self,
        project_id: &str,
        mut config: ProjectConfig,
    ) -> PersistenceResult<ProjectConfig> {
        let _guard = self.locks.lock(project_id);
        let key = StoreKey::project(project_id);
        let current: ProjectConfig = load_typed(self.store(), &key, self.namespace())?;
        if config.last_import.is_none() {
            config.last_import = current.last_import;
        }
        save_typed(self.store(), &key, &config, self.namespace())?;
        Ok(config)
    }

    pub fn activity(&self, project_id: &str) -> PersistenceResult<Vec<ActivityLogEntry>> {
        self.activity_log(project_id).entries()
    }

    pub fn quota_usage(&self, project_id: &str) -> InterchangeResult<QuotaUsage> {
        let log = self.activity_log(project_id).entries()?;
        let today = self.clock.now().date_naive();
        Ok(self.quota().usage(self.is_demo_mode_active(), &log, today))
    }
}
