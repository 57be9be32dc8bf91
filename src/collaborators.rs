//! Interfaces the engine consumes but does not own, with the implementations the
//! binaries and tests use.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub trait DemoModeProvider: Send + Sync {
    fn is_demo_mode_active(&self) -> bool;
}

/// Demo flag held in memory and switchable at runtime.
#[derive(Debug, Default)]
pub struct StaticDemoMode {
    active: AtomicBool,
}

impl StaticDemoMode {
    pub fn new(active: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
        }
    }

    pub fn set(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }
}

impl DemoModeProvider for StaticDemoMode {
    fn is_demo_mode_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub project_id: String,
    pub actor_id: String,
    pub action_type: String,
    pub message: String,
    pub before_state: Value,
    pub after_metadata: Value,
}

pub trait AuditSink: Send + Sync {
    fn log_action(&self, record: &AuditRecord);
}

/// Emits audit records as structured log events.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log_action(&self, record: &AuditRecord) {
        tracing::info!(
            target: "audit",
            project = %record.project_id,
            actor = %record.actor_id,
            action = %record.action_type,
            after = %record.after_metadata,
            "{}",
            record.message
        );
    }
}

#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn log_action(&self, record: &AuditRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Where finished exports are delivered. Failures are reported to the caller of
/// `download` only; the export pipeline logs them and moves on.
pub trait DownloadSurface: Send + Sync {
    fn download(&self, bytes: &[u8], file_name: &str) -> io::Result<()>;
}

/// Drops the bytes. Used when the caller returns them itself, as the HTTP API does.
#[derive(Debug, Default)]
pub struct DiscardDownload;

impl DownloadSurface for DiscardDownload {
    fn download(&self, _bytes: &[u8], _file_name: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Writes each export into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownload {
    dir: PathBuf,
}

impl DirectoryDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSurface for DirectoryDownload {
    fn download(&self, bytes: &[u8], file_name: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(file_name), bytes)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock();
        *guard += by;
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
