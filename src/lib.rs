pub mod activity;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod formats;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod import;
pub mod persistence;
pub mod programme;
pub mod project;
pub mod quota;
pub mod settings;
pub mod task;

pub use activity::{ActivityLog, ActivityLogEntry};
pub use collaborators::{
    AuditRecord, AuditSink, Clock, DemoModeProvider, DirectoryDownload, DiscardDownload,
    DownloadSurface, FixedClock, MemoryAuditSink, StaticDemoMode, SystemClock, TracingAuditSink,
};
pub use config::{ConfigError, EngineConfig, StoreBackend};
pub use engine::{InterchangeEngine, ProjectLocks};
pub use error::{InterchangeError, InterchangeResult};
pub use export::{ExportArtifact, ExportReport};
pub use formats::{ExportPayload, GeneratedFile, ImportFile};
pub use import::{ImportReport, ImportSummary};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTaskStore;
pub use persistence::{
    FileTaskStore, MemoryTaskStore, PersistenceError, PersistenceResult, StoreKey, TaskStore,
};
pub use programme::{ParseWarning, ParsedProgramme};
pub use project::{LastImport, ProjectConfig};
pub use quota::{DemoLimits, QuotaTracker, QuotaUsage};
pub use settings::{DateRange, ExportSettings, FileType};
pub use task::Task;
