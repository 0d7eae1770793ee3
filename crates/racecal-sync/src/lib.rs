//! Sync engine: reconciliation, orchestration, ingest and scheduling.
//!
//! A cycle reads desired records from storage and existing events from the
//! calendar, one race type at a time, and brings the calendar in line:
//!
//! ```text
//! RaceSource ──ingest──▶ StoragePort ──fetch──▶ EligibilityFilter
//!                                                      │
//!                  CalendarPort ──list──▶ reconcile ◀──┘
//!                       ▲                    │
//!                       └── delete, upsert ──┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use racecal_core::{EligibilityFilter, RaceType, TimeWindow};
//! use racecal_providers::{MemoryCalendar, MemoryStorage};
//! use racecal_sync::SyncOrchestrator;
//!
//! # async fn run(window: TimeWindow) {
//! let orchestrator = SyncOrchestrator::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MemoryCalendar::new()),
//!     EligibilityFilter::default(),
//! );
//! let report = orchestrator.sync(&window, &RaceType::ALL).await;
//! println!("{} failures", report.totals().failure_count);
//! # }
//! ```

mod config;
mod error;
mod ingest;
mod orchestrator;
mod reconcile;
mod scheduler;

pub use config::{MAX_WINDOW_DAYS, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use ingest::{IngestOptions, IngestReport, Ingestor};
pub use orchestrator::{RaceTypeOutcome, SyncOptions, SyncOrchestrator, SyncReport};
pub use reconcile::{ReconcilePlan, reconcile};
pub use scheduler::{
    CycleOutcome, Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState,
};
