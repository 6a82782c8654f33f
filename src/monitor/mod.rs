//! Monitoring module
//!
//! Batch probing with bounded concurrency and retries, the monitoring
//! cycle, and the seams to the inventory and notification collaborators.

pub mod batch;
pub mod cycle;
pub mod host;
pub mod inventory;
pub mod notify;
pub mod register;

pub use batch::{probe_many, probe_with_retry, Backoff, BatchOptions, BatchReport, RetryPolicy};
pub use cycle::{run_cycle, AlertDelivery, CycleEntry, CycleOptions, CycleReport, HostOutcome, Monitor};
pub use host::{is_expiring_soon, DisplayState, MonitoredHost, PresentedHost};
pub use inventory::{Inventory, MemoryInventory};
pub use notify::{LogNotifier, Notification, NotificationSink, Severity};
pub use register::check_new_host;
