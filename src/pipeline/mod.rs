//! Poll orchestration.
//!
//! One cycle: fetch → extract (with layout fallback) → diff against the
//! novelty store → dispatch → mark → heartbeat check. The monitor drives
//! cycles on a fixed interval and owns the bounded startup-connect retry
//! loop for the store.

pub mod cycle;
pub mod monitor;

pub use cycle::{CycleOutcome, Watcher};
pub use monitor::{connect_store, run_monitor};
