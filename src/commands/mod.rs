//! Use cases behind the intake boundary
//!
//! Each command takes the shared `AppState` and one request's data.

pub mod diagnostic;
pub mod history;

pub use diagnostic::{diagnose, DiagnosticOutcome, SyncStatus};
pub use history::history;
