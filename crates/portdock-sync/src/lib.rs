//! Live synchronization layer between the portdock UI and the external
//! process directory backend.
//!
//! The backend is reached only through the three-operation
//! [`ProcessDirectory`] boundary. [`SyncEngine`] owns the authoritative
//! [`SyncState`] and runs one fetch cycle at a time; [`PollScheduler`]
//! decides when cycles run (fixed interval, visibility suspend/resume,
//! retry-with-delay on failure).

pub mod directory;
pub mod engine;
pub mod scheduler;

pub use directory::{DirectoryError, ProcessDirectory};
pub use engine::{FetchOutcome, PollPolicy, SyncEngine, SyncState};
pub use scheduler::PollScheduler;
