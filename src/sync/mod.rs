pub mod connection;
pub mod scheduler;
pub mod worker;

pub use connection::{ConnectionMonitor, ConnectionStatus};
pub use scheduler::{RefreshCoordinator, RefreshSettings};
pub use worker::{FetchOutcome, FetchSequence};
