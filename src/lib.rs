pub mod config;
pub mod local;
pub mod remote;
pub mod review;

pub use config::{BackendMode, Config};
pub use local::LocalStore;
pub use remote::{ApiClient, RemoteError, ReviewLogSource, ReviewOutcomeGateway, SnapshotSource};
