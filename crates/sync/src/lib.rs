//! Moving cycle documents between the remote content store, the local cache
//! mirror and the in-memory [`rota_roster::CycleStore`].
//!
//! The gateway is the only code that talks to the network.  Everything it
//! needs from the remote side goes through the [`ContentStore`] trait so it
//! can run against [`MemoryStore`] in tests.

pub mod cache;
pub mod codec;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod github;
pub mod memory;
pub mod store;

pub use cache::{CacheSlot, LocalCache};
pub use discovery::{Stream, discover_streams, fallback_streams, offline_streams, try_discover};
pub use error::SyncError;
pub use gateway::{PullReport, PushReport, SyncGateway, SyncState};
pub use github::GithubContentStore;
pub use memory::MemoryStore;
pub use store::{ContentStore, PutRequest, RemoteDocument, RemoteEntry};
