//! Core logic for the Pandora/Vanguard orchestrator.
//!
//! The pieces fit together as a small pipeline: the two chain subscribers
//! push pending headers and shard infos into bounded slot caches and onto the
//! typed feeds; the verifier matches the two sides slot by slot, persists a
//! verdict and fans it out to downstream subscribers.

mod bls;
pub use bls::{BlstVerifier, SignatureVerifier, BLS_DST};

mod cache;
pub use cache::{CacheError, SlotCache, MAX_CACHE_SIZE};

mod config;
pub use config::{Config, DEFAULT_RECONNECT_PERIOD};

mod error;
pub use error::{SubscriberError, VerifierError};

mod event;
pub use event::{Feed, OrchestratorFeeds, DEFAULT_FEED_CAPACITY};

pub mod pandorachain;
pub use pandorachain::PandoraService;

pub mod vanguardchain;
pub use vanguardchain::VanguardService;

mod verifier;
pub use verifier::Verifier;
