//! Subscription service for the Pandora (execution) chain.

mod service;
pub use service::PandoraService;
