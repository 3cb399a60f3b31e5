//! [`OrchestratorActor`] trait.

use async_trait::async_trait;

/// An actor-like long-lived worker of the orchestrator.
///
/// Actors own their inbound channels and run until cancellation or a fatal
/// error; transient upstream failures are handled inside the actor.
#[async_trait]
pub trait OrchestratorActor {
    /// The error type for the actor.
    type Error: std::fmt::Debug;

    /// Starts the actor, consuming it.
    async fn start(self) -> Result<(), Self::Error>;
}
