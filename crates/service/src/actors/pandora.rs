use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use orchestrator_core::PandoraService;
use orchestrator_storage::VerdictStorageReader;
use tracing::info;

use crate::OrchestratorActor;

/// Drives the Pandora subscription service.
#[derive(Debug)]
pub struct PandoraActor<DB> {
    service: Arc<PandoraService<DB>>,
}

impl<DB> PandoraActor<DB> {
    /// Creates a new actor around the service.
    pub const fn new(service: Arc<PandoraService<DB>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<DB> OrchestratorActor for PandoraActor<DB>
where
    DB: VerdictStorageReader + std::fmt::Debug + 'static,
{
    type Error = Infallible;

    async fn start(self) -> Result<(), Self::Error> {
        info!(target: "orchestrator::pandora", "Starting Pandora subscriber actor");
        self.service.run().await;
        Ok(())
    }
}
