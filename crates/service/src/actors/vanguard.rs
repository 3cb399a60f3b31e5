use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use orchestrator_core::VanguardService;
use orchestrator_storage::{EpochStorageWriter, VerdictStorageReader};
use tracing::info;

use crate::OrchestratorActor;

/// Drives the Vanguard subscription service.
#[derive(Debug)]
pub struct VanguardActor<DB> {
    service: Arc<VanguardService<DB>>,
}

impl<DB> VanguardActor<DB> {
    /// Creates a new actor around the service.
    pub const fn new(service: Arc<VanguardService<DB>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<DB> OrchestratorActor for VanguardActor<DB>
where
    DB: EpochStorageWriter + VerdictStorageReader + std::fmt::Debug + 'static,
{
    type Error = Infallible;

    async fn start(self) -> Result<(), Self::Error> {
        info!(target: "orchestrator::vanguard", "Starting Vanguard subscriber actor");
        self.service.run().await;
        Ok(())
    }
}
