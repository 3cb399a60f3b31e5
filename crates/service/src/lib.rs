//! Actor wiring and lifecycle management for the orchestrator.
//!
//! [`Orchestrator`] owns the store, the feeds, the caches and the services,
//! spawns one actor per long-lived worker and joins them on shutdown. A
//! single [`CancellationToken`] propagates `stop()` to every worker.

mod actors;
pub use actors::{OrchestratorActor, PandoraActor, RpcActor, VanguardActor, VerifierActor};

use orchestrator_core::{
    BlstVerifier, Config, OrchestratorFeeds, PandoraService, SlotCache, VanguardService, Verifier,
};
use orchestrator_rpc::OrchestratorRpcServer;
use orchestrator_storage::{OrchestratorDb, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Fatal orchestrator failures; everything else is retried internally.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Opening the durable store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Binding the RPC listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The assembled orchestrator process.
#[derive(Debug)]
pub struct Orchestrator {
    config: Config,
    cancel_token: CancellationToken,
}

impl Orchestrator {
    /// Creates a new orchestrator from its configuration.
    pub fn new(config: Config) -> Self {
        Self { config, cancel_token: CancellationToken::new() }
    }

    /// The token cancelling every worker.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Requests shutdown; [`Self::run`] returns once all workers exited.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Opens the store, wires the components together and runs all actors to
    /// completion.
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        let db = Arc::new(OrchestratorDb::new(&self.config.database_path())?);

        let feeds = OrchestratorFeeds::default();
        let pan_cache = Arc::new(SlotCache::new(self.config.max_cache_size));
        let van_cache = Arc::new(SlotCache::new(self.config.max_cache_size));

        let pandora = Arc::new(PandoraService::new(
            self.config.pandora_endpoint.clone(),
            self.config.pandora_namespace.clone(),
            self.config.reconnect_period,
            db.clone(),
            pan_cache.clone(),
            feeds.pending_pan_header.clone(),
            self.cancel_token.clone(),
        ));
        let vanguard = Arc::new(VanguardService::new(
            self.config.vanguard_endpoint.clone(),
            self.config.reconnect_period,
            db.clone(),
            van_cache.clone(),
            feeds.clone(),
            self.cancel_token.clone(),
        ));
        let verifier = Arc::new(Verifier::new(
            db.clone(),
            BlstVerifier,
            pan_cache,
            van_cache,
            feeds.verdict.clone(),
        ));
        let rpc_server =
            OrchestratorRpcServer::new(db, feeds.consensus_info.clone(), self.config.rpc_addr);

        // The verifier actor subscribes before anything is spawned so no
        // early event is lost.
        let verifier_actor = VerifierActor::new(verifier, &feeds, self.cancel_token.clone());

        let token = &self.cancel_token;
        let mut workers = JoinSet::new();
        workers.spawn(run_actor("pandora", PandoraActor::new(pandora), token.clone()));
        workers.spawn(run_actor("vanguard", VanguardActor::new(vanguard), token.clone()));
        workers.spawn(run_actor("verifier", verifier_actor, token.clone()));
        workers.spawn(run_actor(
            "rpc",
            RpcActor::new(rpc_server, token.clone()),
            token.clone(),
        ));

        info!(target: "orchestrator::service", "Orchestrator started");
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(target: "orchestrator::service", %err, "Worker task panicked");
            }
        }
        info!(target: "orchestrator::service", "Orchestrator stopped");
        Ok(())
    }
}

async fn run_actor<A: OrchestratorActor + Send + 'static>(
    name: &'static str,
    actor: A,
    cancel_token: CancellationToken,
) {
    if let Err(err) = actor.start().await {
        error!(target: "orchestrator::service", worker = name, ?err, "Worker exited with error");
        // A worker dying outside of shutdown is fatal for the process.
        cancel_token.cancel();
    }
}
