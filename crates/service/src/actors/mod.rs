//! Long-lived workers of the orchestrator.

mod traits;
pub use traits::OrchestratorActor;

mod pandora;
pub use pandora::PandoraActor;

mod vanguard;
pub use vanguard::VanguardActor;

mod verifier;
pub use verifier::VerifierActor;

mod rpc;
pub use rpc::RpcActor;
