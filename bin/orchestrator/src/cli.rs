//! Command-line interface of the orchestrator.

use clap::Parser;
use orchestrator_core::{Config, MAX_CACHE_SIZE};
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

/// Orchestrator configuration arguments.
#[derive(Parser, Debug)]
#[command(name = "orchestrator", version, about = "Pandora/Vanguard orchestrator")]
pub struct OrchestratorArgs {
    /// Pandora (execution) node WS endpoint.
    #[arg(long = "exec-endpoint", alias = "pandora-endpoint", env = "EXEC_ENDPOINT")]
    pub exec_endpoint: String,

    /// RPC namespace of the Pandora pending-header subscription.
    #[arg(
        long = "exec-namespace",
        alias = "pandora-namespace",
        env = "EXEC_NAMESPACE",
        default_value = "eth"
    )]
    pub exec_namespace: String,

    /// Vanguard (consensus) node WS endpoint.
    #[arg(long = "consensus-endpoint", alias = "vanguard-endpoint", env = "CONSENSUS_ENDPOINT")]
    pub consensus_endpoint: String,

    /// Directory to store orchestrator data.
    #[arg(long, env = "DATADIR")]
    pub datadir: PathBuf,

    /// IP address for the notification RPC server to listen on.
    #[arg(long = "rpc.addr", env = "RPC_ADDR", default_value = "127.0.0.1")]
    pub rpc_address: IpAddr,

    /// Port for the notification RPC server to listen on.
    #[arg(long = "rpc.port", env = "RPC_PORT", default_value_t = 7877)]
    pub rpc_port: u16,

    /// Capacity of the unmatched-slot caches.
    #[arg(long = "max-cache-size", env = "MAX_CACHE_SIZE", default_value_t = MAX_CACHE_SIZE)]
    pub max_cache_size: usize,

    /// Seconds to wait before redialing a lost upstream connection.
    #[arg(
        long = "reconnect-period",
        env = "RECONNECT_PERIOD",
        value_name = "SECONDS",
        default_value_t = 15
    )]
    pub reconnect_period: u64,
}

impl OrchestratorArgs {
    /// Assembles the runtime [`Config`].
    pub fn into_config(self) -> Config {
        Config {
            pandora_endpoint: self.exec_endpoint,
            pandora_namespace: self.exec_namespace,
            vanguard_endpoint: self.consensus_endpoint,
            datadir: self.datadir,
            rpc_addr: SocketAddr::new(self.rpc_address, self.rpc_port),
            max_cache_size: self.max_cache_size,
            reconnect_period: Duration::from_secs(self.reconnect_period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let args = OrchestratorArgs::parse_from([
            "orchestrator",
            "--exec-endpoint",
            "ws://127.0.0.1:8546",
            "--consensus-endpoint",
            "ws://127.0.0.1:4000",
            "--datadir",
            "/tmp/orchestrator",
        ]);
        let config = args.into_config();
        assert_eq!(config.pandora_namespace, "eth");
        assert_eq!(config.max_cache_size, MAX_CACHE_SIZE);
        assert_eq!(config.reconnect_period, Duration::from_secs(15));
        assert_eq!(config.rpc_addr, "127.0.0.1:7877".parse::<SocketAddr>().unwrap());
        assert!(config.database_path().ends_with("orchestrator.db"));
    }

    #[test]
    fn rpc_addr_and_port_compose_into_the_listen_address() {
        let args = OrchestratorArgs::parse_from([
            "orchestrator",
            "--exec-endpoint",
            "ws://127.0.0.1:8546",
            "--consensus-endpoint",
            "ws://127.0.0.1:4000",
            "--datadir",
            "/tmp/orchestrator",
            "--rpc.addr",
            "0.0.0.0",
            "--rpc.port",
            "9650",
        ]);
        let config = args.into_config();
        assert_eq!(config.rpc_addr, "0.0.0.0:9650".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn aliases_are_accepted() {
        let args = OrchestratorArgs::parse_from([
            "orchestrator",
            "--pandora-endpoint",
            "ws://127.0.0.1:8546",
            "--vanguard-endpoint",
            "ws://127.0.0.1:4000",
            "--datadir",
            "/tmp/orchestrator",
            "--reconnect-period",
            "3",
        ]);
        assert_eq!(args.reconnect_period, 3);
    }
}
