//! Orchestrator configuration.

use crate::cache::MAX_CACHE_SIZE;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

/// Time to wait before redialing a lost upstream connection.
pub const DEFAULT_RECONNECT_PERIOD: Duration = Duration::from_secs(15);

/// File name of the database inside the data directory.
const DB_FILE_NAME: &str = "orchestrator.db";

/// Runtime configuration assembled by the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pandora WS endpoint serving the pending-header stream.
    pub pandora_endpoint: String,
    /// RPC namespace the Pandora subscription methods live under.
    pub pandora_namespace: String,
    /// Vanguard WS endpoint serving the consensus streams.
    pub vanguard_endpoint: String,
    /// Directory holding the orchestrator database.
    pub datadir: PathBuf,
    /// Listen address of the downstream notification RPC server.
    pub rpc_addr: SocketAddr,
    /// Capacity of the two unmatched-slot caches.
    pub max_cache_size: usize,
    /// Backoff between upstream reconnection attempts.
    pub reconnect_period: Duration,
}

impl Config {
    /// Path of the database file under the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.datadir.join(DB_FILE_NAME)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pandora_endpoint: String::new(),
            pandora_namespace: "eth".to_string(),
            vanguard_endpoint: String::new(),
            datadir: Path::new(".").to_path_buf(),
            rpc_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 7877),
            max_cache_size: MAX_CACHE_SIZE,
            reconnect_period: DEFAULT_RECONNECT_PERIOD,
        }
    }
}
