use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Directory of the prebuilt web frontend
    pub static_dir: Option<PathBuf>,

    /// TLS is enabled when both are set
    pub certs: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            static_dir: None,
            certs: None,
            key: None,
        }
    }
}

pub const DEFAULT_PORT: u16 = 5000;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT)
}
