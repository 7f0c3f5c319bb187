use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use viel_index::config::NotmuchConfig;
use viel_proto::config::WebConfig;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub notmuch: NotmuchConfig,
}

pub fn read_config(config_file: PathBuf) -> Result<Config> {
    let mut file = std::fs::OpenOptions::new()
        .read(true)
        .open(config_file.as_path())
        .with_context(|| format!("unable to open {}", config_file.display()))?;

    let mut config = String::new();
    file.read_to_string(&mut config)?;

    toml::from_str(&config).with_context(|| format!("invalid configuration {}", config_file.display()))
}
