use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotmuchConfig {
    /// Root of the mail store, notmuch's own lookup applies when unset
    pub database_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    #[serde(default = "default_binary")]
    pub binary: String,
}

impl Default for NotmuchConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            config_path: None,
            binary: default_binary(),
        }
    }
}

fn default_binary() -> String {
    "notmuch".into()
}
