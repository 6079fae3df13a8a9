use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const CONFIG_ENV: &str = "HOSPCONNECT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "hospconnect.yaml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    pub bind: SocketAddr,
    /// Répertoire des fichiers JSON ; absent = store en mémoire
    pub data_dir: Option<PathBuf>,
    /// Charge les hôpitaux et comptes de démonstration si le store est vide
    pub seed_demo_data: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_dir: None,
            seed_demo_data: true,
        }
    }
}

pub fn parse_config(txt: &str) -> Result<KernelConfig, serde_yaml::Error> {
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }
    serde_yaml::from_str(txt)
}

pub async fn load_config() -> KernelConfig {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    if !Path::new(&path).exists() {
        tracing::warn!(%path, "no config file, using defaults");
        return KernelConfig::default();
    }

    let txt = match fs::read_to_string(&path).await {
        Ok(txt) => txt,
        Err(e) => {
            tracing::warn!(%path, error = %e, "config unreadable, using defaults");
            return KernelConfig::default();
        }
    };
    parse_config(&txt).unwrap_or_else(|e| {
        tracing::warn!(%path, error = %e, "invalid config, using defaults");
        KernelConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = parse_config("data_dir: ./data\n").unwrap();
        assert_eq!(cfg.data_dir, Some(PathBuf::from("./data")));
        assert_eq!(cfg.bind, KernelConfig::default().bind);
        assert!(cfg.seed_demo_data);
    }

    #[test]
    fn test_full_yaml() {
        let cfg = parse_config("bind: 127.0.0.1:9000\nseed_demo_data: false\n").unwrap();
        assert_eq!(cfg.bind.port(), 9000);
        assert!(!cfg.seed_demo_data);
        assert_eq!(cfg.data_dir, None);
    }

    #[test]
    fn test_empty_and_invalid_files() {
        assert_eq!(parse_config("   \n").unwrap(), KernelConfig::default());
        assert!(parse_config("bind: [not, an, address]").is_err());
    }
}
