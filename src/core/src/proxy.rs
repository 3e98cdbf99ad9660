//! Proxy settings from the engine client configuration file.
//!
//! The client `config.json` may carry a `proxies` map keyed by daemon host
//! (or `default`). Matching settings are added to the container's
//! environment under both the upper- and lower-case variable names.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

/// Proxy settings for one daemon host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub no_proxy: Option<String>,
    pub ftp_proxy: Option<String>,
    pub all_proxy: Option<String>,
}

impl ProxyConfig {
    /// `(VARIABLE, value)` pairs, upper-case name first.
    fn variables(&self) -> Vec<(&'static str, &str)> {
        let fields = [
            ("HTTP_PROXY", "http_proxy", &self.http_proxy),
            ("HTTPS_PROXY", "https_proxy", &self.https_proxy),
            ("NO_PROXY", "no_proxy", &self.no_proxy),
            ("FTP_PROXY", "ftp_proxy", &self.ftp_proxy),
            ("ALL_PROXY", "all_proxy", &self.all_proxy),
        ];
        let mut vars = Vec::new();
        for (upper, lower, value) in fields {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                vars.push((upper, value));
                vars.push((lower, value));
            }
        }
        vars
    }
}

#[derive(Debug, Default, Deserialize)]
struct ClientConfigFile {
    #[serde(default)]
    proxies: HashMap<String, ProxyConfig>,
}

/// All proxy entries from a client config file.
#[derive(Debug, Clone, Default)]
pub struct ProxySettings {
    proxies: HashMap<String, ProxyConfig>,
}

impl ProxySettings {
    /// Read `<config_dir>/config.json`. A missing or unreadable file means
    /// no proxies.
    pub fn load(config_dir: &Path) -> Self {
        let path = config_dir.join("config.json");
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No engine client config");
                return Self::default();
            }
        };
        match serde_json::from_str::<ClientConfigFile>(&data) {
            Ok(file) => Self {
                proxies: file.proxies,
            },
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Unreadable engine client config");
                Self::default()
            }
        }
    }

    pub fn from_map(proxies: HashMap<String, ProxyConfig>) -> Self {
        Self { proxies }
    }

    /// Settings for `host`, falling back to `default`.
    pub fn for_host(&self, host: Option<&str>) -> Option<&ProxyConfig> {
        host.and_then(|h| self.proxies.get(h))
            .or_else(|| self.proxies.get("default"))
    }

    /// Append proxy variables to `env`, skipping names already present.
    pub fn apply(&self, host: Option<&str>, env: &mut Vec<String>) {
        let Some(config) = self.for_host(host) else {
            return;
        };
        let present: HashSet<String> = env
            .iter()
            .map(|entry| entry.split_once('=').map_or(entry.as_str(), |(k, _)| k).to_string())
            .collect();

        for (name, value) in config.variables() {
            if !present.contains(name) {
                tracing::debug!(variable = name, "Injecting proxy setting");
                env.push(format!("{name}={value}"));
            }
        }
    }
}
