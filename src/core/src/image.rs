//! Image configuration as reported by the engine's image inspection.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AutoRunError, Result};

/// OCI title label
pub const OCI_TITLE_LABEL: &str = "org.opencontainers.image.title";

/// OCI description label
pub const OCI_DESCRIPTION_LABEL: &str = "org.opencontainers.image.description";

/// OCI documentation URL label
pub const OCI_DOCUMENTATION_LABEL: &str = "org.opencontainers.image.documentation";

/// A port exposed by the image (`80/tcp`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExposedPort {
    pub port: String,
    pub protocol: String,
}

impl ExposedPort {
    pub fn new(port: impl Into<String>, protocol: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            protocol: protocol.into(),
        }
    }

    /// Publish spec mapping the port 1:1 on the host (`80:80/tcp`).
    pub fn one_to_one(&self) -> String {
        format!("{}:{}/{}", self.port, self.port, self.protocol)
    }
}

impl FromStr for ExposedPort {
    type Err = AutoRunError;

    /// Parse `port[/proto]`; the protocol defaults to `tcp`.
    fn from_str(s: &str) -> Result<Self> {
        let (port, protocol) = match s.split_once('/') {
            Some((port, proto)) => (port, proto.to_lowercase()),
            None => (s, "tcp".to_string()),
        };
        if port.is_empty() || protocol.is_empty() {
            return Err(AutoRunError::invalid_option(
                "exposed port",
                s,
                "expected port[/protocol]",
            ));
        }
        Ok(Self::new(port, protocol))
    }
}

impl fmt::Display for ExposedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// The part of an image's configuration the label interpreter reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageConfig {
    /// Image labels
    pub labels: HashMap<String, String>,

    /// Exposed ports, sorted
    pub exposed_ports: BTreeSet<ExposedPort>,
}

impl ImageConfig {
    pub fn with_labels<K, V>(labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            exposed_ports: BTreeSet::new(),
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Parse the first image of an engine `image inspect` JSON document.
    pub fn from_inspect_output(stdout: &str) -> Result<Self> {
        let images: Vec<ImageInspect> = serde_json::from_str(stdout)?;
        images
            .into_iter()
            .next()
            .ok_or_else(|| AutoRunError::Engine {
                command: "image inspect".to_string(),
                message: "empty inspect output".to_string(),
            })?
            .into_config()
    }
}

/// Subset of the engine's `image inspect` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInspect {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub config: Option<InspectConfig>,
}

/// `Config` object of an `image inspect` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectConfig {
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,

    #[serde(default)]
    pub exposed_ports: Option<HashMap<String, serde_json::Value>>,
}

impl ImageInspect {
    pub fn into_config(self) -> Result<ImageConfig> {
        let config = self.config.unwrap_or_default();
        let exposed_ports = config
            .exposed_ports
            .unwrap_or_default()
            .keys()
            .map(|k| k.parse())
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(ImageConfig {
            labels: config.labels.unwrap_or_default(),
            exposed_ports,
        })
    }
}
