//! Container creation and run options mutated by label handlers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AutoRunError, Result};

/// Parse a boolean the way engine CLIs do (`1`, `t`, `TRUE`, `false`, ...).
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// When to pull the image before running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullPolicy {
    /// Always pull before running.
    #[default]
    Always,
    /// Pull only when the image is not present locally.
    Missing,
    /// Never pull.
    Never,
}

impl FromStr for PullPolicy {
    type Err = AutoRunError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "always" => Ok(PullPolicy::Always),
            "missing" => Ok(PullPolicy::Missing),
            "never" => Ok(PullPolicy::Never),
            other => Err(AutoRunError::invalid_option(
                "pull",
                other,
                "expected \"always\"|\"missing\"|\"never\"",
            )),
        }
    }
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullPolicy::Always => write!(f, "always"),
            PullPolicy::Missing => write!(f, "missing"),
            PullPolicy::Never => write!(f, "never"),
        }
    }
}

/// Network attachment given to `--net`.
///
/// Either a plain network name/mode (`host`, `none`, `container:<id>`,
/// `mynet`) or the advanced `name=mynet,alias=web,...` form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkAttachment {
    pub target: String,
    pub aliases: Vec<String>,
    pub driver_opts: Vec<(String, String)>,
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
    pub link_local_ips: Vec<String>,
    pub mac_address: Option<String>,
}

impl NetworkAttachment {
    fn is_simple(&self) -> bool {
        self.aliases.is_empty()
            && self.driver_opts.is_empty()
            && self.ipv4_address.is_none()
            && self.ipv6_address.is_none()
            && self.link_local_ips.is_empty()
            && self.mac_address.is_none()
    }
}

impl FromStr for NetworkAttachment {
    type Err = AutoRunError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = |reason: String| AutoRunError::invalid_option("network", value, reason);

        if value.is_empty() {
            return Err(invalid("network name is empty".to_string()));
        }
        if !value.contains('=') {
            return Ok(Self {
                target: value.to_string(),
                ..Default::default()
            });
        }

        let mut attachment = Self::default();
        for field in value.split(',') {
            let (key, val) = field
                .split_once('=')
                .ok_or_else(|| invalid(format!("invalid field '{field}' must be a key=value pair")))?;
            let key = key.trim().to_lowercase();
            let val = val.trim();
            if val.is_empty() {
                return Err(invalid(format!("empty value for field '{key}'")));
            }
            match key.as_str() {
                "name" => attachment.target = val.to_string(),
                "alias" => attachment.aliases.push(val.to_string()),
                "driver-opt" => {
                    let (k, v) = val.split_once('=').ok_or_else(|| {
                        invalid(format!("invalid driver-opt '{val}' must be a key=value pair"))
                    })?;
                    attachment.driver_opts.push((k.to_string(), v.to_string()));
                }
                "ip" => attachment.ipv4_address = Some(val.to_string()),
                "ip6" => attachment.ipv6_address = Some(val.to_string()),
                "link-local-ip" => attachment.link_local_ips.push(val.to_string()),
                "mac-address" => attachment.mac_address = Some(val.to_string()),
                other => return Err(invalid(format!("invalid field key '{other}'"))),
            }
        }

        if attachment.target.is_empty() {
            return Err(invalid("network name is required".to_string()));
        }
        Ok(attachment)
    }
}

impl fmt::Display for NetworkAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_simple() {
            return write!(f, "{}", self.target);
        }
        write!(f, "name={}", self.target)?;
        for alias in &self.aliases {
            write!(f, ",alias={alias}")?;
        }
        for (k, v) in &self.driver_opts {
            write!(f, ",driver-opt={k}={v}")?;
        }
        if let Some(ip) = &self.ipv4_address {
            write!(f, ",ip={ip}")?;
        }
        if let Some(ip) = &self.ipv6_address {
            write!(f, ",ip6={ip}")?;
        }
        for ip in &self.link_local_ips {
            write!(f, ",link-local-ip={ip}")?;
        }
        if let Some(mac) = &self.mac_address {
            write!(f, ",mac-address={mac}")?;
        }
        Ok(())
    }
}

/// Mount type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountKind {
    Bind,
    #[default]
    Volume,
    Tmpfs,
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountKind::Bind => write!(f, "bind"),
            MountKind::Volume => write!(f, "volume"),
            MountKind::Tmpfs => write!(f, "tmpfs"),
        }
    }
}

/// A `--mount` specification (`type=bind,source=/src,target=/dst`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    pub kind: MountKind,
    pub source: Option<String>,
    pub target: String,
    pub read_only: bool,
}

impl MountSpec {
    pub fn bind(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: MountKind::Bind,
            source: Some(source.into()),
            target: target.into(),
            read_only: false,
        }
    }
}

impl FromStr for MountSpec {
    type Err = AutoRunError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = |reason: String| AutoRunError::invalid_option("mount", value, reason);

        let mut kind = MountKind::default();
        let mut source = None;
        let mut target = None;
        let mut read_only = false;

        for field in value.split(',') {
            let (key, val) = match field.split_once('=') {
                Some((k, v)) => (k.trim().to_lowercase(), Some(v.trim())),
                None => (field.trim().to_lowercase(), None),
            };
            match (key.as_str(), val) {
                ("readonly" | "ro", None) => read_only = true,
                ("readonly" | "ro", Some(v)) => {
                    read_only = parse_bool(v)
                        .ok_or_else(|| invalid(format!("invalid value for {key}: {v}")))?;
                }
                ("type", Some(v)) => {
                    kind = match v {
                        "bind" => MountKind::Bind,
                        "volume" => MountKind::Volume,
                        "tmpfs" => MountKind::Tmpfs,
                        other => return Err(invalid(format!("unknown mount type '{other}'"))),
                    };
                }
                ("source" | "src", Some(v)) => source = Some(v.to_string()),
                ("target" | "destination" | "dst", Some(v)) => target = Some(v.to_string()),
                (_, None) => {
                    return Err(invalid(format!("invalid field '{field}' must be a key=value pair")))
                }
                (other, Some(_)) => return Err(invalid(format!("unexpected key '{other}'"))),
            }
        }

        let target = target
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid("target is required".to_string()))?;
        if kind == MountKind::Bind && source.as_deref().map_or(true, str::is_empty) {
            return Err(invalid("source is required when specifying bind mount".to_string()));
        }

        Ok(Self {
            kind,
            source,
            target,
            read_only,
        })
    }
}

impl fmt::Display for MountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={}", self.kind)?;
        if let Some(source) = &self.source {
            write!(f, ",source={source}")?;
        }
        write!(f, ",target={}", self.target)?;
        if self.read_only {
            write!(f, ",readonly")?;
        }
        Ok(())
    }
}

/// Options describing the container to create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOptions {
    /// Image reference to run
    pub image: String,
    /// Arguments passed to the entrypoint
    pub args: Vec<String>,
    /// Port publish specs (`8080:80/tcp`)
    pub publish: Vec<String>,
    /// Environment entries (`KEY=VALUE`)
    pub env: Vec<String>,
    /// Keep STDIN open
    pub stdin_open: bool,
    /// Allocate a pseudo-TTY
    pub tty: bool,
    /// PID namespace mode
    pub pid_mode: Option<String>,
    /// Network to attach to
    pub network: Option<NetworkAttachment>,
    /// Filesystem mounts
    pub mounts: Vec<MountSpec>,
    /// Remove the container when it exits
    pub auto_remove: bool,
}

/// Options controlling how the container is run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Container name
    pub name: Option<String>,
    /// Target platform (`linux/amd64`)
    pub platform: Option<String>,
    /// Skip content trust verification
    pub untrusted: bool,
    /// Pull policy handed to the runner; the orchestrator pulls up front
    pub pull: PullPolicy,
    /// Run detached
    pub detach: bool,
    /// Proxy received signals to the container
    pub sig_proxy: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            name: None,
            platform: None,
            untrusted: false,
            pull: PullPolicy::Never,
            detach: false,
            sig_proxy: true,
        }
    }
}

/// Everything label handlers may mutate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsBundle {
    pub create: CreateOptions,
    pub run: RunOptions,
}

impl OptionsBundle {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            create: CreateOptions {
                image: image.into(),
                ..Default::default()
            },
            run: RunOptions::default(),
        }
    }
}
