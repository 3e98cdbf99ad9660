//! Validation of creation options into a runnable container configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::{AutoRunError, Result};
use crate::options::{CreateOptions, MountKind, MountSpec, NetworkAttachment, RunOptions};

/// A parsed `--publish` spec: `[[ip:][host_port]:]container_port[/proto]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<String>,
    pub container_port: String,
    pub protocol: String,
}

fn validate_port_range(spec: &str, ports: &str) -> Result<()> {
    let invalid = |reason: &str| {
        AutoRunError::ConfigError(format!("invalid publish spec \"{spec}\": {reason}"))
    };
    let parse = |p: &str| -> Result<u16> {
        match p.parse::<u16>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid(&format!("invalid port '{p}'"))),
        }
    };
    match ports.split_once('-') {
        Some((start, end)) => {
            if parse(start)? > parse(end)? {
                return Err(invalid(&format!("invalid port range '{ports}'")));
            }
        }
        None => {
            parse(ports)?;
        }
    }
    Ok(())
}

impl FromStr for PortBinding {
    type Err = AutoRunError;

    fn from_str(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| {
            AutoRunError::ConfigError(format!("invalid publish spec \"{spec}\": {reason}"))
        };

        let (rest, protocol) = match spec.rsplit_once('/') {
            Some((rest, proto)) => (rest, proto.to_lowercase()),
            None => (spec, "tcp".to_string()),
        };
        if !matches!(protocol.as_str(), "tcp" | "udp" | "sctp") {
            return Err(invalid(&format!("unknown protocol '{protocol}'")));
        }

        let (host, container_port) = match rest.rsplit_once(':') {
            Some((host, container)) => (Some(host), container),
            None => (None, rest),
        };
        if container_port.is_empty() {
            return Err(invalid("no container port specified"));
        }
        validate_port_range(spec, container_port)?;

        let (host_ip, host_port) = match host {
            None => (None, None),
            Some(host) => match host.rsplit_once(':') {
                Some((ip, port)) => {
                    let ip = ip.trim_start_matches('[').trim_end_matches(']');
                    (Some(ip.to_string()).filter(|s| !s.is_empty()), Some(port))
                }
                None => (None, Some(host)),
            },
        };
        let host_port = host_port.filter(|p| !p.is_empty());
        if let Some(port) = host_port {
            validate_port_range(spec, port)?;
        }

        Ok(Self {
            host_ip,
            host_port: host_port.map(str::to_string),
            container_port: container_port.to_string(),
            protocol,
        })
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.host_ip, &self.host_port) {
            (Some(ip), port) if ip.contains(':') => {
                write!(f, "[{ip}]:{}:", port.as_deref().unwrap_or(""))?
            }
            (Some(ip), port) => write!(f, "{ip}:{}:", port.as_deref().unwrap_or(""))?,
            (None, Some(port)) => write!(f, "{port}:")?,
            (None, None) => {}
        }
        write!(f, "{}/{}", self.container_port, self.protocol)
    }
}

/// Runtime configuration produced from validated options.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    pub image: String,
    pub args: Vec<String>,
    pub name: Option<String>,
    pub ports: Vec<PortBinding>,
    pub env: Vec<String>,
    pub stdin_open: bool,
    pub tty: bool,
    pub auto_remove: bool,
    pub pid_mode: Option<String>,
    pub network: Option<NetworkAttachment>,
    pub mounts: Vec<MountSpec>,
    pub platform: Option<String>,
    pub detach: bool,
    pub sig_proxy: bool,
}

fn validate_env(entry: &str) -> Result<()> {
    let name = entry.split_once('=').map_or(entry, |(name, _)| name);
    if name.trim().is_empty() {
        return Err(AutoRunError::ConfigError(format!(
            "invalid environment variable: {entry}"
        )));
    }
    Ok(())
}

fn validate_pid_mode(mode: &str) -> Result<()> {
    let valid = match mode.split_once(':') {
        Some(("container", target)) => !target.is_empty(),
        Some(_) => false,
        None => mode == "host",
    };
    if !valid {
        return Err(AutoRunError::ConfigError(format!(
            "--pid: invalid PID mode: {mode}"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    let name = name.strip_prefix('/').unwrap_or(name);
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            let rest = chars.as_str();
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        _ => false,
    };
    if !valid {
        return Err(AutoRunError::ConfigError(format!(
            "Invalid container name ({name}), only [a-zA-Z0-9][a-zA-Z0-9_.-] are allowed"
        )));
    }
    Ok(())
}

fn is_absolute_for(os_type: &str, path: &str) -> bool {
    if os_type.eq_ignore_ascii_case("windows") {
        let bytes = path.as_bytes();
        path.starts_with("\\\\")
            || (bytes.len() >= 3
                && bytes[0].is_ascii_alphabetic()
                && bytes[1] == b':'
                && matches!(bytes[2], b'\\' | b'/'))
    } else {
        path.starts_with('/')
    }
}

fn validate_mount(mount: &MountSpec, os_type: &str) -> Result<()> {
    if mount.kind != MountKind::Bind {
        return Ok(());
    }
    let source = mount.source.as_deref().unwrap_or_default();
    if !is_absolute_for(os_type, source) {
        return Err(AutoRunError::ConfigError(format!(
            "invalid mount config for type \"bind\": invalid mount path: '{source}' mount path must be absolute"
        )));
    }
    Ok(())
}

impl ContainerConfig {
    /// Validate creation and run options for an engine running `os_type`.
    pub fn parse(create: &CreateOptions, run: &RunOptions, os_type: &str) -> Result<Self> {
        let ports = create
            .publish
            .iter()
            .map(|p| p.parse())
            .collect::<Result<Vec<PortBinding>>>()?;

        for entry in &create.env {
            validate_env(entry)?;
        }
        if let Some(mode) = &create.pid_mode {
            validate_pid_mode(mode)?;
        }
        if let Some(name) = &run.name {
            validate_name(name)?;
        }
        for mount in &create.mounts {
            validate_mount(mount, os_type)?;
        }
        if create.image.trim().is_empty() {
            return Err(AutoRunError::ConfigError("image reference is empty".to_string()));
        }

        Ok(Self {
            image: create.image.clone(),
            args: create.args.clone(),
            name: run.name.clone(),
            ports,
            env: create.env.clone(),
            stdin_open: create.stdin_open,
            tty: create.tty,
            auto_remove: create.auto_remove,
            pid_mode: create.pid_mode.clone(),
            network: create.network.clone(),
            mounts: create.mounts.clone(),
            platform: run.platform.clone(),
            detach: run.detach,
            sig_proxy: run.sig_proxy,
        })
    }

    /// Arguments following `run` on an engine command line.
    ///
    /// The image has already been pulled, so the engine is told not to pull.
    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec!["--pull".to_string(), "never".to_string()];
        if self.auto_remove {
            args.push("--rm".to_string());
        }
        if self.stdin_open {
            args.push("--interactive".to_string());
        }
        if self.tty {
            args.push("--tty".to_string());
        }
        if self.detach {
            args.push("--detach".to_string());
        } else if !self.sig_proxy {
            args.push("--sig-proxy=false".to_string());
        }
        if let Some(name) = &self.name {
            args.push("--name".to_string());
            args.push(name.clone());
        }
        if let Some(platform) = &self.platform {
            args.push("--platform".to_string());
            args.push(platform.clone());
        }
        if let Some(mode) = &self.pid_mode {
            args.push("--pid".to_string());
            args.push(mode.clone());
        }
        if let Some(network) = &self.network {
            args.push("--network".to_string());
            args.push(network.to_string());
        }
        for port in &self.ports {
            args.push("--publish".to_string());
            args.push(port.to_string());
        }
        for entry in &self.env {
            args.push("--env".to_string());
            args.push(entry.clone());
        }
        for mount in &self.mounts {
            args.push("--mount".to_string());
            args.push(mount.to_string());
        }
        args.push(self.image.clone());
        args.extend(self.args.iter().cloned());
        args
    }
}
