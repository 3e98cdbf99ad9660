//! [`ContainerEngine`] backed by an engine binary (`docker`, `podman`).

use std::process::{ExitStatus, Output, Stdio};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use autorun_core::container::ContainerConfig;
use autorun_core::{
    AutoRunError, ContainerEngine, ImageConfig, ImageReference, ResolvedReference, Result,
    RunOptions,
};

/// Invokes the engine CLI for every engine operation.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
    host: Option<String>,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            host: None,
        }
    }

    /// Talk to a specific daemon (exported to the engine as `DOCKER_HOST`).
    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.host = host;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command<S: AsRef<str>>(&self, args: &[S]) -> Command {
        let mut cmd = Command::new(&self.binary);
        for arg in args {
            let arg: &str = arg.as_ref();
            cmd.arg(arg);
        }
        if let Some(host) = &self.host {
            cmd.env("DOCKER_HOST", host);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    fn describe(&self, subcommand: &str) -> String {
        format!("{} {subcommand}", self.binary)
    }

    /// Run to completion capturing stdout and stderr.
    async fn output(&self, subcommand: &str, args: &[&str]) -> Result<Output> {
        tracing::debug!(binary = %self.binary, ?args, "Invoking engine");
        self.command(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AutoRunError::Engine {
                command: self.describe(subcommand),
                message: e.to_string(),
            })
    }

    fn failure(&self, subcommand: &str, output: &Output) -> AutoRunError {
        AutoRunError::Engine {
            command: self.describe(subcommand),
            message: stderr_message(output),
        }
    }
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exit status {}", exit_code(output.status))
    } else {
        stderr.to_string()
    }
}

/// Engines report missing images with slightly different wording.
fn is_missing_image(stderr: &str) -> bool {
    stderr.contains("No such image")
        || stderr.contains("No such object")
        || stderr.contains("image not known")
}

/// Exit status as a shell would report it: the exit code, or 128 plus the
/// signal number when the process was killed by a signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TrustRepository {
    #[serde(default)]
    signed_tags: Vec<SignedTag>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignedTag {
    signed_tag: String,
    digest: String,
}

/// Signed digest for `tag` in `trust inspect` output.
pub fn parse_trust_output(stdout: &str, tag: &str) -> Result<Option<String>> {
    let repositories: Vec<TrustRepository> = serde_json::from_str(stdout)?;
    Ok(repositories
        .into_iter()
        .flat_map(|r| r.signed_tags)
        .find(|t| t.signed_tag == tag)
        .map(|t| {
            if t.digest.contains(':') {
                t.digest
            } else {
                format!("sha256:{}", t.digest)
            }
        }))
}

/// Full argv for running `config`.
pub fn run_argv(config: &ContainerConfig) -> Vec<String> {
    let mut argv = vec!["run".to_string()];
    argv.extend(config.run_args());
    argv
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn resolve_reference(&self, image: &str, trust: bool) -> Result<ResolvedReference> {
        let mut resolved = ResolvedReference::from_image(image)?;
        if !trust || !resolved.is_tagged() {
            return Ok(resolved);
        }
        let Some(named) = resolved.named.clone() else {
            return Ok(resolved);
        };

        let reference = ImageReference::parse(&named)?;
        let tag = reference.tag.clone().unwrap_or_default();
        let output = self.output("trust inspect", &["trust", "inspect", named.as_str()]).await?;
        if !output.status.success() {
            return Err(self.failure("trust inspect", &output));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let digest = parse_trust_output(&stdout, &tag)?.ok_or_else(|| AutoRunError::Engine {
            command: self.describe("trust inspect"),
            message: format!("No valid trust data for {tag}"),
        })?;

        let canonical = reference.with_digest(&digest).familiar();
        tracing::debug!(named = %named, canonical = %canonical, "Trusted reference");
        resolved.canonical = Some(canonical);
        Ok(resolved)
    }

    async fn pull_image(&self, reference: &str, platform: Option<&str>) -> Result<()> {
        let mut args = vec!["pull"];
        if let Some(platform) = platform {
            args.push("--platform");
            args.push(platform);
        }
        args.push(reference);

        // progress goes to stderr so stdout stays usable
        let status = self
            .command(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| AutoRunError::Engine {
                command: self.describe("pull"),
                message: e.to_string(),
            })?;
        if !status.success() {
            return Err(AutoRunError::Engine {
                command: self.describe("pull"),
                message: format!("exit status {}", exit_code(status)),
            });
        }
        Ok(())
    }

    async fn tag_trusted(&self, canonical: &str, tagged: &str) -> Result<()> {
        let output = self.output("tag", &["tag", canonical, tagged]).await?;
        if !output.status.success() {
            return Err(self.failure("tag", &output));
        }
        Ok(())
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageConfig> {
        let output = self
            .output("image inspect", &["image", "inspect", reference])
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_missing_image(&stderr) {
                return Err(AutoRunError::NotFound(reference.to_string()));
            }
            return Err(self.failure("image inspect", &output));
        }
        ImageConfig::from_inspect_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn server_os(&self) -> Result<String> {
        let output = self
            .output("version", &["version", "--format", "{{.Server.Os}}"])
            .await?;
        if !output.status.success() {
            return Err(self.failure("version", &output));
        }
        let os = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if os.is_empty() {
            tracing::warn!("Engine did not report its OS, assuming linux");
            return Ok("linux".to_string());
        }
        Ok(os)
    }

    async fn run_container(&self, _run: &RunOptions, config: &ContainerConfig) -> Result<i32> {
        let argv = run_argv(config);
        tracing::debug!(binary = %self.binary, ?argv, "Starting container");
        let status = self
            .command(&argv)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false)
            .status()
            .await
            .map_err(|e| AutoRunError::Engine {
                command: self.describe("run"),
                message: e.to_string(),
            })?;
        Ok(exit_code(status))
    }
}
