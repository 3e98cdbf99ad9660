//! The auto-run flow: resolve, pull, inspect, interpret labels, confirm, run.

use std::io::{BufRead, Write};

use crate::engine::{ContainerEngine, ResolvedReference};
use crate::error::{AutoRunError, Result};
use crate::host::{HostEnv, ProcessEnv};
use crate::image::ImageConfig;
use crate::interpreter::interpret;
use crate::options::{OptionsBundle, PullPolicy};
use crate::proxy::ProxySettings;
use crate::render::{self, Decision};

/// One auto-run invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRunRequest {
    /// Image reference as typed by the user
    pub image: String,
    /// Arguments given after the image; these win over the `cmd` label
    pub args: Vec<String>,
    pub pull: PullPolicy,
    pub platform: Option<String>,
    /// Skip content trust resolution
    pub untrusted: bool,
    /// Answer yes to the confirmation prompt
    pub yes: bool,
    /// Print the command line instead of running it
    pub print: bool,
    /// Suppress the header, details and announcement
    pub quiet: bool,
}

impl AutoRunRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            args: Vec::new(),
            pull: PullPolicy::Always,
            platform: None,
            untrusted: true,
            yes: false,
            print: false,
            quiet: false,
        }
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print mode: the command line that would have run
    Printed(String),
    /// The container ran and exited with this status
    Exited(i32),
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Printed(_) => 0,
            Outcome::Exited(code) => *code,
        }
    }
}

/// User-facing streams: confirmation input, stdout and stderr.
pub struct Terminal<R, O, E> {
    pub input: R,
    pub out: O,
    pub err: E,
}

impl<R: BufRead, O: Write, E: Write> Terminal<R, O, E> {
    pub fn new(input: R, out: O, err: E) -> Self {
        Self { input, out, err }
    }
}

/// Runs images according to their `com.docker.auto.*` labels.
pub struct AutoRunner<E, H = ProcessEnv> {
    engine: E,
    host: H,
    program: String,
    proxies: ProxySettings,
    daemon_host: Option<String>,
}

impl<E: ContainerEngine> AutoRunner<E, ProcessEnv> {
    /// `program` is the engine name shown in rendered command lines.
    pub fn new(engine: E, program: impl Into<String>) -> Self {
        Self {
            engine,
            host: ProcessEnv,
            program: program.into(),
            proxies: ProxySettings::default(),
            daemon_host: None,
        }
    }
}

impl<E: ContainerEngine, H: HostEnv> AutoRunner<E, H> {
    /// Use a different host environment for `env` and `mount-local-dir-to`.
    pub fn with_host<H2: HostEnv>(self, host: H2) -> AutoRunner<E, H2> {
        AutoRunner {
            engine: self.engine,
            host,
            program: self.program,
            proxies: self.proxies,
            daemon_host: self.daemon_host,
        }
    }

    /// Inject proxy settings for `daemon_host` into every container.
    pub fn with_proxies(mut self, proxies: ProxySettings, daemon_host: Option<String>) -> Self {
        self.proxies = proxies;
        self.daemon_host = daemon_host;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run `request` end to end.
    pub async fn run<R, O, W>(
        &self,
        request: &AutoRunRequest,
        term: &mut Terminal<R, O, W>,
    ) -> Result<Outcome>
    where
        R: BufRead,
        O: Write,
        W: Write,
    {
        let verbose = !request.quiet && !request.print;

        let mut bundle = OptionsBundle::new(request.image.clone());
        bundle.run.platform = request.platform.clone();
        bundle.run.untrusted = request.untrusted;
        self.proxies
            .apply(self.daemon_host.as_deref(), &mut bundle.create.env);

        let resolved = self
            .engine
            .resolve_reference(&request.image, !request.untrusted)
            .await?;
        if let Some(canonical) = &resolved.canonical {
            tracing::info!(image = %request.image, canonical = %canonical, "Resolved trusted reference");
            bundle.create.image = canonical.clone();
        }
        let image = bundle.create.image.clone();
        let platform = request.platform.as_deref();

        if request.pull == PullPolicy::Always {
            self.pull_and_tag(&image, platform, &resolved).await?;
        }

        let config = self
            .inspect(&image, platform, request.pull, &resolved, &mut term.err)
            .await?;

        if verbose {
            render::write_doc_header(&mut term.err, &image, &config)?;
        }

        if !request.args.is_empty() {
            bundle.create.args = request.args.clone();
        }

        let interpretation = interpret(&config, &mut bundle, &self.host)?;

        if verbose {
            render::write_run_details(&mut term.err, &interpretation.details)?;
        }

        let command = render::command_line(
            &self.program,
            &interpretation.fragments,
            &image,
            &bundle.create.args,
        );

        match render::decide(
            request.print,
            interpretation.confirmation_required,
            request.yes,
        ) {
            Decision::PrintOnly => {
                writeln!(term.out, "{command}")?;
                term.out.flush()?;
                return Ok(Outcome::Printed(command));
            }
            Decision::Run => {
                if !request.quiet {
                    render::write_announcement(&mut term.err, &command)?;
                }
            }
            Decision::Prompt => {
                render::confirm(&mut term.input, &mut term.err, &command)?;
            }
        }

        let os_type = self.engine.server_os().await?;
        let container = self
            .engine
            .parse_container_config(&bundle.create, &bundle.run, &os_type)
            .map_err(|e| match e {
                AutoRunError::ConfigError(_) => e,
                other => AutoRunError::ConfigError(other.to_string()),
            })?;

        tracing::info!(image = %image, "Running container");
        let status = self.engine.run_container(&bundle.run, &container).await?;
        tracing::info!(status, "Container exited");
        Ok(Outcome::Exited(status))
    }

    async fn pull_and_tag(
        &self,
        image: &str,
        platform: Option<&str>,
        resolved: &ResolvedReference,
    ) -> Result<()> {
        tracing::info!(image, "Pulling image");
        self.engine.pull_image(image, platform).await?;

        if let (Some(canonical), Some(named)) = (&resolved.canonical, &resolved.named) {
            if resolved.is_tagged() {
                self.engine.tag_trusted(canonical, named).await?;
            }
        }
        Ok(())
    }

    /// Inspect `image`, pulling once and retrying when it is missing
    /// locally and the policy allows it.
    async fn inspect<W: Write>(
        &self,
        image: &str,
        platform: Option<&str>,
        pull: PullPolicy,
        resolved: &ResolvedReference,
        err: &mut W,
    ) -> Result<ImageConfig> {
        match self.engine.inspect_image(image).await {
            Ok(config) => Ok(config),
            Err(e) if e.is_not_found() && pull == PullPolicy::Missing => {
                let Some(named) = &resolved.named else {
                    return Err(e);
                };
                writeln!(err, "Unable to find image '{named}' locally")?;
                self.pull_and_tag(image, platform, resolved).await?;
                self.engine.inspect_image(image).await
            }
            Err(e) => Err(e),
        }
    }
}
