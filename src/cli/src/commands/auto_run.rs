//! `autorun auto-run` command.

use clap::Args;

use autorun_core::proxy::ProxySettings;
use autorun_core::{AutoRunConfig, AutoRunRequest, AutoRunner, PullPolicy, Result, Terminal};

use crate::engine::DockerCli;

#[derive(Args, Debug)]
pub struct AutoRunArgs {
    /// Image reference (e.g., "nginx", "ghcr.io/org/image:tag") followed by
    /// arguments for the entrypoint, which replace the image's cmd label.
    /// Everything after the image is passed to the container, flags included.
    #[arg(
        value_name = "IMAGE [ARG]...",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,

    /// Do not prompt for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Print the command to run the container and exit
    #[arg(long)]
    pub print: bool,

    /// Suppress the image description and generated option details
    #[arg(short, long)]
    pub quiet: bool,

    /// Pull image before running ("always", "missing", "never")
    #[arg(long)]
    pub pull: Option<PullPolicy>,

    /// Set platform if server is multi-platform capable
    #[arg(long)]
    pub platform: Option<String>,

    /// Skip image verification
    #[arg(long)]
    pub disable_content_trust: bool,
}

impl AutoRunArgs {
    pub fn image(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    /// Explicit container arguments given after the image.
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    /// Combine flags with configured defaults.
    pub fn to_request(&self, config: &AutoRunConfig) -> AutoRunRequest {
        AutoRunRequest {
            image: self.image().to_string(),
            args: self.args().to_vec(),
            pull: self.pull.unwrap_or(config.pull),
            platform: self.platform.clone(),
            untrusted: self.disable_content_trust || !config.content_trust,
            yes: self.yes,
            print: self.print,
            quiet: self.quiet,
        }
    }
}

pub async fn execute(args: AutoRunArgs, config: &AutoRunConfig) -> Result<i32> {
    let engine = DockerCli::new(config.engine.binary.clone()).with_host(config.engine.host.clone());
    let proxies = ProxySettings::load(&config.engine_config_dir());
    let runner = AutoRunner::new(engine, config.engine.binary.clone())
        .with_proxies(proxies, config.engine.host.clone());

    let request = args.to_request(config);
    tracing::debug!(?request, "Auto-running image");

    let stdin = std::io::stdin();
    let mut term = Terminal::new(stdin.lock(), std::io::stdout(), std::io::stderr());
    let outcome = runner.run(&request, &mut term).await?;
    Ok(outcome.exit_code())
}
