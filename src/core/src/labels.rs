//! Run options from `com.docker.auto.*` image labels.
//!
//! # Label Schema
//!
//! | Label | Effect | Needs confirmation |
//! |---|---|---|
//! | `com.docker.auto.rm` | `--rm` when true | no |
//! | `com.docker.auto.publish` | `--publish` per comma-separated spec | yes |
//! | `com.docker.auto.publish-all` | publish every exposed port 1:1 when true | yes |
//! | `com.docker.auto.cmd` | entrypoint arguments, unless given on the command line | no |
//! | `com.docker.auto.interactive` | `--interactive` when true | no |
//! | `com.docker.auto.tty` | `--tty` when true | no |
//! | `com.docker.auto.pid` | `--pid <mode>` | yes |
//! | `com.docker.auto.net` | `--net <mode>` | yes |
//! | `com.docker.auto.name` | `--name <name>` | no |
//! | `com.docker.auto.mount-local-dir-to` | bind mount of the working directory | yes |
//! | `com.docker.auto.env` | `--env NAME` per comma-separated name, value from the host | no |
//!
//! # Example
//!
//! ```dockerfile
//! LABEL com.docker.auto.rm="true"
//! LABEL com.docker.auto.publish="8080:80"
//! LABEL com.docker.auto.mount-local-dir-to="/workspace"
//! LABEL com.docker.auto.cmd="serve --root /workspace"
//! ```

use crate::error::Result;
use crate::host::HostEnv;
use crate::image::ImageConfig;
use crate::options::{parse_bool, MountSpec, OptionsBundle};
use crate::tokenizer::split_command_line;

/// Namespace shared by every recognized label.
pub const LABEL_PREFIX: &str = "com.docker.auto.";

/// A recognized auto-run label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoLabel {
    Rm,
    Publish,
    PublishAll,
    Cmd,
    Interactive,
    Tty,
    Pid,
    Net,
    Name,
    MountLocalDir,
    Env,
}

/// Output of one label handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelEffect {
    /// Flag fragments for the rendered command line, in order
    pub fragments: Vec<String>,
    /// Human-readable detail line
    pub detail: Option<String>,
    /// Whether the change needs interactive approval
    pub confirm: bool,
}

impl LabelEffect {
    fn flag(fragment: String, description: &str) -> Self {
        Self {
            detail: Some(format!("[{fragment}] {description}")),
            fragments: vec![fragment],
            confirm: false,
        }
    }

    fn flags(fragments: Vec<String>, description: &str) -> Self {
        if fragments.is_empty() {
            return Self::default();
        }
        Self {
            detail: Some(format!("[{}] {description}", fragments.join(" "))),
            fragments,
            confirm: false,
        }
    }

    fn confirmed(mut self) -> Self {
        self.confirm = true;
        self
    }
}

/// Trimmed value, or `None` when blank.
fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Comma-separated items, trimmed, blanks dropped, order kept.
fn list_items(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').filter_map(non_empty)
}

impl AutoLabel {
    pub const ALL: [AutoLabel; 11] = [
        AutoLabel::Rm,
        AutoLabel::Publish,
        AutoLabel::PublishAll,
        AutoLabel::Cmd,
        AutoLabel::Interactive,
        AutoLabel::Tty,
        AutoLabel::Pid,
        AutoLabel::Net,
        AutoLabel::Name,
        AutoLabel::MountLocalDir,
        AutoLabel::Env,
    ];

    /// Full label key, e.g. `com.docker.auto.rm`.
    pub fn key(self) -> &'static str {
        match self {
            AutoLabel::Rm => "com.docker.auto.rm",
            AutoLabel::Publish => "com.docker.auto.publish",
            AutoLabel::PublishAll => "com.docker.auto.publish-all",
            AutoLabel::Cmd => "com.docker.auto.cmd",
            AutoLabel::Interactive => "com.docker.auto.interactive",
            AutoLabel::Tty => "com.docker.auto.tty",
            AutoLabel::Pid => "com.docker.auto.pid",
            AutoLabel::Net => "com.docker.auto.net",
            AutoLabel::Name => "com.docker.auto.name",
            AutoLabel::MountLocalDir => "com.docker.auto.mount-local-dir-to",
            AutoLabel::Env => "com.docker.auto.env",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.key() == key)
    }

    /// Apply this label's value to the options bundle.
    pub fn apply(
        self,
        value: &str,
        image: &ImageConfig,
        bundle: &mut OptionsBundle,
        host: &dyn HostEnv,
    ) -> Result<LabelEffect> {
        let create = &mut bundle.create;
        let effect = match self {
            AutoLabel::Rm => {
                if parse_bool(value) != Some(true) {
                    return Ok(LabelEffect::default());
                }
                create.auto_remove = true;
                LabelEffect::flag(
                    "--rm".to_string(),
                    "Automatically remove the container when it exits",
                )
            }
            AutoLabel::Publish => {
                let mut fragments = Vec::new();
                for spec in list_items(value) {
                    create.publish.push(spec.to_string());
                    fragments.push(format!("--publish {spec}"));
                }
                if fragments.is_empty() {
                    return Ok(LabelEffect::default());
                }
                LabelEffect::flags(fragments, "Publish a container's port(s) to the host")
                    .confirmed()
            }
            AutoLabel::PublishAll => {
                if parse_bool(value) != Some(true) {
                    return Ok(LabelEffect::default());
                }
                let mut fragments = Vec::new();
                for port in &image.exposed_ports {
                    let spec = port.one_to_one();
                    fragments.push(format!("--publish {spec}"));
                    create.publish.push(spec);
                }
                LabelEffect::flags(fragments, "Publish all exposed ports to the host").confirmed()
            }
            AutoLabel::Cmd => {
                if !create.args.is_empty() {
                    // arguments on the command line win over the label
                    tracing::debug!("Ignoring {}: arguments given on the command line", self.key());
                    return Ok(LabelEffect::default());
                }
                let Some(command) = non_empty(value) else {
                    return Ok(LabelEffect::default());
                };
                create.args = split_command_line(command)?;
                LabelEffect {
                    detail: Some(format!("[{command}] Arguments to pass to the entrypoint")),
                    ..Default::default()
                }
            }
            AutoLabel::Interactive => {
                if parse_bool(value) != Some(true) {
                    return Ok(LabelEffect::default());
                }
                create.stdin_open = true;
                LabelEffect::flag(
                    "--interactive".to_string(),
                    "Keep STDIN open even if not attached",
                )
            }
            AutoLabel::Tty => {
                if parse_bool(value) != Some(true) {
                    return Ok(LabelEffect::default());
                }
                create.tty = true;
                LabelEffect::flag("--tty".to_string(), "Allocate a pseudo-TTY")
            }
            AutoLabel::Pid => {
                let Some(mode) = non_empty(value) else {
                    return Ok(LabelEffect::default());
                };
                create.pid_mode = Some(mode.to_string());
                LabelEffect::flag(format!("--pid {mode}"), "PID namespace to use").confirmed()
            }
            AutoLabel::Net => {
                let Some(mode) = non_empty(value) else {
                    return Ok(LabelEffect::default());
                };
                create.network = Some(mode.parse()?);
                LabelEffect::flag(format!("--net {mode}"), "Connect the container to a network")
                    .confirmed()
            }
            AutoLabel::Name => {
                let Some(name) = non_empty(value) else {
                    return Ok(LabelEffect::default());
                };
                bundle.run.name = Some(name.to_string());
                LabelEffect::flag(format!("--name {name}"), "Assign a name to the container")
            }
            AutoLabel::MountLocalDir => {
                let Some(target) = non_empty(value) else {
                    return Ok(LabelEffect::default());
                };
                let cwd = host.current_dir()?;
                let spec = format!("type=bind,source={},target={target}", cwd.display());
                create.mounts.push(spec.parse::<MountSpec>()?);
                LabelEffect::flag(
                    format!("--mount {spec}"),
                    "Attach a filesystem mount to the container",
                )
                .confirmed()
            }
            AutoLabel::Env => {
                let mut fragments = Vec::new();
                for name in list_items(value) {
                    let current = host.var(name)?.unwrap_or_default();
                    create.env.push(format!("{name}={current}"));
                    fragments.push(format!("--env {name}"));
                }
                LabelEffect::flags(fragments, "Set environment variables")
            }
        };
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutoRunError;
    use crate::host::testing::FakeHost;
    use crate::image::ExposedPort;

    fn apply(label: AutoLabel, value: &str, bundle: &mut OptionsBundle) -> Result<LabelEffect> {
        label.apply(value, &ImageConfig::default(), bundle, &FakeHost::new())
    }

    #[test]
    fn test_key_roundtrip() {
        for label in AutoLabel::ALL {
            assert!(label.key().starts_with(LABEL_PREFIX));
            assert_eq!(AutoLabel::from_key(label.key()), Some(label));
        }
    }

    #[test]
    fn test_from_key_unknown() {
        assert_eq!(AutoLabel::from_key("com.docker.auto.unknown"), None);
        assert_eq!(AutoLabel::from_key("org.opencontainers.image.title"), None);
        assert_eq!(AutoLabel::from_key("rm"), None);
    }

    #[test]
    fn test_rm_true() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Rm, "true", &mut bundle).unwrap();
        assert!(bundle.create.auto_remove);
        assert_eq!(effect.fragments, vec!["--rm"]);
        assert_eq!(
            effect.detail.as_deref(),
            Some("[--rm] Automatically remove the container when it exits")
        );
        assert!(!effect.confirm);
    }

    #[test]
    fn test_rm_unparsable_is_false() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Rm, "nonsense", &mut bundle).unwrap();
        assert!(!bundle.create.auto_remove);
        assert_eq!(effect, LabelEffect::default());
    }

    #[test]
    fn test_rm_false() {
        let mut bundle = OptionsBundle::new("img");
        apply(AutoLabel::Rm, "0", &mut bundle).unwrap();
        assert!(!bundle.create.auto_remove);
    }

    #[test]
    fn test_publish_list_keeps_order() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Publish, "80:80,443:443", &mut bundle).unwrap();
        assert_eq!(effect.fragments, vec!["--publish 80:80", "--publish 443:443"]);
        assert_eq!(bundle.create.publish, vec!["80:80", "443:443"]);
        assert!(effect.confirm);
        assert_eq!(
            effect.detail.as_deref(),
            Some("[--publish 80:80 --publish 443:443] Publish a container's port(s) to the host")
        );
    }

    #[test]
    fn test_publish_trims_items() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Publish, " 8080:80 , ,9090:90/udp", &mut bundle).unwrap();
        assert_eq!(effect.fragments, vec!["--publish 8080:80", "--publish 9090:90/udp"]);
    }

    #[test]
    fn test_publish_blank_is_absent() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Publish, "  ", &mut bundle).unwrap();
        assert_eq!(effect, LabelEffect::default());
        assert!(bundle.create.publish.is_empty());
    }

    #[test]
    fn test_publish_all() {
        let mut image = ImageConfig::default();
        image.exposed_ports.insert(ExposedPort::new("80", "tcp"));
        image.exposed_ports.insert(ExposedPort::new("53", "udp"));
        let mut bundle = OptionsBundle::new("img");
        let effect = AutoLabel::PublishAll
            .apply("true", &image, &mut bundle, &FakeHost::new())
            .unwrap();
        assert_eq!(effect.fragments, vec!["--publish 53:53/udp", "--publish 80:80/tcp"]);
        assert_eq!(bundle.create.publish, vec!["53:53/udp", "80:80/tcp"]);
        assert!(effect.confirm);
    }

    #[test]
    fn test_publish_all_false() {
        let mut image = ImageConfig::default();
        image.exposed_ports.insert(ExposedPort::new("80", "tcp"));
        let mut bundle = OptionsBundle::new("img");
        let effect = AutoLabel::PublishAll
            .apply("false", &image, &mut bundle, &FakeHost::new())
            .unwrap();
        assert!(!effect.confirm);
        assert!(bundle.create.publish.is_empty());
    }

    #[test]
    fn test_cmd_sets_args() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Cmd, "serve --dir 'my files'", &mut bundle).unwrap();
        assert_eq!(bundle.create.args, vec!["serve", "--dir", "my files"]);
        assert!(effect.fragments.is_empty());
        assert!(!effect.confirm);
        assert_eq!(
            effect.detail.as_deref(),
            Some("[serve --dir 'my files'] Arguments to pass to the entrypoint")
        );
    }

    #[test]
    fn test_cmd_surrounding_whitespace_trimmed() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Cmd, " serve --port 80 ", &mut bundle).unwrap();
        assert_eq!(bundle.create.args, vec!["serve", "--port", "80"]);
        assert_eq!(
            effect.detail.as_deref(),
            Some("[serve --port 80] Arguments to pass to the entrypoint")
        );
    }

    #[test]
    fn test_cmd_blank_is_absent() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Cmd, "   ", &mut bundle).unwrap();
        assert!(bundle.create.args.is_empty());
        assert_eq!(effect, LabelEffect::default());
    }

    #[test]
    fn test_cmd_does_not_override_explicit_args() {
        let mut bundle = OptionsBundle::new("img");
        bundle.create.args = vec!["--help".to_string()];
        let effect = apply(AutoLabel::Cmd, "serve", &mut bundle).unwrap();
        assert_eq!(bundle.create.args, vec!["--help"]);
        assert_eq!(effect, LabelEffect::default());
    }

    #[test]
    fn test_cmd_explicit_args_skip_even_malformed_label() {
        let mut bundle = OptionsBundle::new("img");
        bundle.create.args = vec!["sh".to_string()];
        assert!(apply(AutoLabel::Cmd, "x \"broken", &mut bundle).is_ok());
    }

    #[test]
    fn test_cmd_malformed() {
        let mut bundle = OptionsBundle::new("img");
        let err = apply(AutoLabel::Cmd, "run \"oops", &mut bundle).unwrap_err();
        assert!(matches!(err, AutoRunError::MalformedInput { .. }));
        assert!(bundle.create.args.is_empty());
    }

    #[test]
    fn test_interactive_and_tty() {
        let mut bundle = OptionsBundle::new("img");
        let i = apply(AutoLabel::Interactive, "1", &mut bundle).unwrap();
        let t = apply(AutoLabel::Tty, "True", &mut bundle).unwrap();
        assert!(bundle.create.stdin_open);
        assert!(bundle.create.tty);
        assert_eq!(i.fragments, vec!["--interactive"]);
        assert_eq!(t.fragments, vec!["--tty"]);
        assert!(!i.confirm && !t.confirm);
    }

    #[test]
    fn test_pid() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Pid, " host ", &mut bundle).unwrap();
        assert_eq!(bundle.create.pid_mode.as_deref(), Some("host"));
        assert_eq!(effect.fragments, vec!["--pid host"]);
        assert!(effect.confirm);
    }

    #[test]
    fn test_pid_blank_is_absent() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Pid, "", &mut bundle).unwrap();
        assert!(bundle.create.pid_mode.is_none());
        assert!(!effect.confirm);
    }

    #[test]
    fn test_net() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Net, "host", &mut bundle).unwrap();
        assert_eq!(bundle.create.network.as_ref().unwrap().target, "host");
        assert_eq!(effect.fragments, vec!["--net host"]);
        assert!(effect.confirm);
    }

    #[test]
    fn test_net_invalid() {
        let mut bundle = OptionsBundle::new("img");
        let err = apply(AutoLabel::Net, "name=n1,bogus=1", &mut bundle).unwrap_err();
        assert!(matches!(err, AutoRunError::InvalidOption { .. }));
        assert!(bundle.create.network.is_none());
    }

    #[test]
    fn test_name() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Name, "web", &mut bundle).unwrap();
        assert_eq!(bundle.run.name.as_deref(), Some("web"));
        assert_eq!(effect.fragments, vec!["--name web"]);
        assert!(!effect.confirm);
    }

    #[test]
    fn test_mount_local_dir() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::MountLocalDir, "/workspace", &mut bundle).unwrap();
        assert_eq!(
            effect.fragments,
            vec!["--mount type=bind,source=/home/dev/project,target=/workspace"]
        );
        assert_eq!(
            bundle.create.mounts,
            vec![MountSpec::bind("/home/dev/project", "/workspace")]
        );
        assert!(effect.confirm);
    }

    #[test]
    fn test_mount_local_dir_without_cwd() {
        let mut bundle = OptionsBundle::new("img");
        let host = FakeHost::new().without_cwd();
        let err = AutoLabel::MountLocalDir
            .apply("/workspace", &ImageConfig::default(), &mut bundle, &host)
            .unwrap_err();
        assert!(matches!(err, AutoRunError::EnvironmentUnavailable(_)));
        assert!(bundle.create.mounts.is_empty());
    }

    #[test]
    fn test_env_passthrough() {
        let mut bundle = OptionsBundle::new("img");
        let host = FakeHost::new().with_var("API_TOKEN", "s3cret");
        let effect = AutoLabel::Env
            .apply("API_TOKEN, MISSING", &ImageConfig::default(), &mut bundle, &host)
            .unwrap();
        assert_eq!(bundle.create.env, vec!["API_TOKEN=s3cret", "MISSING="]);
        assert_eq!(effect.fragments, vec!["--env API_TOKEN", "--env MISSING"]);
        assert_eq!(
            effect.detail.as_deref(),
            Some("[--env API_TOKEN --env MISSING] Set environment variables")
        );
        assert!(!effect.confirm);
    }

    #[test]
    fn test_env_blank() {
        let mut bundle = OptionsBundle::new("img");
        let effect = apply(AutoLabel::Env, " ", &mut bundle).unwrap();
        assert_eq!(effect, LabelEffect::default());
    }
}
