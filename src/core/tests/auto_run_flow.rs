//! End-to-end auto-run against an in-memory engine.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use autorun_core::{
    AutoRunError, AutoRunRequest, AutoRunner, ContainerConfig, ContainerEngine, ExposedPort, HostEnv,
    ImageConfig, Outcome, PullPolicy, ResolvedReference, Result, RunOptions, Terminal,
};

struct InMemoryEngine {
    images: HashMap<String, ImageConfig>,
    last_run: Mutex<Option<ContainerConfig>>,
}

impl InMemoryEngine {
    fn with_image(image: &str, config: ImageConfig) -> Self {
        let mut images = HashMap::new();
        images.insert(image.to_string(), config);
        Self {
            images,
            last_run: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ContainerEngine for InMemoryEngine {
    async fn resolve_reference(&self, image: &str, _trust: bool) -> Result<ResolvedReference> {
        ResolvedReference::from_image(image)
    }

    async fn pull_image(&self, _reference: &str, _platform: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn tag_trusted(&self, _canonical: &str, _tagged: &str) -> Result<()> {
        Ok(())
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageConfig> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| AutoRunError::NotFound(reference.to_string()))
    }

    async fn server_os(&self) -> Result<String> {
        Ok("linux".to_string())
    }

    async fn run_container(&self, _run: &RunOptions, config: &ContainerConfig) -> Result<i32> {
        *self.last_run.lock().unwrap() = Some(config.clone());
        Ok(0)
    }
}

struct FixedHost;

impl HostEnv for FixedHost {
    fn var(&self, name: &str) -> Result<Option<String>> {
        Ok(match name {
            "API_TOKEN" => Some("s3cret".to_string()),
            _ => None,
        })
    }

    fn current_dir(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/work/site"))
    }
}

fn devserver_image() -> ImageConfig {
    let mut image = ImageConfig::with_labels([
        ("org.opencontainers.image.title", "devserver"),
        ("org.opencontainers.image.description", "Serves the current directory"),
        ("org.opencontainers.image.documentation", "https://example.com/devserver"),
        ("com.docker.auto.rm", "true"),
        ("com.docker.auto.interactive", "1"),
        ("com.docker.auto.tty", "T"),
        ("com.docker.auto.name", "devserver"),
        ("com.docker.auto.publish-all", "true"),
        ("com.docker.auto.mount-local-dir-to", "/srv"),
        ("com.docker.auto.env", "API_TOKEN, MISSING"),
        ("com.docker.auto.cmd", "serve --root /srv"),
    ]);
    image.exposed_ports = ["8080/tcp".parse::<ExposedPort>().unwrap(), "53/udp".parse().unwrap()]
        .into_iter()
        .collect();
    image
}

#[tokio::test]
async fn full_label_set_runs_after_confirmation() {
    let runner = AutoRunner::new(InMemoryEngine::with_image("devserver", devserver_image()), "docker")
        .with_host(FixedHost);
    let mut term = Terminal::new(Cursor::new(b"yes\n".to_vec()), Vec::new(), Vec::new());
    let request = AutoRunRequest {
        pull: PullPolicy::Never,
        ..AutoRunRequest::new("devserver")
    };

    let outcome = runner.run(&request, &mut term).await.unwrap();
    assert_eq!(outcome, Outcome::Exited(0));

    let err = String::from_utf8(term.err).unwrap();
    assert!(err.contains("Auto-running devserver"));
    assert!(err.contains("devserver: Serves the current directory"));
    assert!(err.contains("See more at https://example.com/devserver"));
    assert!(err.contains("Auto generated options:"));
    assert!(err.contains("  * [serve --root /srv] Arguments to pass to the entrypoint"));
    assert!(err.contains("are you OK to proceed? ([y]/n) "));
    assert!(term.out.is_empty());

    let ran = runner.engine().last_run.lock().unwrap().clone().unwrap();
    assert!(ran.auto_remove && ran.stdin_open && ran.tty);
    assert_eq!(ran.name.as_deref(), Some("devserver"));
    assert_eq!(ran.args, vec!["serve", "--root", "/srv"]);
    assert_eq!(ran.ports.len(), 2);
    assert_eq!(ran.env, vec!["API_TOKEN=s3cret", "MISSING="]);
    assert_eq!(ran.mounts.len(), 1);
    assert_eq!(ran.mounts[0].source.as_deref(), Some("/work/site"));
    assert_eq!(ran.mounts[0].target, "/srv");
}

#[tokio::test]
async fn print_mode_renders_every_fragment() {
    let runner = AutoRunner::new(InMemoryEngine::with_image("devserver", devserver_image()), "podman")
        .with_host(FixedHost);
    let mut term = Terminal::new(Cursor::new(Vec::new()), Vec::new(), Vec::new());
    let request = AutoRunRequest {
        pull: PullPolicy::Never,
        print: true,
        ..AutoRunRequest::new("devserver")
    };

    let Outcome::Printed(command) = runner.run(&request, &mut term).await.unwrap() else {
        panic!("expected print outcome");
    };
    assert!(command.starts_with("podman run "));
    assert!(command.ends_with(" devserver serve --root /srv"));
    for fragment in [
        "--rm",
        "--interactive",
        "--tty",
        "--name devserver",
        "--publish 53:53/udp --publish 8080:8080/tcp",
        "--mount type=bind,source=/work/site,target=/srv",
        "--env API_TOKEN",
        "--env MISSING",
    ] {
        assert!(command.contains(fragment), "missing {fragment} in {command}");
    }
    assert_eq!(
        command,
        "podman run --rm --publish 53:53/udp --publish 8080:8080/tcp --interactive --tty \
         --name devserver --mount type=bind,source=/work/site,target=/srv \
         --env API_TOKEN --env MISSING devserver serve --root /srv"
    );
    assert!(term.err.is_empty());
    assert_eq!(String::from_utf8(term.out).unwrap(), format!("{command}\n"));
    assert!(runner.engine().last_run.lock().unwrap().is_none());
}

#[tokio::test]
async fn declined_prompt_runs_nothing() {
    let runner = AutoRunner::new(InMemoryEngine::with_image("devserver", devserver_image()), "docker")
        .with_host(FixedHost);
    let mut term = Terminal::new(Cursor::new(b"no\n".to_vec()), Vec::new(), Vec::new());
    let request = AutoRunRequest {
        pull: PullPolicy::Never,
        ..AutoRunRequest::new("devserver")
    };

    let err = runner.run(&request, &mut term).await.unwrap_err();
    assert!(matches!(err, AutoRunError::Canceled));
    assert!(runner.engine().last_run.lock().unwrap().is_none());
}

#[tokio::test]
async fn closed_input_is_an_input_error() {
    let runner = AutoRunner::new(InMemoryEngine::with_image("devserver", devserver_image()), "docker")
        .with_host(FixedHost);
    let mut term = Terminal::new(Cursor::new(Vec::new()), Vec::new(), Vec::new());
    let request = AutoRunRequest {
        pull: PullPolicy::Never,
        ..AutoRunRequest::new("devserver")
    };

    let err = runner.run(&request, &mut term).await.unwrap_err();
    assert!(matches!(err, AutoRunError::InputError(_)));
}
