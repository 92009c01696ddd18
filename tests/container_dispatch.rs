mod common;

use std::fs;

use tempfile::TempDir;

use arthur_ops::container::{self, Action, ContainerRequest};
use arthur_ops::defaults::Defaults;
use arthur_ops::environment::Environment;

use common::{environment, ScriptedRunner};

struct Fixture {
    _root: TempDir,
    env: Environment,
    config: String,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = root.path().join("dw-config");
        fs::create_dir_all(&config).unwrap();
        let config = fs::canonicalize(&config).unwrap().display().to_string();
        let env = environment(root.path());
        Self {
            _root: root,
            env,
            config,
        }
    }

    fn source_checkout(self) -> Self {
        fs::write(
            self.env.cwd.join("setup.py"),
            "from setuptools import setup\nsetup(name=\"redshift_etl\")\n",
        )
        .unwrap();
        self
    }

    fn home(&self) -> String {
        self.env.home.as_ref().unwrap().display().to_string()
    }
}

fn request(action: Action, fixture: &Fixture) -> ContainerRequest {
    ContainerRequest {
        action,
        profile: None,
        tag: None,
        writable_config: false,
        config_dir: Some(fixture.config.clone()),
        target_env: Some("dw-dev".to_string()),
    }
}

fn args(fixture: &Fixture, action: Action) -> Vec<String> {
    container::plan(&request(action, fixture), &fixture.env, &Defaults::default())
        .unwrap()
        .invocation
        .args
}

#[test]
fn run_outside_checkout_becomes_read_only_shell() {
    let fixture = Fixture::new();

    let plan = container::plan(&request(Action::Run, &fixture), &fixture.env, &Defaults::default()).unwrap();

    assert_eq!(plan.requested, Action::Run);
    assert_eq!(plan.action, Action::RunRo);
    assert!(plan.downgraded);
    assert!(!plan.invocation.args.iter().any(|a| a.contains("/opt/src/arthur-redshift-etl")));
}

#[test]
fn run_in_checkout_mounts_sources() {
    let fixture = Fixture::new().source_checkout();

    let plan = container::plan(&request(Action::Run, &fixture), &fixture.env, &Defaults::default()).unwrap();

    assert_eq!(plan.action, Action::Run);
    let source = format!("{}:/opt/src/arthur-redshift-etl", fixture.env.cwd.display());
    assert!(plan.invocation.args.contains(&source));
}

#[test]
fn run_ro_builds_interactive_shell_command() {
    let fixture = Fixture::new();

    let expected: Vec<String> = [
        "run".to_string(),
        "--rm".to_string(),
        "--interactive".to_string(),
        "--tty".to_string(),
        "--volume".to_string(),
        format!("{}:/opt/data-warehouse/dw-config:ro", fixture.config),
        "--volume".to_string(),
        format!("{}/.aws:/root/.aws", fixture.home()),
        "--env".to_string(),
        "ARTHUR_DEFAULT_PREFIX=dw-dev".to_string(),
        "--env".to_string(),
        "DATA_WAREHOUSE_CONFIG=/opt/data-warehouse/dw-config".to_string(),
        "arthur-redshift-etl:latest".to_string(),
        "/bin/bash".to_string(),
        "--login".to_string(),
    ]
    .to_vec();

    assert_eq!(args(&fixture, Action::RunRo), expected);
}

#[test]
fn batch_actions_run_their_entry_commands() {
    let fixture = Fixture::new();

    let tail = |action| {
        let args = args(&fixture, action);
        let image = args.iter().position(|a| a == "arthur-redshift-etl:latest").unwrap();
        assert!(!args.contains(&"--tty".to_string()));
        args[image + 1..].to_vec()
    };

    assert_eq!(tail(Action::Deploy), ["upload_env.sh", "-y", "dw-dev"]);
    assert_eq!(
        tail(Action::Upload),
        ["arthur.py", "sync", "--force", "--deploy", "--prefix", "dw-dev"]
    );
    assert_eq!(
        tail(Action::Validate),
        ["arthur.py", "validate", "--prefix", "dw-dev", "--keep-going"]
    );
}

#[test]
fn writable_flag_drops_read_only_mount_option() {
    let fixture = Fixture::new();
    let mut req = request(Action::Upload, &fixture);
    req.writable_config = true;

    let plan = container::plan(&req, &fixture.env, &Defaults::default()).unwrap();

    let mount = format!("{}:/opt/data-warehouse/dw-config", fixture.config);
    assert!(plan.invocation.args.contains(&mount));
}

#[test]
fn profile_and_tag_are_applied() {
    let fixture = Fixture::new();
    let mut req = request(Action::Validate, &fixture);
    req.profile = Some("warehouse-admin".to_string());
    req.tag = Some("v1.7".to_string());

    let plan = container::plan(&req, &fixture.env, &Defaults::default()).unwrap();

    assert_eq!(plan.image, "arthur-redshift-etl:v1.7");
    assert!(plan.invocation.args.contains(&"AWS_PROFILE=warehouse-admin".to_string()));
}

#[test]
fn target_env_defaults_to_login_name() {
    let fixture = Fixture::new();
    let mut req = request(Action::Validate, &fixture);
    req.target_env = None;

    let plan = container::plan(&req, &fixture.env, &Defaults::default()).unwrap();

    assert_eq!(plan.target_env, "alice");
}

#[test]
fn missing_config_directory_is_reported_before_docker_runs() {
    let fixture = Fixture::new();
    let mut req = request(Action::Deploy, &fixture);
    req.config_dir = Some("no-such-config".to_string());

    let err = container::plan(&req, &fixture.env, &Defaults::default()).unwrap_err();

    assert_eq!(err.code.as_str(), "preflight.config_dir_missing");
}

#[test]
fn dispatch_returns_container_exit_code() {
    let fixture = Fixture::new();
    let plan = container::plan(&request(Action::Validate, &fixture), &fixture.env, &Defaults::default()).unwrap();
    let runner = ScriptedRunner::new().interactive_exit(3);

    assert_eq!(container::dispatch(&plan, &runner).unwrap(), 3);
    assert_eq!(runner.calls().len(), 1);
    assert_eq!(runner.calls()[0].program, "docker");
}
