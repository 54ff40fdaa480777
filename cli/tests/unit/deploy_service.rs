//! Tests for the full deploy pipeline and preflight ordering.

#![allow(clippy::expect_used)]

use demoprov_cli::application::services::deploy::deploy;
use demoprov_cli::application::services::preflight::preflight;
use demoprov_cli::domain::{Outcome, Overrides, ProvisionError, ResourceKind, Settings, ToolConfig};
use demoprov_cli::infra::platform::PlatformCli;

use crate::helpers::{
    FakePlatform, MockCommandRunner, NoopReporter, RecordingReporter, RecordingSleeper,
    err_output, manifest, ok_output, settings,
};

fn no_token() -> Settings {
    Settings::resolve(&ToolConfig::default(), Overrides::default()).expect("defaults resolve")
}

/// Answers `version`, and reports "not found" for everything else.
fn empty_platform_runner() -> MockCommandRunner {
    MockCommandRunner::new(|args| match args {
        ["version"] => ok_output(b"platform version 1.6.2\n"),
        _ => err_output(1, b"not found"),
    })
}

#[tokio::test]
async fn test_deploy_creates_everything_then_converges() {
    let platform = FakePlatform::default();
    let sleeper = RecordingSleeper::default();
    let m = manifest();

    let first = deploy(&platform, &sleeper, &NoopReporter, &settings(false), &m)
        .await
        .expect("first deploy");
    let created = platform.mutations().len();
    let second = deploy(&platform, &sleeper, &NoopReporter, &settings(false), &m)
        .await
        .expect("second deploy");

    // project, group, node, service, two env vars, rule, lb
    assert_eq!(first.count(Outcome::Created), 8);
    assert_eq!(created, 8);
    assert_eq!(second.count(Outcome::Unchanged), 8);
    assert_eq!(platform.mutations().len(), created, "second run must not mutate");
}

#[tokio::test]
async fn test_deploy_orders_resources() {
    let platform = FakePlatform::default();
    let report = deploy(
        &platform,
        &RecordingSleeper::default(),
        &NoopReporter,
        &settings(false),
        &manifest(),
    )
    .await
    .expect("deploy");

    let kinds: Vec<ResourceKind> = report.changes.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ResourceKind::Project,
            ResourceKind::Group,
            ResourceKind::Node,
            ResourceKind::Service,
            ResourceKind::EnvVar,
            ResourceKind::EnvVar,
            ResourceKind::Rule,
            ResourceKind::LoadBalancer,
        ]
    );
    assert_eq!(report.changes[4].name, "frontend/API_URL");
}

#[tokio::test]
async fn test_deploy_collects_endpoints_services_first() {
    let platform = FakePlatform::default();
    let report = deploy(
        &platform,
        &RecordingSleeper::default(),
        &NoopReporter,
        &settings(false),
        &manifest(),
    )
    .await
    .expect("deploy");

    let urls: Vec<&str> = report.endpoints.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://frontend.demo.example", "http://public.lb.example"]
    );
}

#[tokio::test]
async fn test_deploy_missing_token_touches_nothing() {
    let runner = empty_platform_runner();
    let platform = PlatformCli::new(&runner, "platform", false);

    let err = deploy(
        &platform,
        &RecordingSleeper::default(),
        &NoopReporter,
        &no_token(),
        &manifest(),
    )
    .await
    .expect_err("missing token");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::MissingToken)
    ));
    assert!(err.to_string().contains("PLATFORM_TOKEN"));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_preflight_missing_token_makes_no_calls() {
    let runner = empty_platform_runner();
    let platform = PlatformCli::new(&runner, "platform", false);

    preflight(&no_token(), Some(&manifest()), &platform)
        .await
        .expect_err("missing token");
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_preflight_rejects_old_cli() {
    let platform = FakePlatform::with_version(semver::Version::new(1, 2, 0));

    let err = preflight(&settings(false), Some(&manifest()), &platform)
        .await
        .expect_err("too old");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::VersionMismatch { found, .. }) if found == "1.2.0"
    ));
}

#[tokio::test]
async fn test_preflight_invalid_manifest_before_version_check() {
    let runner = empty_platform_runner();
    let platform = PlatformCli::new(&runner, "platform", false);
    let mut m = manifest();
    m.project.provider = "mainframe".to_string();

    let err = preflight(&settings(false), Some(&m), &platform)
        .await
        .expect_err("invalid manifest");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::InvalidManifest(_))
    ));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_dry_run_deploy_issues_no_mutating_calls() {
    let runner = empty_platform_runner();
    let platform = PlatformCli::new(&runner, "platform", true);
    let sleeper = RecordingSleeper::default();
    let reporter = RecordingReporter::default();

    let report = deploy(&platform, &sleeper, &reporter, &settings(true), &manifest())
        .await
        .expect("dry run");

    assert!(report.dry_run);
    assert!(runner.mutating_calls().is_empty(), "{:?}", runner.mutating_calls());
    assert!(!runner.calls().is_empty(), "reads still run");
    assert!(sleeper.sleeps().is_empty(), "readiness wait is skipped");
    assert!(report.project.uuid.is_none());
    assert!(reporter.messages().contains(
        &"step: dry-run: platform project create shop-demo --provider aws --region us-east-1 --monitoring none"
            .to_string()
    ));
    assert!(
        reporter
            .messages()
            .iter()
            .any(|m| m == "step: dry-run: platform env set API_URL=http://api:8080 --project shop-demo --service frontend")
    );
}

#[tokio::test]
async fn test_deploy_stops_at_first_failed_mutation() {
    let runner = MockCommandRunner::new(|args| match args {
        ["version"] => ok_output(b"1.6.2"),
        ["project", "get", ..] => ok_output(
            b"Name: shop-demo\nUUID: 0b7e\nStatus: ok\nAvailable: 1\n",
        ),
        ["group", "list", ..] => ok_output(b"NAME\n"),
        ["group", "create", ..] => err_output(3, b"quota exceeded"),
        _ => err_output(1, b""),
    });
    let platform = PlatformCli::new(&runner, "platform", false);

    let err = deploy(
        &platform,
        &RecordingSleeper::default(),
        &NoopReporter,
        &settings(false),
        &manifest(),
    )
    .await
    .expect_err("group create fails");

    let failed = err
        .chain()
        .find_map(|c| c.downcast_ref::<ProvisionError>())
        .expect("provision error in chain");
    assert!(matches!(
        failed,
        ProvisionError::CommandFailed { code: 3, stderr, .. } if stderr == "quota exceeded"
    ));
    let nodes_touched = runner.calls().iter().any(|(_, args)| args[0] == "node");
    assert!(!nodes_touched, "pipeline must stop at the failure");
}

#[tokio::test]
async fn test_deploy_waits_on_project_name() {
    let runner = MockCommandRunner::new(|args| match args {
        ["version"] => ok_output(b"1.6.2"),
        ["project", "get", "shop-demo"] => ok_output(
            b"Name: shop-demo\nUUID: uuid-shop-demo\nStatus: ok\nAvailable: 1\n",
        ),
        [_, "create" | "set" | "add", ..] => ok_output(b""),
        _ => err_output(1, b"not found"),
    });
    let platform = PlatformCli::new(&runner, "platform", false);
    let mut bounded = settings(false);
    bounded.retry.max_attempts = Some(3);

    let report = deploy(
        &platform,
        &RecordingSleeper::default(),
        &NoopReporter,
        &bounded,
        &manifest(),
    )
    .await
    .expect("deploy");

    assert_eq!(report.project.uuid.as_deref(), Some("uuid-shop-demo"));
    let project_reads: Vec<String> = runner
        .calls()
        .into_iter()
        .filter(|(_, args)| args[0] == "project" && args[1] == "get")
        .map(|(_, args)| args[2].clone())
        .collect();
    assert_eq!(project_reads, vec!["shop-demo", "shop-demo"]);
}
