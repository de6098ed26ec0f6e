//! End-to-end submission through the built-in local collaborators.
//!
//! A whole attempt runs inside a temporary directory sandbox: the package
//! store, the running-state store, and the scheduler endpoint are all
//! directories under the sandbox, resolved from the default registry
//! entries exactly as the CLI would resolve them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use topsub::local::LaunchRecord;
use topsub::{
    PluginRegistry, RunningState, Stage, StateManagerAdaptor, SubmissionArgs, Submitter,
    TopologyDescriptor, assemble,
};

struct Sandbox {
    home: TempDir,
    args: SubmissionArgs,
}

fn sandbox() -> Sandbox {
    let home = TempDir::new().unwrap();
    let conf = home.path().join("conf");
    std::fs::create_dir_all(&conf).unwrap();
    std::fs::write(
        conf.join("devel.toml"),
        r#"
[topsub]
packing.containers = 2
"#,
    )
    .unwrap();

    let package = home.path().join("word-count.tar.gz");
    std::fs::write(&package, b"fake tarball bytes").unwrap();

    let defn = home.path().join("word-count.json");
    std::fs::write(
        &defn,
        r#"{
            "id": "word-count-a1b2",
            "name": "word-count",
            "components": [
                {"name": "reader", "parallelism": 2},
                {"name": "counter", "parallelism": 3}
            ]
        }"#,
    )
    .unwrap();

    let args = SubmissionArgs {
        cluster: "devel".to_string(),
        role: "ads".to_string(),
        environ: "staging".to_string(),
        home: home.path().to_path_buf(),
        config_path: conf,
        topology_package: package,
        topology_defn: defn,
        topology_artifact: home.path().join("word-count.jar"),
        config_overrides: Vec::new(),
    };
    Sandbox { home, args }
}

fn build_submitter(args: &SubmissionArgs) -> (Submitter, TopologyDescriptor) {
    let topology = TopologyDescriptor::load(&args.topology_defn).unwrap();
    let config = assemble(args, &topology).unwrap();
    let registry = PluginRegistry::with_builtins();
    let submitter = Submitter::new(
        config.clone(),
        topology.clone(),
        registry.resolve_state_manager(&config).unwrap(),
        registry.resolve_uploader(&config).unwrap(),
        registry.resolve_launcher(&config).unwrap(),
        registry.resolve_packing(&config).unwrap(),
    );
    (submitter, topology)
}

fn uploaded_package(home: &Path) -> PathBuf {
    home.join("uploads")
        .join("word-count")
        .join("word-count.tar.gz")
}

#[tokio::test]
async fn submits_end_to_end_on_the_local_filesystem() {
    let Sandbox { home, args } = sandbox();
    let (submitter, topology) = build_submitter(&args);

    let outcome = submitter.submit().await;
    assert!(outcome.success, "outcome: {outcome:?}");

    // The package landed in the shared store.
    let uploaded = uploaded_package(home.path());
    assert_eq!(std::fs::read(&uploaded).unwrap(), b"fake tarball bytes");

    // The launch record carries the locator and a complete packing plan.
    let record_path = home.path().join("scheduler").join("word-count.json");
    let record: LaunchRecord =
        serde_json::from_slice(&std::fs::read(&record_path).unwrap()).unwrap();
    assert_eq!(record.topology_id, "word-count-a1b2");
    let located = record.package_location.to_file_path().unwrap();
    assert_eq!(std::fs::read(&located).unwrap(), b"fake tarball bytes");
    assert_eq!(record.plan.instance_count() as u32, topology.instance_count());
    assert_eq!(record.plan.containers.len(), 2);

    // The topology is registered as running.
    assert!(home.path().join("state").join("word-count.running").exists());
}

#[tokio::test]
async fn second_attempt_is_rejected_while_running() {
    let Sandbox { home: _home, args } = sandbox();

    let (first, _) = build_submitter(&args);
    assert!(first.submit().await.success);

    let (second, _) = build_submitter(&args);
    let outcome = second.submit().await;
    assert!(!outcome.success);
    assert_eq!(outcome.failed_stage, Some(Stage::Validating));
}

#[tokio::test]
async fn missing_package_fails_the_upload_and_leaves_no_state() {
    let Sandbox { home, args } = sandbox();
    std::fs::remove_file(&args.topology_package).unwrap();

    let (submitter, _) = build_submitter(&args);
    let outcome = submitter.submit().await;

    assert!(!outcome.success);
    assert_eq!(outcome.failed_stage, Some(Stage::Uploading));
    assert!(!uploaded_package(home.path()).exists());
    assert!(!home.path().join("scheduler").join("word-count.json").exists());
    assert!(!home.path().join("state").join("word-count.running").exists());
}

#[tokio::test]
async fn running_registration_round_trips_through_the_adaptor() {
    let Sandbox { home, args } = sandbox();
    let (submitter, _) = build_submitter(&args);
    assert!(submitter.submit().await.success);

    let topology = TopologyDescriptor::load(&args.topology_defn).unwrap();
    let config = assemble(&args, &topology).unwrap();
    let registry = PluginRegistry::with_builtins();
    let mut statemgr = registry.resolve_state_manager(&config).unwrap();
    statemgr.initialize(&config).unwrap();
    let adaptor = StateManagerAdaptor::new(statemgr);

    assert_eq!(
        adaptor
            .topology_is_running("word-count", Duration::from_secs(5))
            .await,
        RunningState::Running
    );
    adaptor.clear_running("word-count").await.unwrap();
    assert!(!home.path().join("state").join("word-count.running").exists());
}
