use process_management::{
    engine::{InMemoryRepository, RepositoryService, SqliteRepository},
    management::{deployments_server, MBeanServer, ManagementValue, ObjectName, DEPLOYMENTS_OBJECT_NAME},
    Error,
};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/trivialProcess.bpmn")
        .to_string_lossy()
        .into_owned()
}

fn rows(value: ManagementValue) -> Vec<Vec<String>> {
    match value {
        ManagementValue::Rows(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    }
}

fn row(value: ManagementValue) -> Vec<String> {
    match value {
        ManagementValue::Row(row) => row,
        other => panic!("expected a row, got {:?}", other),
    }
}

struct Harness {
    repository: Arc<dyn RepositoryService>,
    server: MBeanServer,
    name: ObjectName,
}

impl Harness {
    async fn new(repository: Arc<dyn RepositoryService>) -> Self {
        repository.init().await.expect("Failed to initialize repository");
        let (server, name) = deployments_server(repository.clone(), DEPLOYMENTS_OBJECT_NAME)
            .await
            .expect("Failed to register deployments bean");
        Self { repository, server, name }
    }

    async fn memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new())).await
    }

    async fn sqlite() -> Self {
        let repository = SqliteRepository::in_memory()
            .await
            .expect("Failed to open SQLite repository");
        Self::new(Arc::new(repository)).await
    }

    /// File-backed SQLite with a multi-connection pool, so readers run on
    /// their own connections while a deploy transaction is open.
    async fn sqlite_file(dir: &tempfile::TempDir) -> Self {
        let repository = SqliteRepository::new(&dir.path().join("engine.db"), 4)
            .await
            .expect("Failed to open SQLite repository");
        Self::new(Arc::new(repository)).await
    }

    async fn deployments(&self) -> Vec<Vec<String>> {
        rows(self.server.get_attribute(&self.name, "Deployments").await.unwrap())
    }

    async fn process_definitions(&self) -> Vec<Vec<String>> {
        rows(self.server.get_attribute(&self.name, "ProcessDefinitions").await.unwrap())
    }

    async fn invoke(&self, operation: &str, args: &[&str]) -> Result<ManagementValue, Error> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.server.invoke(&self.name, operation, &args).await
    }

    async fn deploy_fixture(&self) {
        let result = self
            .invoke("deployProcessDefinition", &["trivialProcess.bpmn", fixture().as_str()])
            .await
            .unwrap();
        assert_eq!(result, ManagementValue::Void);
    }
}

/// Deploy, redeploy, suspend, activate and delete, checking the facade
/// against the engine API at every step.
async fn run_lifecycle(h: Harness) {
    // no process deployed yet
    assert!(h.deployments().await.is_empty());
    assert!(h.process_definitions().await.is_empty());

    h.deploy_fixture().await;

    let deployments = h.deployments().await;
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].len(), 3);
    let first_deployment_id = deployments[0][0].clone();

    let definitions = h.process_definitions().await;
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].len(), 5);
    assert!(!definitions[0][0].is_empty());
    assert_eq!(definitions[0][1], "My process");
    assert_eq!(definitions[0][2], "1");
    assert_eq!(definitions[0][3], "false");
    assert_eq!(definitions[0][4], "This process to test JMX");

    // redeploy the same process
    h.deploy_fixture().await;

    let deployments = h.deployments().await;
    assert_eq!(deployments.len(), 2);
    assert!(deployments.iter().all(|d| d.len() == 3));

    let definitions = h.process_definitions().await;
    assert_eq!(definitions.len(), 2);
    assert!(definitions.iter().all(|d| d.len() == 5));
    let v1 = definitions.iter().find(|d| d[2] == "1").expect("no version 1");
    let v2 = definitions.iter().find(|d| d[2] == "2").expect("no version 2");
    for d in [v1, v2] {
        assert_eq!(d[1], "My process");
        assert_eq!(d[3], "false");
        assert_eq!(d[4], "This process to test JMX");
    }
    let (pid_v1, pid_v2) = (v1[0].clone(), v2[0].clone());
    let v2_before_delete = v2.clone();

    // suspend the one with version 2
    h.invoke("suspendProcessDefinitionById", &[pid_v2.as_str()]).await.unwrap();
    assert!(h.repository.get_process_definition(&pid_v2).await.unwrap().is_suspended());
    assert!(!h.repository.get_process_definition(&pid_v1).await.unwrap().is_suspended());

    let pd = row(h.invoke("getProcessDefinitionById", &[pid_v2.as_str()]).await.unwrap());
    assert_eq!(pd.len(), 5);
    assert_eq!(pd[3], "true");
    let pd = row(h.invoke("getProcessDefinitionById", &[pid_v1.as_str()]).await.unwrap());
    assert_eq!(pd.len(), 5);
    assert_eq!(pd[3], "false");

    // reactivate it
    h.invoke("activatedProcessDefinitionById", &[pid_v2.as_str()]).await.unwrap();
    assert!(!h.repository.get_process_definition(&pid_v2).await.unwrap().is_suspended());
    assert!(!h.repository.get_process_definition(&pid_v1).await.unwrap().is_suspended());
    for pid in [&pid_v1, &pid_v2] {
        let pd = row(h.invoke("getProcessDefinitionById", &[pid.as_str()]).await.unwrap());
        assert_eq!(pd[3], "false");
    }

    // activating an active definition is a no-op
    h.invoke("activatedProcessDefinitionById", &[pid_v1.as_str()]).await.unwrap();
    assert!(!h.repository.get_process_definition(&pid_v1).await.unwrap().is_suspended());

    // undeploy the one with version 1
    h.invoke("deleteDeployment", &[first_deployment_id.as_str()]).await.unwrap();

    let engine_deployments = h.repository.list_deployments().await.unwrap();
    assert_eq!(engine_deployments.len(), 1);
    assert_ne!(engine_deployments[0].id, first_deployment_id);

    let deployments = h.deployments().await;
    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].len(), 3);
    assert_ne!(deployments[0][0], first_deployment_id);

    let definitions = h.process_definitions().await;
    assert_eq!(definitions, vec![v2_before_delete]);
    assert!(matches!(
        h.repository.get_process_definition(&pid_v1).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_lifecycle_in_memory() {
    run_lifecycle(Harness::memory().await).await;
}

#[tokio::test]
async fn test_lifecycle_sqlite() {
    run_lifecycle(Harness::sqlite().await).await;
}

async fn run_not_found(h: Harness) {
    h.deploy_fixture().await;
    let deployments_before = h.deployments().await;
    let definitions_before = h.process_definitions().await;

    for operation in [
        "suspendProcessDefinitionById",
        "activatedProcessDefinitionById",
        "getProcessDefinitionById",
        "deleteDeployment",
    ] {
        let err = h.invoke(operation, &["never-existed"]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{} returned {:?}", operation, err);
    }

    // already deleted ids behave the same
    let extra_id = {
        h.deploy_fixture().await;
        let deployments = h.deployments().await;
        deployments
            .iter()
            .find(|d| !deployments_before.contains(d))
            .map(|d| d[0].clone())
            .unwrap()
    };
    h.invoke("deleteDeployment", &[extra_id.as_str()]).await.unwrap();
    assert!(matches!(
        h.invoke("deleteDeployment", &[extra_id.as_str()]).await,
        Err(Error::NotFound(_))
    ));

    assert_eq!(h.deployments().await, deployments_before);
    assert_eq!(h.process_definitions().await, definitions_before);
}

#[tokio::test]
async fn test_not_found_in_memory() {
    run_not_found(Harness::memory().await).await;
}

#[tokio::test]
async fn test_not_found_sqlite() {
    run_not_found(Harness::sqlite().await).await;
}

#[tokio::test]
async fn test_invalid_resources_change_nothing() {
    let h = Harness::memory().await;
    let dir = tempfile::tempdir().unwrap();

    let broken = dir.path().join("broken.bpmn");
    std::fs::write(&broken, "<definitions><process id=").unwrap();
    let no_process = dir.path().join("empty.bpmn");
    std::fs::write(&no_process, "<definitions></definitions>").unwrap();
    let missing = dir.path().join("missing.bpmn");

    let cases = [
        ("broken.bpmn", broken.to_string_lossy().into_owned()),
        ("empty.bpmn", no_process.to_string_lossy().into_owned()),
        ("missing.bpmn", missing.to_string_lossy().into_owned()),
        ("notes.txt", fixture()),
    ];
    for (name, path) in &cases {
        let err = h
            .invoke("deployProcessDefinition", &[*name, path.as_str()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Deploy(_)), "{} returned {:?}", name, err);
    }

    assert!(h.deployments().await.is_empty());
    assert!(h.process_definitions().await.is_empty());
}

async fn run_concurrent_sessions(h: Harness) {
    let h = Arc::new(h);

    let writers = (0..5).map(|_| {
        let h = h.clone();
        async move { h.deploy_fixture().await }
    });
    let readers = (0..20).map(|_| {
        let h = h.clone();
        async move {
            // every definition row must belong to a visible deployment
            let definitions = h.process_definitions().await;
            let deployments = h.deployments().await;
            for d in &definitions {
                assert!(deployments.iter().any(|dep| d[0].ends_with(&dep[0])));
            }
        }
    });

    tokio::join!(futures::future::join_all(writers), futures::future::join_all(readers));

    let definitions = h.process_definitions().await;
    let mut versions: Vec<u32> = definitions.iter().map(|d| d[2].parse().unwrap()).collect();
    versions.sort_unstable();
    assert_eq!(versions, vec![1, 2, 3, 4, 5]);
    assert_eq!(h.deployments().await.len(), 5);
}

#[tokio::test]
async fn test_concurrent_sessions_in_memory() {
    run_concurrent_sessions(Harness::memory().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    run_concurrent_sessions(Harness::sqlite_file(&dir).await).await;
}

#[tokio::test]
async fn test_unknown_members_and_instances() {
    let h = Harness::memory().await;

    assert!(matches!(
        h.server.get_attribute(&h.name, "Nope").await,
        Err(Error::Invocation(_))
    ));
    assert!(matches!(h.invoke("deleteDeployment", &[]).await, Err(Error::Invocation(_))));

    let other: ObjectName = "org.example.mgmt:type=Deployments".parse().unwrap();
    assert!(matches!(
        h.server.get_attribute(&other, "Deployments").await,
        Err(Error::Invocation(_))
    ));
}
