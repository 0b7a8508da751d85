use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::path::Path;
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    engine::{parser, Deployment, ProcessDefinition, RepositoryService, SuspensionState},
    Error, Result,
};

pub struct SqliteRepository {
    pool: Pool<Sqlite>,
    // Serializes writers so version assignment never races
    write_lock: Mutex<()>,
}

impl SqliteRepository {
    pub async fn new(path: &Path, max_connections: u32) -> Result<Self> {
        info!("Connecting to SQLite database: {}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to connect to SQLite: {}", e);
                Error::Sqlx(e)
            })?;

        Ok(Self::with_pool(pool))
    }

    /// Private database that lives as long as the repository.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    async fn set_state(&self, id: &str, state: SuspensionState) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        debug!("Setting process definition {} to {}", id, state);

        let result = sqlx::query("UPDATE process_definitions SET state = ?1 WHERE id = ?2")
            .bind(state.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("process definition '{}'", id)));
        }
        Ok(())
    }
}

fn deployment_from_row(r: &SqliteRow) -> Deployment {
    Deployment {
        id: r.get("id"),
        name: r.get("name"),
        deployment_time: r.get("deployment_time"),
    }
}

fn definition_from_row(r: &SqliteRow) -> Result<ProcessDefinition> {
    let version: i64 = r.get("version");
    Ok(ProcessDefinition {
        id: r.get("id"),
        key: r.get("process_key"),
        name: r.get("name"),
        version: u32::try_from(version)
            .map_err(|_| Error::Internal(format!("Invalid stored version: {}", version)))?,
        state: r.get::<String, _>("state").parse()?,
        description: r.get("description"),
        deployment_id: r.get("deployment_id"),
        resource_name: r.get("resource_name"),
    })
}

const SELECT_DEFINITIONS: &str = r#"
    SELECT id, process_key, name, version, state, description, deployment_id, resource_name
    FROM process_definitions
"#;

#[async_trait]
impl RepositoryService for SqliteRepository {
    async fn init(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to run migrations: {}", e);
                Error::Migrate(e)
            })?;

        Ok(())
    }

    async fn deploy(&self, name: &str, resource: &[u8]) -> Result<Deployment> {
        let descriptors = parser::parse_process_resource(name, resource)?;

        let deployment = Deployment {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            deployment_time: Utc::now(),
        };

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO deployments (id, name, deployment_time) VALUES (?1, ?2, ?3)")
            .bind(&deployment.id)
            .bind(&deployment.name)
            .bind(deployment.deployment_time)
            .execute(&mut *tx)
            .await?;

        for descriptor in &descriptors {
            let latest: i64 = sqlx::query(
                "SELECT COALESCE(MAX(version), 0) AS latest FROM process_definitions WHERE process_key = ?1",
            )
            .bind(&descriptor.key)
            .fetch_one(&mut *tx)
            .await?
            .get("latest");

            let version = u32::try_from(latest + 1)
                .map_err(|_| Error::Internal(format!("Version overflow for '{}'", descriptor.key)))?;
            let id = ProcessDefinition::make_id(&descriptor.key, version, &deployment.id);
            debug!("Registering process definition {}", id);

            sqlx::query(
                r#"
                INSERT INTO process_definitions (
                    id, process_key, name, version, state, description, deployment_id, resource_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&id)
            .bind(&descriptor.key)
            .bind(&descriptor.name)
            .bind(i64::from(version))
            .bind(SuspensionState::Active.to_string())
            .bind(&descriptor.description)
            .bind(&deployment.id)
            .bind(&deployment.name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Deployed {} ({}) with {} process definition(s)",
            deployment.name,
            deployment.id,
            descriptors.len()
        );

        Ok(deployment)
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        let rows = sqlx::query("SELECT id, name, deployment_time FROM deployments ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(deployment_from_row).collect())
    }

    async fn delete_deployment(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let definitions = sqlx::query("DELETE FROM process_definitions WHERE deployment_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deployments = sqlx::query("DELETE FROM deployments WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deployments == 0 {
            tx.rollback().await?;
            return Err(Error::NotFound(format!("deployment '{}'", id)));
        }

        tx.commit().await?;
        info!("Deleted deployment {} and {} process definition(s)", id, definitions);
        Ok(())
    }

    async fn list_process_definitions(&self) -> Result<Vec<ProcessDefinition>> {
        let rows = sqlx::query(&format!("{} ORDER BY process_key, version", SELECT_DEFINITIONS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(definition_from_row).collect()
    }

    async fn get_process_definition(&self, id: &str) -> Result<ProcessDefinition> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_DEFINITIONS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => definition_from_row(&r),
            None => Err(Error::NotFound(format!("process definition '{}'", id))),
        }
    }

    async fn suspend_process_definition(&self, id: &str) -> Result<()> {
        self.set_state(id, SuspensionState::Suspended).await
    }

    async fn activate_process_definition(&self, id: &str) -> Result<()> {
        self.set_state(id, SuspensionState::Active).await
    }
}
