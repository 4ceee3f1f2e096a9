//! Storage backends for tasks, projects, goals and profiles.
//!
//! Provides the [`Collection`] trait, implemented once against the hosted
//! PostgREST API ([`remote`]) and once as an in-memory test double
//! ([`memory`]). A [`Store`] bundles one collection per entity and is built
//! once at startup by [`create_store`]; the backend never changes afterwards.

pub mod memory;
pub mod remote;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::{
    Goal, GoalPatch, Project, ProjectPatch, ProfilePatch, Task, TaskPatch, UserProfile,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request to remote store failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("unexpected response from remote store: {0}")]
    Decode(String),

    #[error("in-memory {table} collection is full ({capacity} records)")]
    CapacityExceeded { table: &'static str, capacity: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A row type that lives in one owner-scoped table.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table (and PostgREST resource) name.
    const TABLE: &'static str;
    /// Column holding the owning user id.
    const OWNER_COLUMN: &'static str = "user_id";
    /// Column that `list` sorts ascending by.
    const ORDER_COLUMN: &'static str;

    type Patch: Serialize + Send + Sync;

    fn id(&self) -> &str;
    fn owner(&self) -> &str;
    fn order_key(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    /// Merge `patch` onto the record and stamp `updated_at`.
    fn apply(&mut self, patch: &Self::Patch, updated_at: DateTime<Utc>);
}

/// Owner-scoped CRUD over one table. Every lookup matches both id and owner.
#[async_trait]
pub trait Collection<T: Record>: Send + Sync {
    async fn insert(&self, record: T) -> StoreResult<T>;

    /// All records owned by `owner`, ascending by [`Record::ORDER_COLUMN`].
    async fn list(&self, owner: &str) -> StoreResult<Vec<T>>;

    async fn get(&self, owner: &str, id: &str) -> StoreResult<Option<T>>;

    /// Returns `None` when no record matched.
    async fn update(
        &self,
        owner: &str,
        id: &str,
        patch: &T::Patch,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<T>>;

    /// Returns whether a record was removed.
    async fn delete(&self, owner: &str, id: &str) -> StoreResult<bool>;
}

/// Which implementation a [`Store`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Remote,
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct Store {
    pub backend: Backend,
    pub tasks: Arc<dyn Collection<Task>>,
    pub projects: Arc<dyn Collection<Project>>,
    pub goals: Arc<dyn Collection<Goal>>,
    pub profiles: Arc<dyn Collection<UserProfile>>,
}

impl Store {
    /// A store backed by the hosted PostgREST API.
    pub fn remote(client: remote::RestClient) -> Self {
        Self {
            backend: Backend::Remote,
            tasks: Arc::new(remote::RemoteCollection::new(client.clone())),
            projects: Arc::new(remote::RemoteCollection::new(client.clone())),
            goals: Arc::new(remote::RemoteCollection::new(client.clone())),
            profiles: Arc::new(remote::RemoteCollection::new(client)),
        }
    }

    /// A store backed by the in-memory test double.
    pub fn memory(store: &memory::MemoryStore) -> Self {
        Self {
            backend: Backend::Memory,
            tasks: Arc::new(store.tasks.clone()),
            projects: Arc::new(store.projects.clone()),
            goals: Arc::new(store.goals.clone()),
            profiles: Arc::new(store.profiles.clone()),
        }
    }
}

/// Pick the storage backend from config.
///
/// With remote credentials present this is always the PostgREST store. Without
/// them, debug builds fall back to the in-memory test double (optionally seeded
/// with sample records); release builds refuse to start.
pub fn create_store(config: &AppConfig) -> anyhow::Result<Store> {
    if config.store_configured() {
        let client = remote::RestClient::new(
            &config.supabase.url,
            &config.supabase.service_role_key,
        )?;
        tracing::info!(url = %config.supabase.url, "using remote store");
        return Ok(Store::remote(client));
    }

    unconfigured_store(config)
}

#[cfg(debug_assertions)]
fn unconfigured_store(config: &AppConfig) -> anyhow::Result<Store> {
    let memory = memory::MemoryStore::new(config.dev.memory_capacity);
    if config.dev.seed_samples {
        memory::seed_samples(&memory, crate::auth::PLACEHOLDER_USER_ID, Utc::now());
    }
    tracing::warn!(
        capacity = config.dev.memory_capacity,
        "remote store not configured - using in-memory test store, data is lost on restart"
    );
    Ok(Store::memory(&memory))
}

#[cfg(not(debug_assertions))]
fn unconfigured_store(_config: &AppConfig) -> anyhow::Result<Store> {
    anyhow::bail!("remote store not configured: set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY")
}

// ── Record impls ────────────────────────────────────────────────────

impl Record for Task {
    const TABLE: &'static str = "tasks";
    const ORDER_COLUMN: &'static str = "scheduled_date";
    type Patch = TaskPatch;

    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> &str {
        &self.user_id
    }
    fn order_key(&self) -> DateTime<Utc> {
        self.scheduled_date
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
    fn apply(&mut self, patch: &TaskPatch, updated_at: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = updated_at;
    }
}

impl Record for Project {
    const TABLE: &'static str = "projects";
    const ORDER_COLUMN: &'static str = "created_at";
    type Patch = ProjectPatch;

    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> &str {
        &self.user_id
    }
    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
    fn apply(&mut self, patch: &ProjectPatch, updated_at: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = updated_at;
    }
}

impl Record for Goal {
    const TABLE: &'static str = "goals";
    const ORDER_COLUMN: &'static str = "target_date";
    type Patch = GoalPatch;

    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> &str {
        &self.user_id
    }
    fn order_key(&self) -> DateTime<Utc> {
        self.target_date
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
    fn apply(&mut self, patch: &GoalPatch, updated_at: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = updated_at;
    }
}

impl Record for UserProfile {
    const TABLE: &'static str = "user_profiles";
    const OWNER_COLUMN: &'static str = "id";
    const ORDER_COLUMN: &'static str = "created_at";
    type Patch = ProfilePatch;

    fn id(&self) -> &str {
        &self.id
    }
    fn owner(&self) -> &str {
        &self.id
    }
    fn order_key(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
    fn apply(&mut self, patch: &ProfilePatch, updated_at: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = updated_at;
    }
}
