//! In-memory test double for the remote store.
//!
//! Nothing here is persisted: records live for the lifetime of the process
//! (or until [`MemoryStore::reset`]). Each collection holds at most
//! `capacity` records and rejects inserts beyond that. Only debug builds
//! select this backend at startup; tests construct it directly.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Collection, Record, StoreError, StoreResult};
use crate::models::{
    EmotionalTag, Goal, GoalCategory, Project, Task, TaskPriority, UserProfile,
};

/// One bounded, owner-scoped table. Clones share the same rows.
#[derive(Clone)]
pub struct MemoryCollection<T> {
    capacity: usize,
    rows: Arc<Mutex<Vec<T>>>,
}

impl<T: Record> MemoryCollection<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn rows(&self) -> MutexGuard<'_, Vec<T>> {
        // A panic while holding the lock leaves the Vec itself intact.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert_row(&self, record: T) -> StoreResult<T> {
        let mut rows = self.rows();
        if rows.len() >= self.capacity {
            return Err(StoreError::CapacityExceeded {
                table: T::TABLE,
                capacity: self.capacity,
            });
        }
        rows.push(record.clone());
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    pub fn clear(&self) {
        self.rows().clear();
    }
}

#[async_trait]
impl<T: Record> Collection<T> for MemoryCollection<T> {
    async fn insert(&self, record: T) -> StoreResult<T> {
        let record = self.insert_row(record)?;
        tracing::debug!(table = T::TABLE, id = record.id(), "inserted into memory store");
        Ok(record)
    }

    async fn list(&self, owner: &str) -> StoreResult<Vec<T>> {
        let mut owned: Vec<T> = self
            .rows()
            .iter()
            .filter(|r| r.owner() == owner)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal keys.
        owned.sort_by_key(|r| r.order_key());
        Ok(owned)
    }

    async fn get(&self, owner: &str, id: &str) -> StoreResult<Option<T>> {
        Ok(self
            .rows()
            .iter()
            .find(|r| r.owner() == owner && r.id() == id)
            .cloned())
    }

    async fn update(
        &self,
        owner: &str,
        id: &str,
        patch: &T::Patch,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<T>> {
        let mut rows = self.rows();
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.owner() == owner && r.id() == id)
        else {
            return Ok(None);
        };
        row.apply(patch, updated_at);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, owner: &str, id: &str) -> StoreResult<bool> {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|r| !(r.owner() == owner && r.id() == id));
        Ok(rows.len() < before)
    }
}

/// One [`MemoryCollection`] per entity.
#[derive(Clone)]
pub struct MemoryStore {
    pub tasks: MemoryCollection<Task>,
    pub projects: MemoryCollection<Project>,
    pub goals: MemoryCollection<Goal>,
    pub profiles: MemoryCollection<UserProfile>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: MemoryCollection::new(capacity),
            projects: MemoryCollection::new(capacity),
            goals: MemoryCollection::new(capacity),
            profiles: MemoryCollection::new(capacity),
        }
    }

    /// Drop every record in every collection.
    pub fn reset(&self) {
        self.tasks.clear();
        self.projects.clear();
        self.goals.clear();
        self.profiles.clear();
    }
}

/// Populate `store` with the fixed smoke-test records for `user_id`:
/// `dummy-task-1`, `dummy-project-1`, `dummy-goal-1` and a `Balanced` profile.
pub fn seed_samples(store: &MemoryStore, user_id: &str, now: DateTime<Utc>) {
    let task = Task {
        id: "dummy-task-1".into(),
        user_id: user_id.into(),
        title: "Sample Task".into(),
        notes: Some("This is a sample task".into()),
        is_completed: false,
        emotional_tag: Some(EmotionalTag::Focus),
        scheduled_date: now,
        priority: TaskPriority::Medium,
        estimated_duration: 30,
        project_id: None,
        created_at: now,
        updated_at: now,
    };
    let project = Project {
        id: "dummy-project-1".into(),
        user_id: user_id.into(),
        title: "Sample Project".into(),
        description: Some("This is a sample project".into()),
        color: "blue".into(),
        icon: "folder.fill".into(),
        created_at: now,
        updated_at: now,
    };
    let goal = Goal {
        id: "dummy-goal-1".into(),
        user_id: user_id.into(),
        title: "Sample Goal".into(),
        description: Some("This is a sample goal".into()),
        target_date: now + Duration::days(30),
        progress: 0.5,
        category: GoalCategory::Wellness,
        created_at: now,
        updated_at: now,
    };
    let profile = UserProfile::new(user_id, Some("Balanced".into()), now);

    let seeded = store.tasks.insert_row(task).is_ok()
        && store.projects.insert_row(project).is_ok()
        && store.goals.insert_row(goal).is_ok()
        && store.profiles.insert_row(profile).is_ok();
    if !seeded {
        tracing::warn!("memory store capacity too small for sample records");
    }
}
