//! Data access facade: one CRUD contract per entity over whichever [`Store`]
//! was selected at startup.
//!
//! The facade owns everything that must behave identically across backends:
//! id generation (UUID v7), created/updated timestamps, input validation, and
//! the guarantee that `updated_at` strictly increases on every update.

use chrono::{DateTime, Duration, SubsecRound, Utc};

use crate::models::{
    valid_progress, Goal, GoalPatch, NewGoal, NewProject, NewTask, ProfilePatch, Project,
    ProjectPatch, Task, TaskPatch, UserProfile,
};
use crate::store::{Backend, Collection, Record, Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type DataResult<T> = Result<T, DataError>;

/// Current time at the microsecond precision Postgres stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly later than `previous`, normally just "now".
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

fn check_progress(progress: f64) -> DataResult<()> {
    if valid_progress(progress) {
        Ok(())
    } else {
        Err(DataError::Validation(
            "Progress must be between 0.0 and 1.0".into(),
        ))
    }
}

/// Read the current record, then write the patch with a bumped `updated_at`.
async fn update_record<T: Record>(
    collection: &dyn Collection<T>,
    owner: &str,
    id: &str,
    patch: &T::Patch,
) -> DataResult<Option<T>> {
    let Some(existing) = collection.get(owner, id).await? else {
        return Ok(None);
    };
    let updated_at = next_timestamp(existing.updated_at());
    Ok(collection.update(owner, id, patch, updated_at).await?)
}

#[derive(Clone)]
pub struct DataAccess {
    store: Store,
}

impl DataAccess {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> Backend {
        self.store.backend
    }

    // ── Tasks ───────────────────────────────────────────────────────

    /// The remote `tasks.user_id` column references `user_profiles`, so the
    /// development identity needs a profile row before its first task.
    #[cfg(debug_assertions)]
    async fn ensure_dev_profile(&self, user_id: &str) -> DataResult<()> {
        if self.store.backend != Backend::Remote || user_id != crate::auth::DEV_USER_ID {
            return Ok(());
        }
        if self.find_profile(user_id).await?.is_none() {
            self.store
                .profiles
                .insert(UserProfile::new(user_id, Some("Balanced".into()), now()))
                .await?;
            tracing::info!(user = user_id, "created development user profile");
        }
        Ok(())
    }

    #[cfg(not(debug_assertions))]
    async fn ensure_dev_profile(&self, _user_id: &str) -> DataResult<()> {
        Ok(())
    }

    pub async fn create_task(&self, user_id: &str, fields: NewTask) -> DataResult<Task> {
        self.ensure_dev_profile(user_id).await?;
        let task = fields.into_record(new_id(), user_id, now());
        let created = self.store.tasks.insert(task).await?;
        tracing::info!(id = %created.id, user = user_id, "task created");
        Ok(created)
    }

    /// All of the user's tasks, earliest `scheduled_date` first.
    pub async fn list_tasks(&self, user_id: &str) -> DataResult<Vec<Task>> {
        Ok(self.store.tasks.list(user_id).await?)
    }

    pub async fn get_task(&self, user_id: &str, task_id: &str) -> DataResult<Option<Task>> {
        Ok(self.store.tasks.get(user_id, task_id).await?)
    }

    pub async fn update_task(
        &self,
        user_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> DataResult<Option<Task>> {
        update_record(self.store.tasks.as_ref(), user_id, task_id, patch).await
    }

    /// Flip `is_completed`. `None` if the task does not exist for this user.
    pub async fn toggle_task(&self, user_id: &str, task_id: &str) -> DataResult<Option<Task>> {
        let Some(task) = self.get_task(user_id, task_id).await? else {
            return Ok(None);
        };
        let patch = TaskPatch {
            is_completed: Some(!task.is_completed),
            ..Default::default()
        };
        let updated_at = next_timestamp(task.updated_at);
        Ok(self
            .store
            .tasks
            .update(user_id, task_id, &patch, updated_at)
            .await?)
    }

    pub async fn delete_task(&self, user_id: &str, task_id: &str) -> DataResult<bool> {
        let removed = self.store.tasks.delete(user_id, task_id).await?;
        if removed {
            tracing::info!(id = task_id, user = user_id, "task deleted");
        }
        Ok(removed)
    }

    // ── Projects ────────────────────────────────────────────────────

    pub async fn create_project(&self, user_id: &str, fields: NewProject) -> DataResult<Project> {
        let project = fields.into_record(new_id(), user_id, now());
        let created = self.store.projects.insert(project).await?;
        tracing::info!(id = %created.id, user = user_id, "project created");
        Ok(created)
    }

    /// All of the user's projects, oldest first.
    pub async fn list_projects(&self, user_id: &str) -> DataResult<Vec<Project>> {
        Ok(self.store.projects.list(user_id).await?)
    }

    pub async fn get_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> DataResult<Option<Project>> {
        Ok(self.store.projects.get(user_id, project_id).await?)
    }

    pub async fn update_project(
        &self,
        user_id: &str,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> DataResult<Option<Project>> {
        update_record(self.store.projects.as_ref(), user_id, project_id, patch).await
    }

    pub async fn delete_project(&self, user_id: &str, project_id: &str) -> DataResult<bool> {
        // Tasks keep their project_id; the reference is not enforced.
        Ok(self.store.projects.delete(user_id, project_id).await?)
    }

    /// Tasks pointing at `project_id`, or `None` if the user has no such project.
    pub async fn project_tasks(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> DataResult<Option<Vec<Task>>> {
        if self.get_project(user_id, project_id).await?.is_none() {
            return Ok(None);
        }
        let tasks = self
            .list_tasks(user_id)
            .await?
            .into_iter()
            .filter(|t| t.project_id.as_deref() == Some(project_id))
            .collect();
        Ok(Some(tasks))
    }

    // ── Goals ───────────────────────────────────────────────────────

    pub async fn create_goal(&self, user_id: &str, fields: NewGoal) -> DataResult<Goal> {
        check_progress(fields.progress)?;
        let goal = fields.into_record(new_id(), user_id, now());
        let created = self.store.goals.insert(goal).await?;
        tracing::info!(id = %created.id, user = user_id, "goal created");
        Ok(created)
    }

    /// All of the user's goals, nearest `target_date` first.
    pub async fn list_goals(&self, user_id: &str) -> DataResult<Vec<Goal>> {
        Ok(self.store.goals.list(user_id).await?)
    }

    pub async fn get_goal(&self, user_id: &str, goal_id: &str) -> DataResult<Option<Goal>> {
        Ok(self.store.goals.get(user_id, goal_id).await?)
    }

    pub async fn update_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        patch: &GoalPatch,
    ) -> DataResult<Option<Goal>> {
        if let Some(progress) = patch.progress {
            check_progress(progress)?;
        }
        update_record(self.store.goals.as_ref(), user_id, goal_id, patch).await
    }

    /// Set progress alone. Out-of-range values are rejected before the store is touched.
    pub async fn set_goal_progress(
        &self,
        user_id: &str,
        goal_id: &str,
        progress: f64,
    ) -> DataResult<Option<Goal>> {
        check_progress(progress)?;
        let patch = GoalPatch {
            progress: Some(progress),
            ..Default::default()
        };
        update_record(self.store.goals.as_ref(), user_id, goal_id, &patch).await
    }

    pub async fn delete_goal(&self, user_id: &str, goal_id: &str) -> DataResult<bool> {
        Ok(self.store.goals.delete(user_id, goal_id).await?)
    }

    // ── Profiles ────────────────────────────────────────────────────

    pub async fn find_profile(&self, user_id: &str) -> DataResult<Option<UserProfile>> {
        Ok(self.store.profiles.get(user_id, user_id).await?)
    }

    /// The user's profile, created with no personality type on first access.
    pub async fn profile(&self, user_id: &str) -> DataResult<UserProfile> {
        if let Some(profile) = self.find_profile(user_id).await? {
            return Ok(profile);
        }
        let created = self
            .store
            .profiles
            .insert(UserProfile::new(user_id, None, now()))
            .await?;
        tracing::info!(user = user_id, "profile created");
        Ok(created)
    }

    /// Apply `patch`, creating the profile first if needed.
    pub async fn update_profile(
        &self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> DataResult<UserProfile> {
        let existing = self.profile(user_id).await?;
        let updated_at = next_timestamp(existing.updated_at);
        let updated = self
            .store
            .profiles
            .update(user_id, user_id, patch, updated_at)
            .await?;
        // Deleted between the read and the write: report what we had.
        Ok(updated.unwrap_or(existing))
    }
}
