//! Entity definitions shared by the store, the facade and the HTTP layer.
//!
//! Each entity comes in three shapes: the stored record ([`Task`]), the
//! create payload ([`NewTask`]) and the partial update ([`TaskPatch`]).
//! Nullable fields in patches are `Option<Option<T>>` so that an absent
//! field (leave unchanged) differs from an explicit `null` (clear it).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// How a task feels to the user, used to pick tasks matching their state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionalTag {
    #[serde(rename = "low energy")]
    LowEnergy,
    #[serde(rename = "focus")]
    Focus,
    #[serde(rename = "time sensitive")]
    TimeSensitive,
    #[serde(rename = "creative")]
    Creative,
    #[serde(rename = "social")]
    Social,
    #[serde(rename = "self care")]
    SelfCare,
    #[serde(rename = "routine")]
    Routine,
    #[serde(rename = "challenging")]
    Challenging,
}

impl EmotionalTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowEnergy => "low energy",
            Self::Focus => "focus",
            Self::TimeSensitive => "time sensitive",
            Self::Creative => "creative",
            Self::Social => "social",
            Self::SelfCare => "self care",
            Self::Routine => "routine",
            Self::Challenging => "challenging",
        }
    }
}

impl std::fmt::Display for EmotionalTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    /// High and Urgent tasks are the ones worth moving other work around for.
    pub fn is_pressing(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GoalCategory {
    #[default]
    Wellness,
    Career,
    Relationships,
    Learning,
    Fitness,
    Creativity,
    Finance,
    Home,
}

impl GoalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wellness => "Wellness",
            Self::Career => "Career",
            Self::Relationships => "Relationships",
            Self::Learning => "Learning",
            Self::Fitness => "Fitness",
            Self::Creativity => "Creativity",
            Self::Finance => "Finance",
            Self::Home => "Home",
        }
    }
}

impl std::fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserialize a present field (even `null`) as `Some(..)`; combined with
/// `#[serde(default)]` an absent field stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// RFC 3339, or an offset-less `YYYY-MM-DD[T ]HH:MM:SS[.f]` read as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid timestamp: {input}"))
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(de::Error::custom)
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw))
        .transpose()
        .map_err(de::Error::custom)
}

fn empty_text() -> Option<String> {
    Some(String::new())
}

fn default_duration() -> u32 {
    30
}

fn default_color() -> String {
    "blue".into()
}

fn default_icon() -> String {
    "folder.fill".into()
}

// ── Tasks ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub emotional_tag: Option<EmotionalTag>,
    pub scheduled_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default = "default_duration")]
    pub estimated_duration: u32,
    #[serde(default)]
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default = "empty_text")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub emotional_tag: Option<EmotionalTag>,
    #[serde(deserialize_with = "timestamp")]
    pub scheduled_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default = "default_duration")]
    pub estimated_duration: u32,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl NewTask {
    pub fn into_record(self, id: String, user_id: &str, now: DateTime<Utc>) -> Task {
        Task {
            id,
            user_id: user_id.to_string(),
            title: self.title,
            notes: self.notes,
            is_completed: self.is_completed,
            emotional_tag: self.emotional_tag,
            scheduled_date: self.scheduled_date,
            priority: self.priority,
            estimated_duration: self.estimated_duration,
            project_id: self.project_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub emotional_tag: Option<Option<EmotionalTag>>,
    #[serde(default, deserialize_with = "optional_timestamp", skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<String>>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
        if let Some(done) = self.is_completed {
            task.is_completed = done;
        }
        if let Some(tag) = self.emotional_tag {
            task.emotional_tag = tag;
        }
        if let Some(date) = self.scheduled_date {
            task.scheduled_date = date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(minutes) = self.estimated_duration {
            task.estimated_duration = minutes;
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
    }
}

// ── Projects ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default = "empty_text")]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

impl NewProject {
    pub fn into_record(self, id: String, user_id: &str, now: DateTime<Utc>) -> Project {
        Project {
            id,
            user_id: user_id.to_string(),
            title: self.title,
            description: self.description,
            color: self.color,
            icon: self.icon,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            project.icon = icon.clone();
        }
    }
}

// ── Goals ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_date: DateTime<Utc>,
    /// Fraction complete in `[0.0, 1.0]`.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub category: GoalCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(default = "empty_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub target_date: DateTime<Utc>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub category: GoalCategory,
}

impl NewGoal {
    pub fn into_record(self, id: String, user_id: &str, now: DateTime<Utc>) -> Goal {
        Goal {
            id,
            user_id: user_id.to_string(),
            title: self.title,
            description: self.description,
            target_date: self.target_date,
            progress: self.progress,
            category: self.category,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "optional_timestamp", skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<GoalCategory>,
}

impl GoalPatch {
    pub fn apply(&self, goal: &mut Goal) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(description) = &self.description {
            goal.description = description.clone();
        }
        if let Some(date) = self.target_date {
            goal.target_date = date;
        }
        if let Some(progress) = self.progress {
            goal.progress = progress;
        }
        if let Some(category) = self.category {
            goal.category = category;
        }
    }
}

/// Progress must be a finite fraction in `[0.0, 1.0]`.
pub fn valid_progress(progress: f64) -> bool {
    (0.0..=1.0).contains(&progress)
}

// ── Profiles ────────────────────────────────────────────────────────

/// One per identity; `id` is the user id itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub personality_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: &str, personality_type: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: user_id.to_string(),
            personality_type,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub personality_type: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(personality) = &self.personality_type {
            profile.personality_type = personality.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        let now = Utc::now();
        NewTask {
            title: "Write report".into(),
            notes: Some("draft".into()),
            is_completed: false,
            emotional_tag: Some(EmotionalTag::Focus),
            scheduled_date: now,
            priority: TaskPriority::High,
            estimated_duration: 45,
            project_id: Some("p1".into()),
        }
        .into_record("t1".into(), "u1", now)
    }

    #[test]
    fn enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&EmotionalTag::LowEnergy).unwrap(),
            "\"low energy\""
        );
        assert_eq!(
            serde_json::from_str::<EmotionalTag>("\"self care\"").unwrap(),
            EmotionalTag::SelfCare
        );
        assert_eq!(serde_json::to_string(&TaskPriority::Urgent).unwrap(), "\"Urgent\"");
        assert_eq!(
            serde_json::from_str::<GoalCategory>("\"Finance\"").unwrap(),
            GoalCategory::Finance
        );
        assert!(serde_json::from_str::<TaskPriority>("\"urgent\"").is_err());
    }

    #[test]
    fn new_task_defaults() {
        let task: NewTask = serde_json::from_str(
            r#"{"title": "Write report", "scheduled_date": "2025-01-10T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(task.notes.as_deref(), Some(""));
        assert!(!task.is_completed);
        assert_eq!(task.emotional_tag, None);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.estimated_duration, 30);
        assert_eq!(task.project_id, None);
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: TaskPatch = serde_json::from_str(r#"{"project_id": null}"#).unwrap();
        assert_eq!(patch.project_id, Some(None));
        assert_eq!(patch.notes, None);

        let mut task = sample_task();
        patch.apply(&mut task);
        assert_eq!(task.project_id, None);
        assert_eq!(task.notes.as_deref(), Some("draft"));
        assert_eq!(task.emotional_tag, Some(EmotionalTag::Focus));
    }

    #[test]
    fn patch_serializes_only_named_fields() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"is_completed": true, "emotional_tag": null}"#).unwrap();
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"is_completed": true, "emotional_tag": null})
        );
    }

    #[test]
    fn patch_leaves_unnamed_fields_alone() {
        let mut task = sample_task();
        let before = task.clone();
        TaskPatch {
            is_completed: Some(true),
            ..Default::default()
        }
        .apply(&mut task);

        assert!(task.is_completed);
        assert_eq!(task.title, before.title);
        assert_eq!(task.notes, before.notes);
        assert_eq!(task.priority, before.priority);
        assert_eq!(task.project_id, before.project_id);
        assert_eq!(task.updated_at, before.updated_at);
    }

    #[test]
    fn offsetless_timestamps_are_utc() {
        let task: NewTask = serde_json::from_str(
            r#"{"title": "t", "scheduled_date": "2025-01-10T09:00:00"}"#,
        )
        .unwrap();
        assert_eq!(task.scheduled_date, parse_timestamp("2025-01-10T09:00:00Z").unwrap());

        let goal: NewGoal = serde_json::from_str(
            r#"{"title": "g", "target_date": "2025-06-01 00:00:00.250"}"#,
        )
        .unwrap();
        assert_eq!(goal.target_date, parse_timestamp("2025-06-01T00:00:00.250+00:00").unwrap());

        let patch: GoalPatch = serde_json::from_str(r#"{"target_date": "2025-07-01T12:30:00"}"#).unwrap();
        assert_eq!(patch.target_date, Some(parse_timestamp("2025-07-01T12:30:00Z").unwrap()));
        assert_eq!(serde_json::from_str::<GoalPatch>("{}").unwrap().target_date, None);

        // offsets still apply
        assert_eq!(
            parse_timestamp("2025-01-10T10:00:00+01:00").unwrap(),
            parse_timestamp("2025-01-10T09:00:00Z").unwrap()
        );
        assert!(serde_json::from_str::<NewTask>(r#"{"title": "t", "scheduled_date": "tomorrow"}"#).is_err());
    }

    #[test]
    fn progress_bounds() {
        assert!(valid_progress(0.0));
        assert!(valid_progress(1.0));
        assert!(valid_progress(0.5));
        assert!(!valid_progress(-0.01));
        assert!(!valid_progress(1.01));
        assert!(!valid_progress(f64::NAN));
    }
}
