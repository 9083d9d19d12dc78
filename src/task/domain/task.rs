//! Task entity and its enumerated fields.

use super::{TaskDomainError, TaskId, TaskTitle};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// No priority assigned.
    None,
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    #[default]
    High,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(TaskDomainError::UnknownPriority(value.to_owned())),
        }
    }
}

/// Task progress status.
///
/// `None` is the unset sentinel; the status cycle never produces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Status not set.
    None,
    /// Work has not started.
    #[default]
    Undone,
    /// Work is in progress.
    Doing,
    /// Work is complete.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Undone => "UNDONE",
            Self::Doing => "DOING",
            Self::Done => "DONE",
        }
    }

    /// Next status in the `UNDONE -> DOING -> DONE -> UNDONE` cycle.
    ///
    /// The unset sentinel enters the cycle at `UNDONE`.
    #[must_use]
    pub const fn next_in_cycle(self) -> Self {
        match self {
            Self::None | Self::Done => Self::Undone,
            Self::Undone => Self::Doing,
            Self::Doing => Self::Done,
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "UNDONE" => Ok(Self::Undone),
            "DOING" => Ok(Self::Doing),
            "DONE" => Ok(Self::Done),
            _ => Err(TaskDomainError::UnknownStatus(value.to_owned())),
        }
    }
}

/// Priority-based ordering for task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrder {
    /// `LOW`, `MEDIUM`, `HIGH`, then unprioritised tasks.
    LowFirst,
    /// `HIGH`, `MEDIUM`, `LOW`, then unprioritised tasks.
    HighFirst,
}

impl PriorityOrder {
    const fn rank(self, priority: Priority) -> u8 {
        match (self, priority) {
            (_, Priority::None) => 4,
            (_, Priority::Medium) => 2,
            (Self::LowFirst, Priority::Low) | (Self::HighFirst, Priority::High) => 1,
            (Self::LowFirst, Priority::High) | (Self::HighFirst, Priority::Low) => 3,
        }
    }

    /// Compares two tasks by priority rank; ties keep their existing order
    /// when used with a stable sort.
    #[must_use]
    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        self.rank(left.priority()).cmp(&self.rank(right.priority()))
    }

    /// Sorts tasks in place, preserving id order within a priority.
    pub fn sort(self, tasks: &mut [Task]) {
        tasks.sort_by(|left, right| self.compare(left, right));
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: String,
    priority: Priority,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    added_date: NaiveDate,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description, possibly empty.
    pub description: String,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted status.
    pub status: TaskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Local display date.
    pub added_date: NaiveDate,
}

impl Task {
    /// Creates an unsaved task with default priority and status.
    #[must_use]
    pub fn new(title: TaskTitle, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::UNSAVED,
            title,
            description: String::new(),
            priority: Priority::default(),
            status: TaskStatus::default(),
            created_at: timestamp,
            updated_at: timestamp,
            added_date: timestamp.date_naive(),
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
            added_date: data.added_date,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Replaces the identifier.
    #[must_use]
    pub const fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Returns a copy advanced to the next status in the cycle.
    #[must_use]
    pub fn cycled(&self) -> Self {
        self.clone().with_status(self.status.next_in_cycle())
    }

    /// Returns a copy with `updated_at` set to the current clock time.
    #[must_use]
    pub fn touched(mut self, clock: &impl Clock) -> Self {
        self.updated_at = clock.utc();
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the local display date. Never synced.
    #[must_use]
    pub const fn added_date(&self) -> NaiveDate {
        self.added_date
    }
}
