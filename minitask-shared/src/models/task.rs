/// Task model and database operations
///
/// Tasks are the core entity of MiniTask. A task has one owner, may belong to
/// a plan, and may have a parent task, forming a tree. Deleting a task deletes
/// its whole subtree through the `parent_id` foreign key.
///
/// # Invariants
///
/// - `owner_id` is set on insert and never updated.
/// - `priority` is derived from the title and description with
///   [`analysis::classify`](crate::analysis::classify) on insert and on every
///   update that touches either field. No caller can set it directly.
/// - Non-owners see a task only through `shared_with`; only the owner writes.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title TEXT NOT NULL,
///     description TEXT,
///     due_date TIMESTAMPTZ,
///     priority TEXT NOT NULL DEFAULT 'medium',
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     owner_id BIGINT NOT NULL,
///     plan_id BIGINT REFERENCES plans(id) ON DELETE SET NULL,
///     parent_id BIGINT REFERENCES tasks(id) ON DELETE CASCADE,
///     shared_with BIGINT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use minitask_shared::models::task::{CreateTask, Task, UpdateTask};
/// use minitask_shared::analysis::Priority;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut conn = pool.acquire().await?;
/// let task = Task::create(&mut *conn, CreateTask {
///     title: "Urgent: call client".to_string(),
///     owner_id: 42,
///     ..Default::default()
/// }).await?;
/// assert_eq!(task.priority, Priority::High);
///
/// let updated = Task::update_owned(&mut conn, task.id, 42, UpdateTask {
///     title: Some("later maybe".to_string()),
///     ..Default::default()
/// }).await?;
/// assert_eq!(updated.map(|t| t.priority), Some(Priority::Low));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, PgPool};
use std::collections::HashMap;

use crate::analysis::{self, Priority};

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    /// Derived from title and description
    pub priority: Priority,

    pub completed: bool,

    /// Telegram ID of the creator; never changes
    pub owner_id: i64,

    /// Plan this task is grouped under
    pub plan_id: Option<i64>,

    /// Parent task, for sub-tasks
    pub parent_id: Option<i64>,

    /// Telegram IDs with read access
    pub shared_with: Vec<i64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A task together with its direct children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskWithSubtasks {
    #[serde(flatten)]
    pub task: Task,

    pub sub_tasks: Vec<Task>,
}

/// Input for creating a task
///
/// There is no priority field: it is always computed from the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub owner_id: i64,
    pub plan_id: Option<i64>,
    pub parent_id: Option<i64>,
}

/// Input for updating a task
///
/// `None` leaves a field unchanged. For nullable columns `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
    pub plan_id: Option<Option<i64>>,
}

impl UpdateTask {
    /// Whether the update changes text that priority is derived from
    pub fn touches_text(&self) -> bool {
        self.title.is_some() || self.description.is_some()
    }
}

/// Which plan a task listing is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanFilter {
    /// No restriction
    #[default]
    Any,

    /// Only tasks without a plan
    Unassigned,

    /// Only tasks in the given plan
    Plan(i64),
}

impl PlanFilter {
    /// Maps the `filter_plan_id` query parameter; `0` means "no plan"
    pub fn from_query(filter_plan_id: Option<i64>) -> Self {
        match filter_plan_id {
            None => PlanFilter::Any,
            Some(0) => PlanFilter::Unassigned,
            Some(id) => PlanFilter::Plan(id),
        }
    }
}

/// Attaches each task's direct children, preserving the order of both lists
pub fn group_subtasks(tasks: Vec<Task>, children: Vec<Task>) -> Vec<TaskWithSubtasks> {
    let mut by_parent: HashMap<i64, Vec<Task>> = HashMap::new();
    for child in children {
        if let Some(parent_id) = child.parent_id {
            by_parent.entry(parent_id).or_default().push(child);
        }
    }

    tasks
        .into_iter()
        .map(|task| {
            let sub_tasks = by_parent.remove(&task.id).unwrap_or_default();
            TaskWithSubtasks { task, sub_tasks }
        })
        .collect()
}

impl Task {
    /// Returns true if `user_id` owns the task or it is shared with them
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        self.owner_id == user_id || self.shared_with.contains(&user_id)
    }

    /// Inserts a task, computing its priority from the text
    ///
    /// Plan and parent visibility are the caller's responsibility; the foreign
    /// keys only guarantee that they exist.
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let priority = analysis::classify(&data.title, data.description.as_deref());

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, due_date, priority, completed,
                               owner_id, plan_id, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, due_date, priority, completed, owner_id,
                      plan_id, parent_id, shared_with, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(priority)
        .bind(data.completed)
        .bind(data.owner_id)
        .bind(data.plan_id)
        .bind(data.parent_id)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task if it is visible to the user
    ///
    /// Returns `None` both when the task does not exist and when the user may
    /// not see it.
    pub async fn find_visible<'e, E>(
        executor: E,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, due_date, priority, completed, owner_id,
                   plan_id, parent_id, shared_with, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND (owner_id = $2 OR $2 = ANY(shared_with))
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Lists tasks visible to the user, oldest first
    pub async fn list_visible(
        pool: &PgPool,
        user_id: i64,
        filter: PlanFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let plan_clause = match filter {
            PlanFilter::Any => "",
            PlanFilter::Unassigned => " AND plan_id IS NULL",
            PlanFilter::Plan(_) => " AND plan_id = $2",
        };

        let query = format!(
            "SELECT id, title, description, due_date, priority, completed, owner_id, \
                    plan_id, parent_id, shared_with, created_at, updated_at \
             FROM tasks \
             WHERE (owner_id = $1 OR $1 = ANY(shared_with)){} \
             ORDER BY created_at ASC, id ASC",
            plan_clause
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(user_id);
        if let PlanFilter::Plan(plan_id) = filter {
            q = q.bind(plan_id);
        }

        let tasks = q.fetch_all(pool).await?;
        Ok(tasks)
    }

    /// Loads the direct children of the given tasks that `user_id` may see
    ///
    /// Seeing a parent grants nothing on its children; each child needs its
    /// own ownership or share entry.
    pub async fn list_children(
        pool: &PgPool,
        parent_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, due_date, priority, completed, owner_id,
                   plan_id, parent_id, shared_with, created_at, updated_at
            FROM tasks
            WHERE parent_id = ANY($1)
              AND (owner_id = $2 OR $2 = ANY(shared_with))
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(parent_ids)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Pairs every task with its direct children visible to `user_id`
    pub async fn with_subtasks(
        pool: &PgPool,
        tasks: Vec<Self>,
        user_id: i64,
    ) -> Result<Vec<TaskWithSubtasks>, sqlx::Error> {
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let children = Self::list_children(pool, &ids, user_id).await?;
        Ok(group_subtasks(tasks, children))
    }

    /// Updates a task owned by `owner_id`
    ///
    /// Reads the current row with `FOR UPDATE`, merges the changes, recomputes
    /// the priority if title or description changed, and writes it back. Run it
    /// inside a transaction so the read and write see the same row.
    ///
    /// Returns `None` if the task does not exist or belongs to someone else.
    pub async fn update_owned(
        conn: &mut PgConnection,
        id: i64,
        owner_id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let current = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, due_date, priority, completed, owner_id,
                   plan_id, parent_id, shared_with, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(current) = current else {
            return Ok(None);
        };

        let touches_text = data.touches_text();
        let title = data.title.unwrap_or(current.title);
        let description = data.description.unwrap_or(current.description);
        let priority = if touches_text {
            analysis::classify(&title, description.as_deref())
        } else {
            current.priority
        };

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $3,
                description = $4,
                due_date = $5,
                completed = $6,
                plan_id = $7,
                priority = $8,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, description, due_date, priority, completed, owner_id,
                      plan_id, parent_id, shared_with, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(data.due_date.unwrap_or(current.due_date))
        .bind(data.completed.unwrap_or(current.completed))
        .bind(data.plan_id.unwrap_or(current.plan_id))
        .bind(priority)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(task)
    }

    /// Grants `user_id` read access to a task owned by `owner_id`
    ///
    /// Sharing with someone already on the list leaves it unchanged.
    pub async fn share(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET shared_with = CASE
                    WHEN $3 = ANY(shared_with) THEN shared_with
                    ELSE array_append(shared_with, $3)
                END,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, description, due_date, priority, completed, owner_id,
                      plan_id, parent_id, shared_with, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task owned by `owner_id`
    ///
    /// All descendants are removed by `ON DELETE CASCADE`, whoever owns them.
    pub async fn delete_owned(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists visible tasks due in the closed window `[from, to]`, soonest first
    pub async fn list_due_between(
        pool: &PgPool,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, due_date, priority, completed, owner_id,
                   plan_id, parent_id, shared_with, created_at, updated_at
            FROM tasks
            WHERE (owner_id = $1 OR $1 = ANY(shared_with))
              AND due_date >= $2
              AND due_date <= $3
            ORDER BY due_date ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}
