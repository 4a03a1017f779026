/// Task endpoints
///
/// All endpoints require init data authentication. Reads are allowed for the
/// owner and anyone in `shared_with`; writes are owner-only. A task the caller
/// may not see or touch answers 404, exactly like a missing one.
///
/// # Endpoints
///
/// - `POST /tasks` - Create task
/// - `GET /tasks?filter_plan_id=` - List visible tasks (`0` = without plan)
/// - `GET /tasks/:id` - Get task with direct sub-tasks
/// - `PUT /tasks/:id` - Partially update task
/// - `DELETE /tasks/:id` - Delete task and its subtree
/// - `POST /tasks/:id/share` - Share task with a Telegram user
/// - `POST /tasks/analyze-task` - Suggest a priority for a draft

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use minitask_shared::{
    analysis::{self, TaskAnalysis},
    auth::init_data::InitDataUser,
    models::{
        plan::Plan,
        task::{CreateTask, PlanFilter, Task, TaskWithSubtasks, UpdateTask},
    },
};
use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Create task request
///
/// A `priority` field, if sent, is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 4096, message = "Description must be at most 4096 characters"))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    /// Plan to file the task under; must be visible to the caller
    pub plan_id: Option<i64>,

    /// Parent task; must be visible to the caller
    pub parent_id: Option<i64>,

    #[serde(default)]
    pub completed: bool,
}

/// Update task request
///
/// Omitted fields are left unchanged; `null` clears nullable fields.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 4096, message = "Description must be at most 4096 characters"))]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    pub completed: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub plan_id: Option<Option<i64>>,
}

/// Share request
#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    /// Telegram ID to grant read access
    pub user_id: i64,
}

/// Analyze task request
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 4096, message = "Description must be at most 4096 characters"))]
    pub description: Option<String>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Plan filter; `0` selects tasks without a plan
    pub filter_plan_id: Option<i64>,
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

/// Create task
///
/// Plan and parent visibility are checked in the same transaction as the
/// insert. Priority is computed from title and description.
///
/// # Endpoint
///
/// ```text
/// POST /tasks
/// X-Telegram-Init-Data: <init data>
///
/// {
///   "title": "Urgent: call client",
///   "due_date": "2025-06-01T12:00:00Z",
///   "plan_id": 3
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Plan or parent task missing or not visible
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<TaskWithSubtasks>> {
    req.validate()?;

    let mut tx = state.db.begin().await?;

    if let Some(plan_id) = req.plan_id {
        Plan::find_visible(&mut *tx, plan_id, user.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Plan not found".to_string()))?;
    }

    if let Some(parent_id) = req.parent_id {
        Task::find_visible(&mut *tx, parent_id, user.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Parent task not found".to_string()))?;
    }

    let task = Task::create(
        &mut *tx,
        CreateTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            completed: req.completed,
            owner_id: user.id,
            plan_id: req.plan_id,
            parent_id: req.parent_id,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        task_id = task.id,
        owner_id = user.id,
        priority = %task.priority,
        "Task created"
    );

    Ok(Json(TaskWithSubtasks {
        task,
        sub_tasks: Vec::new(),
    }))
}

/// List visible tasks, each with its direct sub-tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskWithSubtasks>>> {
    let filter = PlanFilter::from_query(query.filter_plan_id);
    let tasks = Task::list_visible(&state.db, user.id, filter).await?;
    let tasks = Task::with_subtasks(&state.db, tasks, user.id).await?;

    Ok(Json(tasks))
}

/// Get a visible task with its direct sub-tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskWithSubtasks>> {
    let task = Task::find_visible(&state.db, id, user.id)
        .await?
        .ok_or_else(task_not_found)?;

    let mut tasks = Task::with_subtasks(&state.db, vec![task], user.id).await?;
    tasks.pop().map(Json).ok_or_else(task_not_found)
}

/// Update task (owner only)
///
/// Priority is recomputed only when `title` or `description` is present in
/// the body. Moving the task to another plan requires that plan to be visible.
///
/// # Errors
///
/// - `404 Not Found`: Task missing or not owned; target plan not visible
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskWithSubtasks>> {
    req.validate()?;

    let mut tx = state.db.begin().await?;

    if let Some(Some(plan_id)) = req.plan_id {
        Plan::find_visible(&mut *tx, plan_id, user.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Plan not found".to_string()))?;
    }

    let update = UpdateTask {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        completed: req.completed,
        plan_id: req.plan_id,
    };
    let recomputes_priority = update.touches_text();

    let task = Task::update_owned(&mut tx, id, user.id, update)
        .await?
        .ok_or_else(task_not_found)?;

    tx.commit().await?;

    tracing::info!(
        task_id = task.id,
        recomputed = recomputes_priority,
        priority = %task.priority,
        "Task updated"
    );

    let mut tasks = Task::with_subtasks(&state.db, vec![task], user.id).await?;
    tasks.pop().map(Json).ok_or_else(task_not_found)
}

/// Delete task (owner only)
///
/// Removes the whole subtree, including sub-tasks created by other users.
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Task::delete_owned(&state.db, id, user.id).await? {
        return Err(task_not_found());
    }

    tracing::info!(task_id = id, owner_id = user.id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Share task (owner only)
///
/// Sharing with a user who already has access returns the task unchanged.
pub async fn share_task(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
    Json(req): Json<ShareRequest>,
) -> ApiResult<Json<TaskWithSubtasks>> {
    let task = Task::share(&state.db, id, user.id, req.user_id)
        .await?
        .ok_or_else(task_not_found)?;

    tracing::info!(task_id = id, shared_with = req.user_id, "Task shared");

    let mut tasks = Task::with_subtasks(&state.db, vec![task], user.id).await?;
    tasks.pop().map(Json).ok_or_else(task_not_found)
}

/// Suggest a priority for a draft task
///
/// Pure keyword analysis; nothing is stored.
///
/// # Endpoint
///
/// ```text
/// POST /tasks/analyze-task
///
/// { "title": "Finish report later" }
/// ```
///
/// # Response
///
/// ```json
/// { "advice": "This can wait. No rush.", "suggested_priority": "low" }
/// ```
pub async fn analyze_task(
    Extension(_user): Extension<InitDataUser>,
    Json(req): Json<AnalyzeTaskRequest>,
) -> ApiResult<Json<TaskAnalysis>> {
    req.validate()?;

    Ok(Json(analysis::analyze_task(&req.title, req.description.as_deref())))
}
