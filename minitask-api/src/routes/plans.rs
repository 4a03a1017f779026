/// Plan endpoints
///
/// Plans group tasks. Visibility and ownership rules match tasks: the owner
/// and users in `shared_with` can read, only the owner can write.
///
/// # Endpoints
///
/// - `POST /plans` - Create plan
/// - `GET /plans` - List visible plans
/// - `GET /plans/:id` - Get plan
/// - `PUT /plans/:id` - Rename plan
/// - `DELETE /plans/:id` - Delete plan, detaching its tasks
/// - `POST /plans/:id/share` - Share plan with a Telegram user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::tasks::ShareRequest,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use minitask_shared::{
    auth::init_data::InitDataUser,
    models::plan::{CreatePlan, Plan, UpdatePlan},
};
use serde::Deserialize;
use validator::Validate;

/// Create plan request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
}

/// Update plan request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
}

fn plan_not_found() -> ApiError {
    ApiError::NotFound("Plan not found".to_string())
}

pub async fn create_plan(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Json(req): Json<CreatePlanRequest>,
) -> ApiResult<Json<Plan>> {
    req.validate()?;

    let plan = Plan::create(
        &state.db,
        CreatePlan {
            title: req.title,
            owner_id: user.id,
        },
    )
    .await?;

    tracing::info!(plan_id = plan.id, owner_id = user.id, "Plan created");

    Ok(Json(plan))
}

pub async fn list_plans(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
) -> ApiResult<Json<Vec<Plan>>> {
    let plans = Plan::list_visible(&state.db, user.id).await?;
    Ok(Json(plans))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Plan>> {
    let plan = Plan::find_visible(&state.db, id, user.id)
        .await?
        .ok_or_else(plan_not_found)?;

    Ok(Json(plan))
}

/// Update plan (owner only)
///
/// A user the plan is merely shared with gets 404.
pub async fn update_plan(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePlanRequest>,
) -> ApiResult<Json<Plan>> {
    req.validate()?;

    let plan = Plan::update_owned(&state.db, id, user.id, UpdatePlan { title: req.title })
        .await?
        .ok_or_else(plan_not_found)?;

    tracing::info!(plan_id = plan.id, "Plan updated");

    Ok(Json(plan))
}

/// Delete plan (owner only)
///
/// Tasks in the plan survive with `plan_id` cleared.
pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Plan::delete_owned(&state.db, id, user.id).await? {
        return Err(plan_not_found());
    }

    tracing::info!(plan_id = id, owner_id = user.id, "Plan deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Share plan (owner only)
///
/// Sharing a plan does not share the tasks inside it.
pub async fn share_plan(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
    Path(id): Path<i64>,
    Json(req): Json<ShareRequest>,
) -> ApiResult<Json<Plan>> {
    let plan = Plan::share(&state.db, id, user.id, req.user_id)
        .await?
        .ok_or_else(plan_not_found)?;

    tracing::info!(plan_id = id, shared_with = req.user_id, "Plan shared");

    Ok(Json(plan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_plan_request_optional_title() {
        let req: UpdatePlanRequest = serde_json::from_str("{}").unwrap();
        assert!(req.title.is_none());
        assert!(req.validate().is_ok());

        let req: UpdatePlanRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
