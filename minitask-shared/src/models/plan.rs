/// Plan model and database operations
///
/// A plan is a named grouping of tasks. Like a task it has one owner and a
/// `shared_with` list of Telegram user IDs that may read it. Only the owner
/// can rename, share, or delete a plan; deleting a plan detaches its tasks
/// (`tasks.plan_id` becomes NULL) rather than deleting them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE plans (
///     id BIGSERIAL PRIMARY KEY,
///     title TEXT NOT NULL,
///     owner_id BIGINT NOT NULL,
///     shared_with BIGINT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use minitask_shared::models::plan::{CreatePlan, Plan};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let plan = Plan::create(&pool, CreatePlan {
///     title: "Release 1.0".to_string(),
///     owner_id: 42,
/// }).await?;
///
/// // Let user 7 see it
/// Plan::share(&pool, plan.id, 42, 7).await?;
///
/// let visible_to_7 = Plan::list_visible(&pool, 7).await?;
/// assert_eq!(visible_to_7.len(), 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Plan row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plan {
    pub id: i64,

    pub title: String,

    /// Telegram ID of the creator; never changes
    pub owner_id: i64,

    /// Telegram IDs with read access
    pub shared_with: Vec<i64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    pub title: String,
    pub owner_id: i64,
}

/// Input for updating a plan; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub title: Option<String>,
}

impl Plan {
    /// Returns true if `user_id` owns the plan or it is shared with them
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        self.owner_id == user_id || self.shared_with.contains(&user_id)
    }

    /// Creates a plan with an empty share list
    pub async fn create(pool: &PgPool, data: CreatePlan) -> Result<Self, sqlx::Error> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            INSERT INTO plans (title, owner_id)
            VALUES ($1, $2)
            RETURNING id, title, owner_id, shared_with, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.owner_id)
        .fetch_one(pool)
        .await?;

        Ok(plan)
    }

    /// Lists plans the user owns or that are shared with them, newest first
    pub async fn list_visible(pool: &PgPool, user_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, title, owner_id, shared_with, created_at, updated_at
            FROM plans
            WHERE owner_id = $1 OR $1 = ANY(shared_with)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(plans)
    }

    /// Finds a plan if it is visible to the user
    ///
    /// Returns `None` both when the plan does not exist and when the user may
    /// not see it, so callers cannot tell the two apart.
    pub async fn find_visible<'e, E>(
        executor: E,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, title, owner_id, shared_with, created_at, updated_at
            FROM plans
            WHERE id = $1 AND (owner_id = $2 OR $2 = ANY(shared_with))
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(plan)
    }

    /// Updates a plan owned by `owner_id`
    ///
    /// Returns `None` if the plan does not exist or belongs to someone else.
    pub async fn update_owned(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        data: UpdatePlan,
    ) -> Result<Option<Self>, sqlx::Error> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            UPDATE plans
            SET title = COALESCE($3, title),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, owner_id, shared_with, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data.title)
        .fetch_optional(pool)
        .await?;

        Ok(plan)
    }

    /// Grants `user_id` read access to a plan owned by `owner_id`
    ///
    /// Sharing with someone already on the list leaves it unchanged.
    pub async fn share(
        pool: &PgPool,
        id: i64,
        owner_id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let plan = sqlx::query_as::<_, Plan>(
            r#"
            UPDATE plans
            SET shared_with = CASE
                    WHEN $3 = ANY(shared_with) THEN shared_with
                    ELSE array_append(shared_with, $3)
                END,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, owner_id, shared_with, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(plan)
    }

    /// Deletes a plan owned by `owner_id`; its tasks are kept and detached
    pub async fn delete_owned(pool: &PgPool, id: i64, owner_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM plans WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(owner_id: i64, shared_with: Vec<i64>) -> Plan {
        Plan {
            id: 1,
            title: "Groceries".to_string(),
            owner_id,
            shared_with,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_sees_plan() {
        assert!(plan(1, vec![]).is_visible_to(1));
    }

    #[test]
    fn test_shared_user_sees_plan() {
        let p = plan(1, vec![2, 3]);
        assert!(p.is_visible_to(2));
        assert!(p.is_visible_to(3));
        assert!(!p.is_visible_to(4));
    }

    #[test]
    fn test_update_plan_default() {
        assert!(UpdatePlan::default().title.is_none());
    }
}
