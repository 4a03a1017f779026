/// Database models for MiniTask
///
/// Each model owns its SQL. Queries that decide access take the caller's
/// Telegram ID and filter in the `WHERE` clause, so a row the caller may not
/// see is indistinguishable from a missing one.
///
/// # Models
///
/// - `telegram_user`: Telegram profiles registered by the bot or profile sync
/// - `plan`: Shareable groupings of tasks
/// - `task`: Tasks with optional plan, parent task, and sharing
///
/// # Example
///
/// ```no_run
/// use minitask_shared::models::plan::{CreatePlan, Plan};
/// use minitask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// }).await?;
///
/// let plan = Plan::create(&pool, CreatePlan {
///     title: "Weekend".to_string(),
///     owner_id: 42,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod plan;
pub mod task;
pub mod telegram_user;
