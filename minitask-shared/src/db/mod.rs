/// Database layer for MiniTask
///
/// This module provides PostgreSQL connection pooling and the migration runner.
/// Row types and their queries live in the `models` module at crate root level.
///
/// # Modules
///
/// - `pool`: Connection pool creation, health checks, and shutdown
/// - `migrations`: Embedded sqlx migrations for `telegram_users`, `plans`, and `tasks`
///
/// # Example
///
/// ```no_run
/// use minitask_shared::db::pool::{create_pool, DatabaseConfig};
/// use minitask_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
