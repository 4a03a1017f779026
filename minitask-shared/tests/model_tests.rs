/// Model-level tests against PostgreSQL
///
/// Skipped when `DATABASE_URL` is unset. Each test works with its own
/// Telegram IDs and deletes its rows afterwards.

use minitask_shared::analysis::Priority;
use minitask_shared::db::migrations::{ensure_database_exists, run_migrations};
use minitask_shared::db::pool::{create_pool, DatabaseConfig};
use minitask_shared::models::plan::{CreatePlan, Plan};
use minitask_shared::models::task::{CreateTask, PlanFilter, Task, UpdateTask};
use minitask_shared::models::telegram_user::{TelegramProfile, TelegramUser};
use sqlx::PgPool;
use std::sync::atomic::{AtomicI64, Ordering};

static NEXT_ID: AtomicI64 = AtomicI64::new(0);

/// IDs in a negative range the API tests never touch
fn fresh_id() -> i64 {
    let base = -(chrono::Utc::now().timestamp_micros() % 1_000_000_000_000) * 1_000;
    base - NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

async fn pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    };

    ensure_database_exists(&url).await.expect("Failed to create database");
    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 2,
        ..Default::default()
    })
    .await
    .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Migrations failed");

    Some(pool)
}

async fn cleanup(pool: &PgPool, ids: &[i64]) {
    let ids = ids.to_vec();
    sqlx::query("DELETE FROM tasks WHERE owner_id = ANY($1)")
        .bind(&ids)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM plans WHERE owner_id = ANY($1)")
        .bind(&ids)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("DELETE FROM telegram_users WHERE id = ANY($1)")
        .bind(&ids)
        .execute(pool)
        .await
        .unwrap();
}

fn task(owner_id: i64, title: &str) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        owner_id,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_register_reports_new_and_returning_users() {
    let Some(pool) = pool().await else {
        return;
    };
    let id = fresh_id();

    let profile = TelegramProfile {
        id,
        username: Some("ann".to_string()),
        first_name: Some("Ann".to_string()),
        last_name: None,
    };
    let (first, created) = TelegramUser::register(&pool, profile.clone()).await.unwrap();
    assert!(created);
    assert_eq!(first.first_name.as_deref(), Some("Ann"));
    assert!(first.avatar_url.is_none());

    let renamed = TelegramProfile {
        username: Some("ann_b".to_string()),
        ..profile
    };
    let (second, created) = TelegramUser::register(&pool, renamed).await.unwrap();
    assert!(!created);
    assert_eq!(second.username.as_deref(), Some("ann_b"));
    assert_eq!(second.created_at, first.created_at);

    cleanup(&pool, &[id]).await;
}

#[tokio::test]
async fn test_register_keeps_synced_avatar() {
    let Some(pool) = pool().await else {
        return;
    };
    let id = fresh_id();
    let profile = TelegramProfile {
        id,
        first_name: Some("Bo".to_string()),
        ..Default::default()
    };

    TelegramUser::sync_profile(&pool, profile.clone(), Some("/static/avatars/1.jpg".to_string()))
        .await
        .unwrap();
    let (user, created) = TelegramUser::register(&pool, profile.clone()).await.unwrap();
    assert!(!created);
    assert_eq!(user.avatar_url.as_deref(), Some("/static/avatars/1.jpg"));

    // A later sync without a photo clears it
    let synced = TelegramUser::sync_profile(&pool, profile, None).await.unwrap();
    assert!(synced.avatar_url.is_none());

    cleanup(&pool, &[id]).await;
}

#[tokio::test]
async fn test_update_recomputes_priority_only_for_text_changes() {
    let Some(pool) = pool().await else {
        return;
    };
    let owner = fresh_id();

    let created = Task::create(&pool, task(owner, "urgent: renew passport")).await.unwrap();
    assert_eq!(created.priority, Priority::High);

    let mut conn = pool.acquire().await.unwrap();
    let completed = Task::update_owned(
        &mut *conn,
        created.id,
        owner,
        UpdateTask {
            completed: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(completed.completed);
    assert_eq!(completed.priority, Priority::High);

    let retitled = Task::update_owned(
        &mut *conn,
        created.id,
        owner,
        UpdateTask {
            title: Some("renew passport later".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(retitled.priority, Priority::Low);

    let stranger = Task::update_owned(&mut *conn, created.id, fresh_id(), UpdateTask::default())
        .await
        .unwrap();
    assert!(stranger.is_none());

    drop(conn);
    cleanup(&pool, &[owner]).await;
}

#[tokio::test]
async fn test_share_is_deduplicated_and_grants_visibility() {
    let Some(pool) = pool().await else {
        return;
    };
    let owner = fresh_id();
    let friend = fresh_id();

    let created = Task::create(&pool, task(owner, "Buy milk")).await.unwrap();
    assert!(Task::find_visible(&pool, created.id, friend).await.unwrap().is_none());

    Task::share(&pool, created.id, owner, friend).await.unwrap();
    let shared = Task::share(&pool, created.id, owner, friend).await.unwrap().unwrap();
    assert_eq!(shared.shared_with, vec![friend]);
    assert!(Task::find_visible(&pool, created.id, friend).await.unwrap().is_some());

    // Only the owner may share
    assert!(Task::share(&pool, created.id, friend, fresh_id()).await.unwrap().is_none());

    cleanup(&pool, &[owner, friend]).await;
}

#[tokio::test]
async fn test_plan_delete_detaches_tasks_and_filters() {
    let Some(pool) = pool().await else {
        return;
    };
    let owner = fresh_id();

    let plan = Plan::create(
        &pool,
        CreatePlan {
            title: "Trip".to_string(),
            owner_id: owner,
        },
    )
    .await
    .unwrap();
    let in_plan = Task::create(
        &pool,
        CreateTask {
            plan_id: Some(plan.id),
            ..task(owner, "Pack bags")
        },
    )
    .await
    .unwrap();
    let loose = Task::create(&pool, task(owner, "Water plants")).await.unwrap();

    let planned = Task::list_visible(&pool, owner, PlanFilter::Plan(plan.id)).await.unwrap();
    assert_eq!(planned.iter().map(|t| t.id).collect::<Vec<_>>(), vec![in_plan.id]);

    let unassigned = Task::list_visible(&pool, owner, PlanFilter::Unassigned).await.unwrap();
    assert_eq!(unassigned.iter().map(|t| t.id).collect::<Vec<_>>(), vec![loose.id]);

    assert!(Plan::delete_owned(&pool, plan.id, owner).await.unwrap());
    let detached = Task::find_visible(&pool, in_plan.id, owner).await.unwrap().unwrap();
    assert!(detached.plan_id.is_none());

    cleanup(&pool, &[owner]).await;
}

#[tokio::test]
async fn test_deleting_parent_removes_subtasks() {
    let Some(pool) = pool().await else {
        return;
    };
    let owner = fresh_id();

    let parent = Task::create(&pool, task(owner, "Move house")).await.unwrap();
    let child = Task::create(
        &pool,
        CreateTask {
            parent_id: Some(parent.id),
            ..task(owner, "Book van")
        },
    )
    .await
    .unwrap();

    let grouped = Task::with_subtasks(&pool, vec![parent.clone()], owner).await.unwrap();
    assert_eq!(grouped[0].sub_tasks.len(), 1);
    assert_eq!(grouped[0].sub_tasks[0].id, child.id);

    assert!(Task::delete_owned(&pool, parent.id, owner).await.unwrap());
    assert!(Task::find_visible(&pool, child.id, owner).await.unwrap().is_none());

    cleanup(&pool, &[owner]).await;
}
