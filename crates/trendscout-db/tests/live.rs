//! Live integration tests for trendscout-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database. The
//! `migrations` path is relative to `crates/trendscout-db/`.

use trendscout_core::{NewProduct, ProductUpdate};
use trendscout_db::{
    archive_stale_products, complete_scan_run, create_scan_run, fail_scan_run,
    find_product_by_name, get_product, get_scan_run, insert_history, insert_product,
    list_history, list_scan_runs, list_top_products, start_scan_run, try_lock_scans,
    update_product, DbError, ScanRunTotals,
};

fn new_product(name: &str, score: f64) -> NewProduct {
    NewProduct {
        product_name: name.to_string(),
        category: "Home".to_string(),
        source_url: format!("https://example.com/dp/{name}"),
        trend_score: score,
        search_volume: 0,
        price_estimate: Some(30.0),
        notes: Some("Velocity: 0.0%".to_string()),
    }
}

async fn backdate(pool: &sqlx::PgPool, id: i64, days: i32) {
    sqlx::query(
        "UPDATE trending_products SET last_updated = NOW() - make_interval(days => $1) WHERE id = $2",
    )
    .bind(days)
    .bind(id)
    .execute(pool)
    .await
    .expect("backdate failed");
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_then_find_by_exact_name(pool: sqlx::PgPool) {
    let inserted = insert_product(&pool, &new_product("Widget A", 65.0))
        .await
        .expect("insert failed");
    assert_eq!(inserted.status, "active");
    assert_eq!(inserted.first_seen_date, inserted.last_updated);

    let found = find_product_by_name(&pool, "Widget A")
        .await
        .expect("find failed")
        .expect("row should exist");
    assert_eq!(found.id, inserted.id);

    let miss = find_product_by_name(&pool, "widget a")
        .await
        .expect("find failed");
    assert!(miss.is_none(), "name matching is exact");
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_keeps_first_seen_and_status(pool: sqlx::PgPool) {
    let inserted = insert_product(&pool, &new_product("Widget A", 65.0))
        .await
        .expect("insert failed");

    let update = ProductUpdate {
        category: "Electronics".to_string(),
        source_url: "https://example.com/dp/new".to_string(),
        trend_score: 72.5,
        search_volume: 18,
        price_estimate: None,
        notes: None,
    };
    let updated = update_product(&pool, inserted.id, &update)
        .await
        .expect("update failed");

    assert_eq!(updated.first_seen_date, inserted.first_seen_date);
    assert_eq!(updated.status, "active");
    assert_eq!(updated.category, "Electronics");
    assert!((updated.trend_score - 72.5).abs() < f64::EPSILON);
    assert!(updated.last_updated >= inserted.last_updated);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_missing_product_is_not_found(pool: sqlx::PgPool) {
    let update = ProductUpdate {
        category: "Home".to_string(),
        source_url: String::new(),
        trend_score: 10.0,
        search_volume: 0,
        price_estimate: None,
        notes: None,
    };
    let err = update_product(&pool, 9_999, &update).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn out_of_range_score_is_rejected(pool: sqlx::PgPool) {
    let err = insert_product(&pool, &new_product("Broken", 140.0))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Sqlx(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn archive_only_touches_stale_low_scorers(pool: sqlx::PgPool) {
    let stale_low = insert_product(&pool, &new_product("Stale Low", 40.0))
        .await
        .unwrap();
    let stale_high = insert_product(&pool, &new_product("Stale High", 80.0))
        .await
        .unwrap();
    let fresh_low = insert_product(&pool, &new_product("Fresh Low", 40.0))
        .await
        .unwrap();
    backdate(&pool, stale_low.id, 31).await;
    backdate(&pool, stale_high.id, 31).await;

    let archived = archive_stale_products(&pool, 30, 50.0).await.unwrap();
    assert_eq!(archived, 1);

    assert_eq!(get_product(&pool, stale_low.id).await.unwrap().status, "archived");
    assert_eq!(get_product(&pool, stale_high.id).await.unwrap().status, "active");
    assert_eq!(get_product(&pool, fresh_low.id).await.unwrap().status, "active");

    // A second sweep finds nothing new.
    assert_eq!(archive_stale_products(&pool, 30, 50.0).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn top_products_excludes_archived_and_orders_by_score(pool: sqlx::PgPool) {
    let low = insert_product(&pool, &new_product("Low", 20.0)).await.unwrap();
    insert_product(&pool, &new_product("High", 90.0)).await.unwrap();
    insert_product(&pool, &new_product("Mid", 55.0)).await.unwrap();
    backdate(&pool, low.id, 40).await;
    archive_stale_products(&pool, 30, 50.0).await.unwrap();

    let top = list_top_products(&pool, 10).await.unwrap();
    let names: Vec<&str> = top.iter().map(|r| r.product_name.as_str()).collect();
    assert_eq!(names, vec!["High", "Mid"]);

    let limited = list_top_products(&pool, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn history_appends_and_lists_newest_first(pool: sqlx::PgPool) {
    let product = insert_product(&pool, &new_product("Widget A", 65.0))
        .await
        .unwrap();

    insert_history(&pool, product.id, 65.0, 0).await.unwrap();
    insert_history(&pool, product.id, 72.0, 15).await.unwrap();

    let history = list_history(&pool, product.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!((history[0].trend_score - 72.0).abs() < f64::EPSILON);
}

#[sqlx::test(migrations = "../../migrations")]
async fn history_for_unknown_product_fails(pool: sqlx::PgPool) {
    let err = insert_history(&pool, 424_242, 50.0, 0).await.unwrap_err();
    assert!(matches!(err, DbError::Sqlx(_)));
}

// ---------------------------------------------------------------------------
// Scan runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scan_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let run = create_scan_run(&pool, "US", "cli").await.unwrap();
    assert_eq!(run.status, "queued");

    start_scan_run(&pool, run.id).await.unwrap();
    complete_scan_run(
        &pool,
        run.id,
        ScanRunTotals {
            listings_scraped: 250,
            products_stored: 10,
            hot_count: 3,
        },
    )
    .await
    .unwrap();

    let done = get_scan_run(&pool, run.id).await.unwrap();
    assert_eq!(done.status, "succeeded");
    assert_eq!(done.listings_scraped, 250);
    assert_eq!(done.hot_count, 3);
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_run_fail_records_message(pool: sqlx::PgPool) {
    let run = create_scan_run(&pool, "UK", "scheduler").await.unwrap();
    start_scan_run(&pool, run.id).await.unwrap();
    fail_scan_run(&pool, run.id, "no listings").await.unwrap();

    let failed = get_scan_run(&pool, run.id).await.unwrap();
    assert_eq!(failed.status, "failed");
    assert_eq!(failed.error_message.as_deref(), Some("no listings"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_run_rejects_invalid_transitions(pool: sqlx::PgPool) {
    let run = create_scan_run(&pool, "US", "api").await.unwrap();

    let err = complete_scan_run(&pool, run.id, ScanRunTotals::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::InvalidScanRunTransition {
            expected_status: "running",
            ..
        }
    ));

    start_scan_run(&pool, run.id).await.unwrap();
    let err = start_scan_run(&pool, run.id).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::InvalidScanRunTransition {
            expected_status: "queued",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_scan_runs_is_newest_first(pool: sqlx::PgPool) {
    let first = create_scan_run(&pool, "US", "cli").await.unwrap();
    let second = create_scan_run(&pool, "UK", "cli").await.unwrap();

    let runs = list_scan_runs(&pool, 10).await.unwrap();
    assert_eq!(runs[0].id, second.id);
    assert_eq!(runs[1].id, first.id);
}

// ---------------------------------------------------------------------------
// Scan lock
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scan_lock_is_exclusive_across_sessions(pool: sqlx::PgPool) {
    let held = try_lock_scans(&pool)
        .await
        .expect("lock query failed")
        .expect("first lock should be granted");

    let second = try_lock_scans(&pool).await.expect("lock query failed");
    assert!(second.is_none(), "a second session must be refused");

    held.release().await.expect("release failed");

    let again = try_lock_scans(&pool).await.expect("lock query failed");
    assert!(again.is_some(), "lock is free after release");
}

#[sqlx::test(migrations = "../../migrations")]
async fn dropped_scan_lock_frees_the_key(pool: sqlx::PgPool) {
    let held = try_lock_scans(&pool)
        .await
        .expect("lock query failed")
        .expect("first lock should be granted");
    drop(held);

    // The connection closes in the background; poll briefly.
    let mut reacquired = None;
    for _ in 0..50 {
        reacquired = try_lock_scans(&pool).await.expect("lock query failed");
        if reacquired.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(reacquired.is_some(), "closing the connection releases the lock");
}
