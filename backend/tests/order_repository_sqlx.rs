use chrono::{Duration, TimeZone, Utc};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use uuid::Uuid;

use order_eta::db::schema;
use order_eta::order::model::OrderStatus;
use order_eta::order::repository::OrderRepository;
use order_eta::order::repository_sqlx::SqlxOrderRepository;

/// Helper to setup an isolated, unique in-memory SQLite database.
/// A unique name per test keeps parallel tests apart while shared cache lets
/// every pooled connection see the same schema.
async fn setup_db() -> AnyPool {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn_str = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn_str)
        .await
        .unwrap();

    schema::migrate(&pool).await.unwrap();

    sqlx::query("INSERT INTO merchants VALUES ('m-1', 'CAFE01', 'Asia/Jakarta')")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn base_ms() -> i64 {
    Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0)
        .unwrap()
        .timestamp_millis()
}

const MINUTE_MS: i64 = 60_000;

#[allow(clippy::too_many_arguments)]
async fn insert_order(
    pool: &AnyPool,
    number: &str,
    status: &str,
    order_type: &str,
    placed_at_ms: i64,
    actual_ready_at_ms: Option<i64>,
    completed_at_ms: Option<i64>,
) {
    sqlx::query(
        r#"
INSERT INTO orders (
  order_number, merchant_id, status, order_type,
  placed_at_ms, updated_at_ms, actual_ready_at_ms, completed_at_ms,
  is_scheduled, scheduled_date, scheduled_time
) VALUES ($1, 'm-1', $2, $3, $4, $5, $6, $7, 0, NULL, NULL)
"#,
    )
    .bind(number)
    .bind(status)
    .bind(order_type)
    .bind(placed_at_ms)
    .bind(placed_at_ms)
    .bind(actual_ready_at_ms)
    .bind(completed_at_ms)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn fetch_order_joins_merchant() {
    let pool = setup_db().await;
    let repo = SqlxOrderRepository::new(pool.clone());

    sqlx::query(
        r#"
INSERT INTO orders (
  order_number, merchant_id, status, order_type,
  placed_at_ms, updated_at_ms, actual_ready_at_ms, completed_at_ms,
  is_scheduled, scheduled_date, scheduled_time
) VALUES ('ORD-1', 'm-1', 'ACCEPTED', 'TAKEAWAY', $1, $2, NULL, NULL, 1, '2026-03-10', '12:30')
"#,
    )
    .bind(base_ms())
    .bind(base_ms() + 2 * MINUTE_MS)
    .execute(&pool)
    .await
    .unwrap();

    let (order, merchant) = repo.fetch_order_and_merchant("ORD-1").await.unwrap().unwrap();

    assert_eq!(order.status, OrderStatus::Accepted);
    assert_eq!(order.order_type, "TAKEAWAY");
    assert_eq!(order.placed_at.timestamp_millis(), base_ms());
    assert_eq!(order.updated_at - order.placed_at, Duration::minutes(2));
    assert!(order.is_scheduled);
    assert_eq!(order.scheduled_date.as_deref(), Some("2026-03-10"));
    assert_eq!(order.scheduled_time.as_deref(), Some("12:30"));

    assert_eq!(merchant.merchant_id, "m-1");
    assert_eq!(merchant.merchant_code, "CAFE01");
    assert_eq!(merchant.timezone, "Asia/Jakarta");
}

#[tokio::test]
async fn missing_order_is_none() {
    let pool = setup_db().await;
    let repo = SqlxOrderRepository::new(pool);

    assert!(repo.fetch_order_and_merchant("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn unrecognised_status_is_kept_verbatim() {
    let pool = setup_db().await;
    let repo = SqlxOrderRepository::new(pool.clone());

    insert_order(&pool, "ORD-P", "PREPARING", "TAKEAWAY", base_ms(), None, None).await;

    let (order, _) = repo.fetch_order_and_merchant("ORD-P").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Other("PREPARING".to_string()));
    assert!(!order.status.is_terminal());
}

#[tokio::test]
async fn blank_status_is_an_error() {
    let pool = setup_db().await;
    let repo = SqlxOrderRepository::new(pool.clone());

    insert_order(&pool, "ORD-X", " ", "TAKEAWAY", base_ms(), None, None).await;

    assert!(repo.fetch_order_and_merchant("ORD-X").await.is_err());
}

#[tokio::test]
async fn recent_completed_filters_and_orders_newest_first() {
    let pool = setup_db().await;
    let repo = SqlxOrderRepository::new(pool.clone());
    let t = base_ms();

    insert_order(&pool, "A", "COMPLETED", "TAKEAWAY", t - 30 * MINUTE_MS, Some(t - 20 * MINUTE_MS), None).await;
    insert_order(&pool, "B", "COMPLETED", "TAKEAWAY", t - 10 * MINUTE_MS, None, Some(t)).await;
    // no ready/completed timestamp
    insert_order(&pool, "C", "COMPLETED", "TAKEAWAY", t - 5 * MINUTE_MS, None, None).await;
    // wrong status / wrong type
    insert_order(&pool, "D", "CANCELLED", "TAKEAWAY", t - 5 * MINUTE_MS, None, Some(t)).await;
    insert_order(&pool, "E", "COMPLETED", "DELIVERY", t - 5 * MINUTE_MS, None, Some(t)).await;

    let samples = repo.fetch_recent_completed("m-1", "TAKEAWAY", 60).await.unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].placed_at.timestamp_millis(), t - 10 * MINUTE_MS);
    assert_eq!(samples[0].actual_ready_at, None);
    assert_eq!(samples[0].completed_at.map(|c| c.timestamp_millis()), Some(t));
    assert_eq!(
        samples[1].actual_ready_at.map(|r| r.timestamp_millis()),
        Some(t - 20 * MINUTE_MS)
    );
}

#[tokio::test]
async fn recent_completed_respects_limit() {
    let pool = setup_db().await;
    let repo = SqlxOrderRepository::new(pool.clone());
    let t = base_ms();

    for i in 0..8 {
        let placed = t - (i + 1) * 20 * MINUTE_MS;
        insert_order(&pool, &format!("ORD-{i}"), "COMPLETED", "TAKEAWAY", placed, Some(placed + 12 * MINUTE_MS), None).await;
    }

    let samples = repo.fetch_recent_completed("m-1", "TAKEAWAY", 5).await.unwrap();
    assert_eq!(samples.len(), 5);
    assert_eq!(samples[0].placed_at.timestamp_millis(), t - 20 * MINUTE_MS);
}

#[tokio::test]
async fn count_active_before_is_strict_and_status_scoped() {
    let pool = setup_db().await;
    let repo = SqlxOrderRepository::new(pool.clone());
    let t = base_ms();

    insert_order(&pool, "P", "PENDING", "TAKEAWAY", t - 3 * MINUTE_MS, None, None).await;
    insert_order(&pool, "A", "ACCEPTED", "TAKEAWAY", t - 2 * MINUTE_MS, None, None).await;
    insert_order(&pool, "I", "IN_PROGRESS", "TAKEAWAY", t - MINUTE_MS, None, None).await;
    // not counted
    insert_order(&pool, "R", "READY", "TAKEAWAY", t - MINUTE_MS, None, None).await;
    insert_order(&pool, "O", "PENDING", "DELIVERY", t - MINUTE_MS, None, None).await;
    insert_order(&pool, "SAME", "PENDING", "TAKEAWAY", t, None, None).await;
    insert_order(&pool, "LATER", "PENDING", "TAKEAWAY", t + MINUTE_MS, None, None).await;

    let before = Utc.timestamp_millis_opt(t).unwrap();
    let n = repo.count_active_before("m-1", "TAKEAWAY", before).await.unwrap();

    assert_eq!(n, 3);
    assert_eq!(repo.count_active_before("m-2", "TAKEAWAY", before).await.unwrap(), 0);
}
