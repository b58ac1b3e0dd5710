use sqlx::AnyPool;

/// Creates the subset of the ordering schema this service reads.
/// Timestamps are epoch milliseconds.
pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Merchants
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS merchants (
  merchant_id TEXT PRIMARY KEY,
  merchant_code TEXT NOT NULL,
  timezone TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Orders
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS orders (
  order_number TEXT PRIMARY KEY,
  merchant_id TEXT NOT NULL,
  status TEXT NOT NULL,
  order_type TEXT NOT NULL,
  placed_at_ms BIGINT NOT NULL,
  updated_at_ms BIGINT NOT NULL,
  actual_ready_at_ms BIGINT,
  completed_at_ms BIGINT,
  is_scheduled BIGINT NOT NULL DEFAULT 0 CHECK (is_scheduled IN (0,1)),
  scheduled_date TEXT,
  scheduled_time TEXT
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_orders_merchant_type_status ON orders(merchant_id, order_type, status, placed_at_ms);"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
