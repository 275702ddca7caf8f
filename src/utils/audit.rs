use sqlx::MySqlPool;

/// Write one audit row. Failures are logged and swallowed so an audit
/// hiccup never fails the workflow that triggered it.
pub async fn log_audit(
    pool: &MySqlPool,
    entity_type: &str,
    entity_id: &str,
    action: &str,
    performed_by: &str,
    comment: Option<&str>,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs (entity_type, entity_id, action, performed_by, comment)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(action)
    .bind(performed_by)
    .bind(comment)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, entity_type, entity_id, action, "Failed to write audit log");
    }
}
