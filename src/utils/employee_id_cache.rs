use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// true  => employee id is KNOWN (row exists)
/// false => unknown (usually we store only known ids)
pub static EMPLOYEE_ID_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single employee id as known
pub async fn mark_known(employee_id: &str) {
    EMPLOYEE_ID_CACHE
        .insert(employee_id.trim().to_uppercase(), true)
        .await;
}

/// Check if an employee id is known
pub async fn is_known(employee_id: &str) -> bool {
    EMPLOYEE_ID_CACHE
        .get(&employee_id.trim().to_uppercase())
        .await
        .unwrap_or(false)
}

/// Batch mark employee ids as known
async fn batch_mark(employee_ids: &[String]) {
    let futures: Vec<_> = employee_ids
        .iter()
        .map(|id| EMPLOYEE_ID_CACHE.insert(id.trim().to_uppercase(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load only ACTIVE employees into the in-memory cache (batched)
pub async fn warmup_employee_id_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT id
        FROM employees
        WHERE is_active = TRUE
        ORDER BY serial_no DESC
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (employee_id,) = row?;
        batch.push(employee_id);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining ids
    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Employee id cache warmup complete: {} active employees",
        total_count
    );

    Ok(())
}
