use anyhow::{anyhow, Result};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real headcount.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMPLOYEE_ID_FILTER: Lazy<RwLock<CuckooFilter<String>>> = Lazy::new(|| {
    RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE))
});

#[inline]
fn normalize(employee_id: &str) -> String {
    employee_id.trim().to_uppercase()
}

/// Check if an employee id might exist (false positives possible)
pub fn might_exist(employee_id: &str) -> bool {
    let employee_id = normalize(employee_id);
    EMPLOYEE_ID_FILTER
        .read()
        .expect("employee id filter poisoned")
        .contains(&employee_id)
}

/// Insert a single employee id into the filter
pub fn insert(employee_id: &str) {
    let employee_id = normalize(employee_id);
    EMPLOYEE_ID_FILTER
        .write()
        .expect("employee id filter poisoned")
        .add(&employee_id);
}

/// Remove an employee id from the filter
pub fn remove(employee_id: &str) {
    let employee_id = normalize(employee_id);
    EMPLOYEE_ID_FILTER
        .write()
        .expect("employee id filter poisoned")
        .remove(&employee_id);
}

/// Warm up the employee id filter using streaming + batching
pub async fn warmup_employee_id_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT id FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (employee_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&employee_id));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Employee id filter warmup complete: {} employees", total);
    Ok(())
}

/// Insert a batch of normalized employee ids
fn insert_batch(employee_ids: &[String]) {
    let mut filter = EMPLOYEE_ID_FILTER
        .write()
        .expect("employee id filter poisoned");

    for employee_id in employee_ids {
        filter.add(employee_id);
    }
}
