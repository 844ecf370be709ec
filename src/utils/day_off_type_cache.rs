use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::error::AppResult;
use crate::model::day_off_type::DayOffType;
use crate::repository::DayOffTypeRepo;
use crate::repository::day_off_type_repo::COLUMNS;

/// Day-off type catalogue keyed by id. Deleted types are cached too so
/// validation can tell "deleted" from "unknown".
pub static DAY_OFF_TYPE_CACHE: Lazy<Cache<u16, DayOffType>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

pub async fn remember(day_off_type: DayOffType) {
    DAY_OFF_TYPE_CACHE
        .insert(day_off_type.id, day_off_type)
        .await;
}

/// Cached lookup, falling back to the database on a miss.
pub async fn get(pool: &MySqlPool, id: u16) -> AppResult<Option<DayOffType>> {
    if let Some(found) = DAY_OFF_TYPE_CACHE.get(&id).await {
        return Ok(Some(found));
    }

    let found = DayOffTypeRepo::find(pool, id).await?;
    if let Some(day_off_type) = &found {
        remember(day_off_type.clone()).await;
    }
    Ok(found)
}

/// Always read from the database so the list reflects deletions;
/// refreshes the cache on the way.
pub async fn list_active(pool: &MySqlPool) -> AppResult<Vec<DayOffType>> {
    let types = DayOffTypeRepo::list_active(pool).await?;
    batch_remember(&types).await;
    Ok(types)
}

async fn batch_remember(types: &[DayOffType]) {
    let futures: Vec<_> = types
        .iter()
        .map(|t| DAY_OFF_TYPE_CACHE.insert(t.id, t.clone()))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load the whole catalogue into memory (batched).
pub async fn warmup_day_off_type_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let query = format!("SELECT {COLUMNS} FROM day_off_types ORDER BY id");
    let mut stream = sqlx::query_as::<_, DayOffType>(&query).fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(row?);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_remember(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_remember(&batch).await;
    }

    tracing::info!(total_count, "Day-off type cache warmup complete");

    Ok(())
}
