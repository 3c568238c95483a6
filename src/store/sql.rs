use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use super::Store;
use crate::context::OpContext;
use crate::error::{StoreError, StoreResult};
use crate::types::{Asset, AssetType, Pagination};

/// [`Store`] backed by the `assets` table of an sqlx pool.
///
/// Every round-trip runs under the caller's [`OpContext`], so a deadline
/// that fires mid-query surfaces as [`StoreError::DeadlineExceeded`].
#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_asset(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Asset> {
    let data: Option<String> = row.try_get("data")?;
    let data = match data.as_deref() {
        None | Some("") => serde_json::Value::Null,
        Some(raw) => serde_json::from_str(raw)?,
    };
    Ok(Asset {
        id: row.try_get("asset_id")?,
        asset_type: AssetType::from(row.try_get::<String, _>("type")?),
        description: row.try_get("description")?,
        data,
    })
}

#[async_trait]
impl Store for SqlStore {
    async fn fetch_favorites(
        &self,
        ctx: &OpContext,
        user_id: &str,
        filter: Option<AssetType>,
        page: Pagination,
    ) -> StoreResult<Vec<Asset>> {
        let limit = page.page_size as i64;
        let offset = page.offset();
        let rows = ctx
            .run(async {
                let rows = match &filter {
                    Some(kind) => {
                        sqlx::query(
                            r#"SELECT asset_id, type, description, data FROM assets
                               WHERE user_id = ?1 AND type = ?2
                               ORDER BY id LIMIT ?3 OFFSET ?4"#,
                        )
                        .bind(user_id)
                        .bind(kind.as_str())
                        .bind(limit)
                        .bind(offset)
                        .fetch_all(&self.pool)
                        .await?
                    }
                    None => {
                        sqlx::query(
                            r#"SELECT asset_id, type, description, data FROM assets
                               WHERE user_id = ?1
                               ORDER BY id LIMIT ?2 OFFSET ?3"#,
                        )
                        .bind(user_id)
                        .bind(limit)
                        .bind(offset)
                        .fetch_all(&self.pool)
                        .await?
                    }
                };
                Ok::<_, StoreError>(rows)
            })
            .await?;

        rows.iter().map(row_to_asset).collect()
    }

    async fn add_favorite(&self, ctx: &OpContext, user_id: &str, asset: &Asset) -> StoreResult<()> {
        let data = serde_json::to_string(&asset.data)?;
        ctx.run(async {
            let mut tx = self.pool.begin().await?;
            sqlx::query(
                r#"INSERT INTO assets (user_id, asset_id, type, description, data)
                   VALUES (?1, ?2, ?3, ?4, ?5)
                   ON CONFLICT (asset_id) DO NOTHING"#,
            )
            .bind(user_id)
            .bind(&asset.id)
            .bind(asset.asset_type.as_str())
            .bind(&asset.description)
            .bind(&data)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn remove_favorite(&self, ctx: &OpContext, user_id: &str, asset_id: &str) -> StoreResult<()> {
        ctx.run(async {
            sqlx::query("DELETE FROM assets WHERE user_id = ?1 AND asset_id = ?2")
                .bind(user_id)
                .bind(asset_id)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn update_description(
        &self,
        ctx: &OpContext,
        user_id: &str,
        asset_id: &str,
        description: &str,
    ) -> StoreResult<()> {
        ctx.run(async {
            sqlx::query("UPDATE assets SET description = ?1 WHERE user_id = ?2 AND asset_id = ?3")
                .bind(description)
                .bind(user_id)
                .bind(asset_id)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn ping(&self, ctx: &OpContext) -> StoreResult<()> {
        ctx.run(async {
            sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    async fn close(&self) -> StoreResult<()> {
        // Idempotent: closing a closed pool is a no-op.
        self.pool.close().await;
        Ok(())
    }
}
