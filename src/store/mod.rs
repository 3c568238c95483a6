//! Persistence seam for favorites.
//!
//! Handlers only see the [`Store`] trait; [`SqlStore`] is the relational
//! implementation used by the server binary.

use async_trait::async_trait;

use crate::context::OpContext;
use crate::error::StoreResult;
use crate::types::{Asset, AssetType, Pagination};

pub mod sql;

pub use sql::SqlStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// One page of a user's favorites, optionally restricted to one kind,
    /// in the order the store returns them.
    async fn fetch_favorites(
        &self,
        ctx: &OpContext,
        user_id: &str,
        filter: Option<AssetType>,
        page: Pagination,
    ) -> StoreResult<Vec<Asset>>;

    /// Adds `asset` to the user's favorites. An asset id that already exists
    /// is silently ignored.
    async fn add_favorite(&self, ctx: &OpContext, user_id: &str, asset: &Asset) -> StoreResult<()>;

    async fn remove_favorite(&self, ctx: &OpContext, user_id: &str, asset_id: &str) -> StoreResult<()>;

    async fn update_description(
        &self,
        ctx: &OpContext,
        user_id: &str,
        asset_id: &str,
        description: &str,
    ) -> StoreResult<()>;

    /// Connectivity probe used by the readiness endpoint.
    async fn ping(&self, _ctx: &OpContext) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) -> StoreResult<()>;
}
