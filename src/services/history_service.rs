use crate::entities::pull_history_entity as history;
use crate::error::AppResult;
use crate::models::{
    HistoryEntryResponse, HistoryQuery, HistoryResetResponse, PaginatedResponse, PaginationParams,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

#[derive(Clone)]
pub struct HistoryService {
    pool: DatabaseConnection,
}

impl HistoryService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 抽取历史 (分页, 最新在前)
    pub async fn list(
        &self,
        player_id: i64,
        query: &HistoryQuery,
    ) -> AppResult<PaginatedResponse<HistoryEntryResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);
        let mut select = history::Entity::find().filter(history::Column::PlayerId.eq(player_id));
        if let Some(banner_id) = query.banner_id {
            select = select.filter(history::Column::BannerId.eq(banner_id));
        }
        let paginator = select
            .order_by_desc(history::Column::CreatedAt)
            .order_by_asc(history::Column::Id)
            .paginate(&self.pool, params.page_size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(params.page_index()).await?;
        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    /// 管理员重置玩家抽取历史 (唯一的删除路径)
    pub async fn reset(&self, player_id: i64) -> AppResult<HistoryResetResponse> {
        let result = history::Entity::delete_many()
            .filter(history::Column::PlayerId.eq(player_id))
            .exec(&self.pool)
            .await?;
        log::warn!(
            "Pull history of player {player_id} reset by admin ({} rows)",
            result.rows_affected
        );
        Ok(HistoryResetResponse {
            player_id,
            deleted: result.rows_affected,
        })
    }
}
