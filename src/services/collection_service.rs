use crate::entities::{
    OutcomeKind, collection_entry_entity as collection, pool_entry_entity as catalog,
};
use crate::error::{AppError, AppResult};
use crate::gacha::Outcome;
use crate::models::{CollectionResponse, OwnershipChange};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// 图鉴 (永久拥有记录)
#[derive(Clone)]
pub struct CollectionService {
    pool: DatabaseConnection,
}

impl CollectionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_collection(&self, player_id: i64) -> AppResult<CollectionResponse> {
        let entries = collection::Entity::find()
            .filter(collection::Column::PlayerId.eq(player_id))
            .order_by_asc(collection::Column::OutcomeKey)
            .all(&self.pool)
            .await?;
        let catalog_size = catalog::Entity::find()
            .filter(catalog::Column::Kind.eq(OutcomeKind::Creature))
            .filter(catalog::Column::IsActive.eq(true))
            .count(&self.pool)
            .await? as usize;

        Ok(CollectionResponse {
            player_id,
            normal_count: entries.iter().filter(|e| e.has_normal).count(),
            variant_count: entries.iter().filter(|e| e.has_variant).count(),
            catalog_size,
            entries: entries.into_iter().map(Into::into).collect(),
        })
    }

    /// 道具不计入图鉴, 永远不是重复
    pub async fn is_duplicate<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        outcome: &Outcome,
        variant: bool,
    ) -> AppResult<bool> {
        if !outcome.is_collectible() {
            return Ok(false);
        }
        let entry = collection::Entity::find_by_id((player_id, outcome.key().to_string()))
            .one(conn)
            .await?;
        Ok(entry.is_some_and(|e| e.owns(variant)))
    }

    /// 登记获得; 重复调用不会改变已有记录
    pub async fn register_outcome<C: ConnectionTrait>(
        conn: &C,
        player_id: i64,
        outcome_key: &str,
        variant: bool,
        now: DateTime<Utc>,
    ) -> AppResult<OwnershipChange> {
        let am = collection::ActiveModel {
            player_id: Set(player_id),
            outcome_key: Set(outcome_key.to_string()),
            has_normal: Set(false),
            has_variant: Set(false),
            normal_obtained_at: Set(None),
            variant_obtained_at: Set(None),
        };
        collection::Entity::insert(am)
            .on_conflict(
                OnConflict::columns([
                    collection::Column::PlayerId,
                    collection::Column::OutcomeKey,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        let entry = collection::Entity::find_by_id((player_id, outcome_key.to_string()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| {
                AppError::InternalError("Collection entry missing after insert".into())
            })?;

        if entry.owns(variant) {
            return Ok(OwnershipChange::default());
        }

        let mut am = entry.into_active_model();
        let change = if variant {
            am.has_variant = Set(true);
            am.variant_obtained_at = Set(Some(now));
            OwnershipChange {
                new_normal: false,
                new_variant: true,
            }
        } else {
            am.has_normal = Set(true);
            am.normal_obtained_at = Set(Some(now));
            OwnershipChange {
                new_normal: true,
                new_variant: false,
            }
        };
        am.update(conn).await?;
        Ok(change)
    }
}
