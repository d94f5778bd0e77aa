mod common;

use chrono::{Duration, Utc};
use common::{Services, test_gacha_config};
use gacha_engine::AppError;
use gacha_engine::config::GachaConfig;
use gacha_engine::entities::{
    IdempotencyStatus, RewardKind, Tier, banner_entity as banners,
    idempotency_record_entity as records, pending_reward_entity as pending,
    pull_history_entity as history,
};
use gacha_engine::models::HistoryQuery;
use gacha_engine::services::STANDARD_BANNER_ID;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

#[tokio::test]
async fn test_standard_pull_depletes_exact_cost() {
    let svc = Services::new(GachaConfig {
        standard_single_cost: 500,
        ..test_gacha_config()
    })
    .await;
    svc.player(1, 1000).await;

    let resp = svc.pulls.pull(1, STANDARD_BANNER_ID, "std-1").await.unwrap();

    assert_eq!(resp.new_balance, 500);
    assert_eq!(resp.ledger_delta.currency_spent, 500);
    assert_eq!(resp.outcomes.len(), 1);
    assert_eq!(svc.players.get_player(1).await.unwrap().balance, 500);

    let rows = history::Entity::find()
        .filter(history::Column::PlayerId.eq(1))
        .count(&svc.db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(svc.delivery.list_pending("ext-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_insufficient_balance_has_no_side_effects() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 100).await;

    let err = svc
        .pulls
        .pull(1, STANDARD_BANNER_ID, "poor-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance { required: 160, available: 100 }));

    assert_eq!(svc.players.get_player(1).await.unwrap().balance, 100);
    assert_eq!(history::Entity::find().count(&svc.db).await.unwrap(), 0);

    // 失败的请求释放令牌, 充值后可用同一令牌重试
    svc.player(1, 100).await;
    let resp = svc.pulls.pull(1, STANDARD_BANNER_ID, "poor-1").await.unwrap();
    assert_eq!(resp.new_balance, 40);
}

#[tokio::test]
async fn test_duplicate_converts_to_stardust() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;
    let banner_id = svc.single_entry_banner().await;

    let first = svc.pulls.pull(1, banner_id, "dup-1").await.unwrap();
    let first = &first.outcomes[0];
    assert_eq!(first.outcome_key, "mew");
    assert!(!first.was_duplicate);
    assert!(first.is_new_entry);
    assert_eq!(first.stardust_earned, 0);

    let second = svc.pulls.pull(1, banner_id, "dup-2").await.unwrap();
    let outcome = &second.outcomes[0];
    assert_eq!(outcome.outcome_key, "mew");
    assert!(outcome.was_duplicate);
    assert!(!outcome.is_new_entry);
    // 神话档位默认 200 星尘
    assert_eq!(outcome.stardust_earned, 200);
    assert_eq!(second.new_stardust_balance, 200);
    assert_eq!(svc.stardust.get_account(1).await.unwrap().balance, 200);

    let collection = svc.collection.get_collection(1).await.unwrap();
    assert_eq!(collection.normal_count, 1);

    let rows = history::Entity::find()
        .filter(history::Column::PlayerId.eq(1))
        .all(&svc.db)
        .await
        .unwrap();
    assert_eq!(rows.iter().filter(|r| r.is_new_entry).count(), 1);
    assert_eq!(rows.iter().filter(|r| r.was_duplicate).count(), 1);

    let rewards = pending::Entity::find()
        .filter(pending::Column::PlayerId.eq(1))
        .all(&svc.db)
        .await
        .unwrap();
    assert_eq!(rewards.len(), 2);
    assert_eq!(
        rewards
            .iter()
            .filter(|r| r.reward_kind == RewardKind::DuplicateToken)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_banner_expiry_mid_session() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;
    let banner_id = svc.single_entry_banner().await;

    svc.pulls.pull(1, banner_id, "exp-1").await.unwrap();

    banners::Entity::update_many()
        .col_expr(
            banners::Column::EndsAt,
            Expr::value(Some(Utc::now() - Duration::minutes(1))),
        )
        .filter(banners::Column::Id.eq(banner_id))
        .exec(&svc.db)
        .await
        .unwrap();

    let err = svc.pulls.pull(1, banner_id, "exp-2").await.unwrap_err();
    assert!(matches!(err, AppError::BannerExpired(_)));
    let banner = svc.banners.get_banner(banner_id).await.unwrap();
    assert!(!banner.is_active);

    // 第二次仍是同一个错误, 下线只发生一次
    let err = svc.pulls.pull(1, banner_id, "exp-3").await.unwrap_err();
    assert!(matches!(err, AppError::BannerExpired(_)));
    assert_eq!(svc.banners.sweep_expired(Utc::now()).await.unwrap(), 0);

    assert_eq!(svc.players.get_player(1).await.unwrap().balance, 900);
    let listed = svc.banners.list_drawable(Utc::now()).await.unwrap();
    assert!(listed.iter().all(|b| b.id != banner_id));
}

#[tokio::test]
async fn test_idempotent_replay_returns_identical_response() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 5000).await;

    let first = svc
        .pulls
        .multi_pull(1, STANDARD_BANNER_ID, "multi-1")
        .await
        .unwrap();
    let replay = svc
        .pulls
        .multi_pull(1, STANDARD_BANNER_ID, "multi-1")
        .await
        .unwrap();

    assert_eq!(first, replay);
    assert_eq!(first.outcomes.len(), 10);
    assert_eq!(svc.players.get_player(1).await.unwrap().balance, 5000 - 1600);
    assert_eq!(history::Entity::find().count(&svc.db).await.unwrap(), 10);
    assert_eq!(pending::Entity::find().count(&svc.db).await.unwrap(), 10);
    let account = svc.stardust.get_account(1).await.unwrap();
    assert_eq!(account.balance, first.new_stardust_balance);
    assert_eq!(account.balance, first.ledger_delta.stardust_earned);

    // 同一令牌用于不同操作被拒绝
    let err = svc
        .pulls
        .pull(1, STANDARD_BANNER_ID, "multi-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_ledger_conservation_over_many_pulls() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 20_000).await;

    for i in 0..5 {
        svc.pulls
            .multi_pull(1, STANDARD_BANNER_ID, &format!("cons-{i}"))
            .await
            .unwrap();
    }
    svc.pulls.pull(1, STANDARD_BANNER_ID, "cons-single").await.unwrap();

    let rows = history::Entity::find()
        .filter(history::Column::PlayerId.eq(1))
        .all(&svc.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 51);

    let spent: i64 = rows.iter().map(|r| r.cost).sum();
    let player = svc.players.get_player(1).await.unwrap();
    assert_eq!(spent, 5 * 1600 + 160);
    assert_eq!(player.balance, 20_000 - spent);

    let earned: i64 = rows.iter().map(|r| r.stardust_earned).sum();
    let account = svc.stardust.get_account(1).await.unwrap();
    assert_eq!(account.balance, earned);
    assert_eq!(account.lifetime_earned, earned);

    let status = svc.pulls.pity_status(1, STANDARD_BANNER_ID).await.unwrap();
    assert_eq!(status.lifetime_pulls, 51);
    assert_eq!(status.lifetime_spend, spent);

    // 每一抽都有一条待发放记录
    let rewards = pending::Entity::find().count(&svc.db).await.unwrap();
    assert_eq!(rewards, 51);

    let page = svc
        .history
        .list(
            1,
            &HistoryQuery {
                banner_id: Some(STANDARD_BANNER_ID),
                page: Some(2),
                per_page: Some(20),
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 51);
    assert_eq!(page.data.len(), 20);
    assert_eq!(page.total_pages, 3);

    let reset = svc.history.reset(1).await.unwrap();
    assert_eq!(reset.deleted, 51);
}

#[tokio::test]
async fn test_pulling_unknown_banner_fails() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;
    let err = svc
        .pulls
        .pull(1, uuid::Uuid::new_v4(), "unknown-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BannerNotFound(_)));
}

#[tokio::test]
async fn test_target_path_selection() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;
    let banner_id = svc.single_entry_banner().await;

    let err = svc
        .targets
        .set_target(1, banner_id, "pidgey")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let target = svc.targets.set_target(1, banner_id, "mew").await.unwrap();
    assert_eq!(target.target_key, "mew");
    assert_eq!(target.fate_points, 0);
    assert!(!target.will_force);

    // 抽到目标后命定值保持为 0, 响应中带出定轨状态
    let resp = svc.pulls.pull(1, banner_id, "tgt-1").await.unwrap();
    assert_eq!(resp.pity_state.target_key.as_deref(), Some("mew"));
    assert_eq!(resp.pity_state.fate_points, Some(0));

    assert!(svc.targets.get_target(1, banner_id).await.unwrap().is_some());
    assert!(svc.targets.clear_target(1, banner_id).await.unwrap());
    assert!(!svc.targets.clear_target(1, banner_id).await.unwrap());
    assert!(svc.targets.get_target(1, banner_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_in_flight_token_is_rejected_until_lease_expires() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;

    let now = Utc::now();
    records::Entity::insert(records::ActiveModel {
        token: Set("busy-1".into()),
        player_id: Set(1),
        banner_id: Set(STANDARD_BANNER_ID),
        operation: Set("pull".into()),
        status: Set(IdempotencyStatus::InFlight),
        response: Set(None),
        created_at: Set(now),
        expires_at: Set(now + Duration::hours(24)),
    })
    .exec_without_returning(&svc.db)
    .await
    .unwrap();

    let err = svc
        .pulls
        .pull(1, STANDARD_BANNER_ID, "busy-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyInFlight));
    assert_eq!(svc.players.get_player(1).await.unwrap().balance, 1000);
    assert_eq!(history::Entity::find().count(&svc.db).await.unwrap(), 0);

    // 拒绝不会释放他人的占用
    let record = records::Entity::find_by_id("busy-1".to_string())
        .one(&svc.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, IdempotencyStatus::InFlight);

    // 超过租约的占用视为遗弃, 可被接管
    records::Entity::update_many()
        .col_expr(
            records::Column::CreatedAt,
            Expr::value(now - Duration::minutes(5)),
        )
        .filter(records::Column::Token.eq("busy-1"))
        .exec(&svc.db)
        .await
        .unwrap();
    let resp = svc.pulls.pull(1, STANDARD_BANNER_ID, "busy-1").await.unwrap();
    assert_eq!(resp.new_balance, 840);
}

#[tokio::test]
async fn test_token_past_retention_runs_as_new_batch() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;

    let first = svc.pulls.pull(1, STANDARD_BANNER_ID, "old-1").await.unwrap();

    records::Entity::update_many()
        .col_expr(
            records::Column::ExpiresAt,
            Expr::value(Utc::now() - Duration::hours(1)),
        )
        .filter(records::Column::Token.eq("old-1"))
        .exec(&svc.db)
        .await
        .unwrap();

    let second = svc.pulls.pull(1, STANDARD_BANNER_ID, "old-1").await.unwrap();
    assert_ne!(first.batch_id, second.batch_id);
    assert_eq!(second.new_balance, 1000 - 2 * 160);
    assert_eq!(svc.players.get_player(1).await.unwrap().balance, 680);
    assert_eq!(history::Entity::find().count(&svc.db).await.unwrap(), 2);

    // 新批次的响应成为该令牌后续的重放内容
    let replay = svc.pulls.pull(1, STANDARD_BANNER_ID, "old-1").await.unwrap();
    assert_eq!(replay, second);
}

#[tokio::test]
async fn test_failure_after_debit_rolls_back_whole_batch() {
    // 非法的 UP 概率只在抽取阶段 (扣费之后) 才会报错
    let svc = Services::new(GachaConfig {
        featured_win_rate: 1.5,
        ..test_gacha_config()
    })
    .await;
    svc.player(1, 5000).await;

    // 常驻池没有 UP 条目, 不受影响
    svc.pulls.pull(1, STANDARD_BANNER_ID, "ok-1").await.unwrap();

    // mewtwo 为 UP, lugia 为同层级非 UP: 每一抽都要掷 UP 概率
    let banner_id = svc
        .limited_banner(&[("mewtwo", Tier::Legendary)], &["mewtwo", "lugia"])
        .await;
    let err = svc
        .pulls
        .multi_pull(1, banner_id, "broken-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RandomError(_)));

    assert_eq!(svc.players.get_player(1).await.unwrap().balance, 5000 - 160);
    assert_eq!(history::Entity::find().count(&svc.db).await.unwrap(), 1);
    assert_eq!(pending::Entity::find().count(&svc.db).await.unwrap(), 1);
    assert_eq!(svc.stardust.get_account(1).await.unwrap().balance, 0);
    let status = svc.pulls.pity_status(1, banner_id).await.unwrap();
    assert_eq!(status.lifetime_pulls, 0);
    assert_eq!(status.lifetime_spend, 0);

    // 失败后令牌被释放
    assert!(
        records::Entity::find_by_id("broken-1".to_string())
            .one(&svc.db)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_fate_points_persist_and_force_target_in_later_batch() {
    let svc = Services::new(GachaConfig {
        max_fate_points: 2,
        ..test_gacha_config()
    })
    .await;
    svc.player(1, 100_000).await;

    // 两个同层级 UP, 卡池中没有其他条目: 每一抽都是 mewtwo 或 lugia
    let banner_id = svc
        .limited_banner(
            &[("mewtwo", Tier::Legendary), ("lugia", Tier::Legendary)],
            &["mewtwo", "lugia"],
        )
        .await;
    svc.targets.set_target(1, banner_id, "mewtwo").await.unwrap();

    let mut expected = 0;
    let mut forced = false;
    for i in 0..200 {
        let resp = svc
            .pulls
            .pull(1, banner_id, &format!("fate-{i}"))
            .await
            .unwrap();
        let outcome = &resp.outcomes[0];

        if expected == 2 {
            // 上一批次存下的点数已满, 本批次必定为目标
            assert_eq!(outcome.outcome_key, "mewtwo");
            assert_eq!(resp.pity_state.fate_points, Some(0));
            forced = true;
            break;
        }

        expected = if outcome.outcome_key == "mewtwo" {
            0
        } else {
            assert_eq!(outcome.outcome_key, "lugia");
            expected + 1
        };
        assert_eq!(resp.pity_state.fate_points, Some(expected));

        let stored = svc.targets.get_target(1, banner_id).await.unwrap().unwrap();
        assert_eq!(stored.fate_points, expected);
        assert_eq!(stored.will_force, expected == 2);
    }
    assert!(forced);

    let stored = svc.targets.get_target(1, banner_id).await.unwrap().unwrap();
    assert_eq!(stored.fate_points, 0);
    assert!(!stored.will_force);
}
