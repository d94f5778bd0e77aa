mod common;

use chrono::Duration;
use common::{Services, test_gacha_config};
use gacha_engine::AppError;
use gacha_engine::entities::{DeliveryStatus, RewardSource};
use gacha_engine::models::RedeemRequest;
use gacha_engine::services::{STANDARD_BANNER_ID, StardustService};
use serde_json::json;

#[tokio::test]
async fn test_delivery_state_transitions() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;
    svc.pulls.pull(1, STANDARD_BANNER_ID, "dlv-1").await.unwrap();

    let pending = svc.delivery.list_pending("ext-1").await.unwrap();
    assert_eq!(pending.len(), 1);
    let id = pending[0].id;
    assert_eq!(pending[0].source, RewardSource::Pull);

    // 代理开始发放后, 记录不再出现在待发放列表
    let started = svc.delivery.mark_delivery_started(id).await.unwrap();
    assert_eq!(started.status, DeliveryStatus::DeliveryStarted);
    assert!(svc.delivery.list_pending("ext-1").await.unwrap().is_empty());
    assert!(matches!(
        svc.delivery.mark_delivery_started(id).await,
        Err(AppError::DeliveryConflict(_))
    ));

    // 失败退回 pending 并记录次数
    let failed = svc
        .delivery
        .confirm_delivery(id, false, Some("player offline"))
        .await
        .unwrap();
    assert_eq!(failed.status, DeliveryStatus::Pending);
    assert_eq!(failed.attempts, 1);
    assert_eq!(failed.last_error.as_deref(), Some("player offline"));

    svc.delivery.mark_delivery_started(id).await.unwrap();
    let delivered = svc.delivery.confirm_delivery(id, true, None).await.unwrap();
    assert_eq!(delivered.status, DeliveryStatus::Delivered);
    assert!(delivered.delivered_at.is_some());

    // 重复确认视为成功; 已发放的记录不能再被领取
    svc.delivery.mark_delivered(id).await.unwrap();
    assert!(matches!(
        svc.delivery.mark_claimed(id).await,
        Err(AppError::DeliveryConflict(_))
    ));
}

#[tokio::test]
async fn test_claim_is_idempotent_and_unknown_reward_is_not_found() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;
    svc.pulls.pull(1, STANDARD_BANNER_ID, "clm-1").await.unwrap();
    let id = svc.delivery.list_pending("ext-1").await.unwrap()[0].id;

    let claimed = svc.delivery.mark_claimed(id).await.unwrap();
    assert_eq!(claimed.status, DeliveryStatus::Claimed);
    svc.delivery.mark_claimed(id).await.unwrap();
    assert!(matches!(
        svc.delivery.mark_delivery_started(id).await,
        Err(AppError::DeliveryConflict(_))
    ));

    assert!(matches!(
        svc.delivery.mark_claimed(uuid::Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_cleanup_keeps_recent_rewards() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1000).await;
    svc.pulls.pull(1, STANDARD_BANNER_ID, "cln-1").await.unwrap();

    assert_eq!(svc.delivery.cleanup_stale(Duration::hours(1)).await.unwrap(), 0);
    assert_eq!(svc.delivery.list_pending("ext-1").await.unwrap().len(), 1);
    assert!(svc.delivery.cleanup_stale(Duration::zero()).await.is_err());
}

#[tokio::test]
async fn test_shop_redeem_respects_limits_and_balance() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1).await;
    StardustService::credit(&svc.db, 1, 2000, "test_grant", json!({}))
        .await
        .unwrap();

    let redeemed = svc
        .stardust
        .redeem(
            1,
            &RedeemRequest {
                item_key: "master_ball".into(),
                quantity: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(redeemed.stardust_spent, 1000);
    assert_eq!(redeemed.new_stardust_balance, 1000);

    let err = svc
        .stardust
        .redeem(
            1,
            &RedeemRequest {
                item_key: "master_ball".into(),
                quantity: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PurchaseLimitReached(_)));

    let err = svc
        .stardust
        .redeem(
            1,
            &RedeemRequest {
                item_key: "ability_capsule".into(),
                quantity: Some(2),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = svc
        .stardust
        .redeem(
            1,
            &RedeemRequest {
                item_key: "rare_candy".into(),
                quantity: Some(11),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStardust {
            required: 1100,
            available: 1000
        }
    ));

    let account = svc.stardust.get_account(1).await.unwrap();
    assert_eq!(account.balance, 1000);
    assert_eq!(account.lifetime_spent, 1000);

    // 兑换的奖励进入同一个待发放队列
    let pending = svc.delivery.list_pending("ext-1").await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].source, RewardSource::StardustShop);
    assert_eq!(pending[0].id, redeemed.pending_reward_id);
}

#[tokio::test]
async fn test_unknown_shop_item() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1).await;
    let err = svc
        .stardust
        .redeem(
            1,
            &RedeemRequest {
                item_key: "golden_razz".into(),
                quantity: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
