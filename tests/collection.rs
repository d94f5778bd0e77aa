mod common;

use chrono::Utc;
use common::{Services, test_gacha_config};
use gacha_engine::models::OwnershipChange;
use gacha_engine::services::CollectionService;

#[tokio::test]
async fn test_register_outcome_reports_newly_owned_dimension() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1).await;
    let now = Utc::now();

    let first = CollectionService::register_outcome(&svc.db, 1, "mew", false, now)
        .await
        .unwrap();
    assert_eq!(
        first,
        OwnershipChange {
            new_normal: true,
            new_variant: false,
        }
    );

    // 已有普通形态, 首次获得闪光只点亮闪光维度
    let shiny = CollectionService::register_outcome(&svc.db, 1, "mew", true, now)
        .await
        .unwrap();
    assert_eq!(
        shiny,
        OwnershipChange {
            new_normal: false,
            new_variant: true,
        }
    );

    for variant in [false, true] {
        let again = CollectionService::register_outcome(&svc.db, 1, "mew", variant, now)
            .await
            .unwrap();
        assert_eq!(again, OwnershipChange::default());
        assert!(!again.is_new());
    }

    let collection = svc.collection.get_collection(1).await.unwrap();
    assert_eq!(collection.normal_count, 1);
    assert_eq!(collection.variant_count, 1);
}

#[tokio::test]
async fn test_variant_first_leaves_normal_unowned() {
    let svc = Services::new(test_gacha_config()).await;
    svc.player(1, 1).await;
    let now = Utc::now();

    let shiny = CollectionService::register_outcome(&svc.db, 1, "mewtwo", true, now)
        .await
        .unwrap();
    assert!(shiny.new_variant && !shiny.new_normal);

    let normal = CollectionService::register_outcome(&svc.db, 1, "mewtwo", false, now)
        .await
        .unwrap();
    assert!(normal.new_normal && !normal.new_variant);
}
