//! Background scheduled tasks for the gacha engine.
//!
//! Expired limited banners are deactivated by a periodic sweep (pull requests also deactivate
//! lazily), and stale idempotency records are purged after their retention window.
//! Call `spawn_all` once during startup to launch them.

use crate::config::TasksConfig;
use crate::services::{BannerService, IdempotencyService};
use chrono::Utc;

/// Spawn all background tasks.
///
/// Each task runs on its own schedule and is detached via `tokio::spawn`.
pub fn spawn_all(
    banner_service: BannerService,
    idempotency_service: IdempotencyService,
    config: &TasksConfig,
) {
    if !config.enabled {
        log::info!("Background tasks disabled");
        return;
    }

    // 过期限定卡池下线
    {
        let svc = banner_service.clone();
        let interval = config.banner_sweep_interval_secs.max(1);
        tokio::spawn(async move {
            loop {
                match svc.sweep_expired(Utc::now()).await {
                    Ok(n) if n > 0 => log::info!("Expired banners deactivated: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to sweep expired banners: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
            }
        });
    }

    // 幂等记录清理
    {
        let svc = idempotency_service.clone();
        let interval = config.idempotency_purge_interval_secs.max(1);
        tokio::spawn(async move {
            loop {
                match svc.purge_expired(Utc::now()).await {
                    Ok(n) if n > 0 => log::info!("Idempotency records purged: {n}"),
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to purge idempotency records: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
            }
        });
    }
}
