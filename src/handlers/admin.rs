use crate::models::*;
use crate::services::{BannerService, DeliveryService, HistoryService, PlayerService};
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/admin/banners",
    tag = "admin",
    request_body = CreateBannerRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "创建限定卡池成功", body = BannerResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_banner(
    service: web::Data<BannerService>,
    body: web::Json<CreateBannerRequest>,
) -> Result<HttpResponse> {
    match service.create_banner(&body.into_inner()).await {
        Ok(banner) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": banner,
            "message": "卡池已创建"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/banners/{id}",
    tag = "admin",
    request_body = UpdateBannerRequest,
    params(
        ("id" = Uuid, Path, description = "卡池ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = BannerResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "卡池不存在")
    )
)]
pub async fn update_banner(
    service: web::Data<BannerService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateBannerRequest>,
) -> Result<HttpResponse> {
    match service
        .update_banner(path.into_inner(), &body.into_inner())
        .await
    {
        Ok(banner) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": banner }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/banners/{id}/deactivate",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "卡池ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "已下线", body = BannerResponse),
        (status = 400, description = "常驻池不能下线"),
        (status = 404, description = "卡池不存在")
    )
)]
pub async fn deactivate_banner(
    service: web::Data<BannerService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match service.deactivate_banner(path.into_inner()).await {
        Ok(banner) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": banner }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/players/{id}/currency",
    tag = "admin",
    request_body = GrantCurrencyRequest,
    params(
        ("id" = i64, Path, description = "玩家ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "发放成功", body = PlayerResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn grant_currency(
    service: web::Data<PlayerService>,
    path: web::Path<i64>,
    body: web::Json<GrantCurrencyRequest>,
) -> Result<HttpResponse> {
    match service
        .grant_currency(path.into_inner(), &body.into_inner())
        .await
    {
        Ok(player) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": player }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/pending/cleanup",
    tag = "admin",
    request_body = CleanupPendingRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "清理完成", body = CleanupPendingResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn cleanup_pending(
    service: web::Data<DeliveryService>,
    body: web::Json<CleanupPendingRequest>,
) -> Result<HttpResponse> {
    match service
        .cleanup_stale(Duration::hours(body.older_than_hours))
        .await
    {
        Ok(deleted) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": CleanupPendingResponse { deleted }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/players/{id}/history",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "玩家ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "历史已清空", body = HistoryResetResponse)
    )
)]
pub async fn reset_history(
    service: web::Data<HistoryService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.reset(path.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/banners", web::post().to(create_banner))
            .route("/banners/{id}", web::put().to(update_banner))
            .route("/banners/{id}/deactivate", web::post().to(deactivate_banner))
            .route("/players/{id}/currency", web::post().to(grant_currency))
            .route("/players/{id}/history", web::delete().to(reset_history))
            .route("/pending/cleanup", web::post().to(cleanup_pending)),
    );
}
