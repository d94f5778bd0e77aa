use crate::models::*;
use crate::services::DeliveryService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/delivery/pending/{external_id}",
    tag = "delivery",
    params(
        ("external_id" = String, Path, description = "游戏内玩家ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "待发放奖励 (先入先出)", body = [PendingRewardResponse]),
        (status = 403, description = "API key 无效")
    )
)]
pub async fn list_pending(
    service: web::Data<DeliveryService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match service.list_pending(&path.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/delivery/{reward_id}/claim",
    tag = "delivery",
    params(
        ("reward_id" = Uuid, Path, description = "待发放奖励ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "已领取", body = PendingRewardResponse),
        (status = 404, description = "记录不存在"),
        (status = 409, description = "状态不允许")
    )
)]
pub async fn claim(
    service: web::Data<DeliveryService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match service.mark_claimed(path.into_inner()).await {
        Ok(reward) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": reward }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/delivery/{reward_id}/start",
    tag = "delivery",
    params(
        ("reward_id" = Uuid, Path, description = "待发放奖励ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "开始发放", body = PendingRewardResponse),
        (status = 404, description = "记录不存在"),
        (status = 409, description = "状态不允许")
    )
)]
pub async fn start(
    service: web::Data<DeliveryService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match service.mark_delivery_started(path.into_inner()).await {
        Ok(reward) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": reward }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/delivery/{reward_id}/confirm",
    tag = "delivery",
    request_body = ConfirmDeliveryRequest,
    params(
        ("reward_id" = Uuid, Path, description = "待发放奖励ID")
    ),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "成功则标记已发放, 失败则退回待发放", body = PendingRewardResponse),
        (status = 404, description = "记录不存在"),
        (status = 409, description = "状态不允许")
    )
)]
pub async fn confirm(
    service: web::Data<DeliveryService>,
    path: web::Path<Uuid>,
    body: web::Json<ConfirmDeliveryRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    match service
        .confirm_delivery(path.into_inner(), body.success, body.reason.as_deref())
        .await
    {
        Ok(reward) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": reward }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn delivery_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/delivery")
            .route("/pending/{external_id}", web::get().to(list_pending))
            .route("/{reward_id}/claim", web::post().to(claim))
            .route("/{reward_id}/start", web::post().to(start))
            .route("/{reward_id}/confirm", web::post().to(confirm)),
    );
}
