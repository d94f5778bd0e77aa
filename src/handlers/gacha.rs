use crate::models::*;
use crate::services::{
    BannerService, CollectionService, HistoryService, PullService, TargetPathService,
};
use crate::utils::{idempotency_key_from_request, player_id_from_request};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/gacha/banners",
    tag = "gacha",
    responses(
        (status = 200, description = "当前可抽取的卡池 (常驻池在前)", body = [BannerResponse])
    )
)]
pub async fn list_banners(service: web::Data<BannerService>) -> Result<HttpResponse> {
    match service.list_drawable(Utc::now()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/gacha/banners/{id}/pull",
    tag = "gacha",
    params(
        ("id" = Uuid, Path, description = "卡池ID"),
        ("X-Player-Id" = i64, Header, description = "玩家ID"),
        ("Idempotency-Key" = String, Header, description = "幂等令牌")
    ),
    responses(
        (status = 200, description = "单抽成功", body = PullResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "卡池不存在"),
        (status = 409, description = "余额不足/卡池已过期/请求处理中")
    )
)]
/// 单抽; 相同 Idempotency-Key 的重试返回首次结果
pub async fn pull(
    service: web::Data<PullService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let (player_id, token) = match player_and_token(&req) {
        Ok(v) => v,
        Err(e) => return Ok(e.error_response()),
    };
    match service.pull(player_id, path.into_inner(), &token).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/gacha/banners/{id}/multi-pull",
    tag = "gacha",
    params(
        ("id" = Uuid, Path, description = "卡池ID"),
        ("X-Player-Id" = i64, Header, description = "玩家ID"),
        ("Idempotency-Key" = String, Header, description = "幂等令牌")
    ),
    responses(
        (status = 200, description = "十连成功", body = PullResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "卡池不存在"),
        (status = 409, description = "余额不足/卡池已过期/请求处理中")
    )
)]
pub async fn multi_pull(
    service: web::Data<PullService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let (player_id, token) = match player_and_token(&req) {
        Ok(v) => v,
        Err(e) => return Ok(e.error_response()),
    };
    match service.multi_pull(player_id, path.into_inner(), &token).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

fn player_and_token(req: &HttpRequest) -> crate::error::AppResult<(i64, String)> {
    Ok((
        player_id_from_request(req)?,
        idempotency_key_from_request(req)?,
    ))
}

#[utoipa::path(
    get,
    path = "/gacha/banners/{id}/pity",
    tag = "gacha",
    params(
        ("id" = Uuid, Path, description = "卡池ID"),
        ("X-Player-Id" = i64, Header, description = "玩家ID")
    ),
    responses(
        (status = 200, description = "保底状态", body = PityStatusResponse),
        (status = 404, description = "卡池不存在")
    )
)]
pub async fn get_pity(
    service: web::Data<PullService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.pity_status(player_id, path.into_inner()).await {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": status }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/gacha/banners/{id}/target",
    tag = "gacha",
    params(
        ("id" = Uuid, Path, description = "卡池ID"),
        ("X-Player-Id" = i64, Header, description = "玩家ID")
    ),
    responses(
        (status = 200, description = "当前定轨 (未设置时 data 为 null)", body = TargetPathResponse)
    )
)]
pub async fn get_target(
    service: web::Data<TargetPathService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_target(player_id, path.into_inner()).await {
        Ok(target) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": target }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/gacha/banners/{id}/target",
    tag = "gacha",
    request_body = SetTargetRequest,
    params(
        ("id" = Uuid, Path, description = "卡池ID"),
        ("X-Player-Id" = i64, Header, description = "玩家ID")
    ),
    responses(
        (status = 200, description = "定轨成功; 更换目标会清零命定值", body = TargetPathResponse),
        (status = 400, description = "目标不是该卡池的UP条目"),
        (status = 404, description = "卡池不存在")
    )
)]
pub async fn set_target(
    service: web::Data<TargetPathService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<SetTargetRequest>,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .set_target(player_id, path.into_inner(), &body.outcome_key)
        .await
    {
        Ok(target) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": target }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/gacha/banners/{id}/target",
    tag = "gacha",
    params(
        ("id" = Uuid, Path, description = "卡池ID"),
        ("X-Player-Id" = i64, Header, description = "玩家ID")
    ),
    responses(
        (status = 200, description = "已取消定轨")
    )
)]
pub async fn clear_target(
    service: web::Data<TargetPathService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.clear_target(player_id, path.into_inner()).await {
        Ok(removed) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "removed": removed }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/gacha/history",
    tag = "gacha",
    params(
        ("X-Player-Id" = i64, Header, description = "玩家ID"),
        ("banner_id" = Option<Uuid>, Query, description = "按卡池过滤"),
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    responses(
        (status = 200, description = "抽取历史 (最新在前)", body = [HistoryEntryResponse])
    )
)]
pub async fn get_history(
    service: web::Data<HistoryService>,
    req: HttpRequest,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list(player_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/gacha/collection",
    tag = "gacha",
    params(
        ("X-Player-Id" = i64, Header, description = "玩家ID")
    ),
    responses(
        (status = 200, description = "图鉴", body = CollectionResponse)
    )
)]
pub async fn get_collection(
    service: web::Data<CollectionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_collection(player_id).await {
        Ok(collection) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": collection })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn gacha_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gacha")
            .route("/banners", web::get().to(list_banners))
            .route("/banners/{id}/pull", web::post().to(pull))
            .route("/banners/{id}/multi-pull", web::post().to(multi_pull))
            .route("/banners/{id}/pity", web::get().to(get_pity))
            .route("/banners/{id}/target", web::get().to(get_target))
            .route("/banners/{id}/target", web::put().to(set_target))
            .route("/banners/{id}/target", web::delete().to(clear_target))
            .route("/history", web::get().to(get_history))
            .route("/collection", web::get().to(get_collection)),
    );
}
