use crate::models::*;
use crate::services::StardustService;
use crate::utils::player_id_from_request;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/stardust",
    tag = "stardust",
    params(
        ("X-Player-Id" = i64, Header, description = "玩家ID")
    ),
    responses(
        (status = 200, description = "星尘账户", body = StardustAccountResponse)
    )
)]
pub async fn get_account(
    service: web::Data<StardustService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_account(player_id).await {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": account }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stardust/transactions",
    tag = "stardust",
    params(
        ("X-Player-Id" = i64, Header, description = "玩家ID"),
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    responses(
        (status = 200, description = "星尘流水 (最新在前)", body = [StardustTransactionResponse])
    )
)]
pub async fn get_transactions(
    service: web::Data<StardustService>,
    req: HttpRequest,
    query: web::Query<StardustTransactionQuery>,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.list_transactions(player_id, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stardust/shop",
    tag = "stardust",
    responses(
        (status = 200, description = "星尘商店", body = [ShopItem])
    )
)]
pub async fn get_shop(service: web::Data<StardustService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": service.shop() })))
}

#[utoipa::path(
    post,
    path = "/stardust/redeem",
    tag = "stardust",
    request_body = RedeemRequest,
    params(
        ("X-Player-Id" = i64, Header, description = "玩家ID")
    ),
    responses(
        (status = 200, description = "兑换成功, 奖励进入待发放队列", body = RedeemResponse),
        (status = 404, description = "商品不存在"),
        (status = 409, description = "星尘不足或已达限购")
    )
)]
pub async fn redeem(
    service: web::Data<StardustService>,
    req: HttpRequest,
    body: web::Json<RedeemRequest>,
) -> Result<HttpResponse> {
    let player_id = match player_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match service.redeem(player_id, &body.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn stardust_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stardust")
            .route("", web::get().to(get_account))
            .route("/transactions", web::get().to(get_transactions))
            .route("/shop", web::get().to(get_shop))
            .route("/redeem", web::post().to(redeem)),
    );
}
