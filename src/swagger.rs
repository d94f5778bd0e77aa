use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    BannerKind, DeliveryStatus, FeaturedGuarantee, OutcomeKind, RewardKind, RewardSource,
    StardustTransactionType, Tier,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Api-Key"))),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::gacha::list_banners,
        handlers::gacha::pull,
        handlers::gacha::multi_pull,
        handlers::gacha::get_pity,
        handlers::gacha::get_target,
        handlers::gacha::set_target,
        handlers::gacha::clear_target,
        handlers::gacha::get_history,
        handlers::gacha::get_collection,
        handlers::stardust::get_account,
        handlers::stardust::get_transactions,
        handlers::stardust::get_shop,
        handlers::stardust::redeem,
        handlers::delivery::list_pending,
        handlers::delivery::claim,
        handlers::delivery::start,
        handlers::delivery::confirm,
        handlers::admin::create_banner,
        handlers::admin::update_banner,
        handlers::admin::deactivate_banner,
        handlers::admin::grant_currency,
        handlers::admin::cleanup_pending,
        handlers::admin::reset_history,
    ),
    components(
        schemas(
            BannerKind,
            Tier,
            OutcomeKind,
            FeaturedGuarantee,
            RewardKind,
            RewardSource,
            DeliveryStatus,
            StardustTransactionType,
            FeaturedEntry,
            BannerResponse,
            CreateBannerRequest,
            UpdateBannerRequest,
            PullKind,
            PulledOutcome,
            PityState,
            LedgerDelta,
            PullResponse,
            HistoryQuery,
            HistoryEntryResponse,
            HistoryResetResponse,
            PityStatusResponse,
            SetTargetRequest,
            TargetPathResponse,
            CollectionEntryResponse,
            CollectionResponse,
            StardustAccountResponse,
            StardustTransactionResponse,
            StardustTransactionQuery,
            ShopItem,
            RedeemRequest,
            RedeemResponse,
            PendingRewardResponse,
            ConfirmDeliveryRequest,
            CleanupPendingRequest,
            CleanupPendingResponse,
            GrantCurrencyRequest,
            PlayerResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "gacha", description = "Banners, pulls, pity and target path API"),
        (name = "stardust", description = "Stardust ledger and shop API"),
        (name = "delivery", description = "Pending reward delivery API (agent)"),
        (name = "admin", description = "Banner and player administration API"),
    ),
    info(
        title = "Gacha Engine API",
        version = "1.0.0",
        description = "Gacha Engine REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
