use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use gacha_engine::{
    config::Config,
    database::{create_pool, run_migrations},
    gacha::OsRandomSource,
    handlers,
    middlewares::{ApiKeyMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移 (含初始图鉴数据)
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建服务
    let player_service = PlayerService::new(pool.clone());
    let banner_service = BannerService::new(pool.clone(), config.gacha.clone());
    let pity_service = PityService::new(pool.clone(), config.gacha.clone());
    let target_path_service = TargetPathService::new(pool.clone(), config.gacha.clone());
    let collection_service = CollectionService::new(pool.clone());
    let delivery_service = DeliveryService::new(pool.clone());
    let stardust_service = StardustService::new(pool.clone(), config.stardust.clone());
    let idempotency_service = IdempotencyService::new(pool.clone(), config.idempotency.clone());
    let history_service = HistoryService::new(pool.clone());

    banner_service
        .ensure_standard_banner()
        .await
        .expect("Failed to ensure the standard banner");

    let pull_service = PullService::new(
        pool.clone(),
        config.gacha.clone(),
        banner_service.clone(),
        pity_service.clone(),
        stardust_service.clone(),
        idempotency_service.clone(),
        Arc::new(OsRandomSource),
    );

    // 启动后台任务
    tasks::spawn_all(
        banner_service.clone(),
        idempotency_service.clone(),
        &config.tasks,
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let security = config.security.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(ApiKeyMiddleware::new(&security))
            .app_data(web::Data::new(player_service.clone()))
            .app_data(web::Data::new(banner_service.clone()))
            .app_data(web::Data::new(target_path_service.clone()))
            .app_data(web::Data::new(collection_service.clone()))
            .app_data(web::Data::new(delivery_service.clone()))
            .app_data(web::Data::new(stardust_service.clone()))
            .app_data(web::Data::new(history_service.clone()))
            .app_data(web::Data::new(pull_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::gacha_config)
                    .configure(handlers::stardust_config)
                    .configure(handlers::delivery_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
