use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        // 玩家与幂等请求头由前端透传
        .allow_any_header()
        .max_age(3600)
}
