//! 请求头解析
//!
//! 玩家身份由上游网关写入 `X-Player-Id`; 抽卡请求必须携带 `Idempotency-Key`。

use crate::error::{AppError, AppResult};
use actix_web::HttpRequest;

pub const PLAYER_ID_HEADER: &str = "X-Player-Id";
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const API_KEY_HEADER: &str = "X-Api-Key";

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn player_id_from_request(req: &HttpRequest) -> AppResult<i64> {
    let raw = header_str(req, PLAYER_ID_HEADER)
        .ok_or_else(|| AppError::ValidationError(format!("Missing {PLAYER_ID_HEADER} header")))?;
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::ValidationError(format!(
            "Invalid {PLAYER_ID_HEADER} header: {raw}"
        ))),
    }
}

pub fn idempotency_key_from_request(req: &HttpRequest) -> AppResult<String> {
    header_str(req, IDEMPOTENCY_KEY_HEADER)
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::ValidationError(format!("Missing {IDEMPOTENCY_KEY_HEADER} header"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_player_id_header() {
        let req = TestRequest::default()
            .insert_header((PLAYER_ID_HEADER, "42"))
            .to_http_request();
        assert_eq!(player_id_from_request(&req).unwrap(), 42);

        let req = TestRequest::default()
            .insert_header((PLAYER_ID_HEADER, "abc"))
            .to_http_request();
        assert!(player_id_from_request(&req).is_err());

        let req = TestRequest::default()
            .insert_header((PLAYER_ID_HEADER, "-1"))
            .to_http_request();
        assert!(player_id_from_request(&req).is_err());

        let req = TestRequest::default().to_http_request();
        assert!(player_id_from_request(&req).is_err());
    }

    #[test]
    fn test_idempotency_key_header() {
        let req = TestRequest::default()
            .insert_header((IDEMPOTENCY_KEY_HEADER, " pull-001 "))
            .to_http_request();
        assert_eq!(idempotency_key_from_request(&req).unwrap(), "pull-001");

        let req = TestRequest::default()
            .insert_header((IDEMPOTENCY_KEY_HEADER, "  "))
            .to_http_request();
        assert!(idempotency_key_from_request(&req).is_err());
    }
}
