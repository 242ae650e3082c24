//! HTTP handler functions for the tool server.

use actix_web::{HttpResponse, web};
use hoodscope_tools::context::ToolContext;
use hoodscope_tools::dispatch;
use hoodscope_tools_models::{HealthResponse, McpRequest, McpResponse};

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        time: chrono::Utc::now().to_rfc3339(),
    })
}

/// `POST /mcp`
///
/// Always answers HTTP 200; a body that is not a valid request envelope
/// comes back as a failure envelope rather than a transport error.
pub async fn mcp(ctx: web::Data<ToolContext>, body: web::Json<serde_json::Value>) -> HttpResponse {
    let request: McpRequest = match serde_json::from_value(body.into_inner()) {
        Ok(request) => request,
        Err(e) => {
            return HttpResponse::Ok().json(McpResponse::failure(format!("invalid request: {e}")));
        }
    };

    HttpResponse::Ok().json(dispatch::execute(ctx.get_ref(), request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use hoodscope_tools::config::AppConfig;

    fn test_state() -> web::Data<ToolContext> {
        let dir = std::env::temp_dir().join(format!("hoodscope_server_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config = AppConfig {
            data_dir: dir.clone(),
            rent_data_dir: dir,
            crime_api_url: "http://127.0.0.1:1/".to_string(),
            overpass_url: "http://127.0.0.1:1/".to_string(),
            http_timeout_secs: 2,
            ..AppConfig::default()
        };
        web::Data::new(ToolContext::new(config).unwrap())
    }

    #[actix_web::test]
    async fn health_reports_ok_with_time() {
        let app = test::init_service(
            App::new().route("/health", web::get().to(health)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);
        assert!(body["time"].as_str().unwrap().contains('T'));
    }

    #[actix_web::test]
    async fn unknown_tool_still_answers_http_200() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .route("/mcp", web::post().to(mcp)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_json(serde_json::json!({"tool": "foo", "args": {}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Unknown tool");
    }

    #[actix_web::test]
    async fn envelope_without_tool_name_fails_in_envelope() {
        let app = test::init_service(
            App::new()
                .app_data(test_state())
                .route("/mcp", web::post().to(mcp)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_json(serde_json::json!({"args": {}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("tool"));
    }
}
