//! Tool-name dispatch.
//!
//! Maps a request envelope to a tool implementation, deserializing the
//! argument map into the tool's typed struct on the way in. Argument
//! problems and unknown tool names come back through the failure half
//! of the envelope; they never become transport errors.

use serde::de::DeserializeOwned;
use serde_json::Value;

use hoodscope_tools_models::{McpRequest, McpResponse};

use crate::context::ToolContext;
use crate::{ToolError, tools};

/// Executes a request and wraps the outcome in a response envelope.
pub async fn execute(ctx: &ToolContext, request: McpRequest) -> McpResponse {
    log::debug!("Dispatching tool {:?}", request.tool);
    match run(ctx, request).await {
        Ok(data) => McpResponse::success(data),
        Err(e) => McpResponse::failure(e.to_string()),
    }
}

async fn run(ctx: &ToolContext, request: McpRequest) -> Result<Value, ToolError> {
    match request.tool.as_str() {
        "crime_summary" => payload(&tools::crime_summary(ctx, parse(request.args)?).await?),
        "commute_proxy" => payload(&tools::commute_proxy(ctx, parse(request.args)?)?),
        "nearby_pois" => payload(&tools::nearby_pois(ctx, parse(request.args)?).await?),
        "rent_grid" => payload(&tools::rent_grid(ctx, parse(request.args)?)?),
        "crime_grid" => payload(&tools::crime_grid(ctx, parse(request.args)?)?),
        "rent_points" => payload(&tools::rent_points(ctx, parse(request.args)?)?),
        _ => Err(ToolError::UnknownTool),
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidArgs(format!("invalid arguments: {e}")))
}

fn payload<T: serde::Serialize>(data: &T) -> Result<Value, ToolError> {
    serde_json::to_value(data).map_err(|e| ToolError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    use crate::config::AppConfig;

    fn bare_context(name: &str) -> ToolContext {
        let dir = std::env::temp_dir().join(format!(
            "hoodscope_dispatch_{name}_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();

        let mut rent = std::fs::File::create(dir.join("listings.csv")).unwrap();
        writeln!(rent, "Bedroom,Bathroom,Den,Address,Lat,Long,Price,Synthetic").unwrap();
        writeln!(rent, "1,1,0,a,43.6510,-79.3810,\"$1,800.00\",True").unwrap();

        let config = AppConfig {
            data_dir: dir.clone(),
            rent_data_dir: dir,
            crime_api_url: "http://127.0.0.1:1/".to_string(),
            overpass_url: "http://127.0.0.1:1/".to_string(),
            http_timeout_secs: 2,
            ..AppConfig::default()
        };
        ToolContext::new(config).unwrap()
    }

    #[tokio::test]
    async fn unknown_tool_fails_in_envelope() {
        let ctx = bare_context("unknown");
        let response = execute(
            &ctx,
            McpRequest {
                tool: "foo".to_string(),
                args: serde_json::json!({}),
            },
        )
        .await;

        assert!(!response.ok);
        assert_eq!(response.error.as_deref(), Some("Unknown tool"));
        assert!(response.data.is_none());
    }

    #[tokio::test]
    async fn missing_argument_is_reported_by_name() {
        let ctx = bare_context("bad_args");
        let response = execute(
            &ctx,
            McpRequest {
                tool: "crime_summary".to_string(),
                args: serde_json::json!({"lat": 43.65, "lon": -79.38, "radius_m": 1000.0}),
            },
        )
        .await;

        assert!(!response.ok);
        let error = response.error.unwrap();
        assert!(error.contains("window_days"), "unexpected error: {error}");
    }

    #[tokio::test]
    async fn rent_points_round_trips_through_the_envelope() {
        let ctx = bare_context("rent_points");
        let response = execute(
            &ctx,
            McpRequest {
                tool: "rent_points".to_string(),
                args: serde_json::json!({}),
            },
        )
        .await;

        assert!(response.ok, "error: {:?}", response.error);
        let data = response.data.unwrap();
        assert_eq!(data["type"], "FeatureCollection");
        assert_eq!(data["source"], "rent-prices (sample)");
        assert_eq!(data["features"].as_array().unwrap().len(), 1);
    }
}
