mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let (router, echo) = common::setup().await?;

    let res = common::send(&router, common::get("/health").body(Body::empty())?).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["config_version"], 1);
    assert!(res.body["loaded_at"].is_string());

    // Served locally
    assert_eq!(echo.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn root_describes_gateway() -> Result<()> {
    let (router, echo) = common::setup().await?;

    let res = common::send(&router, common::get("/").body(Body::empty())?).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Exam Gateway");
    assert_eq!(res.body["routes"], 4);
    assert_eq!(res.body["pipeline"], serde_json::json!(["language", "routing", "auth"]));
    assert_eq!(echo.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn local_endpoints_ignore_language_header() -> Result<()> {
    let (router, _echo) = common::setup().await?;

    let request = common::get("/health").header("x-language", "xx").body(Body::empty())?;
    let res = common::send(&router, request).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn other_methods_on_local_paths_get_the_error_envelope() -> Result<()> {
    let (router, echo) = common::setup().await?;

    for uri in ["/", "/health"] {
        let request = axum::http::Request::builder().method("POST").uri(uri).body(Body::empty())?;
        let res = common::send(&router, request).await?;

        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(res.body["error"], "NO_ROUTE_FOUND");
        assert!(res.header("x-request-id").is_some());
    }

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/health")
        .header("x-language", "xx")
        .body(Body::empty())?;
    let res = common::send(&router, request).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "INVALID_LANGUAGE");

    assert_eq!(echo.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn health_reports_installed_snapshot_version() -> Result<()> {
    let echo = common::EchoUpstream::spawn().await?;
    let yaml = common::gateway_yaml(&echo.base_url(), &echo.base_url());
    let (router, store) = common::gateway(&yaml, 5)?;

    let file = exam_gateway::config::GatewayFile::from_yaml(&yaml)?;
    let security = common::app_config(5).security;
    store.install(exam_gateway::config::ConfigSnapshot::build(&file, &security, |_| None, 7)?);

    let res = common::send(&router, common::get("/health").body(Body::empty())?).await?;
    assert_eq!(res.body["config_version"], 7);
    Ok(())
}
