mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};

fn exam_get(uri: &str) -> Result<Request<Body>> {
    Ok(common::get(uri)
        .header("authorization", common::EXAM_SECRET)
        .body(Body::empty())?)
}

#[tokio::test]
async fn unknown_path_is_not_found() -> Result<()> {
    let (router, echo) = common::setup().await?;

    let res = common::send(&router, exam_get("/api/unknown-path")?).await?;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "route not found");
    assert_eq!(echo.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn method_not_allowed_by_rule_is_not_found() -> Result<()> {
    let (router, _echo) = common::setup().await?;

    let request = Request::builder()
        .method("POST")
        .uri("/api/reports/weekly")
        .header("authorization", common::bearer(&common::user_token(3, "Instructor", 600)))
        .body(Body::empty())?;
    let res = common::send(&router, request).await?;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "NO_ROUTE_FOUND");
    Ok(())
}

#[tokio::test]
async fn dot_dot_segments_are_never_routed() -> Result<()> {
    let (router, echo) = common::setup().await?;

    for uri in ["/api/auth/../exams/5", "/api/auth/%2e%2e/admin/users"] {
        let res = common::send(&router, exam_get(uri)?).await?;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", uri);
    }
    assert_eq!(echo.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn encoded_separators_cannot_escape_a_public_route() -> Result<()> {
    let echo = common::EchoUpstream::spawn().await?;
    let yaml = format!(
        r#"
services:
  admin: {{ base_url: "{base}", secret: "{secret}" }}
routes:
  - {{ path: "/api/admin/auth/*", service: admin, requires_auth: false }}
  - {{ path: "/api/admin/*", service: admin }}
"#,
        base = echo.base_url(),
        secret = common::ADMIN_SECRET
    );
    let (router, _store) = common::gateway(&yaml, 5)?;

    for uri in [
        "/api/admin/auth/..%2Fusers",
        "/api/admin/auth/%2e%2e%2fusers",
        "/api/admin/auth/..%5Cusers",
    ] {
        let res = common::send(&router, common::get(uri).body(Body::empty())?).await?;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(res.body["error"], "NO_ROUTE_FOUND");
    }
    assert_eq!(echo.hits(), 0);

    let res = common::send(&router, common::get("/api/admin/auth/login").body(Body::empty())?).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(echo.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn path_is_normalised_before_matching_and_forwarding() -> Result<()> {
    let (router, _echo) = common::setup().await?;

    let res = common::send(&router, exam_get("/api//exams/./5/")?).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["path"], "/api/exams/5");
    Ok(())
}

#[tokio::test]
async fn literal_segments_match_case_insensitively() -> Result<()> {
    let (router, _echo) = common::setup().await?;

    let res = common::send(&router, exam_get("/API/Exams/5")?).await?;

    assert_eq!(res.status, StatusCode::OK);
    // Forwarded as sent, only normalised
    assert_eq!(res.body["path"], "/API/Exams/5");
    Ok(())
}

#[tokio::test]
async fn query_string_is_forwarded_verbatim() -> Result<()> {
    let (router, _echo) = common::setup().await?;

    let res = common::send(&router, exam_get("/api/exams/5?expand=questions&lang=hi%2Den")?).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["query"], "expand=questions&lang=hi%2Den");
    Ok(())
}

#[tokio::test]
async fn upstream_base_path_is_prefixed() -> Result<()> {
    let (router, _echo) = common::setup().await?;

    let request = common::get("/api/admin/users")
        .header("authorization", common::ADMIN_SECRET)
        .body(Body::empty())?;
    let res = common::send(&router, request).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["path"], "/admin-svc/api/admin/users");
    Ok(())
}

#[tokio::test]
async fn longest_literal_prefix_wins() -> Result<()> {
    let echo = common::EchoUpstream::spawn().await?;
    let yaml = format!(
        r#"
services:
  auth: {{ base_url: "{base}/auth-svc" }}
  admin: {{ base_url: "{base}/admin-svc", secret: "{secret}" }}
routes:
  - {{ path: "/api/admin/*", service: admin }}
  - {{ path: "/api/admin/auth/*", service: auth, requires_auth: false }}
"#,
        base = echo.base_url(),
        secret = common::ADMIN_SECRET
    );
    let (router, _store) = common::gateway(&yaml, 5)?;

    let res = common::send(&router, common::get("/api/admin/auth/login").body(Body::empty())?).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["path"], "/auth-svc/api/admin/auth/login");

    let res = common::send(&router, common::get("/api/admin/users").body(Body::empty())?).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}
