mod common;

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{expect_status, spawn_server, token_of, JWT_SECRET, PASSWORD};
use garage_api::auth::{issue_token, Claims, Role};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = spawn_server().await?;
    let res = server.client.get(format!("{}/health", server.base_url)).send().await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_login_and_me() -> Result<()> {
    let server = spawn_server().await?;
    let (token, id) = server.register_client("Ines").await?;

    let res = server.get("/auth/me", &token).await?;
    let body = expect_status(res, StatusCode::OK).await?;
    assert_eq!(body["data"]["id"], json!(id));
    assert_eq!(body["data"]["role"], "client");
    assert!(body["data"].get("password_hash").is_none());

    let email = body["data"]["email"].as_str().unwrap_or_default().to_string();
    let again = server.login(&email.to_uppercase(), PASSWORD).await?;
    assert!(!again.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let server = spawn_server().await?;
    let body = json!({
        "email": "twice@garage.test",
        "password": PASSWORD,
        "first_name": "Twice",
        "last_name": "Tester"
    });

    let first = server.client.post(server.url("/auth/register")).json(&body).send().await?;
    expect_status(first, StatusCode::CREATED).await?;
    let second = server.client.post(server.url("/auth/register")).json(&body).send().await?;
    let err = expect_status(second, StatusCode::CONFLICT).await?;
    assert_eq!(err["error"], true);
    assert_eq!(err["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn registration_input_is_validated() -> Result<()> {
    let server = spawn_server().await?;
    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "email": "nope", "password": "short", "first_name": "A", "last_name": "B" }))
        .send()
        .await?;
    let body = expect_status(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("email").is_some());
    assert!(body["field_errors"].get("password").is_some());
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let server = spawn_server().await?;
    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": "not-the-password" }))
        .send()
        .await?;
    let body = expect_status(res, StatusCode::UNAUTHORIZED).await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn missing_or_garbage_token_is_unauthorized() -> Result<()> {
    let server = spawn_server().await?;

    let res = server.client.get(server.url("/cars")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.get("/cars", "not.a.jwt").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn other_algorithms_are_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    let me = expect_status(server.get("/auth/me", &admin).await?, StatusCode::OK).await?;
    let admin_id = Uuid::parse_str(me["data"]["id"].as_str().unwrap_or_default())?;

    let claims = Claims::new(admin_id, common::ADMIN_EMAIL, Role::Admin, 1)?;
    let hs512 = encode(
        &Header::new(jsonwebtoken::Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )?;
    assert_eq!(server.get("/auth/me", &hs512).await?.status(), StatusCode::UNAUTHORIZED);

    // Same claims with the accepted algorithm go through
    let hs256 = issue_token(&claims, JWT_SECRET)?;
    assert_eq!(server.get("/auth/me", &hs256).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let server = spawn_server().await?;
    let (_, id) = server.register_client("Old").await?;

    let mut claims = Claims::new(id, "old@garage.test", Role::Client, 1)?;
    claims.exp = Utc::now().timestamp() - 60;
    let token = issue_token(&claims, JWT_SECRET)?;

    let res = server.get("/auth/me", &token).await?;
    let body = expect_status(res, StatusCode::UNAUTHORIZED).await?;
    assert_eq!(body["message"], "Invalid or expired token");
    Ok(())
}

#[tokio::test]
async fn refresh_issues_a_working_token() -> Result<()> {
    let server = spawn_server().await?;
    let (token, id) = server.register_client("Fresh").await?;

    let res = server.post("/auth/refresh", &token, json!({})).await?;
    let body = expect_status(res, StatusCode::OK).await?;
    let refreshed = token_of(&body)?;

    let me = expect_status(server.get("/auth/me", &refreshed).await?, StatusCode::OK).await?;
    assert_eq!(me["data"]["id"], json!(id));
    Ok(())
}

#[tokio::test]
async fn deleted_account_loses_access() -> Result<()> {
    let server = spawn_server().await?;
    let admin = server.admin_token().await?;
    let (token, id) = server.register_client("Gone").await?;

    let res = server.delete(&format!("/users/{}", id), &admin).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert_eq!(server.get("/auth/me", &token).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
