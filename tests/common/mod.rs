#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use uuid::Uuid;

use garage_api::config::AppConfig;
use garage_api::server;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@garage.test";
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const PASSWORD: &str = "password123";

/// One server per test, on the memory backend, so tests never share data.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn test_config(port: u16) -> AppConfig {
    let port = port.to_string();
    AppConfig::from_lookup(move |key| {
        let value = match key {
            "SERVER_PORT" => port.as_str(),
            "STORE_BACKEND" => "memory",
            "JWT_SECRET" => JWT_SECRET,
            "ADMIN_EMAIL" => ADMIN_EMAIL,
            "ADMIN_PASSWORD" => ADMIN_PASSWORD,
            "CACHE_ENABLED" => "true",
            // Cheap hashing keeps the suite fast
            "PASSWORD_MEMORY_KIB" => "1024",
            "PASSWORD_ITERATIONS" => "1",
            _ => return None,
        };
        Some(value.to_string())
    })
}

pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let state = server::build_state(Arc::new(test_config(port))).await?;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, server::app(state)).await {
            eprintln!("test server stopped: {e}");
        }
    });

    let server = TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?,
        handle,
    };
    Ok(server)
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<Response> {
        Ok(self.client.post(self.url(path)).bearer_auth(token).json(&body).send().await?)
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<Response> {
        Ok(self.client.put(self.url(path)).bearer_auth(token).json(&body).send().await?)
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = expect_status(res, StatusCode::OK).await?;
        token_of(&body)
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Registers a client account, returning its token and id.
    pub async fn register_client(&self, name: &str) -> Result<(String, Uuid)> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "email": unique_email(name),
                "password": PASSWORD,
                "first_name": name,
                "last_name": "Tester"
            }))
            .send()
            .await?;
        let body = expect_status(res, StatusCode::CREATED).await?;
        Ok((token_of(&body)?, id_of(&body["data"]["user"])?))
    }

    /// Creates a staff account through the admin and logs in as it.
    pub async fn staff_token(&self, admin: &str, role: &str) -> Result<(String, Uuid)> {
        let email = unique_email(role);
        let res = self
            .post(
                "/users",
                admin,
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "first_name": "Staff",
                    "last_name": role,
                    "role": role
                }),
            )
            .await?;
        let body = expect_status(res, StatusCode::CREATED).await?;
        let id = id_of(&body["data"])?;
        Ok((self.login(&email, PASSWORD).await?, id))
    }

    /// Creates a car for `owner` as the admin and returns its id.
    pub async fn create_car(&self, admin: &str, owner: Uuid, plate: &str) -> Result<Uuid> {
        let res = self.post("/cars", admin, car_body(plate, Some(owner))).await?;
        let body = expect_status(res, StatusCode::CREATED).await?;
        id_of(&body["data"])
    }
}

pub fn car_body(plate: &str, owner: Option<Uuid>) -> Value {
    let mut body = json!({
        "make": "Toyota",
        "model": "Corolla",
        "year": 2018,
        "license_plate": plate,
        "color": "Blue",
        "mileage": 42000
    });
    if let Some(owner) = owner {
        body["owner_id"] = json!(owner);
    }
    body
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@garage.test", prefix.to_lowercase(), Uuid::new_v4().simple())
}

pub fn unique_plate() -> String {
    format!("PL-{}", &Uuid::new_v4().simple().to_string()[..8])
}

pub async fn expect_status(res: Response, expected: StatusCode) -> Result<Value> {
    let status = res.status();
    let body = res.json::<Value>().await.unwrap_or(Value::Null);
    anyhow::ensure!(status == expected, "expected {}, got {}: {}", expected, status, body);
    Ok(body)
}

pub fn token_of(body: &Value) -> Result<String> {
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("response carries no token")
}

pub fn id_of(record: &Value) -> Result<Uuid> {
    let id = record["id"].as_str().context("record carries no id")?;
    Ok(Uuid::parse_str(id)?)
}
