#![allow(dead_code)]

use std::net::SocketAddr;

use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, SiteConfig,
};
use server::state::AppState;
use server::utils::jwt;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const PAGES: &str = "/api/v1/pages";
    pub const PAGE_HEADERS: &str = "/api/v1/page-headers";
    pub const BLOCK_PREVIEW: &str = "/api/v1/blocks/preview";

    pub fn page(id: i32) -> String {
        format!("/api/v1/pages/{id}")
    }

    pub fn page_by_slug(slug: &str) -> String {
        format!("/api/v1/pages/by-slug/{slug}")
    }

    pub fn page_blocks(id: i32) -> String {
        format!("/api/v1/pages/{id}/blocks")
    }

    pub fn container(id: i32, block_id: i32) -> String {
        format!("/api/v1/pages/{id}/blocks/{block_id}/container")
    }

    pub fn page_header(page: &str) -> String {
        format!("/api/v1/page-headers/{page}")
    }

    pub fn rendered(slug: &str) -> String {
        format!("/p/{slug}")
    }
}

/// A running test server backed by its own SQLite file.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("pagesmith.db").display()
        );

        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");
        server::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
                token_ttl_days: 1,
            },
            site: SiteConfig {
                name: "Test Site".to_string(),
                description: Some("Site default description".to_string()),
            },
        };

        let app = server::build_router(AppState::new(db.clone(), app_config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Token carrying exactly `permissions`.
    pub fn token(&self, permissions: &[&str]) -> String {
        let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
        jwt::sign("editor", &permissions, JWT_SECRET, 1).expect("Failed to sign token")
    }

    /// Token carrying every permission.
    pub fn admin_token(&self) -> String {
        self.token(jwt::ALL_PERMISSIONS)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Create a page via the API and return its `id`.
    pub async fn create_page(&self, token: &str, slug: &str, published: bool) -> i32 {
        let res = self
            .post_with_token(
                routes::PAGES,
                &serde_json::json!({
                    "slug": slug,
                    "title": format!("Page {slug}"),
                    "published": published,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_page failed: {}", res.text);
        res.id()
    }

    /// Replace a page's blocks via the API and return the stored blocks.
    pub async fn replace_blocks(&self, token: &str, page_id: i32, blocks: Value) -> Vec<Value> {
        let res = self
            .put_with_token(
                &routes::page_blocks(page_id),
                &serde_json::json!({ "blocks": blocks }),
                token,
            )
            .await;
        assert_eq!(res.status, 200, "replace_blocks failed: {}", res.text);
        res.body.as_array().cloned().unwrap_or_default()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
