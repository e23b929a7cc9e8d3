use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use reqwest::Client;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;

use server::config::{AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig};
use server::state::AppState;

pub mod routes {
    pub const PHOTOS: &str = "/api/v1/photos";
    pub const UPLOADS: &str = "/api/v1/uploads";

    pub fn photo(id: &str) -> String {
        format!("/api/v1/photos/{id}")
    }

    pub fn photo_like(id: &str) -> String {
        format!("/api/v1/photos/{id}/like")
    }

    pub fn upload(storage_id: &str) -> String {
        format!("/api/v1/uploads/{storage_id}")
    }

    pub fn user_profile(user_id: &str) -> String {
        format!("/api/v1/users/{user_id}")
    }

    pub fn user_photos(user_id: &str) -> String {
        format!("/api/v1/users/{user_id}/photos")
    }

    pub fn feed(page_size: u64, cursor: Option<&str>) -> String {
        match cursor {
            Some(c) => format!("/api/v1/photos?page_size={page_size}&cursor={c}"),
            None => format!("/api/v1/photos?page_size={page_size}"),
        }
    }
}

/// A running test server over a throwaway SQLite database and a tempdir
/// blob store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    _dir: tempfile::TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let db_path = dir.path().join("test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let mut opts = ConnectOptions::new(&db_url);
        // A single connection serializes writers; SQLite has no row locks.
        opts.max_connections(1).min_connections(1);
        let db = Database::connect(opts)
            .await
            .expect("Failed to connect to test database");
        server::database::sync_schema(&db)
            .await
            .expect("Failed to sync schema");
        server::database::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let blob_store = FilesystemBlobStore::new(dir.path().join("blobs"), 1024 * 1024)
            .await
            .expect("Failed to create blob store");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
                public_url: format!("http://{addr}"),
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            storage: StorageConfig {
                blob_dir: dir.path().join("blobs"),
                max_blob_size: 1024 * 1024,
            },
        };

        let state = AppState {
            db: db.clone(),
            blob_store: Arc::new(blob_store),
            config: app_config,
        };
        let app = server::build_router(state);

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

    pub async fn post_as(&self, path: &str, body: &Value, user_id: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("X-User-Id", user_id)
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_anon(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_anon_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_bytes(&self, path: &str) -> (u16, Vec<u8>) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        let status = res.status().as_u16();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, bytes)
    }

    pub async fn put_as(&self, path: &str, body: &Value, user_id: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("X-User-Id", user_id)
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn put_bytes(&self, path: &str, bytes: Vec<u8>) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .body(bytes)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_as(&self, path: &str, user_id: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("X-User-Id", user_id)
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Mint an upload target and PUT some bytes to it, returning the
    /// storage_id.
    pub async fn upload_blob(&self, bytes: Vec<u8>) -> String {
        let target = self.post_anon(routes::UPLOADS).await;
        assert_eq!(target.status, 201, "Minting target failed: {}", target.text);
        let storage_id = target.body["storage_id"].as_str().unwrap().to_string();

        let put = self.put_bytes(&routes::upload(&storage_id), bytes).await;
        assert_eq!(put.status, 201, "Blob upload failed: {}", put.text);

        storage_id
    }

    /// Full upload-then-create flow. Returns the new photo's id.
    pub async fn create_photo(&self, user_id: &str, username: &str) -> String {
        let storage_id = self.upload_blob(b"image bytes".to_vec()).await;
        let body = serde_json::json!({
            "image_url": format!("http://{}{}", self.addr, routes::upload(&storage_id)),
            "storage_id": storage_id,
            "username": username,
        });

        let res = self.post_as(routes::PHOTOS, &body, user_id).await;
        assert_eq!(res.status, 201, "Photo creation failed: {}", res.text);
        res.body["id"].as_str().unwrap().to_string()
    }
}
