mod auth;
mod content;
mod server;
mod users;

use std::net::SocketAddr;

use inkstone::config::{Auth, Config, Database, Server as ServerConfig};
use inkstone::{DbHandle, Role, Router, api, db, server as http};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const SECRET: &str = "test-secret-that-is-at-least-32b!";

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A running server plus the database behind it.
pub struct App {
    pub server: http::Server,
    pub db: DbHandle,
    _dir: TempDir,
}

impl App {
    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    pub async fn stop(self) {
        self.server.shutdown().await.unwrap();
    }

    /// Send a JSON request, optionally with a bearer token.
    pub async fn call(&self, method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut head = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        if let Some(token) = token {
            head.push_str(&format!("Authorization: Bearer {token}\r\n"));
        }
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        if !body.is_empty() {
            head.push_str("Content-Type: application/json\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
        Reply::parse(&raw_request(self.addr(), head.as_bytes()).await)
    }

    /// Register an account and return `(user id, token)`.
    pub async fn register(&self, name: &str) -> (String, String) {
        let reply = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": format!("{name}@example.com"),
                    "password": "correct-horse",
                })),
            )
            .await;
        assert_eq!(reply.status, 201, "register {name}: {:?}", reply.body);
        (
            reply.body["user"]["id"].as_str().unwrap().to_string(),
            reply.body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn login(&self, name: &str) -> String {
        let reply = self
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({
                    "email": format!("{name}@example.com"),
                    "password": "correct-horse",
                })),
            )
            .await;
        assert_eq!(reply.status, 200, "login {name}: {:?}", reply.body);
        reply.body["token"].as_str().unwrap().to_string()
    }

    /// Register an account with `role` and return `(user id, token)`.
    pub async fn user_with_role(&self, name: &str, role: Role) -> (String, String) {
        let (id, _) = self.register(name).await;
        let conn = db::connection(&self.db).unwrap();
        inkstone::users::set_role(&conn, &id, role).await.unwrap();
        (id, self.login(name).await)
    }
}

/// A parsed HTTP/1.1 response.
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub head: String,
    pub body: Value,
}

impl Reply {
    fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let (head, body) = text.split_once("\r\n\r\n").unwrap_or((&text, ""));
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        Self {
            status,
            head: head.to_string(),
            body: serde_json::from_str(body).unwrap_or(Value::Null),
        }
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

fn test_config(server_cfg: ServerConfig, dir: &TempDir) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..server_cfg
        },
        database: Database {
            url: dir.path().join("inkstone.db").to_string_lossy().into_owned(),
        },
        auth: Auth {
            jwt_secret: SECRET.to_string(),
            token_expiry_days: 1,
        },
        ..Default::default()
    }
}

/// Start the full application with default server settings.
pub async fn start_app() -> App {
    start_app_with(ServerConfig::default(), |_| {}).await
}

/// Start the full application; `extra` may add test-only routes.
pub async fn start_app_with(server_cfg: ServerConfig, extra: impl FnOnce(&mut Router)) -> App {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(server_cfg, &dir);

    let db = db::connect(&config.database.url).await.unwrap();
    db::migrate(&db).await.unwrap();

    let mut router = api::router().unwrap();
    extra(&mut router);

    let server = http::start(config, Some(db.clone()), router.into_handle())
        .await
        .expect("failed to start test server");
    App {
        server,
        db,
        _dir: dir,
    }
}

/// Send a raw HTTP/1.1 request with `Connection: close` and read the full response.
pub async fn raw_request(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream.write_all(payload).await.expect("failed to write");

    let mut buf = Vec::new();
    let _ = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut buf),
    )
    .await;
    buf
}
