/*!
Test Harness pour l'API HospConnect

Facilite l'écriture de tests de bout en bout avec:
- Router complet servi sur 127.0.0.1:0 (port éphémère)
- Store en mémoire pré-rempli avec les données de démo
- Requêtes JSON anonymes ou au nom d'un utilisateur
- Assertions sur des champs imbriqués des réponses
*/

use anyhow::Result;
use hospconnect_kernel::seed::seed_demo_data;
use hospconnect_kernel::session::USER_HEADER;
use hospconnect_kernel::{build_router, AppState, DocumentStore, JsonStore};
use reqwest::Method;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Réponse HTTP décodée : statut + corps JSON (Null si vide ou non JSON)
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn field(&self, path: &str) -> Option<&Value> {
        get_nested_field(&self.body, path)
    }

    /// Assert qu'un champ a une valeur spécifique
    pub fn assert_field_equals(&self, path: &str, expected: &Value) -> Result<()> {
        match self.field(path) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!("Field '{}' mismatch: expected {:?}, got {:?}", path, expected, actual),
            None => anyhow::bail!("Field '{}' not found in response {}", path, self.body),
        }
    }

    /// Champs en erreur d'une réponse 422
    pub fn error_fields(&self) -> Vec<String> {
        self.body["fields"]
            .as_array()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f["field"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Harness de test complet pour l'API
pub struct TestHarness {
    pub addr: SocketAddr,
    pub store: Arc<dyn DocumentStore>,
    client: reqwest::Client,
    server: JoinHandle<()>,
}

impl TestHarness {
    /// Démarre le service sur un store en mémoire avec les données de démo
    pub async fn start() -> Result<Self> {
        let store = JsonStore::in_memory();
        seed_demo_data(&store, OffsetDateTime::now_utc())?;
        Self::with_store(Arc::new(store)).await
    }

    /// Démarre le service sur un store fourni (vide, persistant, ...)
    pub async fn with_store(store: Arc<dyn DocumentStore>) -> Result<Self> {
        env_logger::try_init().ok();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = build_router(AppState::new(store.clone(), false));

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("test server stopped: {e}");
            }
        });
        log::info!("test server listening on {addr}");

        Ok(Self {
            addr,
            store,
            client: reqwest::Client::new(),
            server,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Requête JSON, au nom de `user` si fourni
    pub async fn send(&self, method: Method, path: &str, user: Option<&str>, body: Option<&Value>) -> Result<ApiResponse> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(uid) = user {
            req = req.header(USER_HEADER, uid);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok(ApiResponse { status, body })
    }

    pub async fn get(&self, path: &str, user: Option<&str>) -> Result<ApiResponse> {
        self.send(Method::GET, path, user, None).await
    }

    pub async fn post(&self, path: &str, user: Option<&str>, body: &Value) -> Result<ApiResponse> {
        self.send(Method::POST, path, user, Some(body)).await
    }

    pub async fn put(&self, path: &str, user: Option<&str>, body: &Value) -> Result<ApiResponse> {
        self.send(Method::PUT, path, user, Some(body)).await
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn get_nested_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        current = match current {
            Value::Object(obj) => obj.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
