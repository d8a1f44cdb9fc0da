//! HTTP API tests against a live server on an ephemeral port.

mod common;

use std::fs;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{json, Value};
use tempfile::TempDir;

use jjba_wiki::ingest::{migrate, ErrorPolicy, JobOptions, MigrateTarget};
use jjba_wiki::models::{ArcDoc, BattleDoc, CharacterDoc, CharacterUpdate, GroupDoc, NationalityGroup};
use jjba_wiki::server::router;
use jjba_wiki::store::{Collection, DocumentId, DocumentStore, InMemoryStore, StoredCharacter};

struct TestServer {
    base: String,
    _static_dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn spawn(store: Arc<dyn DocumentStore>) -> TestServer {
    let static_dir = TempDir::new().unwrap();
    fs::write(static_dir.path().join("index.html"), "<h1>JJBA Wiki</h1>").unwrap();

    let app = router(store, static_dir.path());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        _static_dir: static_dir,
    }
}

async fn seeded_server() -> TestServer {
    let store = InMemoryStore::new();
    let options = JobOptions {
        concurrency: 4,
        policy: ErrorPolicy::Abort,
        dry_run: false,
    };
    migrate(&common::fixture(), &store, MigrateTarget::All, &options)
        .await
        .unwrap();
    spawn(Arc::new(store)).await
}

async fn get_json(server: &TestServer, path: &str) -> (u16, Value) {
    let resp = reqwest::get(server.url(path)).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_stands_sorted_and_tagged() {
    let server = seeded_server().await;
    let (status, body) = get_json(&server, "/api/stands").await;
    assert_eq!(status, 200);

    let stands = body.as_array().unwrap();
    let names: Vec<&str> = stands.iter().map(|s| s["nome"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Silver Chariot", "Star Platinum", "The World"]);
    assert_eq!(stands[1]["personagem_nome"], "Jotaro Kujo");
    assert!(stands[1]["stats"].is_object());
}

#[tokio::test]
async fn test_character_names_ascending() {
    let server = seeded_server().await;
    let (status, body) = get_json(&server, "/api/personagens").await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!([
            { "nome": "DIO" },
            { "nome": "Jean Pierre Polnareff" },
            { "nome": "Joseph Joestar" },
            { "nome": "Jotaro Kujo" }
        ])
    );
}

#[tokio::test]
async fn test_character_detail_wraps_stand() {
    let server = seeded_server().await;

    let (status, jotaro) = get_json(&server, "/api/personagem/Jotaro Kujo").await;
    assert_eq!(status, 200);
    assert_eq!(jotaro["nome"], "Jotaro Kujo");
    assert_eq!(jotaro["stands"].as_array().unwrap().len(), 1);
    assert_eq!(jotaro["stands"][0]["nome"], "Star Platinum");
    assert_eq!(jotaro["grupos"], json!([]));
    assert_eq!(jotaro["episodios"], json!([]));
    assert_eq!(jotaro["batalhas"], json!([]));
    assert!(jotaro.get("_id").is_none());

    let (status, joseph) = get_json(&server, "/api/personagem/Joseph Joestar").await;
    assert_eq!(status, 200);
    assert_eq!(joseph["stands"], json!([]));
}

#[tokio::test]
async fn test_missing_character_is_404() {
    let server = seeded_server().await;
    let (status, body) = get_json(&server, "/api/personagem/Kira Yoshikage").await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "error": "Personagem não encontrado" }));
}

#[tokio::test]
async fn test_stand_detail_names_owner() {
    let server = seeded_server().await;
    let (status, body) = get_json(&server, "/api/stand/Star Platinum").await;
    assert_eq!(status, 200);
    assert_eq!(body["nome"], "Star Platinum");
    assert_eq!(body["personagem_nome"], "Jotaro Kujo");
    assert_eq!(body["stats"]["destrutivo"], "A");

    let (status, body) = get_json(&server, "/api/stand/Killer Queen").await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "error": "Stand não encontrado" }));
}

#[tokio::test]
async fn test_arcs_with_episodes() {
    let server = seeded_server().await;
    let (status, body) = get_json(&server, "/api/partes-com-episodios").await;
    assert_eq!(status, 200);

    let numbers: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["numero"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![2, 3, 4]);
    assert_eq!(body[1]["episodios"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_nationality_counts_descending() {
    let server = seeded_server().await;
    let (status, body) = get_json(&server, "/api/estatisticas/nacionalidade").await;
    assert_eq!(status, 200);

    let groups = body.as_array().unwrap();
    assert_eq!(groups[0], json!({ "nacionalidade": "Britânico", "count": 2 }));
    let counts: Vec<i64> = groups.iter().map(|g| g["count"].as_i64().unwrap()).collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    assert!(groups.iter().all(|g| g.get("_id").is_none()));
}

#[tokio::test]
async fn test_static_files_and_cors() {
    let server = seeded_server().await;
    let resp = reqwest::Client::new()
        .get(server.url("/"))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert!(resp.text().await.unwrap().contains("JJBA Wiki"));
}

/// Store whose every query fails.
struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn clear(&self, _: Collection) -> Result<u64> {
        bail!("store unavailable")
    }
    async fn insert_character(&self, _: &CharacterDoc) -> Result<()> {
        bail!("store unavailable")
    }
    async fn insert_arc(&self, _: &ArcDoc) -> Result<()> {
        bail!("store unavailable")
    }
    async fn insert_groups(&self, _: &[GroupDoc]) -> Result<()> {
        bail!("store unavailable")
    }
    async fn insert_battles(&self, _: &[BattleDoc]) -> Result<()> {
        bail!("store unavailable")
    }
    async fn characters(&self) -> Result<BoxStream<'static, Result<StoredCharacter>>> {
        bail!("store unavailable")
    }
    async fn update_character(&self, _: &DocumentId, _: &CharacterUpdate) -> Result<()> {
        bail!("store unavailable")
    }
    async fn characters_with_stand(&self) -> Result<Vec<CharacterDoc>> {
        bail!("store unavailable")
    }
    async fn character_names(&self) -> Result<Vec<String>> {
        bail!("store unavailable")
    }
    async fn find_character(&self, _: &str) -> Result<Option<CharacterDoc>> {
        bail!("store unavailable")
    }
    async fn find_stand_owner(&self, _: &str) -> Result<Option<CharacterDoc>> {
        bail!("store unavailable")
    }
    async fn arcs(&self) -> Result<Vec<ArcDoc>> {
        bail!("store unavailable")
    }
    async fn nationality_counts(&self) -> Result<Vec<NationalityGroup>> {
        bail!("store unavailable")
    }
    async fn count(&self, _: Collection) -> Result<u64> {
        bail!("store unavailable")
    }
    async fn dump(&self, _: Collection) -> Result<Vec<Value>> {
        bail!("store unavailable")
    }
    async fn close(&self) {}
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let server = spawn(Arc::new(FailingStore)).await;
    for path in [
        "/api/stands",
        "/api/personagens",
        "/api/personagem/DIO",
        "/api/stand/The World",
        "/api/partes-com-episodios",
        "/api/estatisticas/nacionalidade",
    ] {
        let (status, body) = get_json(&server, path).await;
        assert_eq!(status, 500, "{}", path);
        assert_eq!(body, json!({ "error": "Erro interno do servidor" }));
    }
}
