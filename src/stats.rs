//! Collection statistics.
//!
//! Prints a document count and a content fingerprint for every target
//! collection. The fingerprint hashes the documents without their store
//! ids, so two migration runs over the same source print the same values.

use anyhow::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::db;
use crate::store::{Collection, DocumentStore};

/// Count and fingerprint of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub collection: Collection,
    pub count: u64,
    pub fingerprint: String,
}

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = db::connect_store(config).await?;
    let stats = collect_stats(&store).await;
    store.close().await;
    let stats = stats?;

    println!("JJBA Wiki: Collection Stats");
    println!("============================");
    println!();
    println!("  Database:    {}", config.store.database);
    println!();
    println!("  {:<14} {:>8}   {}", "COLLECTION", "DOCS", "FINGERPRINT");
    println!("  {}", "-".repeat(44));
    for s in &stats {
        println!("  {:<14} {:>8}   {}", s.collection.name(), s.count, &s.fingerprint[..16]);
    }
    println!();
    Ok(())
}

pub async fn collect_stats(store: &dyn DocumentStore) -> Result<Vec<CollectionStats>> {
    let mut stats = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        let count = store.count(collection).await?;
        let docs = store.dump(collection).await?;
        stats.push(CollectionStats {
            collection,
            count,
            fingerprint: fingerprint(&docs),
        });
    }
    Ok(stats)
}

/// Hex SHA-256 over the documents in order, one JSON line each.
pub fn fingerprint(docs: &[Value]) -> String {
    let mut hasher = Sha256::new();
    for doc in docs {
        hasher.update(doc.to_string().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
