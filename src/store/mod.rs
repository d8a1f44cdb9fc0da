//! Document store abstraction.
//!
//! The [`DocumentStore`] trait covers both sides of the system: the write
//! operations used by the migration jobs (full-collection clear, inserts,
//! partial character updates) and the read operations behind the HTTP API.
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`MongoStore`](mongo::MongoStore) | MongoDB database (`jjba_wiki` by default) |
//! | [`InMemoryStore`](memory::InMemoryStore) | Vectors behind locks, for tests |
//!
//! Implementations must be `Send + Sync`; the server shares one instance
//! across all requests.

pub mod memory;
pub mod mongo;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::{ArcDoc, BattleDoc, CharacterDoc, CharacterUpdate, GroupDoc, NationalityGroup};

pub use memory::InMemoryStore;
pub use mongo::MongoStore;

/// The four target collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Personagens,
    Partes,
    Grupos,
    Batalhas,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Personagens,
        Collection::Partes,
        Collection::Grupos,
        Collection::Batalhas,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Personagens => "personagens",
            Collection::Partes => "partes",
            Collection::Grupos => "grupos",
            Collection::Batalhas => "batalhas",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Store-assigned identity of a document, rendered as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A character document together with its store identity.
#[derive(Debug, Clone)]
pub struct StoredCharacter {
    pub id: DocumentId,
    pub doc: CharacterDoc,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Deletes every document of `collection`. Returns the number removed.
    async fn clear(&self, collection: Collection) -> Result<u64>;

    async fn insert_character(&self, doc: &CharacterDoc) -> Result<()>;

    async fn insert_arc(&self, doc: &ArcDoc) -> Result<()>;

    /// Bulk insert, preserving the given order.
    async fn insert_groups(&self, docs: &[GroupDoc]) -> Result<()>;

    /// Bulk insert, preserving the given order.
    async fn insert_battles(&self, docs: &[BattleDoc]) -> Result<()>;

    /// Streams every character document with its identity, unfiltered.
    async fn characters(&self) -> Result<BoxStream<'static, Result<StoredCharacter>>>;

    /// Applies a partial `$set` update to the character with identity `id`.
    async fn update_character(&self, id: &DocumentId, update: &CharacterUpdate) -> Result<()>;

    /// Characters whose `stand` is not null.
    async fn characters_with_stand(&self) -> Result<Vec<CharacterDoc>>;

    /// All character names, ascending.
    async fn character_names(&self) -> Result<Vec<String>>;

    /// Exact-match lookup by character name.
    async fn find_character(&self, nome: &str) -> Result<Option<CharacterDoc>>;

    /// The character whose embedded stand is named `stand_nome`.
    async fn find_stand_owner(&self, stand_nome: &str) -> Result<Option<CharacterDoc>>;

    /// All arcs ascending by number, episodes embedded.
    async fn arcs(&self) -> Result<Vec<ArcDoc>>;

    /// Characters grouped by nationality, most frequent first.
    async fn nationality_counts(&self) -> Result<Vec<NationalityGroup>>;

    async fn count(&self, collection: Collection) -> Result<u64>;

    /// Every document of `collection` in natural order, without store ids.
    async fn dump(&self, collection: Collection) -> Result<Vec<serde_json::Value>>;

    /// Releases the underlying connection.
    async fn close(&self);
}
