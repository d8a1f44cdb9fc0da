//! MongoDB-backed [`DocumentStore`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::{Client, Database};
use serde::Deserialize;
use tracing::info;

use super::{Collection, DocumentId, DocumentStore, StoredCharacter};
use crate::models::{ArcDoc, BattleDoc, CharacterDoc, CharacterUpdate, GroupDoc, NationalityGroup};

/// Store backed by one MongoDB database. The client is cheap to clone and
/// pools connections internally.
pub struct MongoStore {
    client: Client,
    db: Database,
}

/// A character document as read back with its `_id`.
#[derive(Deserialize)]
struct CharacterRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(flatten)]
    doc: CharacterDoc,
}

#[derive(Deserialize)]
struct NameOnly {
    nome: String,
}

/// Projection for reads that must not carry `_id`.
fn without_id() -> Document {
    doc! { "_id": 0 }
}

impl MongoStore {
    /// Connects to `url`, selects `database` and pings it so that an
    /// unreachable server fails here rather than on the first query.
    pub async fn connect(url: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(url)
            .await
            .context("Failed to parse MongoDB connection string")?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;
        info!(database, "Connected to MongoDB");
        Ok(Self { client, db })
    }

    fn collection<T: Send + Sync>(&self, collection: Collection) -> mongodb::Collection<T> {
        self.db.collection(collection.name())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn clear(&self, collection: Collection) -> Result<u64> {
        let result = self
            .collection::<Document>(collection)
            .delete_many(doc! {})
            .await
            .with_context(|| format!("Failed to clear collection '{}'", collection))?;
        Ok(result.deleted_count)
    }

    async fn insert_character(&self, doc: &CharacterDoc) -> Result<()> {
        self.collection::<CharacterDoc>(Collection::Personagens)
            .insert_one(doc)
            .await
            .with_context(|| format!("Failed to insert character '{}'", doc.nome))?;
        Ok(())
    }

    async fn insert_arc(&self, doc: &ArcDoc) -> Result<()> {
        self.collection::<ArcDoc>(Collection::Partes)
            .insert_one(doc)
            .await
            .with_context(|| format!("Failed to insert arc {}", doc.numero))?;
        Ok(())
    }

    async fn insert_groups(&self, docs: &[GroupDoc]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        self.collection::<GroupDoc>(Collection::Grupos)
            .insert_many(docs)
            .await
            .context("Failed to insert groups")?;
        Ok(())
    }

    async fn insert_battles(&self, docs: &[BattleDoc]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        self.collection::<BattleDoc>(Collection::Batalhas)
            .insert_many(docs)
            .await
            .context("Failed to insert battles")?;
        Ok(())
    }

    async fn characters(&self) -> Result<BoxStream<'static, Result<StoredCharacter>>> {
        let cursor = self
            .collection::<CharacterRecord>(Collection::Personagens)
            .find(doc! {})
            .await
            .context("Failed to open characters cursor")?;
        Ok(cursor
            .map(|record| {
                record
                    .map(|r| StoredCharacter {
                        id: DocumentId(r.id.to_hex()),
                        doc: r.doc,
                    })
                    .map_err(anyhow::Error::from)
            })
            .boxed())
    }

    async fn update_character(&self, id: &DocumentId, update: &CharacterUpdate) -> Result<()> {
        let oid = ObjectId::parse_str(&id.0)
            .with_context(|| format!("Invalid document id '{}'", id))?;
        let fields = bson::to_document(&update.set_fields()?)?;
        self.collection::<Document>(Collection::Personagens)
            .update_one(doc! { "_id": oid }, doc! { "$set": fields })
            .await
            .with_context(|| format!("Failed to update character {}", id))?;
        Ok(())
    }

    async fn characters_with_stand(&self) -> Result<Vec<CharacterDoc>> {
        let cursor = self
            .collection::<CharacterDoc>(Collection::Personagens)
            .find(doc! { "stand": { "$ne": Bson::Null } })
            .projection(without_id())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn character_names(&self) -> Result<Vec<String>> {
        let cursor = self
            .collection::<NameOnly>(Collection::Personagens)
            .find(doc! {})
            .projection(doc! { "nome": 1, "_id": 0 })
            .sort(doc! { "nome": 1 })
            .await?;
        let names: Vec<NameOnly> = cursor.try_collect().await?;
        Ok(names.into_iter().map(|n| n.nome).collect())
    }

    async fn find_character(&self, nome: &str) -> Result<Option<CharacterDoc>> {
        Ok(self
            .collection::<CharacterDoc>(Collection::Personagens)
            .find_one(doc! { "nome": nome })
            .projection(without_id())
            .await?)
    }

    async fn find_stand_owner(&self, stand_nome: &str) -> Result<Option<CharacterDoc>> {
        Ok(self
            .collection::<CharacterDoc>(Collection::Personagens)
            .find_one(doc! { "stand.nome": stand_nome })
            .projection(without_id())
            .await?)
    }

    async fn arcs(&self) -> Result<Vec<ArcDoc>> {
        let cursor = self
            .collection::<ArcDoc>(Collection::Partes)
            .find(doc! {})
            .sort(doc! { "numero": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn nationality_counts(&self) -> Result<Vec<NationalityGroup>> {
        let pipeline = vec![
            doc! { "$group": { "_id": "$nacionalidade", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
        ];
        let buckets: Vec<Document> = self
            .collection::<Document>(Collection::Personagens)
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;
        buckets
            .into_iter()
            .map(|bucket| bson::from_document(bucket).map_err(Into::into))
            .collect()
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        Ok(self
            .collection::<Document>(collection)
            .count_documents(doc! {})
            .await?)
    }

    async fn dump(&self, collection: Collection) -> Result<Vec<serde_json::Value>> {
        let docs: Vec<Document> = self
            .collection::<Document>(collection)
            .find(doc! {})
            .projection(without_id())
            .await?
            .try_collect()
            .await?;
        Ok(docs
            .into_iter()
            .map(|d| Bson::Document(d).into_relaxed_extjson())
            .collect())
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
