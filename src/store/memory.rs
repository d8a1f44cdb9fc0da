//! In-memory [`DocumentStore`] implementation for testing.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Queries reproduce the document
//! database semantics relied on by the API: binary ordering of names,
//! natural (insertion) order elsewhere, stable ordering of aggregation ties.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use uuid::Uuid;

use super::{Collection, DocumentId, DocumentStore, StoredCharacter};
use crate::models::{ArcDoc, BattleDoc, CharacterDoc, CharacterUpdate, GroupDoc, NationalityGroup};

/// In-memory store for tests.
pub struct InMemoryStore {
    personagens: RwLock<Vec<(DocumentId, CharacterDoc)>>,
    partes: RwLock<Vec<ArcDoc>>,
    grupos: RwLock<Vec<GroupDoc>>,
    batalhas: RwLock<Vec<BattleDoc>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            personagens: RwLock::new(Vec::new()),
            partes: RwLock::new(Vec::new()),
            grupos: RwLock::new(Vec::new()),
            batalhas: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn to_values<T: serde::Serialize>(docs: &[T]) -> Result<Vec<serde_json::Value>> {
    docs.iter()
        .map(|d| serde_json::to_value(d).map_err(Into::into))
        .collect()
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn clear(&self, collection: Collection) -> Result<u64> {
        let removed = match collection {
            Collection::Personagens => write(&self.personagens)?.drain(..).count(),
            Collection::Partes => write(&self.partes)?.drain(..).count(),
            Collection::Grupos => write(&self.grupos)?.drain(..).count(),
            Collection::Batalhas => write(&self.batalhas)?.drain(..).count(),
        };
        Ok(removed as u64)
    }

    async fn insert_character(&self, doc: &CharacterDoc) -> Result<()> {
        let id = DocumentId(Uuid::new_v4().to_string());
        write(&self.personagens)?.push((id, doc.clone()));
        Ok(())
    }

    async fn insert_arc(&self, doc: &ArcDoc) -> Result<()> {
        write(&self.partes)?.push(doc.clone());
        Ok(())
    }

    async fn insert_groups(&self, docs: &[GroupDoc]) -> Result<()> {
        write(&self.grupos)?.extend_from_slice(docs);
        Ok(())
    }

    async fn insert_battles(&self, docs: &[BattleDoc]) -> Result<()> {
        write(&self.batalhas)?.extend_from_slice(docs);
        Ok(())
    }

    async fn characters(&self) -> Result<BoxStream<'static, Result<StoredCharacter>>> {
        let snapshot: Vec<StoredCharacter> = read(&self.personagens)?
            .iter()
            .map(|(id, doc)| StoredCharacter {
                id: id.clone(),
                doc: doc.clone(),
            })
            .collect();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    async fn update_character(&self, id: &DocumentId, update: &CharacterUpdate) -> Result<()> {
        let mut personagens = write(&self.personagens)?;
        if let Some((_, doc)) = personagens.iter_mut().find(|(doc_id, _)| doc_id == id) {
            update.apply_to(doc);
        }
        Ok(())
    }

    async fn characters_with_stand(&self) -> Result<Vec<CharacterDoc>> {
        Ok(read(&self.personagens)?
            .iter()
            .filter(|(_, doc)| doc.stand.is_some())
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn character_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = read(&self.personagens)?
            .iter()
            .map(|(_, doc)| doc.nome.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn find_character(&self, nome: &str) -> Result<Option<CharacterDoc>> {
        Ok(read(&self.personagens)?
            .iter()
            .find(|(_, doc)| doc.nome == nome)
            .map(|(_, doc)| doc.clone()))
    }

    async fn find_stand_owner(&self, stand_nome: &str) -> Result<Option<CharacterDoc>> {
        Ok(read(&self.personagens)?
            .iter()
            .find(|(_, doc)| doc.stand.as_ref().is_some_and(|s| s.nome == stand_nome))
            .map(|(_, doc)| doc.clone()))
    }

    async fn arcs(&self) -> Result<Vec<ArcDoc>> {
        let mut arcs = read(&self.partes)?.clone();
        arcs.sort_by_key(|a| a.numero);
        Ok(arcs)
    }

    async fn nationality_counts(&self) -> Result<Vec<NationalityGroup>> {
        let mut groups: Vec<NationalityGroup> = Vec::new();
        for (_, doc) in read(&self.personagens)?.iter() {
            match groups
                .iter_mut()
                .find(|g| g.nacionalidade == doc.nacionalidade)
            {
                Some(group) => group.count += 1,
                None => groups.push(NationalityGroup {
                    nacionalidade: doc.nacionalidade.clone(),
                    count: 1,
                }),
            }
        }
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(groups)
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        let len = match collection {
            Collection::Personagens => read(&self.personagens)?.len(),
            Collection::Partes => read(&self.partes)?.len(),
            Collection::Grupos => read(&self.grupos)?.len(),
            Collection::Batalhas => read(&self.batalhas)?.len(),
        };
        Ok(len as u64)
    }

    async fn dump(&self, collection: Collection) -> Result<Vec<serde_json::Value>> {
        match collection {
            Collection::Personagens => {
                let docs: Vec<CharacterDoc> = read(&self.personagens)?
                    .iter()
                    .map(|(_, doc)| doc.clone())
                    .collect();
                to_values(&docs)
            }
            Collection::Partes => to_values(read(&self.partes)?.as_slice()),
            Collection::Grupos => to_values(read(&self.grupos)?.as_slice()),
            Collection::Batalhas => to_values(read(&self.batalhas)?.as_slice()),
        }
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StandDoc, StandStats};

    fn character(nome: &str, nacionalidade: Option<&str>, stand: Option<&str>) -> CharacterDoc {
        CharacterDoc {
            nome: nome.into(),
            genero: None,
            nacionalidade: nacionalidade.map(Into::into),
            ano_nascimento: None,
            vivo: None,
            primeira_aparicao: None,
            imgname: None,
            stand: stand.map(|s| StandDoc {
                nome: s.into(),
                referencia: None,
                categoria: None,
                imgname: None,
                stats: StandStats::default(),
                habilidades: None,
            }),
            participacoes: Vec::new(),
            habilidades: None,
            afiliacoes: None,
            relacionamentos: None,
            grupos: None,
            episodios: None,
            batalhas: None,
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let store = InMemoryStore::new();
        store
            .insert_character(&character("Jotaro Kujo", None, None))
            .await
            .unwrap();
        store
            .insert_character(&character("DIO", None, None))
            .await
            .unwrap();
        assert_eq!(store.clear(Collection::Personagens).await.unwrap(), 2);
        assert_eq!(store.count(Collection::Personagens).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_targets_identity() {
        let store = InMemoryStore::new();
        store
            .insert_character(&character("Jotaro Kujo", None, Some("Star Platinum")))
            .await
            .unwrap();
        let stored: Vec<StoredCharacter> = store
            .characters()
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        let update = CharacterUpdate {
            afiliacoes: Some(vec!["Stardust Crusaders".into()]),
            ..Default::default()
        };
        store
            .update_character(&stored[0].id, &update)
            .await
            .unwrap();
        let doc = store.find_character("Jotaro Kujo").await.unwrap().unwrap();
        assert_eq!(doc.afiliacoes.unwrap(), vec!["Stardust Crusaders"]);
    }

    #[tokio::test]
    async fn test_nationality_counts_sorted_desc() {
        let store = InMemoryStore::new();
        for (nome, nac) in [
            ("Jotaro Kujo", Some("Japonesa")),
            ("Joseph Joestar", Some("Britânica")),
            ("Koichi Hirose", Some("Japonesa")),
            ("Jonathan Joestar", Some("Britânica")),
            ("Josuke Higashikata", Some("Japonesa")),
            ("Desconhecido", None),
        ] {
            store
                .insert_character(&character(nome, nac, None))
                .await
                .unwrap();
        }
        let counts = store.nationality_counts().await.unwrap();
        assert_eq!(counts[0].nacionalidade.as_deref(), Some("Japonesa"));
        assert_eq!(counts[0].count, 3);
        assert!(counts.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(counts.iter().map(|c| c.count).sum::<i64>(), 6);
    }

    #[tokio::test]
    async fn test_find_stand_owner() {
        let store = InMemoryStore::new();
        store
            .insert_character(&character("DIO", None, Some("The World")))
            .await
            .unwrap();
        store
            .insert_character(&character("Jonathan Joestar", None, None))
            .await
            .unwrap();
        let owner = store.find_stand_owner("The World").await.unwrap().unwrap();
        assert_eq!(owner.nome, "DIO");
        assert!(store.find_stand_owner("Hermit Purple").await.unwrap().is_none());
        assert_eq!(store.characters_with_stand().await.unwrap().len(), 1);
    }
}
