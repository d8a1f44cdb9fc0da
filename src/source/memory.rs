//! In-memory [`RelationalSource`] for tests.
//!
//! Tables are plain vectors. Lookups reproduce the ordering and join
//! semantics of the SQL issued by [`PgSource`](super::PgSource): insertion
//! order where the SQL has no `ORDER BY`, inner joins against the ability
//! catalog, and row-level `UNION` for relations.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::RelationalSource;
use crate::models::{
    ArcRow, BattleRow, CharacterAbilityRow, CharacterRow, EpisodeRow, GroupDoc, ParticipationRow,
    RelationRow, StandAbilityRow, StandRow,
};

/// A row of the `habilidades` catalog.
#[derive(Debug, Clone)]
pub struct AbilityEntry {
    pub nome: String,
    pub descricao: Option<String>,
}

/// A row of `personagem_habilidade`.
#[derive(Debug, Clone)]
pub struct CharacterAbilityLink {
    pub personagem_nome: String,
    pub habilidade_nome: String,
    pub nivel: Option<String>,
    pub descricao_uso: Option<String>,
}

/// A row of `stand_habilidade`.
#[derive(Debug, Clone)]
pub struct StandAbilityLink {
    pub stand_nome: String,
    pub habilidade_nome: String,
}

/// A row of `personagem_grupo`.
#[derive(Debug, Clone)]
pub struct AffiliationLink {
    pub personagem_nome: String,
    pub grupo_nome: String,
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub personagens: Vec<CharacterRow>,
    pub stands: Vec<StandRow>,
    pub personagem_parte: Vec<ParticipationRow>,
    pub partes: Vec<ArcRow>,
    pub episodios: Vec<EpisodeRow>,
    pub grupos: Vec<GroupDoc>,
    pub batalha: Vec<BattleRow>,
    pub habilidades: Vec<AbilityEntry>,
    pub personagem_habilidade: Vec<CharacterAbilityLink>,
    pub stand_habilidade: Vec<StandAbilityLink>,
    pub personagem_grupo: Vec<AffiliationLink>,
    pub relacao_personagem: Vec<RelationRow>,
    /// Lookups keyed by this name fail, simulating a broken query.
    pub failing_key: Option<String>,
    pub stand_ability_calls: Arc<AtomicUsize>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every per-entity lookup for `key` return an error.
    pub fn failing_for(mut self, key: impl Into<String>) -> Self {
        self.failing_key = Some(key.into());
        self
    }

    /// Number of `stand_abilities_of` calls made so far.
    pub fn stand_ability_calls(&self) -> usize {
        self.stand_ability_calls.load(Ordering::SeqCst)
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing_key.as_deref() == Some(key) {
            bail!("simulated query failure for '{}'", key);
        }
        Ok(())
    }

    fn catalog_entry(&self, nome: &str) -> Option<&AbilityEntry> {
        self.habilidades.iter().find(|h| h.nome == nome)
    }
}

#[async_trait]
impl RelationalSource for InMemorySource {
    async fn characters(&self) -> Result<Vec<CharacterRow>> {
        Ok(self.personagens.clone())
    }

    async fn stand_of(&self, personagem: &str) -> Result<Option<StandRow>> {
        self.check(personagem)?;
        Ok(self
            .stands
            .iter()
            .find(|s| s.personagem_nome == personagem)
            .cloned())
    }

    async fn participations_of(&self, personagem: &str) -> Result<Vec<ParticipationRow>> {
        self.check(personagem)?;
        Ok(self
            .personagem_parte
            .iter()
            .filter(|p| p.personagem_nome == personagem)
            .cloned()
            .collect())
    }

    async fn arcs(&self) -> Result<Vec<ArcRow>> {
        let mut arcs = self.partes.clone();
        arcs.sort_by_key(|a| a.numero);
        Ok(arcs)
    }

    async fn episodes_of(&self, parte_numero: i32) -> Result<Vec<EpisodeRow>> {
        self.check(&parte_numero.to_string())?;
        let mut episodes: Vec<EpisodeRow> = self
            .episodios
            .iter()
            .filter(|e| e.parte_numero == parte_numero)
            .cloned()
            .collect();
        episodes.sort_by_key(|e| e.numero);
        Ok(episodes)
    }

    async fn groups(&self) -> Result<Vec<GroupDoc>> {
        Ok(self.grupos.clone())
    }

    async fn battles(&self) -> Result<Vec<BattleRow>> {
        Ok(self.batalha.clone())
    }

    async fn abilities_of(&self, personagem: &str) -> Result<Vec<CharacterAbilityRow>> {
        self.check(personagem)?;
        Ok(self
            .personagem_habilidade
            .iter()
            .filter(|link| link.personagem_nome == personagem)
            .filter_map(|link| {
                self.catalog_entry(&link.habilidade_nome)
                    .map(|entry| CharacterAbilityRow {
                        nome: entry.nome.clone(),
                        desc_geral: entry.descricao.clone(),
                        nivel: link.nivel.clone(),
                        descricao_uso: link.descricao_uso.clone(),
                    })
            })
            .collect())
    }

    async fn stand_abilities_of(&self, stand: &str) -> Result<Vec<StandAbilityRow>> {
        self.stand_ability_calls.fetch_add(1, Ordering::SeqCst);
        self.check(stand)?;
        Ok(self
            .stand_habilidade
            .iter()
            .filter(|link| link.stand_nome == stand)
            .filter_map(|link| {
                self.catalog_entry(&link.habilidade_nome)
                    .map(|entry| StandAbilityRow {
                        nome: entry.nome.clone(),
                        descricao: entry.descricao.clone(),
                    })
            })
            .collect())
    }

    async fn affiliations_of(&self, personagem: &str) -> Result<Vec<String>> {
        self.check(personagem)?;
        Ok(self
            .personagem_grupo
            .iter()
            .filter(|link| link.personagem_nome == personagem)
            .map(|link| link.grupo_nome.clone())
            .collect())
    }

    async fn relations_of(&self, personagem: &str) -> Result<Vec<RelationRow>> {
        self.check(personagem)?;
        let left = self
            .relacao_personagem
            .iter()
            .filter(|r| r.personagem_a == personagem);
        let right = self
            .relacao_personagem
            .iter()
            .filter(|r| r.personagem_b == personagem);

        let mut seen = HashSet::new();
        Ok(left
            .chain(right)
            .filter(|r| seen.insert((*r).clone()))
            .cloned()
            .collect())
    }

    async fn close(&self) {}
}
