//! Core data models used throughout the wiki pipeline.
//!
//! Two families of types live here:
//!
//! - **Rows** mirror the normalized relational tables read by the
//!   [`RelationalSource`](crate::source::RelationalSource).
//! - **Documents** are the denormalized shapes written to and read from the
//!   [`DocumentStore`](crate::store::DocumentStore).
//!
//! Field names of document types are the wire names stored in the document
//! database and served to the front end, so they stay in Portuguese.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============ Relational rows ============

/// A row of `personagens`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CharacterRow {
    pub nome: String,
    pub genero: Option<String>,
    pub nacionalidade: Option<String>,
    pub ano_nascimento: Option<i32>,
    pub vivo: Option<bool>,
    pub primeira_aparicao: Option<String>,
    pub imgname: Option<String>,
}

/// A row of `stands`. Each character owns at most one.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StandRow {
    pub personagem_nome: String,
    pub nome: String,
    pub referencia: Option<String>,
    pub categoria: Option<String>,
    pub imgname: Option<String>,
    pub poder_destrutivo: Option<String>,
    pub velocidade: Option<String>,
    pub alcance: Option<String>,
    pub durabilidade: Option<String>,
    pub precisao: Option<String>,
    pub potencial: Option<String>,
}

/// A row of `personagem_parte`: one character's participation in one arc.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ParticipationRow {
    pub personagem_nome: String,
    pub parte_numero: i32,
    pub idade: Option<i32>,
    pub vilao_aliado: Option<bool>,
    pub primeira_aparicao_local: Option<String>,
    pub protagonista: Option<bool>,
}

/// A row of `partes`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ArcRow {
    pub numero: i32,
    pub nome: Option<String>,
    pub ano: Option<i32>,
    pub descricao: Option<String>,
}

/// A row of `episodios`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EpisodeRow {
    pub parte_numero: i32,
    pub numero: i32,
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub data_lancamento: Option<NaiveDate>,
}

/// A row of `batalha`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BattleRow {
    pub personagem_a: Option<String>,
    pub personagem_b: Option<String>,
    pub vencedor: Option<String>,
    pub parte_numero: Option<i32>,
    pub episodio_inicial: Option<i32>,
    pub episodio_final: Option<i32>,
}

/// `personagem_habilidade` joined with the `habilidades` catalog.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CharacterAbilityRow {
    pub nome: String,
    pub desc_geral: Option<String>,
    pub nivel: Option<String>,
    pub descricao_uso: Option<String>,
}

/// `stand_habilidade` joined with the `habilidades` catalog.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StandAbilityRow {
    pub nome: String,
    pub descricao: Option<String>,
}

/// A row of `relacao_personagem`. The relation is symmetric: either column
/// may hold the character being looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct RelationRow {
    pub personagem_a: String,
    pub personagem_b: String,
    pub descricao: Option<String>,
}

// ============ Documents ============

/// A group document. Groups are copied column-for-column from `grupos`.
pub type GroupDoc = Map<String, Value>;

/// Document of the `personagens` collection.
///
/// Identity fields are always serialized, even as `null`. Enrichment
/// fields are only present once the enrichment pass found data for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDoc {
    pub nome: String,
    pub genero: Option<String>,
    pub nacionalidade: Option<String>,
    pub ano_nascimento: Option<i32>,
    pub vivo: Option<bool>,
    pub primeira_aparicao: Option<String>,
    pub imgname: Option<String>,
    pub stand: Option<StandDoc>,
    #[serde(default)]
    pub participacoes: Vec<Participation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habilidades: Option<Vec<CharacterAbility>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afiliacoes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relacionamentos: Option<Vec<Relationship>>,
    // Never written by the migration jobs; tolerated when present in the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grupos: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodios: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batalhas: Option<Vec<Value>>,
    /// Stored keys not modelled above, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The stand embedded in a [`CharacterDoc`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandDoc {
    pub nome: String,
    pub referencia: Option<String>,
    pub categoria: Option<String>,
    pub imgname: Option<String>,
    pub stats: StandStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habilidades: Option<Vec<StandAbility>>,
}

/// The six fixed power ratings of a stand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandStats {
    pub destrutivo: Option<String>,
    pub velocidade: Option<String>,
    pub alcance: Option<String>,
    pub durabilidade: Option<String>,
    pub precisao: Option<String>,
    pub potencial: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub parte_numero: i32,
    pub idade: Option<i32>,
    pub vilao_aliado: Option<bool>,
    pub local_aparicao: Option<String>,
    pub protagonista: Option<bool>,
}

/// An innate or learned ability of a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterAbility {
    pub nome: String,
    pub tipo: String,
    pub descricao: Option<String>,
    pub uso: Option<String>,
    pub nivel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandAbility {
    pub nome: String,
    pub descricao: Option<String>,
}

/// A relation to another character, described by a free-text label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub personagem: String,
    pub tipo: Option<String>,
}

/// Document of the `partes` collection, with its episodes embedded in
/// ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcDoc {
    pub numero: i32,
    pub nome: Option<String>,
    pub ano: Option<i32>,
    pub descricao: Option<String>,
    #[serde(default)]
    pub episodios: Vec<EpisodeDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDoc {
    pub numero: i32,
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub data_lancamento: Option<NaiveDate>,
}

/// Document of the `batalhas` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleDoc {
    pub personagem_a: Option<String>,
    pub personagem_b: Option<String>,
    pub vencedor: Option<String>,
    pub parte_numero: Option<i32>,
    pub episodios: EpisodeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRange {
    pub inicio: Option<i32>,
    pub fim: Option<i32>,
}

/// Partial update computed by the enrichment pass for one character.
///
/// A `None` field means no related data was found; the corresponding key is
/// left untouched in the stored document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterUpdate {
    pub habilidades: Option<Vec<CharacterAbility>>,
    pub stand_habilidades: Option<Vec<StandAbility>>,
    pub afiliacoes: Option<Vec<String>>,
    pub relacionamentos: Option<Vec<Relationship>>,
}

impl CharacterUpdate {
    pub fn is_empty(&self) -> bool {
        self.habilidades.is_none()
            && self.stand_habilidades.is_none()
            && self.afiliacoes.is_none()
            && self.relacionamentos.is_none()
    }

    /// The `$set` payload: stored field paths mapped to their new values.
    /// Stand abilities target the nested `stand.habilidades` path.
    pub fn set_fields(&self) -> serde_json::Result<Map<String, Value>> {
        let mut fields = Map::new();
        if let Some(habilidades) = &self.habilidades {
            fields.insert("habilidades".into(), serde_json::to_value(habilidades)?);
        }
        if let Some(habilidades) = &self.stand_habilidades {
            fields.insert("stand.habilidades".into(), serde_json::to_value(habilidades)?);
        }
        if let Some(afiliacoes) = &self.afiliacoes {
            fields.insert("afiliacoes".into(), serde_json::to_value(afiliacoes)?);
        }
        if let Some(relacionamentos) = &self.relacionamentos {
            fields.insert("relacionamentos".into(), serde_json::to_value(relacionamentos)?);
        }
        Ok(fields)
    }

    /// Applies the update to an in-memory document with `$set` semantics.
    pub fn apply_to(&self, doc: &mut CharacterDoc) {
        if let Some(habilidades) = &self.habilidades {
            doc.habilidades = Some(habilidades.clone());
        }
        if let (Some(habilidades), Some(stand)) = (&self.stand_habilidades, doc.stand.as_mut()) {
            stand.habilidades = Some(habilidades.clone());
        }
        if let Some(afiliacoes) = &self.afiliacoes {
            doc.afiliacoes = Some(afiliacoes.clone());
        }
        if let Some(relacionamentos) = &self.relacionamentos {
            doc.relacionamentos = Some(relacionamentos.clone());
        }
    }
}

/// One bucket of the nationality aggregation, keyed the way the document
/// store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalityGroup {
    #[serde(rename = "_id")]
    pub nacionalidade: Option<String>,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> CharacterDoc {
        CharacterDoc {
            nome: "Jotaro Kujo".into(),
            genero: None,
            nacionalidade: None,
            ano_nascimento: None,
            vivo: None,
            primeira_aparicao: None,
            imgname: None,
            stand: None,
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

    #[test]
    fn test_identity_fields_serialized_as_null() {
        let value = serde_json::to_value(doc()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "nome",
            "genero",
            "nacionalidade",
            "ano_nascimento",
            "vivo",
            "primeira_aparicao",
            "imgname",
            "stand",
            "participacoes",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert!(obj["stand"].is_null());
        assert!(!obj.contains_key("habilidades"));
        assert!(!obj.contains_key("afiliacoes"));
    }

    #[test]
    fn test_empty_update_has_no_fields() {
        let update = CharacterUpdate::default();
        assert!(update.is_empty());
        assert!(update.set_fields().unwrap().is_empty());
    }

    #[test]
    fn test_stand_abilities_use_nested_path() {
        let update = CharacterUpdate {
            stand_habilidades: Some(vec![StandAbility {
                nome: "Time Stop".into(),
                descricao: None,
            }]),
            ..Default::default()
        };
        let fields = update.set_fields().unwrap();
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["stand.habilidades"]);
    }

    #[test]
    fn test_apply_skips_stand_abilities_without_stand() {
        let mut target = doc();
        let update = CharacterUpdate {
            stand_habilidades: Some(Vec::new()),
            afiliacoes: Some(vec!["Speedwagon Foundation".into()]),
            ..Default::default()
        };
        update.apply_to(&mut target);
        assert!(target.stand.is_none());
        assert_eq!(
            target.afiliacoes.as_deref(),
            Some(&["Speedwagon Foundation".to_string()][..])
        );
    }
}
