//! Response shaping for the HTTP API.
//!
//! The store keeps singular relations singular (`stand` is an object or
//! `null`). The front end expects a few of them wrapped in arrays and some
//! optional lists always present; those adjustments happen here so handlers
//! only fetch and return.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::models::{CharacterDoc, NationalityGroup, StandDoc};

/// A stand flattened out of its owner, tagged with the owner's name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandView {
    #[serde(flatten)]
    pub stand: StandDoc,
    pub personagem_nome: String,
}

impl StandView {
    /// `None` when the character has no stand.
    pub fn from_owner(owner: CharacterDoc) -> Option<Self> {
        let stand = owner.stand?;
        Some(Self {
            stand,
            personagem_nome: owner.nome,
        })
    }
}

/// Every stand owned by `owners`, ordered by stand name ignoring case and
/// accents. Names equal under that folding put lowercase first.
pub fn stand_list(owners: Vec<CharacterDoc>) -> Vec<StandView> {
    let mut stands: Vec<StandView> = owners.into_iter().filter_map(StandView::from_owner).collect();
    stands.sort_by(|a, b| compare_names(&a.stand.nome, &b.stand.nome));
    stands
}

fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.chars().map(char::is_uppercase).cmp(b.chars().map(char::is_uppercase)))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameView {
    pub nome: String,
}

pub fn name_list(names: Vec<String>) -> Vec<NameView> {
    names.into_iter().map(|nome| NameView { nome }).collect()
}

/// Character detail: the stored document plus `stands` (zero or one
/// element) and the optional lists defaulted to `[]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterView {
    #[serde(flatten)]
    pub personagem: CharacterDoc,
    pub stands: Vec<StandDoc>,
    pub grupos: Vec<Value>,
    pub episodios: Vec<Value>,
    pub batalhas: Vec<Value>,
}

impl From<CharacterDoc> for CharacterView {
    fn from(mut personagem: CharacterDoc) -> Self {
        // Moved out so the flattened document does not emit them a second time.
        let grupos = personagem.grupos.take().unwrap_or_default();
        let episodios = personagem.episodios.take().unwrap_or_default();
        let batalhas = personagem.batalhas.take().unwrap_or_default();
        let stands = personagem.stand.iter().cloned().collect();
        Self {
            personagem,
            stands,
            grupos,
            episodios,
            batalhas,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NationalityView {
    pub nacionalidade: Option<String>,
    pub count: i64,
}

impl From<NationalityGroup> for NationalityView {
    fn from(group: NationalityGroup) -> Self {
        Self {
            nacionalidade: group.nacionalidade,
            count: group.count,
        }
    }
}

/// Lowercased name with Latin diacritics removed.
fn collation_key(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).map(fold_accent).collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
