//! Document shape builder.
//!
//! Pure transformations from normalized rows to the nested documents stored
//! in the document database. Nothing here performs I/O: callers fetch the
//! rows (see [`ingest`](crate::ingest) and [`enrich`](crate::enrich)) and
//! hand them over for shaping.

use std::collections::HashSet;

use crate::models::{
    ArcDoc, ArcRow, BattleDoc, BattleRow, CharacterAbility, CharacterAbilityRow, CharacterDoc,
    CharacterRow, CharacterUpdate, EpisodeDoc, EpisodeRange, EpisodeRow, Participation,
    ParticipationRow, RelationRow, Relationship, StandAbility, StandAbilityRow, StandDoc,
    StandRow, StandStats,
};

/// Category tag attached to every character ability.
pub const CHARACTER_ABILITY_KIND: &str = "Inata/Técnica";

/// Builds a character document from its row, its stand (if any) and its arc
/// participations. Participations keep the order they were fetched in.
pub fn character_document(
    row: CharacterRow,
    stand: Option<StandRow>,
    participations: Vec<ParticipationRow>,
) -> CharacterDoc {
    CharacterDoc {
        nome: row.nome,
        genero: row.genero,
        nacionalidade: row.nacionalidade,
        ano_nascimento: row.ano_nascimento,
        vivo: row.vivo,
        primeira_aparicao: row.primeira_aparicao,
        imgname: row.imgname,
        stand: stand.map(stand_document),
        participacoes: participations.into_iter().map(participation).collect(),
        habilidades: None,
        afiliacoes: None,
        relacionamentos: None,
        grupos: None,
        episodios: None,
        batalhas: None,
        extra: Default::default(),
    }
}

pub fn stand_document(row: StandRow) -> StandDoc {
    StandDoc {
        nome: row.nome,
        referencia: row.referencia,
        categoria: row.categoria,
        imgname: row.imgname,
        stats: StandStats {
            destrutivo: row.poder_destrutivo,
            velocidade: row.velocidade,
            alcance: row.alcance,
            durabilidade: row.durabilidade,
            precisao: row.precisao,
            potencial: row.potencial,
        },
        habilidades: None,
    }
}

pub fn participation(row: ParticipationRow) -> Participation {
    Participation {
        parte_numero: row.parte_numero,
        idade: row.idade,
        vilao_aliado: row.vilao_aliado,
        local_aparicao: row.primeira_aparicao_local,
        protagonista: row.protagonista,
    }
}

/// Builds an arc document embedding the episodes that belong to it,
/// ascending by episode number.
pub fn arc_document(row: ArcRow, episodes: Vec<EpisodeRow>) -> ArcDoc {
    let mut episodes: Vec<EpisodeRow> = episodes
        .into_iter()
        .filter(|ep| ep.parte_numero == row.numero)
        .collect();
    episodes.sort_by_key(|ep| ep.numero);

    ArcDoc {
        numero: row.numero,
        nome: row.nome,
        ano: row.ano,
        descricao: row.descricao,
        episodios: episodes
            .into_iter()
            .map(|ep| EpisodeDoc {
                numero: ep.numero,
                nome: ep.nome,
                descricao: ep.descricao,
                data_lancamento: ep.data_lancamento,
            })
            .collect(),
    }
}

pub fn battle_document(row: BattleRow) -> BattleDoc {
    BattleDoc {
        personagem_a: row.personagem_a,
        personagem_b: row.personagem_b,
        vencedor: row.vencedor,
        parte_numero: row.parte_numero,
        episodios: EpisodeRange {
            inicio: row.episodio_inicial,
            fim: row.episodio_final,
        },
    }
}

pub fn character_ability(row: CharacterAbilityRow) -> CharacterAbility {
    CharacterAbility {
        nome: row.nome,
        tipo: CHARACTER_ABILITY_KIND.to_string(),
        descricao: row.desc_geral,
        uso: row.descricao_uso,
        nivel: row.nivel,
    }
}

pub fn stand_ability(row: StandAbilityRow) -> StandAbility {
    StandAbility {
        nome: row.nome,
        descricao: row.descricao,
    }
}

/// Resolves symmetric relation rows into relationships from `subject`'s
/// point of view.
///
/// The partner is `personagem_b` when `personagem_a` is the subject and
/// `personagem_a` otherwise. Self-relations are dropped, and a relation
/// stored in both directions with the same label collapses into one entry.
/// Different labels towards the same partner are all kept.
pub fn relationships(subject: &str, rows: Vec<RelationRow>) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|row| {
            let partner = if row.personagem_a == subject {
                row.personagem_b
            } else {
                row.personagem_a
            };
            (partner != subject).then_some(Relationship {
                personagem: partner,
                tipo: row.descricao,
            })
        })
        .filter(|rel| seen.insert(rel.clone()))
        .collect()
}

/// Related rows fetched for one character during enrichment.
#[derive(Debug, Default)]
pub struct RelatedRows {
    pub abilities: Vec<CharacterAbilityRow>,
    /// `None` when the character has no stand and the lookup was skipped.
    pub stand_abilities: Option<Vec<StandAbilityRow>>,
    pub affiliations: Vec<String>,
    pub relations: Vec<RelationRow>,
}

/// Builds the partial update for one character. Keys without related data
/// are left out instead of being set to empty arrays.
pub fn character_update(subject: &str, related: RelatedRows) -> CharacterUpdate {
    let relacionamentos = relationships(subject, related.relations);
    CharacterUpdate {
        habilidades: non_empty(
            related
                .abilities
                .into_iter()
                .map(character_ability)
                .collect(),
        ),
        stand_habilidades: related
            .stand_abilities
            .and_then(|rows| non_empty(rows.into_iter().map(stand_ability).collect())),
        afiliacoes: non_empty(related.affiliations),
        relacionamentos: non_empty(relacionamentos),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
