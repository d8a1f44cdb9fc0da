#![allow(dead_code)]

use chrono::NaiveDate;
use serde_json::json;

use jjba_wiki::models::{
    ArcRow, BattleRow, CharacterRow, EpisodeRow, GroupDoc, ParticipationRow, RelationRow, StandRow,
};
use jjba_wiki::source::memory::{
    AbilityEntry, AffiliationLink, CharacterAbilityLink, StandAbilityLink,
};
use jjba_wiki::source::InMemorySource;

pub fn character(nome: &str, nacionalidade: &str) -> CharacterRow {
    CharacterRow {
        nome: nome.into(),
        genero: Some("Masculino".into()),
        nacionalidade: Some(nacionalidade.into()),
        ano_nascimento: None,
        vivo: Some(true),
        primeira_aparicao: None,
        imgname: Some(format!("{}.png", nome.to_lowercase().replace(' ', "_"))),
    }
}

pub fn stand(owner: &str, nome: &str) -> StandRow {
    StandRow {
        personagem_nome: owner.into(),
        nome: nome.into(),
        referencia: None,
        categoria: Some("Curto alcance".into()),
        imgname: None,
        poder_destrutivo: Some("A".into()),
        velocidade: Some("A".into()),
        alcance: Some("C".into()),
        durabilidade: Some("A".into()),
        precisao: Some("A".into()),
        potencial: Some("A".into()),
    }
}

pub fn participation(nome: &str, parte: i32, protagonista: bool) -> ParticipationRow {
    ParticipationRow {
        personagem_nome: nome.into(),
        parte_numero: parte,
        idade: Some(17),
        vilao_aliado: Some(!protagonista),
        primeira_aparicao_local: Some("Japão".into()),
        protagonista: Some(protagonista),
    }
}

pub fn arc(numero: i32, nome: &str) -> ArcRow {
    ArcRow {
        numero,
        nome: Some(nome.into()),
        ano: Some(1987 + numero),
        descricao: None,
    }
}

pub fn episode(parte: i32, numero: i32) -> EpisodeRow {
    EpisodeRow {
        parte_numero: parte,
        numero,
        nome: Some(format!("Episódio {}", numero)),
        descricao: None,
        data_lancamento: NaiveDate::from_ymd_opt(2014, 4, numero as u32),
    }
}

pub fn relation(a: &str, b: &str, descricao: &str) -> RelationRow {
    RelationRow {
        personagem_a: a.into(),
        personagem_b: b.into(),
        descricao: Some(descricao.into()),
    }
}

fn group(nome: &str, lider: &str) -> GroupDoc {
    let value = json!({ "nome": nome, "lider": lider });
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn ability(nome: &str, descricao: &str) -> AbilityEntry {
    AbilityEntry {
        nome: nome.into(),
        descricao: Some(descricao.into()),
    }
}

pub fn stand_ability(stand: &str, habilidade: &str) -> StandAbilityLink {
    StandAbilityLink {
        stand_nome: stand.into(),
        habilidade_nome: habilidade.into(),
    }
}

fn affiliation(personagem: &str, grupo: &str) -> AffiliationLink {
    AffiliationLink {
        personagem_nome: personagem.into(),
        grupo_nome: grupo.into(),
    }
}

/// A small Stardust Crusaders dataset.
///
/// - Jotaro and Polnareff own stands, Joseph does not, DIO owns The World.
/// - Arcs are stored out of order; arc 3 episodes too.
/// - Jotaro has a self-relation and a duplicated relation row.
pub fn fixture() -> InMemorySource {
    InMemorySource {
        personagens: vec![
            character("Jotaro Kujo", "Japonês"),
            character("Joseph Joestar", "Britânico"),
            character("DIO", "Britânico"),
            character("Jean Pierre Polnareff", "Francês"),
        ],
        stands: vec![
            stand("Jotaro Kujo", "Star Platinum"),
            stand("DIO", "The World"),
            stand("Jean Pierre Polnareff", "Silver Chariot"),
        ],
        personagem_parte: vec![
            participation("Jotaro Kujo", 3, true),
            participation("Jotaro Kujo", 4, false),
            participation("Joseph Joestar", 3, false),
            participation("DIO", 3, false),
        ],
        partes: vec![
            arc(4, "Diamond is Unbreakable"),
            arc(3, "Stardust Crusaders"),
            arc(2, "Battle Tendency"),
        ],
        episodios: vec![
            episode(3, 2),
            episode(4, 1),
            episode(3, 1),
            episode(3, 3),
        ],
        grupos: vec![
            group("Stardust Crusaders", "Joseph Joestar"),
            group("Fundação Speedwagon", "Robert E. O. Speedwagon"),
        ],
        batalha: vec![BattleRow {
            personagem_a: Some("Jotaro Kujo".into()),
            personagem_b: Some("DIO".into()),
            vencedor: Some("Jotaro Kujo".into()),
            parte_numero: Some(3),
            episodio_inicial: Some(2),
            episodio_final: Some(3),
        }],
        habilidades: vec![
            ability("Hamon", "Energia vital do sol"),
            ability("Time Stop", "Para o tempo por alguns segundos"),
            ability("Ora Ora Rush", "Sequência de socos"),
        ],
        personagem_habilidade: vec![CharacterAbilityLink {
            personagem_nome: "Joseph Joestar".into(),
            habilidade_nome: "Hamon".into(),
            nivel: Some("Mestre".into()),
            descricao_uso: Some("Contra vampiros".into()),
        }],
        stand_habilidade: vec![
            stand_ability("Star Platinum", "Ora Ora Rush"),
            stand_ability("Star Platinum", "Time Stop"),
            stand_ability("The World", "Time Stop"),
        ],
        personagem_grupo: vec![
            affiliation("Jotaro Kujo", "Stardust Crusaders"),
            affiliation("Joseph Joestar", "Stardust Crusaders"),
            affiliation("Jean Pierre Polnareff", "Stardust Crusaders"),
        ],
        relacao_personagem: vec![
            relation("Joseph Joestar", "Jotaro Kujo", "Avô"),
            relation("Jotaro Kujo", "DIO", "Inimigo"),
            relation("Jotaro Kujo", "DIO", "Inimigo"),
            relation("Jotaro Kujo", "Jotaro Kujo", "Ele mesmo"),
        ],
        ..Default::default()
    }
}
