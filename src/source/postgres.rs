use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::types::Json;

use super::RelationalSource;
use crate::models::{
    ArcRow, BattleRow, CharacterAbilityRow, CharacterRow, EpisodeRow, GroupDoc, ParticipationRow,
    RelationRow, StandAbilityRow, StandRow,
};

/// [`RelationalSource`] backed by a PostgreSQL pool.
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationalSource for PgSource {
    async fn characters(&self) -> Result<Vec<CharacterRow>> {
        sqlx::query_as(
            r#"
            SELECT nome, genero, nacionalidade, ano_nascimento, vivo, primeira_aparicao, imgname
            FROM personagens
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query personagens")
    }

    async fn stand_of(&self, personagem: &str) -> Result<Option<StandRow>> {
        sqlx::query_as(
            r#"
            SELECT personagem_nome, nome, referencia, categoria, imgname,
                   poder_destrutivo, velocidade, alcance, durabilidade, precisao, potencial
            FROM stands
            WHERE personagem_nome = $1
            "#,
        )
        .bind(personagem)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to query stand of '{}'", personagem))
    }

    async fn participations_of(&self, personagem: &str) -> Result<Vec<ParticipationRow>> {
        sqlx::query_as(
            r#"
            SELECT personagem_nome, parte_numero, idade, vilao_aliado,
                   primeira_aparicao_local, protagonista
            FROM personagem_parte
            WHERE personagem_nome = $1
            "#,
        )
        .bind(personagem)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to query participations of '{}'", personagem))
    }

    async fn arcs(&self) -> Result<Vec<ArcRow>> {
        sqlx::query_as("SELECT numero, nome, ano, descricao FROM partes ORDER BY numero")
            .fetch_all(&self.pool)
            .await
            .context("Failed to query partes")
    }

    async fn episodes_of(&self, parte_numero: i32) -> Result<Vec<EpisodeRow>> {
        sqlx::query_as(
            r#"
            SELECT parte_numero, numero, nome, descricao, data_lancamento
            FROM episodios
            WHERE parte_numero = $1
            ORDER BY numero
            "#,
        )
        .bind(parte_numero)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to query episodes of arc {}", parte_numero))
    }

    async fn groups(&self) -> Result<Vec<GroupDoc>> {
        let rows: Vec<(Json<GroupDoc>,)> = sqlx::query_as("SELECT row_to_json(g) FROM grupos g")
            .fetch_all(&self.pool)
            .await
            .context("Failed to query grupos")?;
        Ok(rows.into_iter().map(|(Json(doc),)| doc).collect())
    }

    async fn battles(&self) -> Result<Vec<BattleRow>> {
        sqlx::query_as(
            r#"
            SELECT personagem_a, personagem_b, vencedor, parte_numero,
                   episodio_inicial, episodio_final
            FROM batalha
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query batalha")
    }

    async fn abilities_of(&self, personagem: &str) -> Result<Vec<CharacterAbilityRow>> {
        sqlx::query_as(
            r#"
            SELECT h.nome, h.descricao AS desc_geral, ph.nivel, ph.descricao_uso
            FROM personagem_habilidade ph
            JOIN habilidades h ON ph.habilidade_nome = h.nome
            WHERE ph.personagem_nome = $1
            "#,
        )
        .bind(personagem)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to query abilities of '{}'", personagem))
    }

    async fn stand_abilities_of(&self, stand: &str) -> Result<Vec<StandAbilityRow>> {
        sqlx::query_as(
            r#"
            SELECT h.nome, h.descricao
            FROM stand_habilidade sh
            JOIN habilidades h ON sh.habilidade_nome = h.nome
            WHERE sh.stand_nome = $1
            "#,
        )
        .bind(stand)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to query abilities of stand '{}'", stand))
    }

    async fn affiliations_of(&self, personagem: &str) -> Result<Vec<String>> {
        sqlx::query_scalar("SELECT grupo_nome FROM personagem_grupo WHERE personagem_nome = $1")
            .bind(personagem)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to query affiliations of '{}'", personagem))
    }

    async fn relations_of(&self, personagem: &str) -> Result<Vec<RelationRow>> {
        sqlx::query_as(
            r#"
            SELECT personagem_a, personagem_b, descricao
            FROM relacao_personagem WHERE personagem_a = $1
            UNION
            SELECT personagem_a, personagem_b, descricao
            FROM relacao_personagem WHERE personagem_b = $1
            "#,
        )
        .bind(personagem)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to query relations of '{}'", personagem))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
