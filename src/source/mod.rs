//! Relational source reader.
//!
//! The [`RelationalSource`] trait lists every lookup the migration jobs
//! issue against the normalized schema. Two backends exist:
//!
//! - [`PgSource`](postgres::PgSource): parameterized queries over a
//!   PostgreSQL pool.
//! - [`InMemorySource`](memory::InMemorySource): tables held in vectors,
//!   used by tests.
//!
//! Every per-character lookup is keyed by the character's `nome`, which is
//! the natural key shared by all join tables.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    ArcRow, BattleRow, CharacterAbilityRow, CharacterRow, EpisodeRow, GroupDoc, ParticipationRow,
    RelationRow, StandAbilityRow, StandRow,
};

pub use memory::InMemorySource;
pub use postgres::PgSource;

#[async_trait]
pub trait RelationalSource: Send + Sync {
    /// All rows of `personagens`, in source order.
    async fn characters(&self) -> Result<Vec<CharacterRow>>;

    /// The stand owned by `personagem`, if any.
    async fn stand_of(&self, personagem: &str) -> Result<Option<StandRow>>;

    /// Arc participations of `personagem`, in source order.
    async fn participations_of(&self, personagem: &str) -> Result<Vec<ParticipationRow>>;

    /// All arcs, ascending by number.
    async fn arcs(&self) -> Result<Vec<ArcRow>>;

    /// Episodes of one arc, ascending by number.
    async fn episodes_of(&self, parte_numero: i32) -> Result<Vec<EpisodeRow>>;

    /// All rows of `grupos`, column-for-column.
    async fn groups(&self) -> Result<Vec<GroupDoc>>;

    async fn battles(&self) -> Result<Vec<BattleRow>>;

    /// Abilities of `personagem` joined with the ability catalog.
    async fn abilities_of(&self, personagem: &str) -> Result<Vec<CharacterAbilityRow>>;

    /// Abilities bound to the stand named `stand`.
    async fn stand_abilities_of(&self, stand: &str) -> Result<Vec<StandAbilityRow>>;

    /// Names of the groups `personagem` is affiliated with.
    async fn affiliations_of(&self, personagem: &str) -> Result<Vec<String>>;

    /// Relations where `personagem` is on either side. Rows repeated
    /// exactly across both directions are returned once.
    async fn relations_of(&self, personagem: &str) -> Result<Vec<RelationRow>>;

    /// Releases the underlying connection.
    async fn close(&self);
}
