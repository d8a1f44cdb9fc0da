//! Enrichment pass.
//!
//! Second phase of the `extras` job: walks every stored character and adds
//! data from the ability, affiliation and relation tables through partial
//! `$set` updates. Characters for which nothing was found are not written.

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use tracing::{debug, info};

use crate::config::Config;
use crate::db;
use crate::ingest::{report, JobOptions, RunSummary};
use crate::models::{CharacterDoc, CharacterUpdate};
use crate::shape::{character_update, RelatedRows};
use crate::source::RelationalSource;
use crate::store::{DocumentStore, StoredCharacter};

/// CLI entry point for `wiki enrich`.
pub async fn run_enrich(config: &Config, options: JobOptions) -> Result<()> {
    let source = db::connect_source(config).await?;
    let store = match db::connect_store(config).await {
        Ok(store) => store,
        Err(err) => {
            source.close().await;
            return Err(err);
        }
    };

    let result = enrich_characters(&source, &store, &options).await;

    source.close().await;
    store.close().await;

    report(&[result?], "enrich", options.dry_run)
}

pub async fn enrich_characters(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    options: &JobOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new("enriquecimento");
    info!("Enriching characters with abilities, relationships and groups");

    let mut outcomes = store
        .characters()
        .await?
        .map(|item| async move {
            let stored = item.context("Failed to read character document")?;
            let outcome = enrich_one(source, store, &stored, options.dry_run).await;
            Ok::<_, anyhow::Error>((stored.doc.nome, outcome))
        })
        .buffer_unordered(options.concurrency);

    while let Some(next) = outcomes.next().await {
        let (nome, outcome) = next?;
        summary.record(&nome, outcome, options.policy)?;
    }

    info!(
        updated = summary.written,
        untouched = summary.skipped,
        "Enrichment finished"
    );
    Ok(summary)
}

async fn enrich_one(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    stored: &StoredCharacter,
    dry_run: bool,
) -> Result<bool> {
    let update = compute_update(source, &stored.doc).await?;
    if update.is_empty() {
        debug!(nome = %stored.doc.nome, "No related data");
        return Ok(false);
    }
    if !dry_run {
        store.update_character(&stored.id, &update).await?;
    }
    Ok(true)
}

/// Fetches the related rows of one character concurrently and builds its
/// partial update. The stand ability lookup only runs when the document
/// already embeds a stand.
pub async fn compute_update(
    source: &dyn RelationalSource,
    doc: &CharacterDoc,
) -> Result<CharacterUpdate> {
    let nome = doc.nome.as_str();
    let stand_abilities = async {
        match &doc.stand {
            Some(stand) => source.stand_abilities_of(&stand.nome).await.map(Some),
            None => Ok(None),
        }
    };

    let (abilities, stand_abilities, affiliations, relations) = tokio::try_join!(
        source.abilities_of(nome),
        stand_abilities,
        source.affiliations_of(nome),
        source.relations_of(nome),
    )?;

    Ok(character_update(
        nome,
        RelatedRows {
            abilities,
            stand_abilities,
            affiliations,
            relations,
        },
    ))
}
