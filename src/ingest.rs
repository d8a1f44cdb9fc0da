//! Migration job orchestration.
//!
//! Coordinates the relational → document flow for each target collection:
//! clear the collection, read the source rows, shape them into documents
//! and write them in source order. The enrichment pass lives in
//! [`enrich`](crate::enrich) and runs as the last step of the `extras` job.
//!
//! Independent lookups for one entity are issued concurrently and entities
//! are shaped with at most [`JobOptions::concurrency`] in flight. Writes
//! stay sequential so insertion order matches source order.

use anyhow::{bail, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db;
use crate::enrich;
use crate::models::{ArcDoc, ArcRow, CharacterDoc, CharacterRow};
use crate::shape::{arc_document, battle_document, character_document};
use crate::source::RelationalSource;
use crate::store::{Collection, DocumentStore};

/// Which migration job to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MigrateTarget {
    /// Characters with embedded stands and arc participations.
    Personagens,
    /// Arcs with embedded episodes.
    Partes,
    /// Groups and battles, followed by the enrichment pass.
    Extras,
    /// Every job above, in order.
    All,
}

/// What to do when one entity fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the job at the first failure.
    Abort,
    /// Record the failure and continue with the next entity.
    KeepGoing,
}

#[derive(Debug, Clone)]
pub struct JobOptions {
    pub concurrency: usize,
    pub policy: ErrorPolicy,
    /// Read and shape everything but write nothing.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub entity: String,
    pub error: String,
}

/// Per-job result collection.
#[derive(Debug)]
pub struct RunSummary {
    pub job: &'static str,
    pub processed: u64,
    pub written: u64,
    /// Entities that needed no write (enrichment found nothing).
    pub skipped: u64,
    pub failures: Vec<ItemFailure>,
}

impl RunSummary {
    pub fn new(job: &'static str) -> Self {
        Self {
            job,
            processed: 0,
            written: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    /// Records the outcome for one entity. `Ok(true)` means a write was
    /// made, `Ok(false)` that none was needed. Under [`ErrorPolicy::Abort`]
    /// a failure is returned as the job's error.
    pub fn record(&mut self, entity: &str, outcome: Result<bool>, policy: ErrorPolicy) -> Result<()> {
        self.processed += 1;
        match outcome {
            Ok(true) => self.written += 1,
            Ok(false) => self.skipped += 1,
            Err(err) => match policy {
                ErrorPolicy::Abort => {
                    return Err(err.context(format!("{} failed at '{}'", self.job, entity)));
                }
                ErrorPolicy::KeepGoing => {
                    warn!(job = self.job, entity, error = %format!("{:#}", err), "Entity failed");
                    self.failures.push(ItemFailure {
                        entity: entity.to_string(),
                        error: format!("{:#}", err),
                    });
                }
            },
        }
        Ok(())
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// First line of the printed summary, e.g. `enrich enriquecimento`.
    pub fn header(&self, command: &str, dry_run: bool) -> String {
        if dry_run {
            format!("{} {} (dry-run)", command, self.job)
        } else {
            format!("{} {}", command, self.job)
        }
    }

    pub fn print(&self, command: &str, dry_run: bool) {
        println!("{}", self.header(command, dry_run));
        println!("  processed: {}", self.processed);
        println!("  written: {}", self.written);
        if self.skipped > 0 {
            println!("  skipped: {}", self.skipped);
        }
        println!("  failed: {}", self.failures.len());
        for failure in &self.failures {
            println!("    {}: {}", failure.entity, failure.error);
        }
        if self.is_clean() {
            println!("ok");
        }
    }
}

/// CLI entry point for `wiki migrate <target>`.
///
/// Both connections are closed once the jobs finish, whether they
/// succeeded or not.
pub async fn run_migrate(config: &Config, target: MigrateTarget, options: JobOptions) -> Result<()> {
    let source = db::connect_source(config).await?;
    let store = match db::connect_store(config).await {
        Ok(store) => store,
        Err(err) => {
            source.close().await;
            return Err(err);
        }
    };

    let result = migrate(&source, &store, target, &options).await;

    source.close().await;
    store.close().await;

    report(&result?, "migrate", options.dry_run)
}

/// Runs the jobs selected by `target` in order.
pub async fn migrate(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    target: MigrateTarget,
    options: &JobOptions,
) -> Result<Vec<RunSummary>> {
    let mut summaries = Vec::new();
    if matches!(target, MigrateTarget::Personagens | MigrateTarget::All) {
        summaries.push(migrate_characters(source, store, options).await?);
    }
    if matches!(target, MigrateTarget::Partes | MigrateTarget::All) {
        summaries.push(migrate_arcs(source, store, options).await?);
    }
    if matches!(target, MigrateTarget::Extras | MigrateTarget::All) {
        summaries.extend(migrate_extras(source, store, options).await?);
    }
    Ok(summaries)
}

/// Prints every summary under `command` and fails when any entity failed.
pub fn report(summaries: &[RunSummary], command: &str, dry_run: bool) -> Result<()> {
    for summary in summaries {
        summary.print(command, dry_run);
    }
    let failed: usize = summaries.iter().map(|s| s.failures.len()).sum();
    if failed > 0 {
        bail!("{} entit{} failed", failed, if failed == 1 { "y" } else { "ies" });
    }
    Ok(())
}

/// Rebuilds `personagens`: one document per character with its stand and
/// arc participations embedded.
pub async fn migrate_characters(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    options: &JobOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new("personagens");
    clear(store, Collection::Personagens, options).await?;

    let rows = source.characters().await?;
    info!(count = rows.len(), "Found characters, starting migration");

    let mut shaped = stream::iter(rows)
        .map(|row| async move {
            let nome = row.nome.clone();
            (nome, shape_character(source, row).await)
        })
        .buffered(options.concurrency);

    while let Some((nome, doc)) = shaped.next().await {
        let outcome = match doc {
            Ok(_) if options.dry_run => Ok(true),
            Ok(doc) => store.insert_character(&doc).await.map(|()| true),
            Err(err) => Err(err),
        };
        if matches!(outcome, Ok(true)) {
            debug!("Migrado: {}", nome);
        }
        summary.record(&nome, outcome, options.policy)?;
    }

    info!(written = summary.written, "Character migration finished");
    Ok(summary)
}

async fn shape_character(source: &dyn RelationalSource, row: CharacterRow) -> Result<CharacterDoc> {
    let (stand, participations) = tokio::try_join!(
        source.stand_of(&row.nome),
        source.participations_of(&row.nome)
    )?;
    Ok(character_document(row, stand, participations))
}

/// Rebuilds `partes`: one document per arc, ascending, with its episodes
/// embedded. Each arc is written with its own insert.
pub async fn migrate_arcs(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    options: &JobOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new("partes");
    clear(store, Collection::Partes, options).await?;

    info!("Migrating arcs and episodes");
    let rows = source.arcs().await?;

    let mut shaped = stream::iter(rows)
        .map(|row| async move {
            let numero = row.numero;
            (numero, shape_arc(source, row).await)
        })
        .buffered(options.concurrency);

    while let Some((numero, doc)) = shaped.next().await {
        let outcome = match doc {
            Ok(doc) => {
                let episodes = doc.episodios.len();
                let written = if options.dry_run {
                    Ok(true)
                } else {
                    store.insert_arc(&doc).await.map(|()| true)
                };
                if written.is_ok() {
                    info!("Parte {} migrada com {} episódios", numero, episodes);
                }
                written
            }
            Err(err) => Err(err),
        };
        summary.record(&numero.to_string(), outcome, options.policy)?;
    }

    Ok(summary)
}

async fn shape_arc(source: &dyn RelationalSource, row: ArcRow) -> Result<ArcDoc> {
    let episodes = source.episodes_of(row.numero).await?;
    Ok(arc_document(row, episodes))
}

/// Rebuilds `grupos` with a verbatim copy of every group row.
pub async fn migrate_groups(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    options: &JobOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new("grupos");
    clear(store, Collection::Grupos, options).await?;

    let docs = source.groups().await?;
    summary.processed = docs.len() as u64;
    if !docs.is_empty() {
        if !options.dry_run {
            store.insert_groups(&docs).await?;
        }
        summary.written = docs.len() as u64;
        info!(count = docs.len(), "Groups migrated");
    }
    Ok(summary)
}

/// Rebuilds `batalhas`, nesting each episode range.
pub async fn migrate_battles(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    options: &JobOptions,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new("batalhas");
    clear(store, Collection::Batalhas, options).await?;

    let docs: Vec<_> = source
        .battles()
        .await?
        .into_iter()
        .map(battle_document)
        .collect();
    summary.processed = docs.len() as u64;
    if !docs.is_empty() {
        if !options.dry_run {
            store.insert_battles(&docs).await?;
        }
        summary.written = docs.len() as u64;
        info!(count = docs.len(), "Battles migrated");
    }
    Ok(summary)
}

/// Groups, battles, then the enrichment pass over `personagens`.
pub async fn migrate_extras(
    source: &dyn RelationalSource,
    store: &dyn DocumentStore,
    options: &JobOptions,
) -> Result<Vec<RunSummary>> {
    Ok(vec![
        migrate_groups(source, store, options).await?,
        migrate_battles(source, store, options).await?,
        enrich::enrich_characters(source, store, options).await?,
    ])
}

async fn clear(store: &dyn DocumentStore, collection: Collection, options: &JobOptions) -> Result<()> {
    if options.dry_run {
        return Ok(());
    }
    let removed = store.clear(collection).await?;
    debug!(collection = %collection, removed, "Cleared collection");
    Ok(())
}
