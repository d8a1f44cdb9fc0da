//! # JJBA Wiki
//!
//! A knowledge base about the JoJo's Bizarre Adventure franchise.
//!
//! Characters, stands, arcs, episodes, groups, battles, abilities and
//! relationships are curated in a normalized PostgreSQL database. One-shot
//! migration jobs denormalize them into MongoDB documents, and a read-only
//! HTTP API serves those documents to a static front end.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ PostgreSQL  │──▶│  Migration   │──▶│   MongoDB    │
//! │ (source)    │   │ shape+enrich │   │  (jjba_wiki) │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                                             ▼
//!                                       ┌──────────┐
//!                                       │   HTTP   │
//!                                       │   API    │
//!                                       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export pgConnectionString=postgres://localhost/jjba
//! export mongoConnectionString=mongodb://localhost:27017
//! wiki migrate all      # rebuild every collection
//! wiki stats            # counts and fingerprints
//! wiki serve            # API on :3000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Relational rows and document types |
//! | [`source`] | Relational source trait, PostgreSQL and in-memory backends |
//! | [`store`] | Document store trait, MongoDB and in-memory backends |
//! | [`shape`] | Pure row → document transformations |
//! | [`ingest`] | Migration jobs, error policy and run summaries |
//! | [`enrich`] | Enrichment pass over stored characters |
//! | [`views`] | API response shaping |
//! | [`server`] | HTTP API |
//! | [`stats`] | Collection counts and fingerprints |
//! | [`db`] | Connection setup |

pub mod config;
pub mod db;
pub mod enrich;
pub mod ingest;
pub mod models;
pub mod server;
pub mod shape;
pub mod source;
pub mod stats;
pub mod store;
pub mod views;
