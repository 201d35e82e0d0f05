// adstar-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)] // On autorise le manque de doc pour le moment

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- MODULES HEXAGONAUX ---

// 1. Ports (Interfaces / Traits)
// Définit les contrats (StagingSource, WarningSink, Connector)
pub mod ports;

// 2. Domain (Cœur du métier)
// Dimensions, bridge, faits, KPIs, avertissements...
// Ne dépend que des Ports.
pub mod domain;

// 3. Infrastructure (Adapters)
// Implémentation technique (CSV, DuckDB, Config YAML, tracing)
// Dépend du Domain et des Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Orchestration (Pipeline, Publication, Rapport, Clean)
// Dépend du Domain, de l'Infra et des Ports.
pub mod application;

// --- GESTION DES ERREURS GLOBALE ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// Permet d'importer l'erreur principale facilement : use adstar_core::AdstarError;
pub use error::AdstarError;
