//! Ingestion and reconciliation layer for genomic annotation sources.
//!
//! The crate resolves remote annotation files through a local cache, loads
//! the gene catalog and the ontology-linked association sets for a model
//! organism, merges the two disease-annotation formats into one record
//! stream, and reduces conflicting evidence to a single canonical annotation
//! per gene/term pair for downstream description generation.

pub mod annotation;
pub mod cache;
pub mod config;
pub mod disease;
pub mod error;
pub mod gaf;
pub mod gene;
pub mod ontology;
pub mod repository;
pub mod select;
pub mod sources;

pub use annotation::{AssociationSet, RawAnnotation, SourceFormat};
pub use error::AnnofetchError;
pub use gene::{Gene, GeneCatalog};
pub use ontology::{Ontology, OntologyKind, OntologyTerm, RenamePatterns};
pub use repository::{DataBundle, DataLoader, LoadParams, OntologyParser};
pub use select::{Selection, SelectionOptions, SelectionStats};
