use std::collections::HashSet;
use std::fs;

use camino::Utf8Path;
use tracing::info;

use crate::annotation::{AssociationSet, RawAnnotation};
use crate::cache::{FileCache, RemoteSource};
use crate::disease::{merge_disease_annotations, parse_daf};
use crate::error::AnnofetchError;
use crate::gaf::parse_gaf;
use crate::gene::GeneCatalog;
use crate::ontology::{Ontology, OntologyKind, OntologyTerm, RenamePatterns};
use crate::select::{Selection, SelectionOptions, select_annotations};
use crate::sources::SourceLayout;

/// Parses an externally-supplied ontology file into the in-memory graph.
/// Graph construction is a collaborator concern; this crate only orchestrates.
pub trait OntologyParser: Send + Sync {
    fn parse(&self, file: &Utf8Path, kind: OntologyKind) -> Result<Ontology, AnnofetchError>;
}

/// Per-load-cycle data, one field per load phase.
///
/// Phases write exactly one field each, so a failed phase leaves previously
/// loaded phases intact and the caller can retry just that phase. The bundle
/// is rebuilt wholesale on the next release, never patched incrementally.
#[derive(Debug, Default)]
pub struct DataBundle {
    pub genes: Option<GeneCatalog>,
    pub go_ontology: Option<Ontology>,
    pub go_associations: Option<AssociationSet>,
    pub disease_ontology: Option<Ontology>,
    pub disease_associations: Option<AssociationSet>,
}

impl DataBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ontology(&self, kind: OntologyKind) -> Option<&Ontology> {
        match kind {
            OntologyKind::Go => self.go_ontology.as_ref(),
            OntologyKind::Disease => self.disease_ontology.as_ref(),
        }
    }

    pub fn associations(&self, kind: OntologyKind) -> Option<&AssociationSet> {
        match kind {
            OntologyKind::Go => self.go_associations.as_ref(),
            OntologyKind::Disease => self.disease_associations.as_ref(),
        }
    }

    /// Strict term lookup for consumers that require ontology membership,
    /// e.g. when rendering a selected annotation's term label.
    pub fn term(
        &self,
        kind: OntologyKind,
        term_id: &str,
    ) -> Result<&OntologyTerm, AnnofetchError> {
        let ontology = self
            .ontology(kind)
            .ok_or(AnnofetchError::NotLoaded(ontology_name(kind)))?;
        ontology
            .term(term_id)
            .ok_or_else(|| AnnofetchError::MissingTerm {
                term: term_id.to_string(),
                ontology: kind.to_string(),
            })
    }

    /// The query interface for downstream description generation: at most
    /// one annotation per term id, plus the selection statistics.
    pub fn annotations_for_gene(
        &self,
        gene_id: &str,
        kind: OntologyKind,
        options: &SelectionOptions,
    ) -> Result<Selection, AnnofetchError> {
        let ontology = self
            .ontology(kind)
            .ok_or(AnnofetchError::NotLoaded(ontology_name(kind)))?;
        let associations = self
            .associations(kind)
            .ok_or(AnnofetchError::NotLoaded(associations_name(kind)))?;
        Ok(select_annotations(
            associations.annotations_for(gene_id),
            ontology,
            options,
        ))
    }
}

fn ontology_name(kind: OntologyKind) -> &'static str {
    match kind {
        OntologyKind::Go => "go ontology",
        OntologyKind::Disease => "disease ontology",
    }
}

fn associations_name(kind: OntologyKind) -> &'static str {
    match kind {
        OntologyKind::Go => "go associations",
        OntologyKind::Disease => "disease associations",
    }
}

/// Phase-by-phase loader: resolves files through the cache, parses them, and
/// writes the results into a [`DataBundle`].
pub struct DataLoader<L: SourceLayout, R: RemoteSource, P: OntologyParser> {
    layout: L,
    cache: FileCache<R>,
    parser: P,
    go_relations: Option<Vec<String>>,
    disease_relations: Option<Vec<String>>,
}

impl<L: SourceLayout, R: RemoteSource, P: OntologyParser> DataLoader<L, R, P> {
    pub fn new(layout: L, cache: FileCache<R>, parser: P) -> Self {
        Self {
            layout,
            cache,
            parser,
            go_relations: None,
            disease_relations: None,
        }
    }

    /// Relation sets used to restrict each ontology subgraph. `None` keeps
    /// every relation.
    pub fn with_relations(
        mut self,
        go_relations: Option<Vec<String>>,
        disease_relations: Option<Vec<String>>,
    ) -> Self {
        self.go_relations = go_relations;
        self.disease_relations = disease_relations;
        self
    }

    fn relations_for(&self, kind: OntologyKind) -> Option<&[String]> {
        match kind {
            OntologyKind::Go => self.go_relations.as_deref(),
            OntologyKind::Disease => self.disease_relations.as_deref(),
        }
    }

    pub fn load_gene_data(&self, bundle: &mut DataBundle) -> Result<(), AnnofetchError> {
        let source = self.layout.gene_data();
        let path = self.cache.resolve(&source.cache_path, &source.url)?;
        let text = fs::read_to_string(path.as_std_path()).map_err(AnnofetchError::filesystem)?;
        let catalog = GeneCatalog::parse(&text, self.layout.organism_tag())?;
        info!(genes = catalog.len(), "loaded gene catalog");
        bundle.genes = Some(catalog);
        Ok(())
    }

    /// Stores an already-parsed ontology. The graph is restricted to the
    /// configured relations and renamed first; depths are annotated last.
    pub fn set_ontology(
        &self,
        bundle: &mut DataBundle,
        kind: OntologyKind,
        ontology: Ontology,
        rename: Option<&RenamePatterns>,
    ) {
        let mut prepared = ontology.restricted_to(self.relations_for(kind));
        if let Some(patterns) = rename {
            prepared.rename_terms(patterns);
        }
        prepared.assign_depths();
        match kind {
            OntologyKind::Go => bundle.go_ontology = Some(prepared),
            OntologyKind::Disease => bundle.disease_ontology = Some(prepared),
        }
    }

    pub fn load_ontology(
        &self,
        bundle: &mut DataBundle,
        kind: OntologyKind,
        rename: Option<&RenamePatterns>,
    ) -> Result<(), AnnofetchError> {
        let source = self.layout.ontology(kind);
        let path = self.cache.resolve(&source.cache_path, &source.url)?;
        let ontology = self.parser.parse(&path, kind)?;
        info!(kind = %kind, terms = ontology.len(), "loaded ontology");
        self.set_ontology(bundle, kind, ontology, rename);
        Ok(())
    }

    /// Stores a pre-assembled record stream as the association set for
    /// `kind`, applying the term exclusion list. The matching ontology must
    /// already be loaded.
    pub fn set_associations(
        &self,
        bundle: &mut DataBundle,
        kind: OntologyKind,
        records: Vec<RawAnnotation>,
        exclusion: &HashSet<String>,
    ) -> Result<(), AnnofetchError> {
        let ontology = bundle
            .ontology(kind)
            .ok_or(AnnofetchError::NotLoaded(ontology_name(kind)))?;
        let set = AssociationSet::build(records, ontology, exclusion);
        info!(kind = %kind, records = set.len(), "loaded associations");
        match kind {
            OntologyKind::Go => bundle.go_associations = Some(set),
            OntologyKind::Disease => bundle.disease_associations = Some(set),
        }
        Ok(())
    }

    /// Loads the association file for `kind`. For the disease ontology the
    /// tabular source is merged with the rich-text supplement: the tabular
    /// file contributes IEA records, the supplement everything else.
    pub fn load_associations(
        &self,
        bundle: &mut DataBundle,
        kind: OntologyKind,
        exclusion: &HashSet<String>,
    ) -> Result<(), AnnofetchError> {
        let source = self.layout.associations(kind);
        let path = self.cache.resolve(&source.cache_path, &source.url)?;
        let text = fs::read_to_string(path.as_std_path()).map_err(AnnofetchError::filesystem)?;
        let records = parse_gaf(&text)?;

        let records = match (kind, self.layout.disease_supplement()) {
            (OntologyKind::Disease, Some(supplement)) => {
                let ontology = bundle
                    .ontology(kind)
                    .ok_or(AnnofetchError::NotLoaded(ontology_name(kind)))?;
                let rich_path = self.cache.resolve(&supplement.cache_path, &supplement.url)?;
                let rich_text =
                    fs::read_to_string(rich_path.as_std_path()).map_err(AnnofetchError::filesystem)?;
                let rich_records = parse_daf(&rich_text)?;
                merge_disease_annotations(records, rich_records, ontology)
            }
            _ => records,
        };
        self.set_associations(bundle, kind, records, exclusion)
    }

    /// Runs every load phase in dependency order: gene catalog first, then
    /// per ontology kind the ontology before its associations.
    pub fn load_all(
        &self,
        bundle: &mut DataBundle,
        params: &LoadParams,
    ) -> Result<(), AnnofetchError> {
        self.load_gene_data(bundle)?;
        self.load_ontology(bundle, OntologyKind::Go, params.go_rename.as_ref())?;
        self.load_associations(bundle, OntologyKind::Go, &params.go_exclusion)?;
        self.load_ontology(bundle, OntologyKind::Disease, params.disease_rename.as_ref())?;
        self.load_associations(bundle, OntologyKind::Disease, &params.disease_exclusion)?;
        Ok(())
    }
}

/// Per-ontology rename patterns and term exclusion lists for a full load.
#[derive(Debug, Default)]
pub struct LoadParams {
    pub go_rename: Option<RenamePatterns>,
    pub disease_rename: Option<RenamePatterns>,
    pub go_exclusion: HashSet<String>,
    pub disease_exclusion: HashSet<String>,
}
