use camino::Utf8PathBuf;

use crate::ontology::OntologyKind;

/// A remote file and where it lives in the local cache tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub url: String,
    pub cache_path: Utf8PathBuf,
}

/// Resolves data categories to (url, cache path) pairs for one organism.
pub trait SourceLayout {
    fn organism_tag(&self) -> &str;
    fn gene_data(&self) -> SourceFile;
    fn ontology(&self, kind: OntologyKind) -> SourceFile;
    fn associations(&self, kind: OntologyKind) -> SourceFile;
    /// Secondary rich-text disease source, when the organism provides one.
    fn disease_supplement(&self) -> Option<SourceFile>;
}

/// WormBase FTP layout for a single species and release.
#[derive(Debug, Clone)]
pub struct WormBaseSources {
    raw_files_source: String,
    cache_location: Utf8PathBuf,
    release_version: String,
    species: String,
    project_id: String,
}

impl WormBaseSources {
    pub fn new(
        raw_files_source: &str,
        cache_location: Utf8PathBuf,
        release_version: &str,
        species: &str,
        project_id: &str,
    ) -> Self {
        Self {
            raw_files_source: raw_files_source.trim_end_matches('/').to_string(),
            cache_location,
            release_version: release_version.to_string(),
            species: species.to_string(),
            project_id: project_id.to_string(),
        }
    }

    pub fn release_version(&self) -> &str {
        &self.release_version
    }

    fn annotation_file(&self, suffix: &str) -> SourceFile {
        let name = format!(
            "{}.{}.{}.{suffix}",
            self.species, self.project_id, self.release_version
        );
        SourceFile {
            url: format!(
                "{}/{}/species/{}/{}/annotation/{name}",
                self.raw_files_source, self.release_version, self.species, self.project_id
            ),
            cache_path: self.annotation_cache_dir().join(name),
        }
    }

    fn annotation_cache_dir(&self) -> Utf8PathBuf {
        self.cache_location
            .join("wormbase")
            .join(&self.release_version)
            .join("species")
            .join(&self.species)
            .join(&self.project_id)
            .join("annotation")
    }

    fn ontology_file(&self, name: &str) -> SourceFile {
        SourceFile {
            url: format!(
                "{}/{}/ONTOLOGY/{name}",
                self.raw_files_source, self.release_version
            ),
            cache_path: self
                .cache_location
                .join("wormbase")
                .join(&self.release_version)
                .join("ONTOLOGY")
                .join(name),
        }
    }
}

impl SourceLayout for WormBaseSources {
    fn organism_tag(&self) -> &str {
        "WB"
    }

    fn gene_data(&self) -> SourceFile {
        self.annotation_file("geneIDs.txt.gz")
    }

    fn ontology(&self, kind: OntologyKind) -> SourceFile {
        match kind {
            OntologyKind::Go => {
                self.ontology_file(&format!("gene_ontology.{}.obo", self.release_version))
            }
            OntologyKind::Disease => {
                self.ontology_file(&format!("disease_ontology.{}.obo", self.release_version))
            }
        }
    }

    fn associations(&self, kind: OntologyKind) -> SourceFile {
        match kind {
            OntologyKind::Go => self.annotation_file("go_annotations.gaf.gz"),
            OntologyKind::Disease => SourceFile {
                url: format!(
                    "{}/{}/ONTOLOGY/disease_association.{}.wb",
                    self.raw_files_source, self.release_version, self.release_version
                ),
                cache_path: self.annotation_file("do_annotations.wb").cache_path,
            },
        }
    }

    fn disease_supplement(&self) -> Option<SourceFile> {
        Some(SourceFile {
            url: format!(
                "{}/{}/ONTOLOGY/disease_association.{}.daf.txt",
                self.raw_files_source, self.release_version, self.release_version
            ),
            cache_path: self.annotation_file("do_annotations.daf.txt").cache_path,
        })
    }
}
