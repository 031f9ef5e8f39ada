use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::cache::default_cache_root;
use crate::error::AnnofetchError;
use crate::ontology::RenamePatterns;
use crate::repository::LoadParams;
use crate::sources::WormBaseSources;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub raw_files_source: String,
    pub release_version: String,
    pub species: String,
    pub project_id: String,
    #[serde(default)]
    pub cache_location: Option<String>,
    #[serde(default)]
    pub use_cache: bool,
    #[serde(default)]
    pub go_relations: Option<Vec<String>>,
    #[serde(default)]
    pub disease_relations: Option<Vec<String>>,
    #[serde(default)]
    pub go_rename_patterns: Vec<RenamePair>,
    #[serde(default)]
    pub disease_rename_patterns: Vec<RenamePair>,
    #[serde(default)]
    pub go_terms_exclusion: Vec<String>,
    #[serde(default)]
    pub disease_terms_exclusion: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RenamePair {
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug)]
pub struct ResolvedConfig {
    pub sources: WormBaseSources,
    pub use_cache: bool,
    pub go_relations: Option<Vec<String>>,
    pub disease_relations: Option<Vec<String>>,
    pub load_params: LoadParams,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, AnnofetchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("annofetch.json"),
        };
        let content = fs::read_to_string(&config_path)
            .map_err(|_| AnnofetchError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| AnnofetchError::ConfigParse(err.to_string()))?;
        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, AnnofetchError> {
        let cache_location = match config.cache_location {
            Some(location) => Utf8PathBuf::from(location),
            None => default_cache_root()?,
        };
        let sources = WormBaseSources::new(
            &config.raw_files_source,
            cache_location,
            &config.release_version,
            &config.species,
            &config.project_id,
        );
        let load_params = LoadParams {
            go_rename: compile_patterns(&config.go_rename_patterns)?,
            disease_rename: compile_patterns(&config.disease_rename_patterns)?,
            go_exclusion: config.go_terms_exclusion.into_iter().collect::<HashSet<_>>(),
            disease_exclusion: config
                .disease_terms_exclusion
                .into_iter()
                .collect::<HashSet<_>>(),
        };
        Ok(ResolvedConfig {
            sources,
            use_cache: config.use_cache,
            go_relations: config.go_relations,
            disease_relations: config.disease_relations,
            load_params,
        })
    }
}

fn compile_patterns(pairs: &[RenamePair]) -> Result<Option<RenamePatterns>, AnnofetchError> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let patterns = RenamePatterns::from_pairs(
        pairs
            .iter()
            .map(|pair| (pair.pattern.as_str(), pair.replacement.as_str())),
    )?;
    Ok(Some(patterns))
}
