use std::collections::HashMap;

use tracing::debug;

use crate::error::AnnofetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gene {
    pub id: String,
    pub name: String,
    pub dead: bool,
    pub pseudo: bool,
}

/// Canonical gene list for one species, keyed by gene id.
///
/// The full catalog, dead and pseudo genes included, stays in memory;
/// filtering happens at iteration time.
#[derive(Debug, Clone, Default)]
pub struct GeneCatalog {
    genes: Vec<Gene>,
    index: HashMap<String, usize>,
}

impl GeneCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated gene list. Column 2 carries the gene id
    /// suffix, prefixed with the organism tag to form the canonical id;
    /// column 3 is the display name, falling back to column 4; column 5
    /// holds the literal `Dead` marker.
    pub fn parse(text: &str, organism_tag: &str) -> Result<Self, AnnofetchError> {
        let mut catalog = Self::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields = line.trim().split(',').collect::<Vec<_>>();
            if fields.len() < 5 {
                return Err(AnnofetchError::Parse {
                    format: "gene list",
                    line: idx + 1,
                    reason: format!("expected at least 5 fields, got {}", fields.len()),
                });
            }
            let name = if fields[2].is_empty() {
                fields[3]
            } else {
                fields[2]
            };
            catalog.insert(Gene {
                id: format!("{organism_tag}:{}", fields[1]),
                name: name.to_string(),
                dead: fields[4] == "Dead",
                pseudo: false,
            });
        }
        debug!(genes = catalog.len(), "parsed gene list");
        Ok(catalog)
    }

    /// Inserts or replaces by id; a replaced gene keeps its position.
    pub fn insert(&mut self, gene: Gene) {
        match self.index.get(&gene.id) {
            Some(&pos) => self.genes[pos] = gene,
            None => {
                self.index.insert(gene.id.clone(), self.genes.len());
                self.genes.push(gene);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Gene> {
        self.index.get(id).map(|&pos| &self.genes[pos])
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Finite, restartable iteration over the catalog in load order.
    pub fn iter(
        &self,
        include_dead: bool,
        include_pseudo: bool,
    ) -> impl Iterator<Item = &Gene> + '_ {
        self.genes
            .iter()
            .filter(move |gene| (include_dead || !gene.dead) && (include_pseudo || !gene.pseudo))
    }
}
