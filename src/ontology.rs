use std::collections::{HashMap, VecDeque};
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AnnofetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OntologyKind {
    Go,
    Disease,
}

impl fmt::Display for OntologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OntologyKind::Go => write!(f, "go"),
            OntologyKind::Disease => write!(f, "disease"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OntologyTerm {
    pub id: String,
    pub label: String,
    pub obsolete: bool,
    pub depth: Option<u32>,
}

#[derive(Debug, Clone)]
struct ParentLink {
    parent: String,
    relation: String,
}

/// In-memory term graph at the collaborator boundary.
///
/// Construction happens outside this crate (an OBO parser, a test fixture);
/// the loader only restricts relations, renames labels, and annotates depths.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    terms: HashMap<String, OntologyTerm>,
    parents: HashMap<String, Vec<ParentLink>>,
}

impl Ontology {
    pub fn builder() -> OntologyBuilder {
        OntologyBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term_id: &str) -> bool {
        self.terms.contains_key(term_id)
    }

    pub fn term(&self, term_id: &str) -> Option<&OntologyTerm> {
        self.terms.get(term_id)
    }

    pub fn label(&self, term_id: &str) -> Option<&str> {
        self.terms.get(term_id).map(|term| term.label.as_str())
    }

    pub fn depth(&self, term_id: &str) -> Option<u32> {
        self.terms.get(term_id).and_then(|term| term.depth)
    }

    /// Unknown terms answer `false`; membership checks are a separate concern.
    pub fn is_obsolete(&self, term_id: &str) -> bool {
        self.terms
            .get(term_id)
            .map(|term| term.obsolete)
            .unwrap_or(false)
    }

    pub fn parents(&self, term_id: &str) -> Vec<&str> {
        self.parents
            .get(term_id)
            .map(|links| links.iter().map(|link| link.parent.as_str()).collect())
            .unwrap_or_default()
    }

    /// Non-obsolete terms without parent links, sorted by id.
    pub fn roots(&self) -> Vec<&str> {
        let mut roots = self
            .terms
            .values()
            .filter(|term| {
                !term.obsolete
                    && self
                        .parents
                        .get(&term.id)
                        .map(|links| links.is_empty())
                        .unwrap_or(true)
            })
            .map(|term| term.id.as_str())
            .collect::<Vec<_>>();
        roots.sort_unstable();
        roots
    }

    /// Ids of terms whose label matches the pattern, sorted by id.
    pub fn search(&self, pattern: &Regex) -> Vec<String> {
        let mut ids = self
            .terms
            .values()
            .filter(|term| pattern.is_match(&term.label))
            .map(|term| term.id.clone())
            .collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    /// Copy of the graph keeping only parent links whose relation is listed.
    /// `None` keeps every link.
    pub fn restricted_to(&self, relations: Option<&[String]>) -> Ontology {
        let parents = match relations {
            None => self.parents.clone(),
            Some(keep) => self
                .parents
                .iter()
                .map(|(child, links)| {
                    let kept = links
                        .iter()
                        .filter(|link| keep.iter().any(|rel| rel == &link.relation))
                        .cloned()
                        .collect::<Vec<_>>();
                    (child.clone(), kept)
                })
                .collect(),
        };
        Ontology {
            terms: self.terms.clone(),
            parents,
        }
    }

    /// Applies substitution pairs in caller order. A later pattern may
    /// re-match a label already rewritten by an earlier one.
    pub fn rename_terms(&mut self, patterns: &RenamePatterns) {
        for (pattern, target) in &patterns.patterns {
            for id in self.search(pattern) {
                if let Some(term) = self.terms.get_mut(&id) {
                    term.label = pattern.replace_all(&term.label, target.as_str()).into_owned();
                }
            }
        }
    }

    /// Breadth-first distance from the nearest root, recorded on every
    /// reachable term. Run once per load, after restriction and renaming.
    pub fn assign_depths(&mut self) {
        let roots = self
            .roots()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for (child, links) in &self.parents {
            for link in links {
                children
                    .entry(link.parent.as_str())
                    .or_default()
                    .push(child.as_str());
            }
        }

        let mut depths: HashMap<String, u32> = HashMap::new();
        for root in &roots {
            let mut queue = VecDeque::new();
            queue.push_back((root.clone(), 0u32));
            while let Some((id, depth)) = queue.pop_front() {
                match depths.get(&id) {
                    Some(existing) if *existing <= depth => continue,
                    _ => {}
                }
                depths.insert(id.clone(), depth);
                if let Some(kids) = children.get(id.as_str()) {
                    for kid in kids {
                        queue.push_back((kid.to_string(), depth + 1));
                    }
                }
            }
        }

        for (id, depth) in depths {
            if let Some(term) = self.terms.get_mut(&id) {
                term.depth = Some(depth);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct OntologyBuilder {
    ontology: Ontology,
}

impl OntologyBuilder {
    pub fn term(mut self, id: &str, label: &str) -> Self {
        self.ontology.terms.insert(
            id.to_string(),
            OntologyTerm {
                id: id.to_string(),
                label: label.to_string(),
                obsolete: false,
                depth: None,
            },
        );
        self
    }

    pub fn obsolete_term(mut self, id: &str, label: &str) -> Self {
        self.ontology.terms.insert(
            id.to_string(),
            OntologyTerm {
                id: id.to_string(),
                label: label.to_string(),
                obsolete: true,
                depth: None,
            },
        );
        self
    }

    pub fn parent(mut self, child: &str, parent: &str, relation: &str) -> Self {
        self.ontology
            .parents
            .entry(child.to_string())
            .or_default()
            .push(ParentLink {
                parent: parent.to_string(),
                relation: relation.to_string(),
            });
        self
    }

    pub fn build(self) -> Ontology {
        self.ontology
    }
}

/// Ordered regex substitution pairs for term renaming.
#[derive(Debug, Clone, Default)]
pub struct RenamePatterns {
    patterns: Vec<(Regex, String)>,
}

impl RenamePatterns {
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, AnnofetchError> {
        let mut patterns = Vec::new();
        for (pattern, target) in pairs {
            let compiled = Regex::new(pattern)
                .map_err(|err| AnnofetchError::InvalidPattern(err.to_string()))?;
            patterns.push((compiled, target.to_string()));
        }
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sample() -> Ontology {
        Ontology::builder()
            .term("GO:1", "biological_process")
            .term("GO:2", "cell cycle")
            .term("GO:3", "mitotic cell cycle")
            .obsolete_term("GO:4", "old process")
            .parent("GO:2", "GO:1", "subClassOf")
            .parent("GO:3", "GO:2", "subClassOf")
            .parent("GO:3", "GO:1", "BFO:0000050")
            .build()
    }

    #[test]
    fn roots_exclude_obsolete_terms() {
        let ontology = sample();
        assert_eq!(ontology.roots(), vec!["GO:1"]);
    }

    #[test]
    fn restriction_drops_unlisted_relations() {
        let ontology = sample();
        let restricted = ontology.restricted_to(Some(&["subClassOf".to_string()]));
        assert_eq!(restricted.parents("GO:3"), vec!["GO:2"]);
        assert!(restricted.contains("GO:3"));

        let full = ontology.restricted_to(None);
        assert_eq!(full.parents("GO:3").len(), 2);
    }

    #[test]
    fn rename_applies_patterns_in_order() {
        let mut ontology = Ontology::builder()
            .term("GO:10", "dauer larval development")
            .build();
        let patterns = RenamePatterns::from_pairs([
            ("dauer", "dormant"),
            ("dormant larval", "dormant stage larval"),
        ])
        .unwrap();
        ontology.rename_terms(&patterns);
        assert_eq!(
            ontology.label("GO:10"),
            Some("dormant stage larval development")
        );
    }

    #[test]
    fn invalid_rename_pattern_is_rejected() {
        let err = RenamePatterns::from_pairs([("[unclosed", "x")]).unwrap_err();
        assert_matches!(err, AnnofetchError::InvalidPattern(_));
    }

    #[test]
    fn depths_follow_shortest_path_to_root() {
        let mut ontology = sample();
        ontology.assign_depths();
        assert_eq!(ontology.depth("GO:1"), Some(0));
        assert_eq!(ontology.depth("GO:2"), Some(1));
        // direct part-of link to the root is shorter than the is-a chain
        assert_eq!(ontology.depth("GO:3"), Some(1));
    }

    #[test]
    fn unknown_term_is_not_obsolete() {
        let ontology = sample();
        assert!(!ontology.is_obsolete("GO:999"));
        assert!(ontology.is_obsolete("GO:4"));
    }
}
