use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ontology::Ontology;

pub const NEGATION_QUALIFIER: &str = "NOT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Tabular,
    RichText,
}

/// One evidence statement linking a subject gene to an ontology term.
/// Several annotations for the same (subject, term) pair are expected.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    pub subject_id: String,
    pub subject_label: String,
    pub subject_type: String,
    pub taxon: String,
    pub term_id: String,
    pub qualifiers: Vec<String>,
    pub evidence_code: String,
    pub references: Vec<String>,
    pub provider: String,
    pub date: String,
    pub source: SourceFormat,
}

impl RawAnnotation {
    pub fn is_negated(&self) -> bool {
        self.qualifiers.iter().any(|q| q == NEGATION_QUALIFIER)
    }
}

/// Raw annotations grouped by subject gene id, in input order.
#[derive(Debug, Clone, Default)]
pub struct AssociationSet {
    by_subject: HashMap<String, Vec<RawAnnotation>>,
    record_count: usize,
}

impl AssociationSet {
    /// Groups records by subject, dropping those whose term is blacklisted.
    ///
    /// No deduplication happens here; duplicates across terms and evidence
    /// codes are preserved for the selector. Records referencing terms
    /// outside the ontology are kept as well, since membership matters only
    /// to downstream consumers.
    pub fn build(
        records: Vec<RawAnnotation>,
        ontology: &Ontology,
        blacklist: &HashSet<String>,
    ) -> Self {
        let mut by_subject: HashMap<String, Vec<RawAnnotation>> = HashMap::new();
        let mut record_count = 0usize;
        let mut unknown_terms = 0usize;
        for record in records {
            if blacklist.contains(&record.term_id) {
                continue;
            }
            if !ontology.contains(&record.term_id) {
                unknown_terms += 1;
            }
            record_count += 1;
            by_subject
                .entry(record.subject_id.clone())
                .or_default()
                .push(record);
        }
        if unknown_terms > 0 {
            debug!(unknown_terms, "association set references terms outside the ontology");
        }
        debug!(
            records = record_count,
            subjects = by_subject.len(),
            "built association set"
        );
        Self {
            by_subject,
            record_count,
        }
    }

    pub fn annotations_for(&self, subject_id: &str) -> &[RawAnnotation] {
        self.by_subject
            .get(subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.by_subject.keys().map(String::as_str)
    }

    pub fn subject_count(&self) -> usize {
        self.by_subject.len()
    }

    pub fn len(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }
}

#[cfg(test)]
pub(crate) fn annotation(subject: &str, term: &str, evidence: &str) -> RawAnnotation {
    RawAnnotation {
        subject_id: subject.to_string(),
        subject_label: String::new(),
        subject_type: "gene".to_string(),
        taxon: String::new(),
        term_id: term.to_string(),
        qualifiers: Vec::new(),
        evidence_code: evidence.to_string(),
        references: Vec::new(),
        provider: String::new(),
        date: String::new(),
        source: SourceFormat::Tabular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklisted_terms_are_dropped() {
        let ontology = Ontology::builder()
            .term("GO:1", "one")
            .term("GO:2", "two")
            .build();
        let records = vec![
            annotation("WB:1", "GO:1", "IDA"),
            annotation("WB:1", "GO:2", "IDA"),
            annotation("WB:2", "GO:2", "IEA"),
        ];
        let blacklist = HashSet::from(["GO:2".to_string()]);

        let set = AssociationSet::build(records, &ontology, &blacklist);
        assert_eq!(set.len(), 1);
        assert_eq!(set.annotations_for("WB:1").len(), 1);
        assert!(set.annotations_for("WB:2").is_empty());
    }

    #[test]
    fn duplicates_and_order_are_preserved() {
        let ontology = Ontology::builder().term("GO:1", "one").build();
        let records = vec![
            annotation("WB:1", "GO:1", "IEA"),
            annotation("WB:1", "GO:1", "EXP"),
            annotation("WB:1", "GO:1", "IEA"),
        ];

        let set = AssociationSet::build(records, &ontology, &HashSet::new());
        let kept = set.annotations_for("WB:1");
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].evidence_code, "IEA");
        assert_eq!(kept[1].evidence_code, "EXP");
        assert_eq!(kept[2].evidence_code, "IEA");
    }

    #[test]
    fn out_of_ontology_terms_are_kept() {
        let ontology = Ontology::builder().term("GO:1", "one").build();
        let records = vec![annotation("WB:1", "GO:999", "IDA")];
        let set = AssociationSet::build(records, &ontology, &HashSet::new());
        assert_eq!(set.annotations_for("WB:1").len(), 1);
    }
}
