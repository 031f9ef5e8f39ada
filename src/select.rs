use std::collections::HashMap;

use tracing::debug;

use crate::annotation::RawAnnotation;
use crate::ontology::Ontology;

/// Default evidence-code priorities in ascending order: later entries win.
pub fn default_priority_list() -> Vec<String> {
    [
        "IEA", "RCA", "IRD", "IKR", "IBD", "IBA", "IGC", "ISM", "ISA", "ISO", "ISS", "IC",
        "IEP", "IGI", "IMP", "IPI", "IDA", "EXP",
    ]
    .iter()
    .map(|code| code.to_string())
    .collect()
}

#[derive(Debug, Clone)]
pub struct SelectionOptions {
    pub include_obsolete: bool,
    pub include_negative: bool,
    /// Both a filter and a ranking: codes absent from the list are discarded,
    /// and among duplicates for a term the highest-ranked code wins.
    pub priority_list: Vec<String>,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            include_obsolete: false,
            include_negative: false,
            priority_list: default_priority_list(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Count after the obsolescence/negation filters, before priority dedup.
    pub total_annotations: usize,
    /// Size of the deduplicated result.
    pub prioritized_annotations: usize,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub annotations: Vec<RawAnnotation>,
    pub stats: SelectionStats,
}

/// Reduces one gene's raw annotations to exactly one per term id.
///
/// Ties on rank keep the first-encountered annotation; the result preserves
/// first-seen term order.
pub fn select_annotations(
    annotations: &[RawAnnotation],
    ontology: &Ontology,
    options: &SelectionOptions,
) -> Selection {
    let filtered = annotations
        .iter()
        .filter(|a| {
            (options.include_obsolete || !ontology.is_obsolete(&a.term_id))
                && (options.include_negative || !a.is_negated())
        })
        .collect::<Vec<_>>();
    let total_annotations = filtered.len();

    let rank = options
        .priority_list
        .iter()
        .enumerate()
        .map(|(idx, code)| (code.as_str(), idx))
        .collect::<HashMap<_, _>>();

    let mut selected: Vec<&RawAnnotation> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for annotation in filtered {
        let Some(&candidate_rank) = rank.get(annotation.evidence_code.as_str()) else {
            continue;
        };
        match position.get(annotation.term_id.as_str()) {
            Some(&idx) => {
                let current_rank = rank[selected[idx].evidence_code.as_str()];
                if candidate_rank > current_rank {
                    selected[idx] = annotation;
                }
            }
            None => {
                position.insert(annotation.term_id.as_str(), selected.len());
                selected.push(annotation);
            }
        }
    }

    let stats = SelectionStats {
        total_annotations,
        prioritized_annotations: selected.len(),
    };
    debug!(
        total = stats.total_annotations,
        selected = stats.prioritized_annotations,
        "selected canonical annotations"
    );
    Selection {
        annotations: selected.into_iter().cloned().collect(),
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::annotation;

    fn options(priority: &[&str]) -> SelectionOptions {
        SelectionOptions {
            include_obsolete: false,
            include_negative: false,
            priority_list: priority.iter().map(|code| code.to_string()).collect(),
        }
    }

    fn empty_ontology() -> Ontology {
        Ontology::builder().build()
    }

    #[test]
    fn later_priority_entries_win() {
        let annotations = vec![
            annotation("G1", "T1", "IEA"),
            annotation("G1", "T1", "EXP"),
        ];
        let selection =
            select_annotations(&annotations, &empty_ontology(), &options(&["IEA", "EXP"]));
        assert_eq!(selection.annotations.len(), 1);
        assert_eq!(selection.annotations[0].evidence_code, "EXP");
        assert_eq!(selection.stats.total_annotations, 2);
        assert_eq!(selection.stats.prioritized_annotations, 1);
    }

    #[test]
    fn equal_rank_keeps_first_encountered() {
        let mut first = annotation("G1", "T1", "IMP");
        first.provider = "first".to_string();
        let mut second = annotation("G1", "T1", "IMP");
        second.provider = "second".to_string();

        let selection = select_annotations(
            &[first, second],
            &empty_ontology(),
            &options(&["IEA", "IMP"]),
        );
        assert_eq!(selection.annotations.len(), 1);
        assert_eq!(selection.annotations[0].provider, "first");
    }

    #[test]
    fn codes_outside_priority_list_are_discarded() {
        let annotations = vec![
            annotation("G1", "T1", "ND"),
            annotation("G1", "T2", "IMP"),
        ];
        let selection = select_annotations(&annotations, &empty_ontology(), &options(&["IMP"]));
        assert_eq!(selection.annotations.len(), 1);
        assert_eq!(selection.annotations[0].term_id, "T2");
        // the discard happens after the count statistic
        assert_eq!(selection.stats.total_annotations, 2);
    }

    #[test]
    fn obsolete_terms_are_filtered_unless_included() {
        let ontology = Ontology::builder()
            .obsolete_term("T1", "gone")
            .term("T2", "kept")
            .build();
        let annotations = vec![
            annotation("G1", "T1", "IMP"),
            annotation("G1", "T2", "IMP"),
        ];

        let selection = select_annotations(&annotations, &ontology, &options(&["IMP"]));
        assert_eq!(selection.annotations.len(), 1);
        assert_eq!(selection.annotations[0].term_id, "T2");

        let mut opts = options(&["IMP"]);
        opts.include_obsolete = true;
        let selection = select_annotations(&annotations, &ontology, &opts);
        assert_eq!(selection.annotations.len(), 2);
    }

    #[test]
    fn negated_annotations_are_filtered_unless_included() {
        let mut negated = annotation("G1", "T1", "IMP");
        negated.qualifiers = vec!["NOT".to_string()];
        let annotations = vec![negated, annotation("G1", "T2", "IMP")];

        let selection = select_annotations(&annotations, &empty_ontology(), &options(&["IMP"]));
        assert_eq!(selection.annotations.len(), 1);
        assert_eq!(selection.stats.total_annotations, 1);

        let mut opts = options(&["IMP"]);
        opts.include_negative = true;
        let selection = select_annotations(&annotations, &empty_ontology(), &opts);
        assert_eq!(selection.annotations.len(), 2);
    }

    #[test]
    fn result_preserves_first_seen_term_order() {
        let annotations = vec![
            annotation("G1", "T3", "IMP"),
            annotation("G1", "T1", "IMP"),
            annotation("G1", "T3", "EXP"),
            annotation("G1", "T2", "IMP"),
        ];
        let selection = select_annotations(
            &annotations,
            &empty_ontology(),
            &options(&["IMP", "EXP"]),
        );
        let terms = selection
            .annotations
            .iter()
            .map(|a| a.term_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(terms, vec!["T3", "T1", "T2"]);
        assert_eq!(selection.annotations[0].evidence_code, "EXP");
    }

    #[test]
    fn at_most_one_annotation_per_term() {
        // deterministic pseudo-random evidence sets
        let codes = ["IEA", "ISS", "IMP", "IDA", "EXP"];
        let mut state = 0x2545f491u64;
        let mut annotations = Vec::new();
        for _ in 0..500 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let term = format!("T{}", state % 17);
            let code = codes[(state >> 32) as usize % codes.len()];
            annotations.push(annotation("G1", &term, code));
        }

        let selection = select_annotations(&annotations, &empty_ontology(), &options(&codes));
        let mut seen = std::collections::HashSet::new();
        for a in &selection.annotations {
            assert!(seen.insert(a.term_id.clone()), "duplicate term {}", a.term_id);
        }
        assert_eq!(
            selection.stats.prioritized_annotations,
            selection.annotations.len()
        );
    }
}
