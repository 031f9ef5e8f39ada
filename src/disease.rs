use tracing::debug;

use crate::annotation::{RawAnnotation, SourceFormat};
use crate::error::AnnofetchError;
use crate::gaf::split_pipe;
use crate::ontology::Ontology;

/// Evidence code marking auto-generated, lower-confidence annotations.
pub const ELECTRONIC_EVIDENCE: &str = "IEA";

// disease-association file column layout
const COL_TAXON: usize = 0;
const COL_OBJECT_TYPE: usize = 1;
const COL_OBJECT_ID: usize = 2;
const COL_OBJECT_SYMBOL: usize = 3;
const COL_QUALIFIER: usize = 9;
const COL_TERM_ID: usize = 10;
const COL_EVIDENCE: usize = 16;
const COL_REFERENCES: usize = 18;
const COL_DATE: usize = 19;
const COL_PROVIDER: usize = 20;
const MIN_COLUMNS: usize = 21;

/// Parses the rich-text disease-association format: `!`-prefixed comment
/// lines, exactly one header line, then tab-separated rows.
pub fn parse_daf(text: &str) -> Result<Vec<RawAnnotation>, AnnofetchError> {
    let mut records = Vec::new();
    let mut header_seen = false;
    for (idx, line) in text.lines().enumerate() {
        if line.trim().starts_with('!') {
            continue;
        }
        if !header_seen {
            header_seen = true;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let fields = line.split('\t').collect::<Vec<_>>();
        if fields.len() < MIN_COLUMNS {
            return Err(AnnofetchError::Parse {
                format: "disease association",
                line: idx + 1,
                reason: format!(
                    "expected at least {MIN_COLUMNS} columns, got {}",
                    fields.len()
                ),
            });
        }
        records.push(RawAnnotation {
            subject_id: fields[COL_OBJECT_ID].to_string(),
            subject_label: fields[COL_OBJECT_SYMBOL].to_string(),
            subject_type: fields[COL_OBJECT_TYPE].to_string(),
            taxon: fields[COL_TAXON].to_string(),
            term_id: fields[COL_TERM_ID].to_string(),
            qualifiers: split_pipe(fields[COL_QUALIFIER]),
            evidence_code: fields[COL_EVIDENCE].to_string(),
            references: split_pipe(fields[COL_REFERENCES]),
            provider: fields[COL_PROVIDER].to_string(),
            date: fields[COL_DATE].to_string(),
            source: SourceFormat::RichText,
        });
    }
    Ok(records)
}

/// Unions the two disease-annotation sources into one record stream.
///
/// Each format is authoritative for a disjoint evidence partition: the
/// tabular file contributes only its IEA records, the rich-text file only
/// its non-IEA records whose term exists in the disease ontology. Merging
/// partitions by evidence code instead of deduplicating by key, so neither
/// source doubles nor drops the other's evidence.
pub fn merge_disease_annotations(
    tabular: Vec<RawAnnotation>,
    rich_text: Vec<RawAnnotation>,
    ontology: &Ontology,
) -> Vec<RawAnnotation> {
    let mut merged = tabular
        .into_iter()
        .filter(|record| record.evidence_code == ELECTRONIC_EVIDENCE)
        .collect::<Vec<_>>();
    let tabular_kept = merged.len();
    merged.extend(rich_text.into_iter().filter(|record| {
        ontology.contains(&record.term_id) && record.evidence_code != ELECTRONIC_EVIDENCE
    }));
    debug!(
        tabular = tabular_kept,
        rich_text = merged.len() - tabular_kept,
        "merged disease annotation sources"
    );
    merged
}
