use crate::annotation::{RawAnnotation, SourceFormat};
use crate::error::AnnofetchError;

// GAF 2.x column layout
const COL_DB: usize = 0;
const COL_DB_OBJECT_ID: usize = 1;
const COL_SYMBOL: usize = 2;
const COL_QUALIFIER: usize = 3;
const COL_TERM_ID: usize = 4;
const COL_REFERENCES: usize = 5;
const COL_EVIDENCE: usize = 6;
const COL_OBJECT_TYPE: usize = 11;
const COL_TAXON: usize = 12;
const COL_DATE: usize = 13;
const COL_ASSIGNED_BY: usize = 14;
const MIN_COLUMNS: usize = 15;

/// Parses a GAF-style annotation file: `!`-prefixed header block, then one
/// tab-separated record per line.
pub fn parse_gaf(text: &str) -> Result<Vec<RawAnnotation>, AnnofetchError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.starts_with('!') || line.trim().is_empty() {
            continue;
        }
        let fields = line.split('\t').collect::<Vec<_>>();
        if fields.len() < MIN_COLUMNS {
            return Err(AnnofetchError::Parse {
                format: "gaf",
                line: idx + 1,
                reason: format!(
                    "expected at least {MIN_COLUMNS} columns, got {}",
                    fields.len()
                ),
            });
        }
        records.push(RawAnnotation {
            subject_id: subject_id(fields[COL_DB], fields[COL_DB_OBJECT_ID]),
            subject_label: fields[COL_SYMBOL].to_string(),
            subject_type: fields[COL_OBJECT_TYPE].to_string(),
            taxon: fields[COL_TAXON].to_string(),
            term_id: fields[COL_TERM_ID].to_string(),
            qualifiers: split_pipe(fields[COL_QUALIFIER]),
            evidence_code: fields[COL_EVIDENCE].to_string(),
            references: split_pipe(fields[COL_REFERENCES]),
            provider: fields[COL_ASSIGNED_BY].to_string(),
            date: fields[COL_DATE].to_string(),
            source: SourceFormat::Tabular,
        });
    }
    Ok(records)
}

fn subject_id(db: &str, local_id: &str) -> String {
    if local_id.contains(':') || db.is_empty() {
        local_id.to_string()
    } else {
        format!("{db}:{local_id}")
    }
}

pub(crate) fn split_pipe(field: &str) -> Vec<String> {
    field
        .split('|')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
