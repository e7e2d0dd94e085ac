//! `packing-audit`: classify stored packing documents and flag suspicious ones.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;
use tracing::{info, warn};

use loomerp_core::{Quantity, UnitOfMeasure};
use loomerp_packing::{PackingMode, PackingTotals, WireError, decode};

/// What the audit found for one stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    /// Position inside the file (0 for a single-document file).
    pub index: usize,
    pub mode: PackingMode,
    pub totals: PackingTotals,
    pub ambiguous: bool,
    pub stored_total_mismatch: Option<Quantity>,
}

impl RecordReport {
    pub fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.ambiguous {
            flags.push("ambiguous".to_string());
        }
        if let Some(stored) = self.stored_total_mismatch {
            flags.push(format!("total-mismatch(stored={stored})"));
        }
        flags
    }

    pub fn render(&self, source: &Path, unit: &UnitOfMeasure) -> String {
        let mut line = format!(
            "{}#{}: {} {}",
            source.display(),
            self.index,
            self.mode,
            self.totals.summary(unit)
        );
        for flag in self.flags() {
            line.push_str(" [");
            line.push_str(&flag);
            line.push(']');
        }
        line
    }
}

/// Totals over one audit run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditOutcome {
    pub records: usize,
    pub ambiguous: usize,
    pub mismatched: usize,
    pub failed_files: usize,
}

/// Audit a parsed document: a single packing object or an array of them.
pub fn audit_value(value: Value) -> Result<Vec<RecordReport>, WireError> {
    let documents = match value {
        Value::Array(items) => items,
        single => vec![single],
    };

    documents
        .into_iter()
        .enumerate()
        .map(|(index, doc)| {
            let decoded = decode(doc)?;
            Ok(RecordReport {
                index,
                mode: decoded.record.mode(),
                totals: decoded.record.totals(),
                ambiguous: decoded.ambiguous,
                stored_total_mismatch: decoded.stored_total_mismatch,
            })
        })
        .collect()
}

pub fn audit_file(path: &Path) -> anyhow::Result<Vec<RecordReport>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    audit_value(value).with_context(|| format!("decoding packing in {}", path.display()))
}

/// Audit every file, writing one line per record to `out`.
///
/// Unreadable files are reported to `out` and counted; they do not stop the
/// run. Only write failures are returned as errors.
pub fn run<W: Write>(
    files: &[PathBuf],
    unit: &UnitOfMeasure,
    out: &mut W,
) -> anyhow::Result<AuditOutcome> {
    let mut outcome = AuditOutcome::default();

    for path in files {
        match audit_file(path) {
            Ok(reports) => {
                for report in &reports {
                    outcome.records += 1;
                    outcome.ambiguous += usize::from(report.ambiguous);
                    outcome.mismatched += usize::from(report.stored_total_mismatch.is_some());
                    writeln!(out, "{}", report.render(path, unit))?;
                }
            }
            Err(err) => {
                outcome.failed_files += 1;
                warn!(file = %path.display(), error = %format!("{err:#}"), "packing audit failed");
                writeln!(out, "{}: error: {err:#}", path.display())?;
            }
        }
    }

    info!(
        records = outcome.records,
        ambiguous = outcome.ambiguous,
        mismatched = outcome.mismatched,
        failed_files = outcome.failed_files,
        "packing audit finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn array_documents_are_reported_per_record() {
        let value = json!([
            { "boxes": [], "loose_pieces": [{ "id": "a", "quantity": 120 }], "total_quantity": 120, "piece_count": 40 },
            { "boxes": [{ "id": "b", "pieces": [{ "id": "c", "quantity": 3.5 }] }], "loose_pieces": [], "total_quantity": 4 }
        ]);

        let reports = audit_value(value).unwrap();
        assert_eq!(reports.len(), 2);

        assert_eq!(reports[0].mode, PackingMode::Quick);
        assert_eq!(reports[0].flags(), vec!["ambiguous".to_string()]);
        assert_eq!(reports[0].totals.pieces, 40);

        assert_eq!(reports[1].mode, PackingMode::Detailed);
        assert!(!reports[1].ambiguous);
        assert_eq!(reports[1].flags(), vec!["total-mismatch(stored=4)".to_string()]);
    }

    #[test]
    fn tagged_quick_records_are_not_ambiguous() {
        let value = json!({
            "boxes": [],
            "loosePieces": [{ "id": "a", "quantity": 10 }],
            "pieceCount": 2,
            "mode": "quick"
        });
        let reports = audit_value(value).unwrap();
        assert!(reports[0].flags().is_empty());
    }

    #[test]
    fn run_reports_and_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(
            &dir,
            "good.json",
            r#"{"boxes":[{"id":"b1","pieces":[{"id":"p1","quantity":3.5},{"id":"p2","quantity":2.5}]}],"loose_pieces":[],"total_quantity":6}"#,
        );
        let bad = write_file(&dir, "bad.json", "{ not json");
        let missing = dir.path().join("missing.json");

        let mut out = Vec::new();
        let outcome = run(
            &[good.clone(), bad, missing],
            &UnitOfMeasure::meter(),
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome.records, 1);
        assert_eq!(outcome.failed_files, 2);
        assert_eq!(outcome.mismatched, 0);

        let text = String::from_utf8(out).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(
            first,
            format!("{}#0: detailed 1 boxes • 2 pieces • 6 Meter", good.display())
        );
        assert_eq!(text.matches(": error: ").count(), 2);
    }

    #[test]
    fn out_of_range_totals_count_as_failed_files() {
        let dir = tempfile::tempdir().unwrap();
        let max = "79228162514264337593543950335";
        let huge = write_file(
            &dir,
            "huge.json",
            &json!({
                "boxes": [],
                "loose_pieces": [{ "id": "a", "quantity": max }, { "id": "b", "quantity": max }]
            })
            .to_string(),
        );
        let good = write_file(
            &dir,
            "good.json",
            r#"{"boxes":[],"loose_pieces":[{"id":"a","quantity":"5"}],"piece_count":"2"}"#,
        );

        let mut out = Vec::new();
        let outcome = run(&[huge, good], &UnitOfMeasure::meter(), &mut out).unwrap();

        assert_eq!(outcome.failed_files, 1);
        assert_eq!(outcome.records, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("out of range"));
        assert!(text.contains("quick 0 boxes • 2 pieces • 5 Meter"));
    }
}
