//! Canonical observation building.
//!
//! Documents are reduced independently (`extract_document`, pure and safe to
//! run in parallel) and then merged in submission order by
//! `ObservationBuilder`. No deduplication happens here: the same amount found
//! in two documents is two observations.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{
    Document, DocumentClass, DocumentContent, Observation, ObservationSet, Origin,
    normalize_header_name,
};
use crate::extract::tabular::{FieldResolution, FieldRule, FieldSource, field_rule, resolve_fields};
use crate::extract::tokens::iter_tokens;

/// Label of the merged set every document contributes to.
pub const PRIMARY_SERIES: &str = "values";

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentDetail {
    Table {
        fields: Vec<String>,
        source: FieldSource,
        nulls_dropped: usize,
        malformed_dropped: usize,
    },
    NoNumericField,
    Text {
        tokens: usize,
    },
    Unsupported {
        extension: String,
    },
    ReadFailed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub name: String,
    pub class: DocumentClass,
    pub observations: usize,
    pub detail: DocumentDetail,
}

/// Where a batch of observations is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesTarget {
    Primary,
    /// A parallel series that is analysed on its own (e.g. balance-sheet `Assets`).
    Parallel(String),
}

/// Observations extracted from a single document, not yet merged.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub name: String,
    pub class: DocumentClass,
    pub batches: Vec<(SeriesTarget, Vec<Observation>)>,
    pub detail: DocumentDetail,
}

/// Reduce one document to observations.
pub fn extract_document(doc: &Document) -> Extraction {
    let (batches, detail) = match &doc.content {
        DocumentContent::Table(records) => {
            let resolution = resolve_fields(records, doc.class);
            table_batches(doc, &resolution)
        }
        DocumentContent::Text(text) => {
            let observations: Vec<Observation> = iter_tokens(text)
                .map(|t| Observation::new(t.value, &doc.name, doc.class, Origin::OcrToken))
                .collect();
            let detail = DocumentDetail::Text {
                tokens: observations.len(),
            };
            (vec![(SeriesTarget::Primary, observations)], detail)
        }
        DocumentContent::Unsupported { extension } => (
            Vec::new(),
            DocumentDetail::Unsupported {
                extension: extension.clone(),
            },
        ),
    };

    Extraction {
        name: doc.name.clone(),
        class: doc.class,
        batches,
        detail,
    }
}

fn table_batches(
    doc: &Document,
    resolution: &FieldResolution,
) -> (Vec<(SeriesTarget, Vec<Observation>)>, DocumentDetail) {
    let columns = resolution.columns();
    let Some(first) = columns.first() else {
        return (Vec::new(), DocumentDetail::NoNumericField);
    };

    let parallel = matches!(field_rule(doc.class), FieldRule::EachOf(_))
        && matches!(resolution, FieldResolution::Designated { .. });

    let batches = columns
        .iter()
        .map(|column| {
            let target = if parallel {
                SeriesTarget::Parallel(designated_label(doc.class, &column.field))
            } else {
                SeriesTarget::Primary
            };
            let observations = column
                .values
                .iter()
                .map(|&v| {
                    Observation::new(
                        v,
                        &doc.name,
                        doc.class,
                        Origin::TabularField {
                            field: column.field.clone(),
                        },
                    )
                })
                .collect();
            (target, observations)
        })
        .collect();

    let detail = DocumentDetail::Table {
        fields: columns.iter().map(|c| c.field.clone()).collect(),
        source: first.source,
        nulls_dropped: columns.iter().map(|c| c.nulls_dropped).sum(),
        malformed_dropped: columns.iter().map(|c| c.malformed_dropped).sum(),
    };
    (batches, detail)
}

/// Canonical spelling of a designated field, so `assets` and `Assets` from
/// different files land in the same series.
fn designated_label(class: DocumentClass, header: &str) -> String {
    let names = match field_rule(class) {
        FieldRule::FirstOf(names) | FieldRule::EachOf(names) => names,
    };
    let normalized = normalize_header_name(header);
    names
        .iter()
        .find(|name| normalize_header_name(name) == normalized)
        .map(|name| name.to_string())
        .unwrap_or_else(|| header.trim().to_string())
}

/// Merged output of a batch of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalObservations {
    pub primary: ObservationSet,
    /// Parallel series, in order of first appearance.
    pub parallel: Vec<ObservationSet>,
    pub documents: Vec<DocumentReport>,
}

impl CanonicalObservations {
    /// Every non-empty set worth analysing: the primary one first.
    pub fn analysable_sets(&self) -> Vec<&ObservationSet> {
        std::iter::once(&self.primary)
            .chain(self.parallel.iter())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn total_observations(&self) -> usize {
        self.primary.len() + self.parallel.iter().map(ObservationSet::len).sum::<usize>()
    }
}

/// Merges extractions in the order they are added.
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    out: CanonicalObservations,
}

impl Default for ObservationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self {
            out: CanonicalObservations {
                primary: ObservationSet::new(PRIMARY_SERIES),
                parallel: Vec::new(),
                documents: Vec::new(),
            },
        }
    }

    pub fn add_document(&mut self, doc: &Document) {
        self.add_extraction(extract_document(doc));
    }

    pub fn add_extraction(&mut self, extraction: Extraction) {
        let mut count = 0;
        for (target, observations) in extraction.batches {
            count += observations.len();
            let set = match target {
                SeriesTarget::Primary => &mut self.out.primary,
                SeriesTarget::Parallel(label) => self.parallel_set(label),
            };
            for observation in observations {
                set.push(observation);
            }
        }

        debug!(document = %extraction.name, observations = count, "merged document");
        self.out.documents.push(DocumentReport {
            name: extraction.name,
            class: extraction.class,
            observations: count,
            detail: extraction.detail,
        });
    }

    /// Record a document that could not be read at all.
    pub fn add_failure(&mut self, name: impl Into<String>, class: DocumentClass, message: impl Into<String>) {
        self.out.documents.push(DocumentReport {
            name: name.into(),
            class,
            observations: 0,
            detail: DocumentDetail::ReadFailed {
                message: message.into(),
            },
        });
    }

    pub fn finish(self) -> CanonicalObservations {
        info!(
            documents = self.out.documents.len(),
            observations = self.out.total_observations(),
            parallel_series = self.out.parallel.len(),
            "observations built"
        );
        self.out
    }

    fn parallel_set(&mut self, label: String) -> &mut ObservationSet {
        let pos = match self.out.parallel.iter().position(|s| s.label == label) {
            Some(pos) => pos,
            None => {
                self.out.parallel.push(ObservationSet::new(label));
                self.out.parallel.len() - 1
            }
        };
        &mut self.out.parallel[pos]
    }
}

/// A document that could not be loaded; it is kept as a `ReadFailed` note.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub name: String,
    pub class: DocumentClass,
    pub message: String,
}

/// Extract all documents (in parallel) and merge them in submission order.
pub fn build_observations(docs: &[Document]) -> CanonicalObservations {
    build_observations_from(docs, |doc| Ok(extract_document(doc)))
}

/// Load and extract every input in parallel, then merge the results in input
/// order. Failed inputs are recorded where they occurred.
pub fn build_observations_from<T, F>(inputs: &[T], extract: F) -> CanonicalObservations
where
    T: Sync,
    F: Fn(&T) -> Result<Extraction, LoadFailure> + Sync,
{
    let extractions: Vec<Result<Extraction, LoadFailure>> = inputs.par_iter().map(&extract).collect();
    let mut builder = ObservationBuilder::new();
    for extraction in extractions {
        match extraction {
            Ok(extraction) => builder.add_extraction(extraction),
            Err(failure) => builder.add_failure(failure.name, failure.class, failure.message),
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cell, RecordSet};

    fn table(name: &str, class: DocumentClass, columns: &[&str], rows: Vec<Vec<Cell>>) -> Document {
        Document {
            name: name.to_string(),
            class,
            content: DocumentContent::Table(RecordSet::from_rows(
                columns.iter().map(|c| c.to_string()).collect(),
                rows,
            )),
        }
    }

    fn text(name: &str, class: DocumentClass, body: &str) -> Document {
        Document {
            name: name.to_string(),
            class,
            content: DocumentContent::Text(body.to_string()),
        }
    }

    #[test]
    fn merges_in_submission_order_without_dedup() {
        let docs = vec![
            table(
                "a.csv",
                DocumentClass::Invoice,
                &["Amount"],
                vec![vec![Cell::Number(10.0)], vec![Cell::Number(20.0)]],
            ),
            text("b.txt", DocumentClass::Invoice, "Total 20.00 and 5.50"),
            table("c.csv", DocumentClass::Invoice, &["Amount"], vec![vec![Cell::Number(10.0)]]),
        ];

        let out = build_observations(&docs);
        assert_eq!(out.primary.values(), vec![10.0, 20.0, 20.0, 5.5, 10.0]);
        assert_eq!(out.primary.observations()[2].source(), "b.txt");
        assert_eq!(out.primary.observations()[2].origin(), &Origin::OcrToken);
        assert_eq!(
            out.primary.observations()[0].origin(),
            &Origin::TabularField {
                field: "Amount".to_string()
            }
        );
        assert_eq!(out.documents.len(), 3);
        assert!(out.parallel.is_empty());
    }

    #[test]
    fn balance_sheet_fields_stay_separate() {
        let docs = vec![
            table(
                "bs1.csv",
                DocumentClass::BalanceSheet,
                &["Assets", "Liabilities"],
                vec![vec![Cell::Number(100.0), Cell::Number(40.0)]],
            ),
            table(
                "bs2.csv",
                DocumentClass::BalanceSheet,
                &["liabilities"],
                vec![vec![Cell::Number(55.0)]],
            ),
            text("bs3.txt", DocumentClass::BalanceSheet, "Cash 12.00"),
        ];

        let out = build_observations(&docs);
        assert_eq!(out.primary.values(), vec![12.0]);
        assert_eq!(out.parallel.len(), 2);
        assert_eq!(out.parallel[0].label, "Assets");
        assert_eq!(out.parallel[0].values(), vec![100.0]);
        assert_eq!(out.parallel[1].label, "Liabilities");
        assert_eq!(out.parallel[1].values(), vec![40.0, 55.0]);
        assert_eq!(out.analysable_sets().len(), 3);
    }

    #[test]
    fn balance_sheet_fallback_goes_to_primary() {
        let docs = vec![table(
            "bs.csv",
            DocumentClass::BalanceSheet,
            &["Equity"],
            vec![vec![Cell::Number(3.0)]],
        )];
        let out = build_observations(&docs);
        assert_eq!(out.primary.values(), vec![3.0]);
        assert!(out.parallel.is_empty());
    }

    #[test]
    fn reports_documents_without_values() {
        let docs = vec![
            table("names.csv", DocumentClass::Payslip, &["Name"], vec![vec![Cell::Text("x".into())]]),
            text("blank.txt", DocumentClass::Payslip, "no amounts here"),
            Document {
                name: "scan.png".to_string(),
                class: DocumentClass::Payslip,
                content: DocumentContent::Unsupported {
                    extension: "png".to_string(),
                },
            },
        ];
        let mut builder = ObservationBuilder::new();
        for doc in &docs {
            builder.add_document(doc);
        }
        builder.add_failure("broken.csv", DocumentClass::Payslip, "bad utf-8");
        let out = builder.finish();

        assert!(out.primary.is_empty());
        assert!(out.analysable_sets().is_empty());
        assert_eq!(out.documents[0].detail, DocumentDetail::NoNumericField);
        assert_eq!(out.documents[1].detail, DocumentDetail::Text { tokens: 0 });
        assert!(matches!(out.documents[2].detail, DocumentDetail::Unsupported { .. }));
        assert!(matches!(out.documents[3].detail, DocumentDetail::ReadFailed { .. }));
    }

    #[test]
    fn failed_inputs_keep_their_position() {
        let inputs = ["a.txt", "missing.csv", "c.txt"];
        let out = build_observations_from(&inputs, |&name| {
            if name == "missing.csv" {
                return Err(LoadFailure {
                    name: name.to_string(),
                    class: DocumentClass::Invoice,
                    message: "not found".to_string(),
                });
            }
            Ok(extract_document(&text(name, DocumentClass::Invoice, "Due 12.50")))
        });

        assert_eq!(out.primary.values(), vec![12.5, 12.5]);
        let names: Vec<&str> = out.documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "missing.csv", "c.txt"]);
        assert_eq!(
            out.documents[1].detail,
            DocumentDetail::ReadFailed {
                message: "not found".to_string()
            }
        );
        assert_eq!(out.documents[1].observations, 0);
    }
}
