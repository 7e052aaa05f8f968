use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use neo4rs::query;
use tracing::{info, warn};

use oeis_common::EdgeTriple;

use crate::GraphClient;

/// Outcome of one flush over the results buffer.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub batches: usize,
    pub written: usize,
    pub failed_batches: usize,
    pub duration: Duration,
}

/// Narrow seam over query execution. Production code runs against the bolt
/// connection; tests drive the drain loop with a scripted backend.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn run(&self, cypher: &str, params: &[(&str, Vec<String>)]) -> Result<(), neo4rs::Error>;
}

#[async_trait]
impl QueryBackend for GraphClient {
    async fn run(&self, cypher: &str, params: &[(&str, Vec<String>)]) -> Result<(), neo4rs::Error> {
        let mut q = query(cypher);
        for (name, values) in params {
            q = q.param(name, values.clone());
        }
        self.graph.run(q).await
    }
}

/// Write-side wrapper for the graph. Drains extracted triples in fixed-size
/// batches, one upsert transaction per batch.
pub struct GraphWriter<B: QueryBackend = GraphClient> {
    backend: B,
    batch_size: usize,
}

impl<B: QueryBackend> GraphWriter<B> {
    pub fn new(backend: B, batch_size: usize) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
        }
    }

    /// Create the id index used by every MERGE. Safe to run repeatedly.
    pub async fn ensure_indexes(&self) -> Result<(), neo4rs::Error> {
        self.backend
            .run(
                "CREATE INDEX sequence_id IF NOT EXISTS FOR (n:Sequence) ON (n.id)",
                &[],
            )
            .await
    }

    /// Write all triples in batches of `batch_size`. A failed batch falls back
    /// once to the built-in MERGE path; if that also fails the batch is dropped
    /// and logged. A single batch failure never aborts the drain.
    pub async fn flush(&self, triples: &[EdgeTriple]) -> WriteReport {
        let start = Instant::now();
        let mut report = WriteReport::default();
        let total = triples.len();

        if total == 0 {
            report.duration = start.elapsed();
            return report;
        }

        if let Err(e) = self.ensure_indexes().await {
            // MERGE still works without the index, only slower.
            warn!(error = %e, "Failed to create sequence id index, continuing");
        }

        for (index, batch) in triples.chunks(self.batch_size).enumerate() {
            report.batches += 1;

            let written = match self.write_batch(batch).await {
                Ok(()) => batch.len(),
                Err(e) => {
                    warn!(batch = index + 1, error = %e, "Batch upsert failed, trying fallback");
                    match self.write_batch_fallback(batch).await {
                        Ok(written) => written,
                        Err(e2) => {
                            report.failed_batches += 1;
                            warn!(batch = index + 1, error = %e2, "Fallback upsert failed, dropping batch");
                            continue;
                        }
                    }
                }
            };

            report.written += written;
            info!(
                batch = index + 1,
                written = report.written,
                total,
                pct = report.written as f64 / total as f64 * 100.0,
                "Graph batch written"
            );
        }

        report.duration = start.elapsed();
        report
    }

    /// Preferred path: one UNWIND transaction merging both nodes and the
    /// relationship, with the relationship type passed as a parameter to
    /// apoc.merge.relationship. Requires APOC on the server.
    async fn write_batch(&self, batch: &[EdgeTriple]) -> Result<(), neo4rs::Error> {
        let (from_ids, to_ids, rels) = batch_columns(batch);

        self.backend
            .run(
                "UNWIND range(0, size($from_ids) - 1) AS i
                 MERGE (from:Sequence {id: $from_ids[i]})
                 MERGE (to:Sequence {id: $to_ids[i]})
                 WITH from, to, $rels[i] AS rel_type
                 CALL apoc.merge.relationship(from, rel_type, {}, {}, to)
                 YIELD rel
                 RETURN count(*) AS merged",
                &[("from_ids", from_ids), ("to_ids", to_ids), ("rels", rels)],
            )
            .await
    }

    /// Fallback path for servers without APOC: one built-in MERGE query per
    /// relationship type present in the batch. Cypher cannot parameterize a
    /// relationship type, so the label is embedded in the query text, but
    /// only after `valid_rel_type` accepts it. Rejected labels are skipped.
    /// Returns the number of triples actually written.
    async fn write_batch_fallback(&self, batch: &[EdgeTriple]) -> Result<usize, neo4rs::Error> {
        let mut written = 0;

        for (rel_type, pairs) in group_by_relationship(batch) {
            if !valid_rel_type(rel_type) {
                warn!(rel_type, "Rejected relationship type, skipping its edges");
                continue;
            }

            let count = pairs.len();
            let (from_ids, to_ids): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();

            self.backend
                .run(
                    &format!(
                        "UNWIND range(0, size($from_ids) - 1) AS i
                         MERGE (from:Sequence {{id: $from_ids[i]}})
                         MERGE (to:Sequence {{id: $to_ids[i]}})
                         MERGE (from)-[:`{rel_type}`]->(to)"
                    ),
                    &[("from_ids", from_ids), ("to_ids", to_ids)],
                )
                .await?;

            written += count;
        }

        Ok(written)
    }
}

/// Split a batch into the three parallel parameter columns for UNWIND.
fn batch_columns(batch: &[EdgeTriple]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut from_ids = Vec::with_capacity(batch.len());
    let mut to_ids = Vec::with_capacity(batch.len());
    let mut rels = Vec::with_capacity(batch.len());
    for triple in batch {
        from_ids.push(triple.from_id.to_string());
        to_ids.push(triple.to_id.clone());
        rels.push(triple.relationship.clone());
    }
    (from_ids, to_ids, rels)
}

/// Group a batch into (relationship type, [(from, to)]) buckets, preserving a
/// stable order so re-running a failed batch issues identical queries.
fn group_by_relationship(batch: &[EdgeTriple]) -> BTreeMap<&str, Vec<(String, String)>> {
    let mut groups: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
    for triple in batch {
        groups
            .entry(triple.relationship.as_str())
            .or_default()
            .push((triple.from_id.to_string(), triple.to_id.clone()));
    }
    groups
}

/// Allow-list shape check for relationship types embedded in query text.
/// Section names from OEIS pages are short labels like "Cf." or
/// "Adjacent sequences"; anything with backticks, control characters, or
/// unreasonable length is rejected rather than interpolated.
pub fn valid_rel_type(rel_type: &str) -> bool {
    !rel_type.is_empty()
        && rel_type.len() <= 64
        && rel_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use oeis_common::SeqId;

    fn triple(from: u32, to: &str, rel: &str) -> EdgeTriple {
        EdgeTriple {
            from_id: SeqId::from_number(from),
            to_id: to.to_string(),
            relationship: rel.to_string(),
        }
    }

    /// Backend that records every query and fails the paths it is told to.
    #[derive(Default)]
    struct ScriptedBackend {
        fail_index: bool,
        fail_apoc: bool,
        fail_fallback: bool,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn scripted_failure() -> neo4rs::Error {
            neo4rs::Error::UnsupportedVersion("scripted failure".to_string())
        }
    }

    #[async_trait]
    impl QueryBackend for Arc<ScriptedBackend> {
        async fn run(
            &self,
            cypher: &str,
            _params: &[(&str, Vec<String>)],
        ) -> Result<(), neo4rs::Error> {
            self.calls.lock().unwrap().push(cypher.to_string());
            let fail = if cypher.contains("CREATE INDEX") {
                self.fail_index
            } else if cypher.contains("apoc.merge.relationship") {
                self.fail_apoc
            } else {
                self.fail_fallback
            };
            if fail {
                Err(ScriptedBackend::scripted_failure())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_flush_writes_in_batches_via_apoc() {
        let backend = Arc::new(ScriptedBackend::default());
        let writer = GraphWriter::new(Arc::clone(&backend), 2);

        let triples = vec![
            triple(1, "A000002", "Cf."),
            triple(1, "A000003", "Cf."),
            triple(2, "A000004", "Cf."),
        ];
        let report = writer.flush(&triples).await;

        assert_eq!(report.batches, 2);
        assert_eq!(report.written, 3);
        assert_eq!(report.failed_batches, 0);

        let calls = backend.calls();
        assert_eq!(calls.len(), 3); // index + two batches
        assert!(calls[0].contains("CREATE INDEX"));
        assert!(calls[1].contains("apoc.merge.relationship"));
        assert!(calls[2].contains("apoc.merge.relationship"));
    }

    #[tokio::test]
    async fn test_fallback_rescues_failed_batch() {
        let backend = Arc::new(ScriptedBackend {
            fail_apoc: true,
            ..Default::default()
        });
        let writer = GraphWriter::new(Arc::clone(&backend), 10);

        let triples = vec![triple(1, "A000002", "Cf."), triple(1, "A000003", "Cf.")];
        let report = writer.flush(&triples).await;

        assert_eq!(report.batches, 1);
        assert_eq!(report.written, 2);
        assert_eq!(report.failed_batches, 0);

        let fallback = backend
            .calls()
            .into_iter()
            .find(|c| c.contains("[:`Cf.`]"))
            .expect("fallback MERGE should have been issued");
        assert!(!fallback.contains("apoc"));
    }

    #[tokio::test]
    async fn test_failed_batch_is_dropped_and_drain_continues() {
        let backend = Arc::new(ScriptedBackend {
            fail_apoc: true,
            fail_fallback: true,
            ..Default::default()
        });
        let writer = GraphWriter::new(Arc::clone(&backend), 1);

        let triples = vec![triple(1, "A000002", "Cf."), triple(2, "A000003", "Cf.")];
        let report = writer.flush(&triples).await;

        // Both batches attempted despite both failing twice.
        assert_eq!(report.batches, 2);
        assert_eq!(report.failed_batches, 2);
        assert_eq!(report.written, 0);
        assert_eq!(backend.calls().len(), 5); // index + 2 * (apoc + fallback)
    }

    #[tokio::test]
    async fn test_index_failure_is_non_fatal() {
        let backend = Arc::new(ScriptedBackend {
            fail_index: true,
            ..Default::default()
        });
        let writer = GraphWriter::new(Arc::clone(&backend), 10);

        let report = writer.flush(&[triple(1, "A000002", "Cf.")]).await;

        assert_eq!(report.written, 1);
        assert_eq!(report.failed_batches, 0);
    }

    #[tokio::test]
    async fn test_fallback_skips_rejected_labels() {
        let backend = Arc::new(ScriptedBackend {
            fail_apoc: true,
            ..Default::default()
        });
        let writer = GraphWriter::new(Arc::clone(&backend), 10);

        let triples = vec![
            triple(1, "A000002", "Cf."),
            triple(1, "A000003", "X`]->(n) DETACH DELETE n //"),
        ];
        let report = writer.flush(&triples).await;

        // Only the validated label is written; the injection shape never
        // reaches the backend.
        assert_eq!(report.written, 1);
        assert_eq!(report.failed_batches, 0);
        assert!(backend.calls().iter().all(|c| !c.contains("DETACH DELETE")));
    }

    #[tokio::test]
    async fn test_empty_flush_touches_nothing() {
        let backend = Arc::new(ScriptedBackend::default());
        let writer = GraphWriter::new(Arc::clone(&backend), 10);

        let report = writer.flush(&[]).await;

        assert_eq!(report.batches, 0);
        assert_eq!(report.written, 0);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_valid_rel_type_accepts_section_names() {
        assert!(valid_rel_type("Cf."));
        assert!(valid_rel_type("Adjacent sequences"));
        assert!(valid_rel_type("HAS_AUTHOR"));
        assert!(valid_rel_type("CROSSREFS"));
    }

    #[test]
    fn test_valid_rel_type_rejects_injection_shapes() {
        assert!(!valid_rel_type(""));
        assert!(!valid_rel_type("X`]->(n) DETACH DELETE n //"));
        assert!(!valid_rel_type("a\nb"));
        assert!(!valid_rel_type(&"x".repeat(65)));
    }

    #[test]
    fn test_batch_columns_preserve_order() {
        let batch = vec![triple(1, "A000002", "Cf."), triple(1, "A000003", "Cf.")];
        let (from_ids, to_ids, rels) = batch_columns(&batch);
        assert_eq!(from_ids, vec!["A000001", "A000001"]);
        assert_eq!(to_ids, vec!["A000002", "A000003"]);
        assert_eq!(rels, vec!["Cf.", "Cf."]);
    }

    #[test]
    fn test_group_by_relationship() {
        let batch = vec![
            triple(1, "A000002", "Cf."),
            triple(1, "Sloane", "HAS_AUTHOR"),
            triple(2, "A000003", "Cf."),
        ];
        let groups = group_by_relationship(&batch);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Cf."].len(), 2);
        assert_eq!(groups["HAS_AUTHOR"].len(), 1);
    }

    #[test]
    fn test_batch_size_boundary() {
        // Exactly batch_size triples -> one chunk; one more -> two chunks.
        let size = 1000;
        let exact: Vec<EdgeTriple> = (0..size as u32).map(|i| triple(i, "A000001", "Cf.")).collect();
        assert_eq!(exact.chunks(size).count(), 1);

        let over: Vec<EdgeTriple> =
            (0..size as u32 + 1).map(|i| triple(i, "A000001", "Cf.")).collect();
        let chunks: Vec<_> = over.chunks(size).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), size);
        assert_eq!(chunks[1].len(), 1);
    }
}
