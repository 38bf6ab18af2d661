// tessera-core/src/application/importer.rs

use crate::domain::context::Context;
use crate::domain::identifiers::IdentifierMaps;
use crate::domain::record::ItemRecord;
use crate::domain::rules::item_type::RuleTree;
use crate::domain::settings::SettingsStore;
use crate::error::TesseraError;
use crate::ports::reader::SourceRecord;
use crate::ports::writer::ItemWriter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

type AfterStep = Box<dyn Fn() -> Result<(), TesseraError> + Send + Sync>;

/// Outcome of one pipeline run. `success` is false when the writer reported
/// skipped records; hard failures surface as errors instead.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub record_count: usize,
    pub skipped_by_writer: usize,
    pub elapsed_seconds: f64,
    pub records_per_second: f64,
    pub finished_at: String,
}

/// The pipeline driver: iterates source records on a single producer, fans
/// mapping work onto a bounded worker pool, hands finished records to the
/// writer and supervises lifecycle and reporting.
pub struct Importer<I> {
    settings: Arc<SettingsStore>,
    maps: Arc<IdentifierMaps>,
    rules: Arc<RuleTree<I>>,
    after_processing_steps: Vec<(String, AfterStep)>,
}

impl<I: Send + Sync + 'static> Importer<I> {
    pub fn new(
        settings: Arc<SettingsStore>,
        maps: Arc<IdentifierMaps>,
        rules: RuleTree<I>,
    ) -> Self {
        Self {
            settings,
            maps,
            rules: Arc::new(rules),
            after_processing_steps: Vec::new(),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Register a step to run after the stream is drained and the writer is
    /// closed. Steps run in registration order; a failing step aborts the run.
    pub fn after_processing(
        &mut self,
        name: impl Into<String>,
        step: impl Fn() -> Result<(), TesseraError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_processing_steps.push((name.into(), Box::new(step)));
        self
    }

    /// Map a single item through the rule tree. Convenience shortcut around a
    /// one-record context; returns `None` when the record was skipped.
    pub fn map_item(
        &self,
        item: I,
        item_id: impl Into<String>,
    ) -> Result<Option<ItemRecord>, TesseraError> {
        let mut context = Context::new(
            item,
            item_id,
            1,
            self.settings.clone(),
            self.maps.clone(),
        );
        self.rules.map_record(&mut context)?;
        Ok(context.take_output())
    }

    /// Process the whole source stream.
    ///
    /// Pool size ≤ 1 maps records inline on the producer; otherwise up to
    /// `processing_thread_pool` mapping tasks run concurrently and writer
    /// `put` calls happen off the producer. The first captured worker error
    /// halts further submission, in-flight work is drained, and the error is
    /// re-raised; later concurrent errors are intentionally lost.
    pub async fn process<R>(
        &self,
        reader: R,
        writer: Arc<dyn ItemWriter>,
    ) -> Result<ImportReport, TesseraError>
    where
        R: IntoIterator<Item = SourceRecord<I>>,
    {
        // Local filled-in copy so readers of the defaults see them all.
        let settings = {
            let mut settings = (*self.settings).clone();
            settings.fill_in_defaults();
            Arc::new(settings)
        };

        let pool_size = settings.get_usize("processing_thread_pool").unwrap_or(1);
        let batch_size = settings.get_usize("log.batch_size").filter(|n| *n > 0);
        let batch_severity = settings
            .get_str("log.batch_size.severity")
            .unwrap_or_else(|| "info".into());
        let ascii_progress = settings.get_flag("debug_ascii_progress");

        debug!(settings = ?settings, "beginning import with settings");
        info!(
            processing_thread_pool = pool_size,
            rule_count = self.rules.len(),
            "importer starting"
        );

        let start_time = Instant::now();
        let mut batch_start_time = Instant::now();
        let mut count = 0usize;
        let mut tasks: JoinSet<Result<(), TesseraError>> = JoinSet::new();
        let mut captured: Option<TesseraError> = None;

        for SourceRecord { item, item_id } in reader {
            count += 1;
            let position = count;

            // Fail fast: stop submitting as soon as one worker has failed.
            if captured.is_some() {
                break;
            }

            if let Some(batch) = batch_size {
                if count % batch == 0 {
                    if ascii_progress {
                        eprint!(".");
                    }
                    let batch_rps = batch as f64 / batch_start_time.elapsed().as_secs_f64();
                    let overall_rps = count as f64 / start_time.elapsed().as_secs_f64();
                    log_batch(&batch_severity, count, &item_id, batch_rps, overall_rps);
                    batch_start_time = Instant::now();
                }
            }

            let context = Context::new(item, item_id, position, settings.clone(), self.maps.clone());

            if pool_size <= 1 {
                if let Err(err) = run_one(self.rules.clone(), writer.clone(), context).await {
                    captured = Some(err);
                }
            } else {
                // Bounded pool: at most `pool_size` mapping tasks in flight.
                while tasks.len() >= pool_size {
                    if let Some(joined) = tasks.join_next().await {
                        capture_first(joined, &mut captured);
                    }
                }
                tasks.spawn(run_one(self.rules.clone(), writer.clone(), context));
            }
        }

        if ascii_progress {
            eprintln!();
        }

        // Drain: already-submitted tasks run to completion, there is no
        // mid-flight cancellation.
        debug!("shutting down mapper pool");
        while let Some(joined) = tasks.join_next().await {
            capture_first(joined, &mut captured);
        }
        debug!("mapper pool shutdown complete");

        if let Some(err) = captured {
            return Err(err);
        }

        writer.close().await?;

        for (name, step) in &self.after_processing_steps {
            if let Err(err) = step() {
                error!(step = %name, error = %err, "unexpected error executing after-processing step");
                return Err(TesseraError::AfterProcessing {
                    step: name.clone(),
                    source: Box::new(err),
                });
            }
        }

        let elapsed = start_time.elapsed().as_secs_f64();
        let records_per_second = if elapsed > 0.0 { count as f64 / elapsed } else { 0.0 };
        info!(
            record_count = count,
            elapsed_seconds = format!("{:.3}", elapsed).as_str(),
            records_per_second = format!("{:.1}", records_per_second).as_str(),
            "finished import"
        );

        let skipped_by_writer = writer.skipped_count();
        if skipped_by_writer > 0 {
            error!(
                skipped_by_writer,
                "run returning failure due to records skipped by the writer"
            );
        }

        Ok(ImportReport {
            success: skipped_by_writer == 0,
            record_count: count,
            skipped_by_writer,
            elapsed_seconds: elapsed,
            records_per_second,
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// One mapping task: run the rule tree over the context, then either log the
/// skip or hand the record to the writer.
async fn run_one<I>(
    rules: Arc<RuleTree<I>>,
    writer: Arc<dyn ItemWriter>,
    mut context: Context<I>,
) -> Result<(), TesseraError> {
    rules.map_record(&mut context)?;
    if context.is_skipped() {
        debug!(
            position = context.position(),
            message = context.skip_message(),
            "skipped record"
        );
        return Ok(());
    }
    if let Some(record) = context.take_output() {
        writer.put(record).await?;
    }
    Ok(())
}

/// First captured error wins; errors from other in-flight workers are
/// accepted as lost.
fn capture_first(
    joined: Result<Result<(), TesseraError>, JoinError>,
    captured: &mut Option<TesseraError>,
) {
    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(join_err) => Err(TesseraError::InternalError(format!(
            "mapping task panicked: {join_err}"
        ))),
    };
    if let Err(err) = outcome {
        if captured.is_none() {
            *captured = Some(err);
        } else {
            warn!(error = %err, "discarding additional worker error, first one wins");
        }
    }
}

fn log_batch(severity: &str, count: usize, item_id: &str, batch_rps: f64, overall_rps: f64) {
    match severity.to_ascii_lowercase().as_str() {
        "debug" => debug!(
            count,
            item_id,
            "read {count} records; {batch_rps:.0}/s this batch, {overall_rps:.0}/s overall"
        ),
        "warn" => warn!(
            count,
            item_id,
            "read {count} records; {batch_rps:.0}/s this batch, {overall_rps:.0}/s overall"
        ),
        _ => info!(
            count,
            item_id,
            "read {count} records; {batch_rps:.0}/s this batch, {overall_rps:.0}/s overall"
        ),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::identifiers::{Element, ElementSet, ItemType};
    use crate::domain::rules::builder::ImporterBuilder;
    use crate::domain::rules::extract::Extract;
    use crate::domain::rules::predicate::Predicate;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writer that keeps everything it is given, for assertions.
    #[derive(Default)]
    struct CapturingWriter {
        records: Mutex<Vec<ItemRecord>>,
        closes: AtomicUsize,
        skipped: usize,
    }

    #[async_trait]
    impl ItemWriter for CapturingWriter {
        async fn put(&self, record: ItemRecord) -> Result<(), TesseraError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }

        async fn close(&self) -> Result<(), TesseraError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn skipped_count(&self) -> usize {
            self.skipped
        }
    }

    fn sample_maps() -> Arc<IdentifierMaps> {
        Arc::new(IdentifierMaps::from_parts(
            vec![ElementSet { id: 3, name: "Item Type Metadata".into() }],
            vec![Element { id: 50, name: "Birth Date".into(), element_set_id: 3 }],
            vec![
                ItemType { id: 12, name: "Person".into() },
                ItemType { id: 13, name: "Organization".into() },
            ],
            vec![],
            vec![],
        ))
    }

    fn settings_with_pool(pool: usize) -> Arc<SettingsStore> {
        let mut settings = SettingsStore::new();
        settings.set("processing_thread_pool", json!(pool));
        Arc::new(settings)
    }

    /// End-to-end mapping of sample Person/Organization records.
    fn person_org_importer(pool: usize) -> Importer<Value> {
        let maps = sample_maps();
        let mut builder = ImporterBuilder::<Value>::new(maps.clone());
        builder
            .item_type("Person", Predicate::callable(|id| id.contains("person")), |rules| {
                rules.to_field(
                    "identifier",
                    Some(Extract::with_item(|item: &Value, acc| {
                        if let Some(id) = item.get("identifier").and_then(Value::as_str) {
                            // Strip the leading source-system character.
                            acc.push(json!(id[1..].to_string()));
                        }
                        Ok(())
                    })),
                    None,
                )?;
                rules.to_element(
                    "Birth Date",
                    "Item Type Metadata",
                    Some(Extract::with_item(|item: &Value, acc| {
                        if let Some(birth) = item.get("birth") {
                            acc.push(birth.clone());
                        }
                        Ok(())
                    })),
                    None,
                )?;
                Ok(())
            })
            .unwrap()
            .item_type("Organization", Predicate::callable(|id| id.contains("org")), |_| Ok(()))
            .unwrap();
        Importer::new(settings_with_pool(pool), maps, builder.build())
    }

    fn two_records() -> Vec<SourceRecord<Value>> {
        vec![
            SourceRecord::new(json!({"identifier": "X123", "birth": "1823"}), "person_a"),
            SourceRecord::new(json!({}), "org_b"),
        ]
    }

    #[tokio::test]
    async fn test_end_to_end_two_records() {
        let importer = person_org_importer(1);
        let writer = Arc::new(CapturingWriter::default());
        let report = importer.process(two_records(), writer.clone()).await.unwrap();

        assert!(report.success);
        assert_eq!(report.record_count, 2);
        assert_eq!(writer.closes.load(Ordering::SeqCst), 1);

        let records = writer.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        let person = records
            .iter()
            .find(|r| r.item_type_id() == Some(12))
            .unwrap();
        assert_eq!(person.get("identifier"), Some(&json!("123")));
        let texts = person.element_texts();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text, json!("1823"));
        assert_eq!(texts[0].element.id, json!(50));
        let org = records
            .iter()
            .find(|r| r.item_type_id() == Some(13))
            .unwrap();
        assert!(org.element_texts().is_empty());
    }

    #[tokio::test]
    async fn test_pooled_run_maps_every_record() {
        let importer = person_org_importer(4);
        let writer = Arc::new(CapturingWriter::default());
        let records: Vec<_> = (0..50)
            .map(|n| SourceRecord::new(json!({"birth": "1823"}), format!("person_{n}")))
            .collect();
        let report = importer.process(records, writer.clone()).await.unwrap();
        assert!(report.success);
        assert_eq!(report.record_count, 50);
        assert_eq!(writer.records.lock().unwrap().len(), 50);
        assert_eq!(writer.closes.load(Ordering::SeqCst), 1);
    }

    fn failing_importer(pool: usize) -> Importer<Value> {
        let maps = sample_maps();
        let mut builder = ImporterBuilder::<Value>::new(maps.clone());
        builder
            .item_type("Person", Predicate::AlwaysTrue, |rules| {
                rules.to_field(
                    "identifier",
                    Some(Extract::with_context(|_, acc, ctx| {
                        if ctx.position() == 5 {
                            return Err(TesseraError::InternalError("bad record".into()));
                        }
                        acc.push(json!(ctx.position()));
                        Ok(())
                    })),
                    None,
                )?;
                Ok(())
            })
            .unwrap();
        Importer::new(settings_with_pool(pool), maps, builder.build())
    }

    #[tokio::test]
    async fn test_one_bad_record_halts_the_run_inline() {
        let importer = failing_importer(1);
        let writer = Arc::new(CapturingWriter::default());
        let records: Vec<_> = (1..=10)
            .map(|n| SourceRecord::new(json!({}), format!("rec_{n}")))
            .collect();
        let err = importer.process(records, writer.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            TesseraError::Domain(crate::domain::error::DomainError::Mapping { position: 5, .. })
        ));
        // Records 6..10 never reach the writer, and it is never closed.
        assert_eq!(writer.records.lock().unwrap().len(), 4);
        assert_eq!(writer.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_bad_record_halts_the_run_pooled() {
        let importer = failing_importer(3);
        let writer = Arc::new(CapturingWriter::default());
        let records: Vec<_> = (1..=10)
            .map(|n| SourceRecord::new(json!({}), format!("rec_{n}")))
            .collect();
        let err = importer.process(records, writer.clone()).await.unwrap_err();
        assert!(matches!(err, TesseraError::Domain(_)));
        // In-flight tasks may still complete, but the run fails closed.
        assert!(writer.records.lock().unwrap().len() < 10);
    }

    #[tokio::test]
    async fn test_skipped_records_are_dropped_not_written() {
        let maps = sample_maps();
        let mut builder = ImporterBuilder::<Value>::new(maps.clone());
        builder
            .item_type("Person", Predicate::AlwaysTrue, |rules| {
                rules.to_field(
                    "identifier",
                    Some(Extract::with_context(|_, _, ctx| {
                        if ctx.source_item_id().contains("empty") {
                            ctx.skip("no usable metadata");
                        }
                        Ok(())
                    })),
                    None,
                )?;
                Ok(())
            })
            .unwrap();
        let importer = Importer::new(settings_with_pool(1), maps, builder.build());
        let writer = Arc::new(CapturingWriter::default());
        let records = vec![
            SourceRecord::new(json!({}), "good_1"),
            SourceRecord::new(json!({}), "empty_2"),
            SourceRecord::new(json!({}), "good_3"),
        ];
        let report = importer.process(records, writer.clone()).await.unwrap();
        assert!(report.success);
        assert_eq!(report.record_count, 3);
        assert_eq!(writer.records.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_writer_skips_downgrade_result_without_raising() {
        let importer = person_org_importer(1);
        let writer = Arc::new(CapturingWriter {
            skipped: 2,
            ..Default::default()
        });
        let report = importer.process(two_records(), writer).await.unwrap();
        assert!(!report.success);
        assert_eq!(report.skipped_by_writer, 2);
    }

    #[tokio::test]
    async fn test_after_processing_steps_run_and_failures_reraise() {
        let mut importer = person_org_importer(1);
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();
        importer.after_processing("bump", move || {
            ran_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        importer.after_processing("explode", || {
            Err(TesseraError::InternalError("postflight failed".into()))
        });
        let writer = Arc::new(CapturingWriter::default());
        let err = importer.process(two_records(), writer.clone()).await.unwrap_err();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(matches!(err, TesseraError::AfterProcessing { step, .. } if step == "explode"));
        // The writer was already closed before the steps ran.
        assert_eq!(writer.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_map_item_shortcut() {
        let importer = person_org_importer(1);
        let record = importer
            .map_item(json!({"identifier": "X9", "birth": "1850"}), "person_z")
            .unwrap()
            .unwrap();
        assert_eq!(record.get("identifier"), Some(&json!("9")));

        let skipped = importer.map_item(json!({}), "dataset_unmatched").unwrap();
        assert!(skipped.is_none());
    }
}
