//! The control loop: poll → dispatch extractors → aggregate → write →
//! commit-or-skip, per §4.9. Runs as a single cooperative task; the only
//! suspension points are `poll`, `write`, `commit`, and the cancellation
//! check between updates.

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::consumer::Consumer;
use crate::error::ConsumerError;
use crate::extractors::ExtractorRegistry;
use crate::path::Path;
use crate::proto;
use crate::record::RecordMeta;
use crate::schema::Schema;
use crate::writer::Sink;
use crate::{aggregator, metrics as metric_names, wire};

pub struct Processor {
    consumer: Consumer,
    sink: Box<dyn Sink>,
    registry: ExtractorRegistry,
    schema: Schema,
}

impl Processor {
    pub fn new(consumer: Consumer, sink: Box<dyn Sink>, schema: Schema) -> Self {
        Self {
            consumer,
            sink,
            registry: ExtractorRegistry::new(),
            schema,
        }
    }

    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                self.consumer.close();
                tracing::info!("processor shutting down");
                return;
            }

            let notifications = match self.poll_once().await {
                Ok(n) => n,
                Err(err @ ConsumerError::Decode(_)) => {
                    tracing::warn!(%err, "failed to decode message body");
                    metrics::counter!(metric_names::UNMARSHAL_ERRORS_TOTAL).increment(1);
                    continue;
                }
                Err(err) => {
                    tracing::warn!(%err, "kafka fetch failed");
                    metrics::counter!(metric_names::FETCH_ERRORS_TOTAL).increment(1);
                    continue;
                }
            };

            if notifications.is_empty() {
                continue;
            }

            let started = Instant::now();
            let records = self.extract_batch(&notifications, &cancel);
            let records = aggregator::aggregate(records);
            metrics::histogram!(metric_names::PROCESSING_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());

            if records.is_empty() {
                continue;
            }

            match self.sink.write(&records).await {
                Ok(()) => match self.consumer.commit().await {
                    Ok(()) => {
                        metrics::counter!(metric_names::RECORDS_PROCESSED_TOTAL)
                            .increment(records.len() as u64);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "kafka commit failed");
                        metrics::counter!(metric_names::COMMIT_ERRORS_TOTAL).increment(1);
                    }
                },
                Err(err) if err.retryable => {
                    tracing::warn!(message = %err.message, "retryable sink write failure, will reprocess");
                    metrics::counter!(metric_names::WRITE_ERRORS_TOTAL).increment(1);
                }
                Err(err) => {
                    tracing::warn!(
                        message = %err.message,
                        "non-retryable sink write failure, committing anyway to avoid an infinite loop"
                    );
                    metrics::counter!(metric_names::WRITE_ERRORS_TOTAL).increment(1);
                    if let Err(commit_err) = self.consumer.commit().await {
                        tracing::warn!(err = %commit_err, "kafka commit failed after non-retryable write error");
                        metrics::counter!(metric_names::COMMIT_ERRORS_TOTAL).increment(1);
                    }
                }
            }
        }
    }

    async fn poll_once(&self) -> Result<Vec<proto::Notification>, ConsumerError> {
        let notifications = self.consumer.poll().await?;
        metrics::counter!(metric_names::NOTIFICATIONS_CONSUMED_TOTAL)
            .increment(notifications.len() as u64);
        Ok(notifications)
    }

    fn extract_batch(
        &self,
        notifications: &[proto::Notification],
        cancel: &CancellationToken,
    ) -> Vec<crate::record::AnyRecord> {
        let mut records = Vec::new();

        'notifications: for notification in notifications {
            let prefix: Path = notification
                .prefix
                .as_ref()
                .map(Path::from)
                .unwrap_or_default();
            let device_identity = notification
                .prefix
                .as_ref()
                .map(|p| p.target.clone())
                .unwrap_or_default();

            for update in &notification.update {
                if cancel.is_cancelled() {
                    break 'notifications;
                }

                let Some(path) = update.path.as_ref().map(Path::from) else {
                    continue;
                };
                let Some(typed_value) = update.val.as_ref() else {
                    continue;
                };

                let value = match wire::typed_value_to_json(typed_value) {
                    Ok(v) => v,
                    Err(err) => {
                        tracing::warn!(%err, "failed to decode update value");
                        metrics::counter!(metric_names::UNMARSHAL_ERRORS_TOTAL).increment(1);
                        continue;
                    }
                };

                let meta = RecordMeta {
                    timestamp: notification.timestamp,
                    device_identity: device_identity.clone(),
                };

                match self
                    .registry
                    .dispatch(&self.schema, &prefix, &path, &value, &meta)
                {
                    Ok(extracted) => records.extend(extracted),
                    Err(err) => {
                        tracing::warn!(%err, "extraction failed");
                        metrics::counter!(metric_names::PROCESSING_ERRORS_TOTAL).increment(1);
                    }
                }
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KafkaAuth;
    use crate::proto::{typed_value::Value as TV, Notification, Path as ProtoPath, PathElem, TypedValue, Update};
    use crate::record::AnyRecord;
    use std::time::Duration;

    fn processor() -> Processor {
        // librdkafka defers the actual broker connection to first poll, so
        // constructing against an address nothing listens on is safe here:
        // this test never calls `poll`, only `extract_batch`.
        let consumer = Consumer::new(
            "127.0.0.1:0",
            "gnmi",
            "gnmi-writer-test",
            &KafkaAuth::None,
            true,
            Duration::from_millis(1),
        )
        .expect("client construction does not require a reachable broker");
        Processor::new(consumer, Box::new(crate::writer::StdoutSink), Schema::load().unwrap())
    }

    fn path(elems: &[&str]) -> ProtoPath {
        ProtoPath {
            elem: elems
                .iter()
                .map(|name| PathElem { name: name.to_string(), key: Default::default() })
                .collect(),
            origin: String::new(),
            target: String::new(),
        }
    }

    #[test]
    fn dispatches_a_single_notification_to_its_extractor() {
        let processor = processor();
        let notification = Notification {
            timestamp: 1_700_000_000,
            prefix: Some(ProtoPath { elem: vec![], origin: String::new(), target: "router-1".into() }),
            update: vec![Update {
                path: Some(path(&["system", "state", "hostname"])),
                val: Some(TypedValue { value: Some(TV::StringVal("router-1.example".into())) }),
                duplicates: 0,
            }],
            delete: vec![],
            atomic: false,
        };

        let cancel = CancellationToken::new();
        let records = processor.extract_batch(&[notification], &cancel);

        assert_eq!(records.len(), 1);
        let AnyRecord::SystemState(r) = &records[0] else {
            panic!("expected a SystemState record");
        };
        assert_eq!(r.hostname, "router-1.example");
        assert_eq!(r.device, "router-1");
    }

    #[test]
    fn cancellation_stops_extraction_before_the_next_update() {
        let processor = processor();
        let notification = Notification {
            timestamp: 1,
            prefix: Some(ProtoPath { elem: vec![], origin: String::new(), target: "router-1".into() }),
            update: vec![
                Update {
                    path: Some(path(&["system", "state", "hostname"])),
                    val: Some(TypedValue { value: Some(TV::StringVal("router-1".into())) }),
                    duplicates: 0,
                },
                Update {
                    path: Some(path(&["system", "state", "cpu-utilization"])),
                    val: Some(TypedValue { value: Some(TV::DoubleVal(12.5)) }),
                    duplicates: 0,
                },
            ],
            delete: vec![],
            atomic: false,
        };

        let cancel = CancellationToken::new();
        cancel.cancel();
        let records = processor.extract_batch(&[notification], &cancel);

        assert!(records.is_empty());
    }

    #[test]
    fn unrecognized_path_produces_no_records() {
        let processor = processor();
        let notification = Notification {
            timestamp: 1,
            prefix: None,
            update: vec![Update {
                path: Some(path(&["not-a-modeled-subtree", "leaf"])),
                val: Some(TypedValue { value: Some(TV::StringVal("x".into())) }),
                duplicates: 0,
            }],
            delete: vec![],
            atomic: false,
        };

        let cancel = CancellationToken::new();
        let records = processor.extract_batch(&[notification], &cancel);

        assert!(records.is_empty());
    }
}
