//! Columnar sink: groups a batch of [`AnyRecord`]s by destination table and
//! writes each group atomically. Two implementations are provided,
//! selected by configuration (§6): `ClickhouseSink` for production,
//! `StdoutSink` for local runs and tests.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::error::SinkError;
use crate::record::{AnyRecord, Value};

#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    async fn write(&self, records: &[AnyRecord]) -> Result<(), SinkError>;
}

/// Splits a batch into per-table groups, preserving the relative order of
/// records within each group (the aggregator has already collapsed
/// duplicates by this point, so order only matters for readability).
fn group_by_table(records: &[AnyRecord]) -> BTreeMap<&'static str, Vec<&AnyRecord>> {
    let mut groups: BTreeMap<&'static str, Vec<&AnyRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.table_name()).or_default().push(record);
    }
    groups
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::String(s) => JsonValue::String(s.clone()),
        Value::U32(n) => JsonValue::from(*n),
        Value::U64(n) => JsonValue::from(*n),
        Value::F64(n) => JsonValue::from(*n),
        Value::I64(n) => JsonValue::from(*n),
        Value::Bool(b) => JsonValue::Bool(*b),
    }
}

fn record_to_json_row(record: &AnyRecord) -> JsonValue {
    let mut row = serde_json::Map::new();
    row.insert("timestamp".to_string(), JsonValue::from(record.meta().timestamp));
    for (name, value) in record.column_values() {
        row.insert(name.to_string(), value_to_json(&value));
    }
    JsonValue::Object(row)
}

/// Row shapes bound to the `clickhouse` crate's `Row` derive, one per
/// destination table, flattened (no nested `RecordMeta`) since RowBinary
/// encoding is positional and must match the table's column order exactly.
mod rows {
    use clickhouse::Row;
    use serde::Serialize;

    #[derive(Debug, Serialize, Row)]
    pub struct IsisAdjacencyRow {
        pub timestamp: i64,
        pub device: String,
        pub interface: String,
        pub level: u32,
        pub system_id: String,
        pub neighbor_ipv4: String,
        pub adjacency_state: String,
    }

    #[derive(Debug, Serialize, Row)]
    pub struct BgpNeighborRow {
        pub timestamp: i64,
        pub device: String,
        pub neighbor_address: String,
        pub peer_as: u32,
        pub session_state: String,
        pub description: String,
    }

    #[derive(Debug, Serialize, Row)]
    pub struct SystemStateRow {
        pub timestamp: i64,
        pub device: String,
        pub hostname: String,
        pub memory_utilization: f64,
        pub cpu_utilization: f64,
    }

    #[derive(Debug, Serialize, Row)]
    pub struct InterfaceIfindexRow {
        pub timestamp: i64,
        pub device: String,
        pub interface: String,
        pub ifindex: u32,
    }

    #[derive(Debug, Serialize, Row)]
    pub struct InterfaceStateRow {
        pub timestamp: i64,
        pub device: String,
        pub interface: String,
        pub admin_status: String,
        pub oper_status: String,
        pub description: String,
    }

    #[derive(Debug, Serialize, Row)]
    pub struct TransceiverChannelStateRow {
        pub timestamp: i64,
        pub device: String,
        pub interface: String,
        pub channel_index: u32,
        pub input_power: f64,
        pub output_power: f64,
        pub laser_bias_current: f64,
    }

    #[derive(Debug, Serialize, Row)]
    pub struct TransceiverThresholdsRow {
        pub timestamp: i64,
        pub device: String,
        pub interface: String,
        pub severity: String,
        pub value: f64,
        pub threshold_type: String,
    }
}

use rows::*;

/// Production sink, backed by the `clickhouse` crate. One `Insert` handle
/// is opened per table per batch and finalized with `end()`, matching the
/// "atomic batch" contract in §4.7 — a partial write never becomes visible.
pub struct ClickhouseSink {
    client: clickhouse::Client,
}

impl ClickhouseSink {
    pub fn new(url: &str, database: &str, user: &str, password: &str) -> Self {
        let client = clickhouse::Client::default()
            .with_url(url)
            .with_database(database)
            .with_user(user)
            .with_password(password);
        Self { client }
    }

    async fn write_table(&self, table: &str, records: &[&AnyRecord]) -> Result<(), SinkError> {
        let started = std::time::Instant::now();
        let result = self.write_table_inner(table, records).await;

        metrics::histogram!(crate::metrics::CLICKHOUSE_INSERT_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(()) => {
                metrics::counter!(crate::metrics::CLICKHOUSE_RECORDS_WRITTEN_TOTAL)
                    .increment(records.len() as u64);
            }
            Err(_) => {
                metrics::counter!(crate::metrics::CLICKHOUSE_INSERT_ERRORS_TOTAL).increment(1);
            }
        }
        result
    }

    async fn write_table_inner(&self, table: &str, records: &[&AnyRecord]) -> Result<(), SinkError> {
        macro_rules! insert_group {
            ($row_ty:ty, $to_row:expr) => {{
                let mut insert = self
                    .client
                    .insert::<$row_ty>(table)
                    .map_err(|err| classify_error(table, &err))?;
                for (index, record) in records.iter().enumerate() {
                    let row = $to_row(record);
                    insert
                        .write(&row)
                        .await
                        .map_err(|err| classify_error(table, &err).at_index(index))?;
                }
                insert.end().await.map_err(|err| classify_error(table, &err))
            }};
        }

        match records.first() {
            Some(AnyRecord::IsisAdjacency(_)) => {
                insert_group!(IsisAdjacencyRow, |r: &&AnyRecord| {
                    let AnyRecord::IsisAdjacency(r) = r else { unreachable!() };
                    IsisAdjacencyRow {
                        timestamp: r.meta.timestamp,
                        device: r.device.clone(),
                        interface: r.interface.clone(),
                        level: r.level,
                        system_id: r.system_id.clone(),
                        neighbor_ipv4: r.neighbor_ipv4.clone(),
                        adjacency_state: r.adjacency_state.clone(),
                    }
                })
            }
            Some(AnyRecord::BgpNeighbor(_)) => {
                insert_group!(BgpNeighborRow, |r: &&AnyRecord| {
                    let AnyRecord::BgpNeighbor(r) = r else { unreachable!() };
                    BgpNeighborRow {
                        timestamp: r.meta.timestamp,
                        device: r.device.clone(),
                        neighbor_address: r.neighbor_address.clone(),
                        peer_as: r.peer_as,
                        session_state: r.session_state.clone(),
                        description: r.description.clone(),
                    }
                })
            }
            Some(AnyRecord::SystemState(_)) => {
                insert_group!(SystemStateRow, |r: &&AnyRecord| {
                    let AnyRecord::SystemState(r) = r else { unreachable!() };
                    SystemStateRow {
                        timestamp: r.meta.timestamp,
                        device: r.device.clone(),
                        hostname: r.hostname.clone(),
                        memory_utilization: r.memory_utilization,
                        cpu_utilization: r.cpu_utilization,
                    }
                })
            }
            Some(AnyRecord::InterfaceIfindex(_)) => {
                insert_group!(InterfaceIfindexRow, |r: &&AnyRecord| {
                    let AnyRecord::InterfaceIfindex(r) = r else { unreachable!() };
                    InterfaceIfindexRow {
                        timestamp: r.meta.timestamp,
                        device: r.device.clone(),
                        interface: r.interface.clone(),
                        ifindex: r.ifindex,
                    }
                })
            }
            Some(AnyRecord::InterfaceState(_)) => {
                insert_group!(InterfaceStateRow, |r: &&AnyRecord| {
                    let AnyRecord::InterfaceState(r) = r else { unreachable!() };
                    InterfaceStateRow {
                        timestamp: r.meta.timestamp,
                        device: r.device.clone(),
                        interface: r.interface.clone(),
                        admin_status: r.admin_status.clone(),
                        oper_status: r.oper_status.clone(),
                        description: r.description.clone(),
                    }
                })
            }
            Some(AnyRecord::TransceiverChannelState(_)) => {
                insert_group!(TransceiverChannelStateRow, |r: &&AnyRecord| {
                    let AnyRecord::TransceiverChannelState(r) = r else { unreachable!() };
                    TransceiverChannelStateRow {
                        timestamp: r.meta.timestamp,
                        device: r.device.clone(),
                        interface: r.interface.clone(),
                        channel_index: r.channel_index,
                        input_power: r.input_power,
                        output_power: r.output_power,
                        laser_bias_current: r.laser_bias_current,
                    }
                })
            }
            Some(AnyRecord::TransceiverThresholds(_)) => {
                insert_group!(TransceiverThresholdsRow, |r: &&AnyRecord| {
                    let AnyRecord::TransceiverThresholds(r) = r else { unreachable!() };
                    TransceiverThresholdsRow {
                        timestamp: r.meta.timestamp,
                        device: r.device.clone(),
                        interface: r.interface.clone(),
                        severity: r.severity.clone(),
                        value: r.value,
                        threshold_type: r.threshold_type.clone(),
                    }
                })
            }
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Sink for ClickhouseSink {
    /// Writes every table group unconditionally, even after an earlier
    /// group fails — §4.7 isolates failure at table granularity, it does
    /// not license abandoning tables that haven't been attempted yet. Only
    /// once every group has been tried is a single aggregate `SinkError`
    /// folded from whatever failed: retryable if *any* group failed
    /// retryably (so the whole batch is reprocessed next poll, since a
    /// retry is the only way the retryably-failed group's records aren't
    /// lost), non-retryable only if every failure was itself non-retryable.
    async fn write(&self, records: &[AnyRecord]) -> Result<(), SinkError> {
        let mut failures = Vec::new();
        for (table, rows) in group_by_table(records) {
            if let Err(err) = self.write_table(table, &rows).await {
                failures.push(err);
            }
        }

        let Some(first) = failures.first() else {
            return Ok(());
        };

        let retryable = failures.iter().any(|err| err.retryable);
        let record_index = first.record_index;
        let message = failures
            .iter()
            .map(|err| err.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        Err(SinkError {
            message,
            retryable,
            record_index,
        })
    }
}

fn classify_error(table: &str, err: &clickhouse::error::Error) -> SinkError {
    let message = err.to_string();
    if message.contains("UNKNOWN_TABLE") {
        SinkError::non_retryable(format!("unknown table '{table}': {message}"))
    } else {
        SinkError::retryable(format!("clickhouse write to '{table}' failed: {message}"))
    }
}

/// Debug sink used for local runs and tests: writes one JSON line per
/// record to stdout, never retryable.
pub struct StdoutSink;

#[async_trait::async_trait]
impl Sink for StdoutSink {
    async fn write(&self, records: &[AnyRecord]) -> Result<(), SinkError> {
        for record in records {
            let row = record_to_json_row(record);
            let line = serde_json::to_string(&row)
                .map_err(|err| SinkError::non_retryable(format!("could not serialize row: {err}")))?;
            println!("{} {line}", record.table_name());
        }
        Ok(())
    }
}
