//! Flat row types produced by extractors, one per destination table.
//!
//! Rust has no runtime reflection, so the "reflection-driven column
//! binding" the writer needs is realized as a `const` slice of
//! [`ColumnBinding`] per kind, exposed through the [`Record`] trait. The
//! binding is computed once — there is nothing to memoize beyond the first
//! access since the slice is `const` — but each kind still routes through
//! [`Record::columns`] so a future kind with genuinely derived metadata can
//! drop in behind the same call site without touching the writer.

use std::collections::BTreeMap;

/// A single column value, as bound for the columnar sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    U32(u32),
    U64(u64),
    F64(f64),
    I64(i64),
    Bool(bool),
}

impl Value {
    /// Whether this is the field's "not present in this leaf update" zero
    /// value, per the aggregator's zero-value contract (§4.6).
    pub fn is_zero(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::U32(n) => *n == 0,
            Value::U64(n) => *n == 0,
            Value::F64(n) => *n == 0.0,
            Value::I64(n) => *n == 0,
            Value::Bool(b) => !b,
        }
    }
}

pub struct ColumnBinding<R> {
    pub name: &'static str,
    pub aggregation_key: bool,
    pub get: fn(&R) -> Value,
}

/// Metadata common to every record, populated from the notification that
/// produced it (§3, "Metadata").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordMeta {
    pub timestamp: i64,
    pub device_identity: String,
}

pub trait Record: Sized {
    fn table_name() -> &'static str;
    fn columns() -> &'static [ColumnBinding<Self>];
    fn meta(&self) -> &RecordMeta;

    /// The aggregation key for this record, built from the columns tagged
    /// `aggregation_key`. Records of kinds that don't aggregate still
    /// implement this (it is simply unused by the aggregator for those
    /// kinds).
    fn aggregation_key(&self) -> Vec<Value> {
        Self::columns()
            .iter()
            .filter(|c| c.aggregation_key)
            .map(|c| (c.get)(self))
            .collect()
    }

    fn column_values(&self) -> BTreeMap<&'static str, Value> {
        Self::columns()
            .iter()
            .map(|c| (c.name, (c.get)(self)))
            .collect()
    }
}

macro_rules! column {
    ($name:literal, $field:ident, $variant:ident, key) => {
        ColumnBinding {
            name: $name,
            aggregation_key: true,
            get: |r| Value::$variant(r.$field.clone()),
        }
    };
    ($name:literal, $field:ident, $variant:ident) => {
        ColumnBinding {
            name: $name,
            aggregation_key: false,
            get: |r| Value::$variant(r.$field.clone()),
        }
    };
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsisAdjacency {
    pub meta: RecordMeta,
    pub device: String,
    pub interface: String,
    pub level: u32,
    pub system_id: String,
    pub neighbor_ipv4: String,
    pub adjacency_state: String,
}

impl Record for IsisAdjacency {
    fn table_name() -> &'static str {
        "isis_adjacency"
    }

    fn columns() -> &'static [ColumnBinding<Self>] {
        &[
            column!("device", device, String, key),
            column!("interface", interface, String, key),
            column!("level", level, U32, key),
            column!("system_id", system_id, String),
            column!("neighbor_ipv4", neighbor_ipv4, String),
            column!("adjacency_state", adjacency_state, String),
        ]
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BgpNeighbor {
    pub meta: RecordMeta,
    pub device: String,
    pub neighbor_address: String,
    pub peer_as: u32,
    pub session_state: String,
    pub description: String,
}

impl Record for BgpNeighbor {
    fn table_name() -> &'static str {
        "bgp_neighbor"
    }

    fn columns() -> &'static [ColumnBinding<Self>] {
        &[
            column!("device", device, String, key),
            column!("neighbor_address", neighbor_address, String, key),
            column!("peer_as", peer_as, U32),
            column!("session_state", session_state, String),
            column!("description", description, String),
        ]
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemState {
    pub meta: RecordMeta,
    pub device: String,
    pub hostname: String,
    pub memory_utilization: f64,
    pub cpu_utilization: f64,
}

impl Record for SystemState {
    fn table_name() -> &'static str {
        "system_state"
    }

    fn columns() -> &'static [ColumnBinding<Self>] {
        &[
            column!("device", device, String, key),
            column!("hostname", hostname, String),
            column!("memory_utilization", memory_utilization, F64),
            column!("cpu_utilization", cpu_utilization, F64),
        ]
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceIfindex {
    pub meta: RecordMeta,
    pub device: String,
    pub interface: String,
    pub ifindex: u32,
}

impl Record for InterfaceIfindex {
    fn table_name() -> &'static str {
        "interface_ifindex"
    }

    fn columns() -> &'static [ColumnBinding<Self>] {
        &[
            column!("device", device, String, key),
            column!("interface", interface, String, key),
            column!("ifindex", ifindex, U32),
        ]
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceState {
    pub meta: RecordMeta,
    pub device: String,
    pub interface: String,
    pub admin_status: String,
    pub oper_status: String,
    pub description: String,
}

impl Record for InterfaceState {
    fn table_name() -> &'static str {
        "interface_state"
    }

    fn columns() -> &'static [ColumnBinding<Self>] {
        &[
            column!("device", device, String, key),
            column!("interface", interface, String, key),
            column!("admin_status", admin_status, String),
            column!("oper_status", oper_status, String),
            column!("description", description, String),
        ]
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransceiverChannelState {
    pub meta: RecordMeta,
    pub device: String,
    pub interface: String,
    pub channel_index: u32,
    pub input_power: f64,
    pub output_power: f64,
    pub laser_bias_current: f64,
}

impl Record for TransceiverChannelState {
    fn table_name() -> &'static str {
        "transceiver_channel_state"
    }

    fn columns() -> &'static [ColumnBinding<Self>] {
        &[
            column!("device", device, String, key),
            column!("interface", interface, String, key),
            column!("channel_index", channel_index, U32, key),
            column!("input_power", input_power, F64),
            column!("output_power", output_power, F64),
            column!("laser_bias_current", laser_bias_current, F64),
        ]
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransceiverThresholds {
    pub meta: RecordMeta,
    pub device: String,
    pub interface: String,
    pub severity: String,
    pub value: f64,
    pub threshold_type: String,
}

impl Record for TransceiverThresholds {
    fn table_name() -> &'static str {
        "transceiver_thresholds"
    }

    fn columns() -> &'static [ColumnBinding<Self>] {
        &[
            column!("device", device, String, key),
            column!("interface", interface, String, key),
            column!("severity", severity, String, key),
            column!("value", value, F64),
            column!("threshold_type", threshold_type, String),
        ]
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

/// A heterogeneous, type-erased record, as produced by the extractor
/// registry and consumed by the aggregator and writer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyRecord {
    IsisAdjacency(IsisAdjacency),
    BgpNeighbor(BgpNeighbor),
    SystemState(SystemState),
    InterfaceIfindex(InterfaceIfindex),
    InterfaceState(InterfaceState),
    TransceiverChannelState(TransceiverChannelState),
    TransceiverThresholds(TransceiverThresholds),
}

impl AnyRecord {
    pub fn table_name(&self) -> &'static str {
        match self {
            AnyRecord::IsisAdjacency(_) => IsisAdjacency::table_name(),
            AnyRecord::BgpNeighbor(_) => BgpNeighbor::table_name(),
            AnyRecord::SystemState(_) => SystemState::table_name(),
            AnyRecord::InterfaceIfindex(_) => InterfaceIfindex::table_name(),
            AnyRecord::InterfaceState(_) => InterfaceState::table_name(),
            AnyRecord::TransceiverChannelState(_) => TransceiverChannelState::table_name(),
            AnyRecord::TransceiverThresholds(_) => TransceiverThresholds::table_name(),
        }
    }

    pub fn meta(&self) -> &RecordMeta {
        match self {
            AnyRecord::IsisAdjacency(r) => r.meta(),
            AnyRecord::BgpNeighbor(r) => r.meta(),
            AnyRecord::SystemState(r) => r.meta(),
            AnyRecord::InterfaceIfindex(r) => r.meta(),
            AnyRecord::InterfaceState(r) => r.meta(),
            AnyRecord::TransceiverChannelState(r) => r.meta(),
            AnyRecord::TransceiverThresholds(r) => r.meta(),
        }
    }

    pub fn aggregation_key(&self) -> Vec<Value> {
        match self {
            AnyRecord::IsisAdjacency(r) => r.aggregation_key(),
            AnyRecord::BgpNeighbor(r) => r.aggregation_key(),
            AnyRecord::SystemState(r) => r.aggregation_key(),
            AnyRecord::InterfaceIfindex(r) => r.aggregation_key(),
            AnyRecord::InterfaceState(r) => r.aggregation_key(),
            AnyRecord::TransceiverChannelState(r) => r.aggregation_key(),
            AnyRecord::TransceiverThresholds(r) => r.aggregation_key(),
        }
    }

    pub fn column_values(&self) -> BTreeMap<&'static str, Value> {
        match self {
            AnyRecord::IsisAdjacency(r) => r.column_values(),
            AnyRecord::BgpNeighbor(r) => r.column_values(),
            AnyRecord::SystemState(r) => r.column_values(),
            AnyRecord::InterfaceIfindex(r) => r.column_values(),
            AnyRecord::InterfaceState(r) => r.column_values(),
            AnyRecord::TransceiverChannelState(r) => r.column_values(),
            AnyRecord::TransceiverThresholds(r) => r.column_values(),
        }
    }

    /// Whether this kind participates in post-processing aggregation
    /// (§4.6): currently the two transceiver kinds, which routinely arrive
    /// as separate leaf-granularity updates for the same logical row.
    pub fn aggregates(&self) -> bool {
        matches!(
            self,
            AnyRecord::TransceiverChannelState(_) | AnyRecord::TransceiverThresholds(_)
        )
    }

    /// Merges `other` into `self` in place, taking the last non-zero value
    /// per field, per the aggregator's merge contract.
    pub fn merge_from(&mut self, other: &AnyRecord) {
        match (self, other) {
            (AnyRecord::TransceiverChannelState(a), AnyRecord::TransceiverChannelState(b)) => {
                merge_f64(&mut a.input_power, b.input_power);
                merge_f64(&mut a.output_power, b.output_power);
                merge_f64(&mut a.laser_bias_current, b.laser_bias_current);
            }
            (AnyRecord::TransceiverThresholds(a), AnyRecord::TransceiverThresholds(b)) => {
                merge_f64(&mut a.value, b.value);
                merge_string(&mut a.threshold_type, &b.threshold_type);
            }
            _ => {}
        }
    }
}

fn merge_f64(a: &mut f64, b: f64) {
    if b != 0.0 {
        *a = b;
    }
}

fn merge_string(a: &mut String, b: &str) {
    if !b.is_empty() {
        *a = b.to_string();
    }
}
