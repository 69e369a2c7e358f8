use super::Extractor;
use crate::device::Device;
use crate::path::Matcher;
use crate::record::{AnyRecord, RecordMeta, SystemState};

pub fn extractor() -> Extractor {
    Extractor {
        name: "system_state",
        matcher: Matcher::contains(&["system"]),
        extract: extract,
    }
}

/// Singleton subtree: one record per device, not one per list element.
fn extract(device: &Device, meta: &RecordMeta) -> Vec<AnyRecord> {
    let Some(system) = &device.system else {
        return Vec::new();
    };
    let state = system.state.as_ref();

    vec![AnyRecord::SystemState(SystemState {
        meta: meta.clone(),
        device: meta.device_identity.clone(),
        hostname: state.and_then(|s| s.hostname.clone()).unwrap_or_default(),
        memory_utilization: state.and_then(|s| s.memory_utilization).unwrap_or_default(),
        cpu_utilization: state.and_then(|s| s.cpu_utilization).unwrap_or_default(),
    })]
}
