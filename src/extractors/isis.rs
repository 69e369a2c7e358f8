use super::Extractor;
use crate::device::Device;
use crate::path::Matcher;
use crate::record::{AnyRecord, IsisAdjacency, RecordMeta};

pub fn extractor() -> Extractor {
    Extractor {
        name: "isis_adjacency",
        matcher: Matcher::contains(&["isis", "adjacencies"]),
        extract: extract,
    }
}

fn extract(device: &Device, meta: &RecordMeta) -> Vec<AnyRecord> {
    let mut out = Vec::new();
    for ni in device.network_instances.values() {
        for protocol in ni.protocols.values() {
            let Some(isis) = &protocol.isis else { continue };
            for level in isis.levels.values() {
                for adjacency in level.adjacencies.values() {
                    let state = adjacency.state.as_ref();
                    out.push(AnyRecord::IsisAdjacency(IsisAdjacency {
                        meta: meta.clone(),
                        device: meta.device_identity.clone(),
                        interface: state
                            .and_then(|s| s.interface_name.clone())
                            .unwrap_or_default(),
                        level: level.level_number as u32,
                        system_id: adjacency.system_id.clone(),
                        neighbor_ipv4: state
                            .and_then(|s| s.neighbor_ipv4.clone())
                            .unwrap_or_default(),
                        adjacency_state: state
                            .and_then(|s| s.adjacency_state.clone())
                            .unwrap_or_default(),
                    }));
                }
            }
        }
    }
    out
}
