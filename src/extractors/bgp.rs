use super::Extractor;
use crate::device::Device;
use crate::path::Matcher;
use crate::record::{AnyRecord, BgpNeighbor, RecordMeta};

pub fn extractor() -> Extractor {
    Extractor {
        name: "bgp_neighbor",
        matcher: Matcher::contains(&["bgp", "neighbors"]),
        extract: extract,
    }
}

fn extract(device: &Device, meta: &RecordMeta) -> Vec<AnyRecord> {
    let mut out = Vec::new();
    for ni in device.network_instances.values() {
        for protocol in ni.protocols.values() {
            let Some(bgp) = &protocol.bgp else { continue };
            for neighbor in bgp.neighbors.values() {
                let state = neighbor.state.as_ref();
                out.push(AnyRecord::BgpNeighbor(BgpNeighbor {
                    meta: meta.clone(),
                    device: meta.device_identity.clone(),
                    neighbor_address: neighbor.neighbor_address.clone(),
                    peer_as: state.and_then(|s| s.peer_as).unwrap_or_default(),
                    session_state: state
                        .and_then(|s| s.session_state.clone())
                        .unwrap_or_default(),
                    description: state
                        .and_then(|s| s.description.clone())
                        .unwrap_or_default(),
                }));
            }
        }
    }
    out
}
