use super::Extractor;
use crate::device::Device;
use crate::path::Matcher;
use crate::record::{AnyRecord, InterfaceIfindex, RecordMeta};

pub fn extractor() -> Extractor {
    Extractor {
        name: "interface_ifindex",
        matcher: Matcher::contains_any(&["ifindex"]),
        extract: extract,
    }
}

fn extract(device: &Device, meta: &RecordMeta) -> Vec<AnyRecord> {
    device
        .interfaces
        .values()
        .filter_map(|iface| {
            let ifindex = iface.state.as_ref()?.ifindex?;
            Some(AnyRecord::InterfaceIfindex(InterfaceIfindex {
                meta: meta.clone(),
                device: meta.device_identity.clone(),
                interface: iface.name.clone(),
                ifindex,
            }))
        })
        .collect()
}
