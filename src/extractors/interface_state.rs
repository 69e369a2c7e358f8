use super::Extractor;
use crate::device::Device;
use crate::path::Matcher;
use crate::record::{AnyRecord, InterfaceState, RecordMeta};

pub fn extractor() -> Extractor {
    Extractor {
        name: "interface_state",
        matcher: Matcher::contains(&["interfaces", "interface", "state"]),
        extract: extract,
    }
}

fn extract(device: &Device, meta: &RecordMeta) -> Vec<AnyRecord> {
    device
        .interfaces
        .values()
        .filter_map(|iface| {
            let state = iface.state.as_ref()?;
            Some(AnyRecord::InterfaceState(InterfaceState {
                meta: meta.clone(),
                device: meta.device_identity.clone(),
                interface: iface.name.clone(),
                admin_status: state.admin_status.clone().unwrap_or_default(),
                oper_status: state.oper_status.clone().unwrap_or_default(),
                description: state.description.clone().unwrap_or_default(),
            }))
        })
        .collect()
}
