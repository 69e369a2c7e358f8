use super::Extractor;
use crate::device::Device;
use crate::path::Matcher;
use crate::record::{AnyRecord, RecordMeta, TransceiverChannelState, TransceiverThresholds};

pub fn channel_extractor() -> Extractor {
    Extractor {
        name: "transceiver_channel_state",
        matcher: Matcher::contains(&["physical-channels", "channel"]),
        extract: extract_channels,
    }
}

pub fn thresholds_extractor() -> Extractor {
    Extractor {
        name: "transceiver_thresholds",
        matcher: Matcher::contains(&["thresholds", "threshold"]),
        extract: extract_thresholds,
    }
}

fn extract_channels(device: &Device, meta: &RecordMeta) -> Vec<AnyRecord> {
    let mut out = Vec::new();
    for component in device.components.values() {
        let Some(transceiver) = &component.transceiver else { continue };
        for channel in transceiver.physical_channels.values() {
            let state = channel.state.as_ref();
            out.push(AnyRecord::TransceiverChannelState(TransceiverChannelState {
                meta: meta.clone(),
                device: meta.device_identity.clone(),
                interface: component.name.clone(),
                channel_index: channel.index,
                input_power: state.and_then(|s| s.input_power).unwrap_or_default(),
                output_power: state.and_then(|s| s.output_power).unwrap_or_default(),
                laser_bias_current: state.and_then(|s| s.laser_bias_current).unwrap_or_default(),
            }));
        }
    }
    out
}

fn extract_thresholds(device: &Device, meta: &RecordMeta) -> Vec<AnyRecord> {
    let mut out = Vec::new();
    for component in device.components.values() {
        let Some(transceiver) = &component.transceiver else { continue };
        for threshold in transceiver.thresholds.values() {
            let state = threshold.state.as_ref();
            out.push(AnyRecord::TransceiverThresholds(TransceiverThresholds {
                meta: meta.clone(),
                device: meta.device_identity.clone(),
                interface: component.name.clone(),
                severity: threshold.severity.clone(),
                value: state.and_then(|s| s.value).unwrap_or_default(),
                threshold_type: state.and_then(|s| s.threshold_type.clone()).unwrap_or_default(),
            }));
        }
    }
    out
}
