//! Converts one `(prefix, update)` pair into a freshly allocated [`Device`]
//! tree containing only the subtree reachable from the merged path.
//!
//! The core recursive step is `apply_value`: given a path and a JSON value
//! at that path, it either (a) recognizes an object with exactly one
//! array-valued key as a "container-of-list" payload and reconstructs list
//! elements one at a time — honouring list keys rather than silently
//! dropping them, per §4.4's rationale — or (b) walks every other field of
//! an object one level deeper, or (c) applies a scalar directly to the leaf
//! the path addresses. Scalars and nested containers both bottom out in the
//! same base case, so the same function handles a lone scalar update and a
//! multi-field JSON-IETF object update uniformly.

use crate::device::Device;
use crate::error::UnmarshalError;
use crate::path::{Path, PathElement};
use crate::schema::Schema;
use serde_json::Value as Json;

pub fn unmarshal(
    schema: &Schema,
    prefix: &Path,
    update_path: &Path,
    value: &Json,
) -> Result<Device, UnmarshalError> {
    let merged = Path::merged(prefix, update_path);
    let mut device = Device::default();
    apply_value(&mut device, &merged.0, value, schema)?;
    Ok(device)
}

fn apply_value(
    device: &mut Device,
    path: &[PathElement],
    value: &Json,
    schema: &Schema,
) -> Result<(), UnmarshalError> {
    if let Json::Object(map) = value {
        if let Some((list_name, Json::Array(elements))) = single_entry(map) {
            return apply_list(device, path, list_name, elements, schema);
        }
        for (field, field_value) in map {
            let mut child = path.to_vec();
            child.push(PathElement::unkeyed(field.clone()));
            apply_value(device, &child, field_value, schema)?;
        }
        return Ok(());
    }

    if let Json::Array(_) = value {
        return Err(UnmarshalError::UnknownList {
            container_name: path
                .last()
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            list_name: "<top-level array>".to_string(),
        });
    }

    set_scalar_leaf(device, path, value)
}

/// Returns the map's single entry, or `None` if it has zero or more than
/// one entries. A container whose payload is "exactly one list" is
/// detected by this having exactly one entry whose value is an array.
fn single_entry(map: &serde_json::Map<String, Json>) -> Option<(&str, &Json)> {
    let mut iter = map.iter();
    let first = iter.next()?;
    if iter.next().is_some() {
        return None;
    }
    Some((first.0.as_str(), first.1))
}

fn apply_list(
    device: &mut Device,
    path: &[PathElement],
    list_name: &str,
    elements: &[Json],
    schema: &Schema,
) -> Result<(), UnmarshalError> {
    let container_name = path
        .last()
        .map(|e| e.name.as_str())
        .unwrap_or_default()
        .to_string();

    let schema_name = schema
        .resolve_list(&container_name, list_name)
        .ok_or_else(|| UnmarshalError::UnknownList {
            container_name: container_name.clone(),
            list_name: list_name.to_string(),
        })?;
    let entry = schema
        .lookup(schema_name)
        .ok_or_else(|| UnmarshalError::UnknownSchemaNode(schema_name.to_string()))?;
    let key_field = entry.list_key;

    for element in elements {
        let Json::Object(element_map) = element else {
            return Err(UnmarshalError::UnknownList {
                container_name: container_name.clone(),
                list_name: list_name.to_string(),
            });
        };
        let key_value = element_map
            .get(key_field)
            .ok_or_else(|| UnmarshalError::MissingKey {
                path: describe(path),
                key: key_field.to_string(),
            })?;
        let key_value = match key_value {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        };

        let mut child = path.to_vec();
        let mut key = std::collections::BTreeMap::new();
        key.insert(key_field.to_string(), key_value);
        child.push(PathElement {
            name: list_name.to_string(),
            key,
        });

        for (field, field_value) in element_map {
            if field == key_field {
                continue;
            }
            let mut leaf_path = child.clone();
            leaf_path.push(PathElement::unkeyed(field.clone()));
            apply_value(device, &leaf_path, field_value, schema)?;
        }
    }

    Ok(())
}

fn describe(path: &[PathElement]) -> String {
    path.iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn as_string(v: &Json) -> Option<String> {
    match v {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_f64(v: &Json) -> Option<f64> {
    match v {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_u32(v: &Json) -> Option<u32> {
    match v {
        Json::Number(n) => n.as_u64().map(|n| n as u32),
        Json::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn key_of<'p>(path: &'p [PathElement], name: &str, field: &str) -> Option<&'p str> {
    path.iter()
        .find(|e| e.name == name)
        .and_then(|e| e.key.get(field))
        .map(|s| s.as_str())
}

/// Matches the known leaf paths of the record kinds this processor models
/// and writes `value` into the corresponding device tree field. An
/// unrecognized leaf is not an error: OpenConfig subtrees routinely carry
/// fields no extractor reads, and I4/I5 only require that *known* leaves
/// land in the right place.
fn set_scalar_leaf(
    device: &mut Device,
    path: &[PathElement],
    value: &Json,
) -> Result<(), UnmarshalError> {
    let names: Vec<&str> = path.iter().map(|e| e.name.as_str()).collect();

    match names.as_slice() {
        ["interfaces", "interface", "state", "ifindex"] => {
            let if_name = key_of(path, "interface", "name").unwrap_or_default();
            if let Some(v) = as_u32(value) {
                device.interface(if_name).state().ifindex = Some(v);
            }
        }
        ["interfaces", "interface", "state", "admin-status"] => {
            let if_name = key_of(path, "interface", "name").unwrap_or_default();
            device.interface(if_name).state().admin_status = as_string(value);
        }
        ["interfaces", "interface", "state", "oper-status"] => {
            let if_name = key_of(path, "interface", "name").unwrap_or_default();
            device.interface(if_name).state().oper_status = as_string(value);
        }
        ["interfaces", "interface", "state", "description"] => {
            let if_name = key_of(path, "interface", "name").unwrap_or_default();
            device.interface(if_name).state().description = as_string(value);
        }
        ["system", "state", "hostname"] => {
            device.system().state().hostname = as_string(value);
        }
        ["system", "state", "memory-utilization"] => {
            device.system().state().memory_utilization = as_f64(value);
        }
        ["system", "state", "cpu-utilization"] => {
            device.system().state().cpu_utilization = as_f64(value);
        }
        ["network-instances", "network-instance", "protocols", "protocol", "bgp", "neighbors", "neighbor", "state", leaf] =>
        {
            let ni_name = key_of(path, "network-instance", "name").unwrap_or_default();
            let identifier = key_of(path, "protocol", "identifier").unwrap_or_default();
            let protocol_name = key_of(path, "protocol", "name").unwrap_or("bgp");
            let neighbor_addr = key_of(path, "neighbor", "neighbor-address").unwrap_or_default();

            let state = device
                .network_instance(ni_name)
                .protocol(identifier, protocol_name)
                .bgp()
                .neighbor(neighbor_addr)
                .state();

            match *leaf {
                "peer-as" => state.peer_as = as_u32(value),
                "session-state" => state.session_state = as_string(value),
                "description" => state.description = as_string(value),
                _ => {}
            }
        }
        ["network-instances", "network-instance", "protocols", "protocol", "isis", "levels", "level", "adjacencies", "adjacency", "state", leaf] =>
        {
            let ni_name = key_of(path, "network-instance", "name").unwrap_or_default();
            let identifier = key_of(path, "protocol", "identifier").unwrap_or("ISIS");
            let protocol_name = key_of(path, "protocol", "name").unwrap_or("isis");
            let level_number: u8 = key_of(path, "level", "level-number")
                .or_else(|| key_of(path, "level", "level"))
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let system_id = key_of(path, "adjacency", "system-id").unwrap_or_default();

            let state = device
                .network_instance(ni_name)
                .protocol(identifier, protocol_name)
                .isis()
                .level(level_number)
                .adjacency(system_id)
                .state();

            match *leaf {
                "interface-name" => state.interface_name = as_string(value),
                "neighbor-ipv4" => state.neighbor_ipv4 = as_string(value),
                "adjacency-state" => state.adjacency_state = as_string(value),
                _ => {}
            }
        }
        ["components", "component", "transceiver", "physical-channels", "channel", "state", leaf] =>
        {
            let component = key_of(path, "component", "name").unwrap_or_default();
            let index = key_of(path, "channel", "index")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let state = device.component(component).transceiver().channel(index).state();
            match *leaf {
                "input-power" => state.input_power = as_f64(value),
                "output-power" => state.output_power = as_f64(value),
                "laser-bias-current" => state.laser_bias_current = as_f64(value),
                _ => {}
            }
        }
        ["components", "component", "transceiver", "thresholds", "threshold", "state", leaf] => {
            let component = key_of(path, "component", "name").unwrap_or_default();
            let severity = key_of(path, "threshold", "severity").unwrap_or_default();
            let state = device
                .component(component)
                .transceiver()
                .threshold(severity)
                .state();
            match *leaf {
                "value" => state.value = as_f64(value),
                "type" => state.threshold_type = as_string(value),
                _ => {}
            }
        }
        _ => {
            tracing::debug!(path = describe(path), "ignoring unrecognized leaf path");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn elem(name: &str) -> PathElement {
        PathElement::unkeyed(name)
    }

    fn keyed(name: &str, key: &str, value: &str) -> PathElement {
        let mut map = std::collections::BTreeMap::new();
        map.insert(key.to_string(), value.to_string());
        PathElement {
            name: name.to_string(),
            key: map,
        }
    }

    #[test]
    fn scalar_leaf_hostname() {
        let schema = Schema::load().unwrap();
        let prefix = Path(vec![]);
        let update_path = Path(vec![elem("system"), elem("state"), elem("hostname")]);
        let device = unmarshal(&schema, &prefix, &update_path, &json!("e76554a34f51")).unwrap();
        assert_eq!(
            device.system.unwrap().state.unwrap().hostname.as_deref(),
            Some("e76554a34f51")
        );
    }

    #[test]
    fn container_of_list_preserves_keys_and_ordering() {
        let schema = Schema::load().unwrap();
        let prefix = Path(vec![]);
        let update_path = Path(vec![
            elem("network-instances"),
            keyed("network-instance", "name", "default"),
            elem("protocols"),
            keyed("protocol", "identifier", "ISIS"),
            elem("isis"),
            elem("levels"),
            keyed("level", "level-number", "2"),
            elem("adjacencies"),
        ]);
        let payload = json!({
            "adjacency": [
                {
                    "system-id": "ac10.0001.0000",
                    "state": {
                        "interface-name": "Switch1/11/2",
                        "adjacency-state": "UP",
                    }
                },
                {
                    "system-id": "ac10.000d.0000",
                    "state": {
                        "interface-name": "Switch1/11/4",
                        "adjacency-state": "UP",
                        "neighbor-ipv4": "172.16.0.23",
                    }
                },
            ]
        });

        let device = unmarshal(&schema, &prefix, &update_path, &payload).unwrap();
        let ni = &device.network_instances["default"];
        let proto = &ni.protocols[&("ISIS".to_string(), "isis".to_string())];
        let level = &proto.isis.as_ref().unwrap().levels[&2];
        assert_eq!(level.adjacencies.len(), 2);
        let a1 = &level.adjacencies["ac10.0001.0000"];
        assert_eq!(
            a1.state.as_ref().unwrap().interface_name.as_deref(),
            Some("Switch1/11/2")
        );
        let a2 = &level.adjacencies["ac10.000d.0000"];
        assert_eq!(
            a2.state.as_ref().unwrap().neighbor_ipv4.as_deref(),
            Some("172.16.0.23")
        );
    }

    #[test]
    fn unknown_list_is_an_error() {
        let schema = Schema::load().unwrap();
        let prefix = Path(vec![]);
        let update_path = Path(vec![elem("not-a-real-container")]);
        let payload = json!({ "also-not-real": [{"k": "v"}] });
        let err = unmarshal(&schema, &prefix, &update_path, &payload).unwrap_err();
        assert!(matches!(err, UnmarshalError::UnknownList { .. }));
    }
}
