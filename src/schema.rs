//! Compiled, read-only representation of the subset of the OpenConfig data
//! model this processor understands. Loaded once at startup; the device
//! tree it describes is built fresh per notification by the unmarshaler
//! (§9, "Device tree ownership") — `Schema` itself never holds device data.

use crate::error::ConfigError;
use std::collections::HashMap;

/// One compiled node: its path from the root, and (for list nodes) the
/// name of the key field used to address elements.
#[derive(Debug, Clone, Copy)]
pub struct SchemaEntry {
    pub path: &'static [&'static str],
    /// Empty for non-list nodes.
    pub list_key: &'static str,
}

const ENTRIES: &[(&str, SchemaEntry)] = &[
    (
        "Device",
        SchemaEntry {
            path: &[],
            list_key: "",
        },
    ),
    (
        "Interface",
        SchemaEntry {
            path: &["interfaces", "interface"],
            list_key: "name",
        },
    ),
    (
        "IsisAdjacency",
        SchemaEntry {
            path: &[
                "network-instances",
                "network-instance",
                "protocols",
                "protocol",
                "isis",
                "levels",
                "level",
                "adjacencies",
                "adjacency",
            ],
            list_key: "system-id",
        },
    ),
    (
        "BgpNeighbor",
        SchemaEntry {
            path: &[
                "network-instances",
                "network-instance",
                "protocols",
                "protocol",
                "bgp",
                "neighbors",
                "neighbor",
            ],
            list_key: "neighbor-address",
        },
    ),
    (
        "Component",
        SchemaEntry {
            path: &["components", "component"],
            list_key: "name",
        },
    ),
    (
        "PhysicalChannel",
        SchemaEntry {
            path: &[
                "components",
                "component",
                "transceiver",
                "physical-channels",
                "channel",
            ],
            list_key: "index",
        },
    ),
    (
        "Threshold",
        SchemaEntry {
            path: &["components", "component", "transceiver", "thresholds", "threshold"],
            list_key: "severity",
        },
    ),
];

/// Maps `(container_name, list_name) -> schema_name`, precomputed once so
/// the unmarshaler's list lookup (§4.4 step 4) is O(1) at runtime.
const LIST_INDEX: &[((&str, &str), &str)] = &[
    (("interfaces", "interface"), "Interface"),
    (("adjacencies", "adjacency"), "IsisAdjacency"),
    (("neighbors", "neighbor"), "BgpNeighbor"),
    (("components", "component"), "Component"),
    (("physical-channels", "channel"), "PhysicalChannel"),
    (("thresholds", "threshold"), "Threshold"),
];

pub struct Schema {
    entries: HashMap<&'static str, SchemaEntry>,
    list_index: HashMap<(&'static str, &'static str), &'static str>,
}

impl Schema {
    /// Compiles the embedded schema table. Fails only if the embedded table
    /// itself is internally inconsistent (e.g. a list-index entry pointing
    /// at an unknown schema name) — a condition that can only arise from a
    /// bad build, never from runtime input.
    pub fn load() -> Result<Schema, ConfigError> {
        let entries: HashMap<_, _> = ENTRIES.iter().copied().collect();
        let list_index: HashMap<_, _> = LIST_INDEX.iter().copied().collect();

        for schema_name in list_index.values() {
            if !entries.contains_key(schema_name) {
                return Err(ConfigError::MalformedSchema(format!(
                    "list index refers to unknown schema entry '{schema_name}'"
                )));
            }
        }

        Ok(Schema { entries, list_index })
    }

    pub fn lookup(&self, node_name: &str) -> Option<&SchemaEntry> {
        self.entries.get(node_name)
    }

    /// Resolves a list by its container and list element names, e.g.
    /// `("interfaces", "interface") -> "Interface"`.
    pub fn resolve_list(&self, container_name: &str, list_name: &str) -> Option<&'static str> {
        self.list_index.get(&(container_name, list_name)).copied()
    }
}
