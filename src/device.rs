//! The device tree: a strongly typed tree mirroring the subset of the
//! OpenConfig data model this processor cares about, using *uncompressed*
//! paths — every element of a gNMI path, including `state` containers, is a
//! distinct level of the tree.
//!
//! Each notification produces a fresh [`Device`] containing only the
//! subtree reachable from its merged path; there is no sharing across
//! notifications and no long-lived references (§9, "Device tree
//! ownership").
//!
//! Container nodes are lazily instantiated on first write via `entry(..)
//! .or_default()` / `get_or_insert_with`, which is idempotent: initializing
//! the same parent twice is a no-op, satisfying I4 (an extractor never
//! observes a partially constructed parent).

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Device {
    pub interfaces: BTreeMap<String, Interface>,
    pub network_instances: BTreeMap<String, NetworkInstance>,
    pub system: Option<System>,
    pub components: BTreeMap<String, Component>,
}

impl Device {
    pub fn interface(&mut self, name: &str) -> &mut Interface {
        self.interfaces
            .entry(name.to_string())
            .or_insert_with(|| Interface {
                name: name.to_string(),
                ..Default::default()
            })
    }

    pub fn network_instance(&mut self, name: &str) -> &mut NetworkInstance {
        self.network_instances
            .entry(name.to_string())
            .or_insert_with(|| NetworkInstance {
                name: name.to_string(),
                ..Default::default()
            })
    }

    pub fn system(&mut self) -> &mut System {
        self.system.get_or_insert_with(System::default)
    }

    pub fn component(&mut self, name: &str) -> &mut Component {
        self.components
            .entry(name.to_string())
            .or_insert_with(|| Component {
                name: name.to_string(),
                ..Default::default()
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Interface {
    pub name: String,
    pub state: Option<InterfaceState>,
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceState {
    pub ifindex: Option<u32>,
    pub admin_status: Option<String>,
    pub oper_status: Option<String>,
    pub description: Option<String>,
}

impl Interface {
    pub fn state(&mut self) -> &mut InterfaceState {
        self.state.get_or_insert_with(InterfaceState::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NetworkInstance {
    pub name: String,
    /// Keyed by (identifier, protocol name), e.g. ("BGP", "bgp-instance").
    pub protocols: BTreeMap<(String, String), Protocol>,
}

impl NetworkInstance {
    pub fn protocol(&mut self, identifier: &str, name: &str) -> &mut Protocol {
        self.protocols
            .entry((identifier.to_string(), name.to_string()))
            .or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Protocol {
    pub isis: Option<Isis>,
    pub bgp: Option<Bgp>,
}

impl Protocol {
    pub fn isis(&mut self) -> &mut Isis {
        self.isis.get_or_insert_with(Isis::default)
    }

    pub fn bgp(&mut self) -> &mut Bgp {
        self.bgp.get_or_insert_with(Bgp::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Isis {
    pub levels: BTreeMap<u8, IsisLevel>,
}

impl Isis {
    pub fn level(&mut self, level_number: u8) -> &mut IsisLevel {
        self.levels.entry(level_number).or_insert_with(|| IsisLevel {
            level_number,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct IsisLevel {
    pub level_number: u8,
    pub adjacencies: BTreeMap<String, IsisAdjacency>,
}

impl IsisLevel {
    pub fn adjacency(&mut self, system_id: &str) -> &mut IsisAdjacency {
        self.adjacencies
            .entry(system_id.to_string())
            .or_insert_with(|| IsisAdjacency {
                system_id: system_id.to_string(),
                ..Default::default()
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct IsisAdjacency {
    pub system_id: String,
    pub state: Option<IsisAdjacencyState>,
}

impl IsisAdjacency {
    pub fn state(&mut self) -> &mut IsisAdjacencyState {
        self.state.get_or_insert_with(IsisAdjacencyState::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IsisAdjacencyState {
    pub interface_name: Option<String>,
    pub neighbor_ipv4: Option<String>,
    pub adjacency_state: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Bgp {
    pub neighbors: BTreeMap<String, BgpNeighbor>,
}

impl Bgp {
    pub fn neighbor(&mut self, address: &str) -> &mut BgpNeighbor {
        self.neighbors
            .entry(address.to_string())
            .or_insert_with(|| BgpNeighbor {
                neighbor_address: address.to_string(),
                ..Default::default()
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BgpNeighbor {
    pub neighbor_address: String,
    pub state: Option<BgpNeighborState>,
}

impl BgpNeighbor {
    pub fn state(&mut self) -> &mut BgpNeighborState {
        self.state.get_or_insert_with(BgpNeighborState::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BgpNeighborState {
    pub peer_as: Option<u32>,
    pub session_state: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct System {
    pub state: Option<SystemStateNode>,
}

impl System {
    pub fn state(&mut self) -> &mut SystemStateNode {
        self.state.get_or_insert_with(SystemStateNode::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemStateNode {
    pub hostname: Option<String>,
    pub memory_utilization: Option<f64>,
    pub cpu_utilization: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Component {
    pub name: String,
    pub transceiver: Option<Transceiver>,
}

impl Component {
    pub fn transceiver(&mut self) -> &mut Transceiver {
        self.transceiver.get_or_insert_with(Transceiver::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transceiver {
    pub physical_channels: BTreeMap<u32, PhysicalChannel>,
    pub thresholds: BTreeMap<String, Threshold>,
}

impl Transceiver {
    pub fn channel(&mut self, index: u32) -> &mut PhysicalChannel {
        self.physical_channels
            .entry(index)
            .or_insert_with(|| PhysicalChannel {
                index,
                ..Default::default()
            })
    }

    pub fn threshold(&mut self, severity: &str) -> &mut Threshold {
        self.thresholds
            .entry(severity.to_string())
            .or_insert_with(|| Threshold {
                severity: severity.to_string(),
                ..Default::default()
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhysicalChannel {
    pub index: u32,
    pub state: Option<PhysicalChannelState>,
}

impl PhysicalChannel {
    pub fn state(&mut self) -> &mut PhysicalChannelState {
        self.state.get_or_insert_with(PhysicalChannelState::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhysicalChannelState {
    pub input_power: Option<f64>,
    pub output_power: Option<f64>,
    pub laser_bias_current: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Threshold {
    pub severity: String,
    pub state: Option<ThresholdState>,
}

impl Threshold {
    pub fn state(&mut self) -> &mut ThresholdState {
        self.state.get_or_insert_with(ThresholdState::default)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThresholdState {
    pub value: Option<f64>,
    pub threshold_type: Option<String>,
}
