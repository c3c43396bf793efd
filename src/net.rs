use super::*;

use log::*;
use petgraph::unionfind::UnionFind;

use std::collections::BTreeMap;
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// Bounds for the resolver.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Cap on the bus-width fixed-point iteration. Exhausting it yields a
    /// best-effort result, never an error.
    pub width_iteration_cap: usize,
}

impl Default for ResolveOptions {
    fn default() -> ResolveOptions {
        ResolveOptions {
            width_iteration_cap: 100,
        }
    }
}

const MAX_INSTANCE_DEPTH: usize = 64;

/// One expansion of a circuit definition in the hierarchy. The root is
/// instance 0; the tree is expanded depth-first.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: InstanceId,
    pub def: Arc<CircuitDef>,
    pub parent: Option<InstanceId>,
    /// Child instance for each sub-circuit occurrence in `def`.
    pub children: BTreeMap<ComponentId, InstanceId>,
}

/// A wire segment tagged with its owner, as carried by a net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetWire {
    pub segment: Segment,
    pub instance: InstanceId,
    /// Index of the segment within its definition's wire list.
    pub index: usize,
}

/// A reference to one port occurrence, used for unconnected reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRef {
    pub instance: InstanceId,
    pub component: ComponentId,
    pub name: String,
}

/// A final, one-bit net. Owns one memory cell once declared to the compiler.
#[derive(Debug, Clone)]
pub struct Net {
    pub id: NetId,
    /// Suffixed identifiers of the ordinary port bits attached to this net.
    pub ios: Vec<IoId>,
    /// The wires this net covers, for editor read-back.
    pub wires: Vec<NetWire>,
}

/// Geometry that identify() could not attach to any net. Not an error; the
/// simulation proceeds without these elements.
#[derive(Debug, Clone, Default)]
pub struct Unconnected {
    pub wires: Vec<NetWire>,
    pub ports: Vec<PortRef>,
}

/// The output of [`Design::identify`].
#[derive(Debug, Clone)]
pub struct NetList {
    pub nets: Vec<Net>,
    pub instances: Vec<Instance>,
    pub unconnected: Unconnected,
}

impl NetList {
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id]
    }

    /// Every final net whose bit touches the given port occurrence.
    pub fn nets_of(&self, io: &IoId) -> Vec<NetId> {
        self.nets
            .iter()
            .filter(|net| net.ios.contains(io))
            .map(|net| net.id)
            .collect()
    }
}

/// A port occurrence, flattened out of the instance tree.
/// Lives only inside one identify() call.
#[derive(Debug, Clone)]
struct NetPort {
    name: String,
    compare_name: String,
    at: Point,
    kind: PortKind,
    component: ComponentId,
    instance: InstanceId,
    width: Width,
}

impl NetPort {
    fn to_ref(&self) -> PortRef {
        PortRef {
            instance: self.instance,
            component: self.component,
            name: self.name.clone(),
        }
    }

    fn io_id(&self, bit: Width) -> IoId {
        let suffix = Suffix::new(self.component, self.instance);
        if self.width == 1 {
            IoId::new(&self.name, suffix)
        } else {
            IoId::bit(&self.name, bit, suffix)
        }
    }
}

/// A mutually-connected wire/port group; pre-split, so it may carry
/// width > 1. Lives only inside one identify() call.
#[derive(Debug, Clone, Default)]
struct PreNet {
    wires: Vec<NetWire>,
    ports: Vec<usize>,
}

struct SplitterRef {
    /// Pre-net touched by the bus (1-to-n) port.
    bus: usize,
    /// (channel index, pre-net touched), sorted by channel index.
    channels: Vec<(u32, usize)>,
}

impl Design {
    /// Reconstruct the electrical net list for the named circuit,
    /// recursively across its sub-circuit instances.
    pub fn identify(&self, top: &str, options: &ResolveOptions) -> Result<NetList, NetError> {
        let top = self
            .circuit(top)
            .ok_or_else(|| NetError::NoSuchCircuit(top.to_string()))?;

        let mut instances: Vec<Instance> = vec![];
        expand_instances(&mut instances, top, None, 0)?;

        let (wires, ports) = gather_geometry(&instances);
        let mut unconnected = Unconnected::default();

        let prenets = assemble_prenets(wires, &ports, &mut unconnected);
        let prenets = merge_tunnels_and_hierarchy(prenets, &ports, &instances);

        let splitters = find_splitters(&instances, &ports, &prenets);
        let widths = propagate_widths(&prenets, &ports, &splitters, options);

        let nets = split_bits(&prenets, &ports, &splitters, &widths, &mut unconnected);

        info!(
            "identify: {} instances, {} nets, {} unconnected wires, {} unconnected ports",
            instances.len(),
            nets.len(),
            unconnected.wires.len(),
            unconnected.ports.len()
        );

        Ok(NetList {
            nets,
            instances,
            unconnected,
        })
    }
}

fn expand_instances(
    instances: &mut Vec<Instance>,
    def: Arc<CircuitDef>,
    parent: Option<InstanceId>,
    depth: usize,
) -> Result<InstanceId, NetError> {
    if depth > MAX_INSTANCE_DEPTH {
        return Err(NetError::RecursiveCircuit(def.name.clone()));
    }
    let id = instances.len();
    instances.push(Instance {
        id,
        def: def.clone(),
        parent,
        children: BTreeMap::new(),
    });
    for component in &def.components {
        if let Some(reference) = &component.subcircuit {
            let child_def = reference
                .get()
                .ok_or_else(|| NetError::UnresolvedCircuit(reference.name().to_string()))?;
            let child = expand_instances(instances, child_def, Some(id), depth + 1)?;
            instances[id].children.insert(component.id, child);
        }
    }
    Ok(id)
}

fn gather_geometry(instances: &[Instance]) -> (Vec<NetWire>, Vec<NetPort>) {
    let mut wires = vec![];
    let mut ports = vec![];
    for instance in instances {
        for (index, segment) in instance.def.wires.iter().enumerate() {
            wires.push(NetWire {
                segment: *segment,
                instance: instance.id,
                index,
            });
        }
        for component in &instance.def.components {
            for port in &component.ports {
                ports.push(NetPort {
                    name: port.name.clone(),
                    compare_name: port.compare_name.clone(),
                    at: port.at,
                    kind: port.kind,
                    component: component.id,
                    instance: instance.id,
                    width: port.width,
                });
            }
        }
    }
    (wires, ports)
}

/// Ordinary assembly: grow wire groups to their transitive closure under the
/// containment test, then sweep ports onto them. Wire-only groups are
/// reported unconnected; leftover ports each seed a group of their own.
fn assemble_prenets(
    wires: Vec<NetWire>,
    ports: &[NetPort],
    unconnected: &mut Unconnected,
) -> Vec<PreNet> {
    let mut remaining = wires;
    let mut groups: Vec<Vec<NetWire>> = vec![];
    while let Some(seed) = remaining.pop() {
        let mut members = vec![seed];
        loop {
            let mut absorbed = false;
            let mut i = 0;
            while i < remaining.len() {
                let candidate = remaining[i];
                let joins = candidate.instance == seed.instance
                    && members
                        .iter()
                        .any(|member| member.segment.touches(&candidate.segment));
                if joins {
                    members.push(remaining.swap_remove(i));
                    absorbed = true;
                } else {
                    i += 1;
                }
            }
            if !absorbed {
                break;
            }
        }
        groups.push(members);
    }
    debug!("assemble: {} wire groups", groups.len());

    let mut port_group: Vec<Option<usize>> = vec![None; ports.len()];
    for (pi, port) in ports.iter().enumerate() {
        for (gi, group) in groups.iter().enumerate() {
            let on_group = group
                .iter()
                .any(|wire| wire.instance == port.instance && wire.segment.contains(port.at));
            if on_group {
                port_group[pi] = Some(gi);
                break;
            }
        }
    }

    // Wire-only groups can never gain a port through the later merge
    // phases, so they are settled here.
    let mut prenets: Vec<PreNet> = vec![];
    let mut group_prenet: Vec<Option<usize>> = vec![None; groups.len()];
    for (gi, group) in groups.into_iter().enumerate() {
        if port_group.iter().any(|assigned| *assigned == Some(gi)) {
            group_prenet[gi] = Some(prenets.len());
            prenets.push(PreNet {
                wires: group,
                ports: vec![],
            });
        } else {
            unconnected.wires.extend(group);
        }
    }
    for (pi, assigned) in port_group.iter().enumerate() {
        match assigned {
            Some(gi) => prenets[group_prenet[*gi].unwrap()].ports.push(pi),
            None => prenets.push(PreNet {
                wires: vec![],
                ports: vec![pi],
            }),
        }
    }
    prenets
}

/// Join same-named tunnels within one instance, and fuse descend ports on
/// sub-circuit occurrences with the matching ascend ports inside the child
/// instance.
fn merge_tunnels_and_hierarchy(
    prenets: Vec<PreNet>,
    ports: &[NetPort],
    instances: &[Instance],
) -> Vec<PreNet> {
    let mut prenet_of_port: BTreeMap<usize, usize> = BTreeMap::new();
    for (ni, prenet) in prenets.iter().enumerate() {
        for &pi in &prenet.ports {
            prenet_of_port.insert(pi, ni);
        }
    }

    let mut merges: UnionFind<usize> = UnionFind::new(prenets.len());

    // Tunnels: an invisible wire between identical non-empty labels.
    let mut tunnels: BTreeMap<(InstanceId, &str), usize> = BTreeMap::new();
    for (pi, port) in ports.iter().enumerate() {
        if port.kind != PortKind::Tunnel || port.compare_name.is_empty() {
            continue;
        }
        let ni = prenet_of_port[&pi];
        match tunnels.get(&(port.instance, port.compare_name.as_str())) {
            Some(&first) => {
                merges.union(first, ni);
            }
            None => {
                tunnels.insert((port.instance, port.compare_name.as_str()), ni);
            }
        }
    }

    // Hierarchy: descend on the occurrence fuses with ascend in the child.
    let mut ascends: BTreeMap<(InstanceId, &str), usize> = BTreeMap::new();
    for (pi, port) in ports.iter().enumerate() {
        if port.kind == PortKind::Ascend {
            ascends
                .entry((port.instance, port.name.as_str()))
                .or_insert(pi);
        }
    }
    for (pi, port) in ports.iter().enumerate() {
        if port.kind != PortKind::Descend {
            continue;
        }
        let instance = &instances[port.instance];
        if let Some(&child) = instance.children.get(&port.component) {
            if let Some(&api) = ascends.get(&(child, port.name.as_str())) {
                merges.union(prenet_of_port[&pi], prenet_of_port[&api]);
            }
        }
    }

    // Collapse the union into merged pre-nets.
    let labels = merges.into_labeling();
    let mut merged: Vec<PreNet> = vec![];
    let mut merged_of_label: BTreeMap<usize, usize> = BTreeMap::new();
    for (ni, prenet) in prenets.into_iter().enumerate() {
        let mi = *merged_of_label
            .entry(labels[ni])
            .or_insert_with(|| {
                merged.push(PreNet::default());
                merged.len() - 1
            });
        merged[mi].wires.extend(prenet.wires);
        merged[mi].ports.extend(prenet.ports);
    }
    debug!("merge: {} pre-nets after tunnels and hierarchy", merged.len());
    merged
}

fn find_splitters(
    instances: &[Instance],
    ports: &[NetPort],
    prenets: &[PreNet],
) -> Vec<SplitterRef> {
    let mut prenet_of_port: BTreeMap<(InstanceId, ComponentId, &str), usize> = BTreeMap::new();
    for (ni, prenet) in prenets.iter().enumerate() {
        for &pi in &prenet.ports {
            let port = &ports[pi];
            prenet_of_port.insert((port.instance, port.component, port.name.as_str()), ni);
        }
    }

    let mut splitters = vec![];
    for instance in instances {
        for component in &instance.def.components {
            let mut bus = None;
            let mut channels = vec![];
            for port in &component.ports {
                let key = (instance.id, component.id, port.name.as_str());
                if let Some(&ni) = prenet_of_port.get(&key) {
                    match port.kind {
                        PortKind::Bus => bus = Some(ni),
                        PortKind::Channel(index) => channels.push((index, ni)),
                        _ => (),
                    }
                }
            }
            if let Some(bus) = bus {
                channels.sort_by_key(|&(index, _)| index);
                splitters.push(SplitterRef { bus, channels });
            }
        }
    }
    splitters
}

/// Pre-net width starts at the widest declared port touching it, then
/// propagates across splitters (bus width grows to the sum of its channel
/// widths) until stable or the iteration cap is hit.
fn propagate_widths(
    prenets: &[PreNet],
    ports: &[NetPort],
    splitters: &[SplitterRef],
    options: &ResolveOptions,
) -> Vec<Width> {
    let mut widths: Vec<Width> = prenets
        .iter()
        .map(|prenet| {
            prenet
                .ports
                .iter()
                .map(|&pi| ports[pi].width)
                .max()
                .unwrap_or(1)
        })
        .collect();

    let mut stable = false;
    for _ in 0..options.width_iteration_cap {
        let mut changed = false;
        for splitter in splitters {
            let sum: Width = splitter.channels.iter().map(|&(_, ni)| widths[ni]).sum();
            if sum > widths[splitter.bus] {
                widths[splitter.bus] = sum;
                changed = true;
            }
        }
        if !changed {
            stable = true;
            break;
        }
    }
    if !stable && !splitters.is_empty() {
        warn!(
            "bus widths did not stabilize within {} rounds; using best-effort result",
            options.width_iteration_cap
        );
    }
    widths
}

/// Expand every width-W pre-net into W one-bit nets, merging corresponding
/// bit positions across splitter boundaries, then settle lone ports.
fn split_bits(
    prenets: &[PreNet],
    ports: &[NetPort],
    splitters: &[SplitterRef],
    widths: &[Width],
    unconnected: &mut Unconnected,
) -> Vec<Net> {
    let mut offsets: Vec<usize> = vec![0; prenets.len()];
    let mut total = 0usize;
    for (ni, width) in widths.iter().enumerate() {
        offsets[ni] = total;
        total += *width as usize;
    }

    let mut merges: UnionFind<usize> = UnionFind::new(total);
    for splitter in splitters {
        let bus_width = widths[splitter.bus];
        let mut offset: Width = 0;
        for &(_, channel) in &splitter.channels {
            let channel_width = widths[channel];
            for j in 0..channel_width {
                let bus_bit = offset + j;
                if bus_bit < bus_width {
                    merges.union(
                        offsets[splitter.bus] + bus_bit as usize,
                        offsets[channel] + j as usize,
                    );
                }
            }
            offset += channel_width;
        }
    }

    // One final net per partition, carrying the union of all wires and
    // ports of the pre-nets whose bits landed in it.
    let labels = merges.into_labeling();
    let mut net_of_label: BTreeMap<usize, usize> = BTreeMap::new();
    let mut nets: Vec<Net> = vec![];
    let mut attached: Vec<Vec<usize>> = vec![];
    for (ni, prenet) in prenets.iter().enumerate() {
        for bit in 0..widths[ni] {
            let label = labels[offsets[ni] + bit as usize];
            let id = *net_of_label.entry(label).or_insert_with(|| {
                nets.push(Net {
                    id: nets.len(),
                    ios: vec![],
                    wires: vec![],
                });
                attached.push(vec![]);
                nets.len() - 1
            });
            for wire in &prenet.wires {
                if !nets[id].wires.contains(wire) {
                    nets[id].wires.push(*wire);
                }
            }
            for &pi in &prenet.ports {
                let port = &ports[pi];
                if bit < port.width {
                    attached[id].push(pi);
                    if port.kind == PortKind::Ordinary {
                        nets[id].ios.push(port.io_id(bit));
                    }
                }
            }
        }
    }

    // A net that is still a single wireless port after every merge phase is
    // a lone port: reported, then dropped.
    let mut kept: Vec<Net> = vec![];
    for (id, mut net) in nets.into_iter().enumerate() {
        if net.wires.is_empty() && attached[id].len() == 1 {
            let port_ref = ports[attached[id][0]].to_ref();
            if !unconnected.ports.contains(&port_ref) {
                unconnected.ports.push(port_ref);
            }
        } else {
            net.id = kept.len();
            kept.push(net);
        }
    }
    kept
}
