use super::*;
use crate::reference::Reference;

use anyhow::anyhow;
use log::*;

use std::sync::Arc;

type Name = String;

/// What a port means to the net resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// An electrical pin of a concrete component.
    Ordinary,
    /// The inside face of a circuit's own IO pin.
    Ascend,
    /// The outside face of a pin on a sub-circuit occurrence.
    Descend,
    /// Joins same-named ports within one instance without a drawn wire.
    Tunnel,
    /// The multi-bit side of a splitter.
    Bus,
    /// One single- or multi-bit channel of a splitter, with its channel index.
    Channel(u32),
}

/// A port on a component. The editor hands us the rotation-adjusted grid
/// location; the core never sees rotation.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: Name,
    /// The label used for tunnel matching. Defaults to `name`.
    pub compare_name: Name,
    pub at: Point,
    pub kind: PortKind,
    pub width: Width,
    pub direction: Direction,
}

impl Port {
    pub fn new(name: &str, at: Point, kind: PortKind, width: Width, direction: Direction) -> Port {
        Port {
            name: name.to_string(),
            compare_name: name.to_string(),
            at,
            kind,
            width,
            direction,
        }
    }

    pub fn with_compare_name(mut self, label: &str) -> Port {
        self.compare_name = label.to_string();
        self
    }
}

/// A component occurrence inside a circuit definition.
///
/// Virtual components (tunnels, splitters, pins) exist only as geometry; the
/// editor never declares them to the compiler.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: ComponentId,
    pub ports: Vec<Port>,
    /// Set on sub-circuit occurrences.
    pub subcircuit: Option<Reference<CircuitDef>>,
}

impl Component {
    pub fn new(id: ComponentId, ports: Vec<Port>) -> Component {
        Component {
            id,
            ports,
            subcircuit: None,
        }
    }

    pub fn subcircuit(id: ComponentId, ports: Vec<Port>, definition: &str) -> Component {
        Component {
            id,
            ports,
            subcircuit: Some(definition.into()),
        }
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|port| port.name == name)
    }
}

/// One circuit definition: a sheet of wires and components.
#[derive(Debug, Clone)]
pub struct CircuitDef {
    pub name: Name,
    pub wires: Vec<Segment>,
    pub components: Vec<Component>,
}

impl CircuitDef {
    pub fn new(name: &str) -> CircuitDef {
        CircuitDef {
            name: name.to_string(),
            wires: vec![],
            components: vec![],
        }
    }

    pub fn add_wire(&mut self, a: Point, b: Point) {
        self.wires.push(Segment::new(a, b));
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }
}

/// All circuit definitions of one open document.
///
/// Construction resolves every sub-circuit reference and validates the
/// snapshot; afterwards the design is immutable and [`Design::identify`]
/// may be called any number of times.
#[derive(Debug, Clone)]
pub struct Design(Vec<Arc<CircuitDef>>);

impl Design {
    pub fn new(defs: Vec<CircuitDef>) -> anyhow::Result<Design> {
        let design = Design(defs.into_iter().map(Arc::new).collect());
        design.check()?;
        design.resolve_references()?;
        Ok(design)
    }

    pub fn circuit(&self, name: &str) -> Option<Arc<CircuitDef>> {
        self.0.iter().find(|def| def.name == name).cloned()
    }

    pub fn circuits(&self) -> &[Arc<CircuitDef>] {
        &self.0
    }

    fn check(&self) -> anyhow::Result<()> {
        for (i, def) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|other| other.name == def.name) {
                return Err(anyhow!("Duplicate circuit definition: {}", def.name));
            }
            for (j, component) in def.components.iter().enumerate() {
                if def.components[..j].iter().any(|other| other.id == component.id) {
                    return Err(anyhow!(
                        "Duplicate component id {} in circuit {}",
                        component.id,
                        def.name
                    ));
                }
                for port in &component.ports {
                    if port.width == 0 {
                        return Err(anyhow!(
                            "Port {} on component {} in circuit {} has width 0",
                            port.name,
                            component.id,
                            def.name
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_references(&self) -> anyhow::Result<()> {
        for def in &self.0 {
            for component in &def.components {
                if let Some(reference) = &component.subcircuit {
                    let target = self.circuit(reference.name()).ok_or_else(|| {
                        anyhow!("Undefined reference to circuit: {}", reference.name())
                    })?;
                    reference.resolve_to(target)?;
                }
            }
        }
        debug!("Resolved references for {} circuit definitions", self.0.len());
        Ok(())
    }
}
