//! The simulation core of a schematic logic editor.
//!
//! Two components, consumed in dependency order:
//!
//! * [`Design::identify`] recovers electrical connectivity from raw wire and
//!   port geometry, across nested sub-circuit instances, tunnels, and bus
//!   splitters, yielding a [`NetList`] of one-bit nets.
//! * [`Compiler`] takes the declared primitives plus the net list and
//!   produces a [`Simulation`]: one flat memory array and one straight-line
//!   tick routine advanced by [`Simulation::simulate`].
//!
//! The editor owns everything else (rendering, placement, persistence) and
//! talks to this crate only through the snapshot types in [`circuit`] and
//! the declare calls on [`Compiler`].

mod common;

#[cfg(test)]
mod tests;

pub mod circuit;
pub mod error;
pub mod geom;
pub mod net;
pub mod reference;
pub mod sim;

pub use common::*;

pub use circuit::{CircuitDef, Component, Design, Port, PortKind};
pub use error::{NetError, SimError};
pub use geom::{Point, Segment};
pub use net::{Instance, Net, NetList, NetWire, PortRef, ResolveOptions, Unconnected};
pub use sim::defs::{builtin, BuiltinSpec, GateOp, OutputSpec};
pub use sim::expr::Expr;
pub use sim::{BuiltinId, ClockId, Compiler, ConstId, GateId, PullId, SimConfig, Signal, Simulation};
