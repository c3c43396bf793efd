use crate::common::IoId;
use crate::sim::defs::GateOp;
use crate::sim::Signal;

/// Errors raised while identifying nets from a design snapshot.
///
/// Unresolved connectivity (dangling wires, lone ports) is never an error;
/// it is reported as data in [`crate::net::Unconnected`].
#[derive(Debug, Clone)]
pub enum NetError {
    NoSuchCircuit(String),
    UnresolvedCircuit(String),
    RecursiveCircuit(String),
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetError::NoSuchCircuit(name) => write!(f, "No such circuit definition: {name}"),
            NetError::UnresolvedCircuit(name) => {
                write!(f, "Sub-circuit reference was never resolved: {name}")
            }
            NetError::RecursiveCircuit(name) => {
                write!(f, "Circuit instantiates itself: {name}")
            }
        }
    }
}

impl std::error::Error for NetError {}

/// Errors raised while declaring primitives or compiling the simulation.
///
/// Every case indicates an editor-level bug and is raised immediately;
/// driver conflicts at runtime are not errors (see [`Signal::Conflict`]).
#[derive(Debug, Clone)]
pub enum SimError {
    BadName(String),
    DuplicateIo(IoId),
    UnknownIo(IoId),
    IoOnTwoNets(IoId),
    GateArity(GateOp, usize),
    UnknownOperand(String, String),
    DuplicateName(String),
    FormulaTooDeep(String, usize),
    ZeroFrequency,
    ZeroTickRate,
    MemorySize { expected: usize, got: usize },
    InvalidSignal(Signal),
    BadHandle(&'static str, usize),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::BadName(name) => write!(f, "Malformed identifier: {name:?}"),
            SimError::DuplicateIo(io) => write!(f, "IO is declared twice: {io}"),
            SimError::UnknownIo(io) => write!(f, "Net references an undeclared IO: {io}"),
            SimError::IoOnTwoNets(io) => write!(f, "IO is attached to two nets: {io}"),
            SimError::GateArity(op, n) => {
                write!(f, "Gate {op} does not take {n} inputs")
            }
            SimError::UnknownOperand(output, operand) => {
                write!(f, "Formula for {output} names an unknown operand: {operand}")
            }
            SimError::DuplicateName(name) => {
                write!(f, "Name is used twice within one primitive: {name}")
            }
            SimError::FormulaTooDeep(output, depth) => {
                write!(f, "Formula for {output} needs stack depth {depth}")
            }
            SimError::ZeroFrequency => write!(f, "Clock frequency must be nonzero"),
            SimError::ZeroTickRate => write!(f, "Ticks-per-second must be nonzero"),
            SimError::MemorySize { expected, got } => {
                write!(f, "Carried memory has {got} cells but the layout needs {expected}")
            }
            SimError::InvalidSignal(signal) => {
                write!(f, "Signal {signal} cannot be written")
            }
            SimError::BadHandle(kind, index) => write!(f, "No such {kind}: {index}"),
        }
    }
}

impl std::error::Error for SimError {}
