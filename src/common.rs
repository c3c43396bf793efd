use std::sync::Arc;

/// Identifies a component within one circuit definition.
pub type ComponentId = u32;

/// Identifies one expansion of a circuit definition. The root is instance 0.
pub type InstanceId = usize;

/// Identifies a final one-bit net.
pub type NetId = usize;

/// A declared channel width, in bits.
pub type Width = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    Inout,
}

/// The suffix tying a port name to one component in one hierarchy instance.
///
/// Appending it to a port name is what keeps same-named ports in different
/// instances from colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Suffix {
    pub component: ComponentId,
    pub instance: InstanceId,
}

impl Suffix {
    pub fn new(component: ComponentId, instance: InstanceId) -> Suffix {
        Suffix { component, instance }
    }
}

impl std::fmt::Display for Suffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.component, self.instance)
    }
}

/// A uniquely-suffixed IO identifier.
///
/// Produced by the net resolver for every port bit it attaches to a net, and
/// by [`crate::sim::Compiler`] for every port a primitive declares. The two
/// sides meet by string equality.
#[derive(Ord, PartialOrd, Eq, PartialEq, Clone, Hash)]
pub struct IoId(Arc<String>);

impl IoId {
    pub fn new(name: &str, suffix: Suffix) -> IoId {
        format!("{name}@{suffix}").into()
    }

    /// The identifier for one bit of a port wider than one bit.
    pub fn bit(name: &str, bit: Width, suffix: Suffix) -> IoId {
        format!("{name}[{bit}]@{suffix}").into()
    }
}

impl std::ops::Deref for IoId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", &self.0)
    }
}

impl std::fmt::Debug for IoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "IoId(\"{}\")", &self.0)
    }
}

impl From<String> for IoId {
    fn from(id: String) -> IoId {
        IoId(Arc::new(id))
    }
}

impl From<&str> for IoId {
    fn from(id: &str) -> IoId {
        IoId(Arc::new(id.to_string()))
    }
}
