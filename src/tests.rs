use super::*;

fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

/// A drawn inverter whose output wire loops back to its input: the resolver
/// finds one net with both ports, and the compiled gate oscillates on it.
#[test]
fn identify_then_compile_ring_oscillator() {
    let mut def = CircuitDef::new("top");
    def.add_wire(p(0, 0), p(10, 0));
    def.add_component(Component::new(
        1,
        vec![
            Port::new("a", p(0, 0), PortKind::Ordinary, 1, Direction::In),
            Port::new("q", p(10, 0), PortKind::Ordinary, 1, Direction::Out),
        ],
    ));

    let design = Design::new(vec![def]).unwrap();
    let netlist = design.identify("top", &ResolveOptions::default()).unwrap();
    assert_eq!(netlist.nets.len(), 1);

    let mut compiler = Compiler::new(SimConfig::default());
    let suffix = Suffix::new(1, 0);
    compiler.declare_gate(GateOp::Not, &["a"], "q", suffix).unwrap();
    let mut nets = vec![];
    for net in &netlist.nets {
        nets.push(compiler.declare_net(&net.ios).unwrap());
    }

    let mut sim = compiler.compile(None).unwrap();
    sim.simulate(2);
    let mut last = sim.get_net(nets[0]).unwrap();
    for _ in 0..6 {
        sim.simulate(1);
        let next = sim.get_net(nets[0]).unwrap();
        assert_ne!(next, last);
        last = next;
    }
}

/// Two host-set constants feed the two channels of a splitter. Each bit of
/// the bus is its own net; poking one channel never disturbs the other.
#[test]
fn identify_then_compile_splitter_channels() {
    let mut def = CircuitDef::new("top");
    for (id, y) in [(1u32, 10), (2, 20)] {
        def.add_wire(p(0, y), p(5, y));
        def.add_component(Component::new(
            id,
            vec![Port::new("out", p(0, y), PortKind::Ordinary, 1, Direction::Out)],
        ));
    }
    def.add_wire(p(10, 0), p(15, 0));
    def.add_component(Component::new(
        3,
        vec![
            Port::new("bus", p(10, 0), PortKind::Bus, 2, Direction::Inout),
            Port::new("c0", p(5, 10), PortKind::Channel(0), 1, Direction::Inout),
            Port::new("c1", p(5, 20), PortKind::Channel(1), 1, Direction::Inout),
        ],
    ));

    let design = Design::new(vec![def]).unwrap();
    let netlist = design.identify("top", &ResolveOptions::default()).unwrap();
    assert_eq!(netlist.nets.len(), 2);

    let mut compiler = Compiler::new(SimConfig::default());
    let c0 = compiler
        .declare_const("out", Signal::Low, Suffix::new(1, 0))
        .unwrap();
    let c1 = compiler
        .declare_const("out", Signal::Low, Suffix::new(2, 0))
        .unwrap();
    for net in &netlist.nets {
        compiler.declare_net(&net.ios).unwrap();
    }
    let bit0 = netlist.nets_of(&IoId::new("out", Suffix::new(1, 0)))[0];
    let bit1 = netlist.nets_of(&IoId::new("out", Suffix::new(2, 0)))[0];
    assert_ne!(bit0, bit1);

    let mut sim = compiler.compile(None).unwrap();
    sim.set_const(c0, Signal::High).unwrap();
    sim.simulate(1);
    assert_eq!(sim.get_net(bit0).unwrap(), Signal::High);
    assert_eq!(sim.get_net(bit1).unwrap(), Signal::Low);

    sim.set_const(c0, Signal::Low).unwrap();
    sim.set_const(c1, Signal::High).unwrap();
    sim.simulate(1);
    assert_eq!(sim.get_net(bit0).unwrap(), Signal::Low);
    assert_eq!(sim.get_net(bit1).unwrap(), Signal::High);
}
