use super::*;

fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

fn source(name: &str, at: Point) -> Port {
    Port::new(name, at, PortKind::Ordinary, 1, Direction::Out)
}

fn sink(name: &str, at: Point) -> Port {
    Port::new(name, at, PortKind::Ordinary, 1, Direction::In)
}

fn identify(defs: Vec<CircuitDef>, top: &str) -> NetList {
    let design = Design::new(defs).unwrap();
    design.identify(top, &ResolveOptions::default()).unwrap()
}

#[test]
fn wire_path_is_one_net() {
    let mut def = CircuitDef::new("top");
    def.add_wire(p(0, 0), p(10, 0));
    def.add_wire(p(10, 0), p(10, 10));
    def.add_wire(p(10, 10), p(20, 10));
    def.add_component(Component::new(1, vec![source("out", p(0, 0))]));
    def.add_component(Component::new(2, vec![sink("a", p(15, 10))]));

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 1);
    let net = &netlist.nets[0];
    assert_eq!(net.ios.len(), 2);
    assert!(net.ios.contains(&IoId::new("out", Suffix::new(1, 0))));
    assert!(net.ios.contains(&IoId::new("a", Suffix::new(2, 0))));
    assert_eq!(net.wires.len(), 3);
    assert!(netlist.unconnected.wires.is_empty());
    assert!(netlist.unconnected.ports.is_empty());
}

#[test]
fn wire_supply_order_does_not_matter() {
    let build = |reverse: bool| {
        let mut def = CircuitDef::new("top");
        let mut wires = vec![
            (p(0, 0), p(10, 0)),
            (p(10, 0), p(10, 10)),
            (p(10, 10), p(20, 10)),
            (p(20, 10), p(30, 10)),
        ];
        if reverse {
            wires.reverse();
        }
        for (a, b) in wires {
            def.add_wire(a, b);
        }
        def.add_component(Component::new(1, vec![source("out", p(0, 0))]));
        def.add_component(Component::new(2, vec![sink("a", p(30, 10))]));
        identify(vec![def], "top")
    };

    let forward = build(false);
    let backward = build(true);
    assert_eq!(forward.nets.len(), 1);
    assert_eq!(backward.nets.len(), 1);
    let mut fwd_ios = forward.nets[0].ios.clone();
    let mut bwd_ios = backward.nets[0].ios.clone();
    fwd_ios.sort();
    bwd_ios.sort();
    assert_eq!(fwd_ios, bwd_ios);
}

#[test]
fn branch_from_interior_joins() {
    let mut def = CircuitDef::new("top");
    def.add_wire(p(0, 0), p(10, 0));
    // branches off the interior, endpoint to non-endpoint
    def.add_wire(p(5, 0), p(5, 5));
    def.add_component(Component::new(1, vec![source("out", p(0, 0))]));
    def.add_component(Component::new(2, vec![sink("a", p(5, 5))]));

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 1);
    assert_eq!(netlist.nets[0].ios.len(), 2);
}

#[test]
fn crossing_without_shared_endpoint_stays_apart() {
    let mut def = CircuitDef::new("top");
    def.add_wire(p(0, 0), p(10, 0));
    def.add_wire(p(5, -5), p(5, 5));
    def.add_component(Component::new(1, vec![source("out", p(0, 0))]));
    def.add_component(Component::new(2, vec![sink("a", p(5, 5))]));

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 2);
}

#[test]
fn tunnels_join_by_label() {
    let tunnel = |id, at, label: &str| {
        Component::new(
            id,
            vec![Port::new("t", at, PortKind::Tunnel, 1, Direction::Inout).with_compare_name(label)],
        )
    };

    let mut def = CircuitDef::new("top");
    def.add_wire(p(0, 0), p(5, 0));
    def.add_component(Component::new(1, vec![source("out", p(5, 0))]));
    def.add_component(tunnel(2, p(0, 0), "bus_a"));
    def.add_wire(p(100, 0), p(105, 0));
    def.add_component(Component::new(3, vec![sink("a", p(105, 0))]));
    def.add_component(tunnel(4, p(100, 0), "bus_a"));

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 1);
    assert_eq!(netlist.nets[0].ios.len(), 2);

    // differing labels never join
    let mut def = CircuitDef::new("top");
    def.add_wire(p(0, 0), p(5, 0));
    def.add_component(Component::new(1, vec![source("out", p(5, 0))]));
    def.add_component(tunnel(2, p(0, 0), "bus_a"));
    def.add_wire(p(100, 0), p(105, 0));
    def.add_component(Component::new(3, vec![sink("a", p(105, 0))]));
    def.add_component(tunnel(4, p(100, 0), "bus_b"));
    assert_eq!(identify(vec![def], "top").nets.len(), 2);

    // empty labels never join
    let mut def = CircuitDef::new("top");
    def.add_wire(p(0, 0), p(5, 0));
    def.add_component(Component::new(1, vec![source("out", p(5, 0))]));
    def.add_component(tunnel(2, p(0, 0), ""));
    def.add_wire(p(100, 0), p(105, 0));
    def.add_component(Component::new(3, vec![sink("a", p(105, 0))]));
    def.add_component(tunnel(4, p(100, 0), ""));
    assert_eq!(identify(vec![def], "top").nets.len(), 2);
}

#[test]
fn unwired_tunnels_still_join() {
    let mut def = CircuitDef::new("top");
    for (id, at) in [(1, p(0, 0)), (2, p(50, 50))] {
        def.add_component(Component::new(
            id,
            vec![Port::new("t", at, PortKind::Tunnel, 1, Direction::Inout).with_compare_name("x")],
        ));
    }

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 1);
    assert!(netlist.unconnected.ports.is_empty());
}

#[test]
fn dangling_geometry_is_reported_not_fatal() {
    let mut def = CircuitDef::new("top");
    // a wire group touching no port
    def.add_wire(p(0, 0), p(10, 0));
    // a port on no wire
    def.add_component(Component::new(1, vec![sink("a", p(50, 50))]));
    // and one real net
    def.add_wire(p(100, 0), p(110, 0));
    def.add_component(Component::new(2, vec![source("out", p(100, 0))]));
    def.add_component(Component::new(3, vec![sink("b", p(110, 0))]));

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 1);
    assert_eq!(netlist.unconnected.wires.len(), 1);
    assert_eq!(
        netlist.unconnected.ports,
        vec![PortRef {
            instance: 0,
            component: 1,
            name: "a".to_string(),
        }]
    );
}

#[test]
fn subcircuit_instances_are_disjoint() {
    // leaf: an IO pin fused upward, wired to one internal sink
    let mut leaf = CircuitDef::new("leaf");
    leaf.add_wire(p(0, 0), p(5, 0));
    leaf.add_component(Component::new(
        1,
        vec![Port::new("a", p(0, 0), PortKind::Ascend, 1, Direction::In)],
    ));
    leaf.add_component(Component::new(2, vec![sink("g", p(5, 0))]));

    let mut top = CircuitDef::new("top");
    for (id, x) in [(10, 0), (11, 100)] {
        top.add_wire(p(x - 5, 0), p(x, 0));
        top.add_component(Component::new(id + 10, vec![source("out", p(x - 5, 0))]));
        top.add_component(Component::subcircuit(
            id,
            vec![Port::new("a", p(x, 0), PortKind::Descend, 1, Direction::In)],
            "leaf",
        ));
    }

    let netlist = identify(vec![top, leaf], "top");
    assert_eq!(netlist.instances.len(), 3);
    assert_eq!(netlist.instances[0].parent, None);
    assert_eq!(netlist.instances[1].parent, Some(0));
    assert_eq!(netlist.instances[2].parent, Some(0));

    assert_eq!(netlist.nets.len(), 2);
    let first = &netlist.nets[0];
    let second = &netlist.nets[1];
    // identical internal structure, disjoint identifiers
    assert_eq!(first.ios.len(), 2);
    assert_eq!(second.ios.len(), 2);
    for net in [first, second] {
        assert!(net
            .ios
            .iter()
            .any(|io| io == &IoId::new("g", Suffix::new(2, 1))
                || io == &IoId::new("g", Suffix::new(2, 2))));
    }
    assert!(first.ios.iter().all(|io| !second.ios.contains(io)));
}

#[test]
fn splitter_fans_bus_into_channels() {
    let mut def = CircuitDef::new("top");
    // a 4-bit source wired to the bus side
    def.add_wire(p(-5, 0), p(0, 0));
    def.add_component(Component::new(
        1,
        vec![Port::new("w", p(-5, 0), PortKind::Ordinary, 4, Direction::Out)],
    ));
    // the splitter
    let mut ports = vec![Port::new("bus", p(0, 0), PortKind::Bus, 4, Direction::Inout)];
    for k in 0..4u32 {
        ports.push(Port::new(
            &format!("c{k}"),
            p(10, 10 * k as i32),
            PortKind::Channel(k),
            1,
            Direction::Inout,
        ));
    }
    def.add_component(Component::new(2, ports));
    // each channel wired to its own sink
    for k in 0..4 {
        def.add_wire(p(10, 10 * k), p(20, 10 * k));
        def.add_component(Component::new(
            10 + k as u32,
            vec![sink("a", p(20, 10 * k))],
        ));
    }

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 4);
    for k in 0..4u32 {
        let io = IoId::bit("w", k, Suffix::new(1, 0));
        let nets = netlist.nets_of(&io);
        assert_eq!(nets.len(), 1, "bit {k} lands in exactly one net");
        let net = netlist.net(nets[0]);
        assert!(net.ios.contains(&IoId::new("a", Suffix::new(10 + k, 0))));
        assert_eq!(net.ios.len(), 2);
    }
}

#[test]
fn widths_propagate_across_splitter_chain() {
    let mut def = CircuitDef::new("top");
    // two splitters joined bus-to-bus; neither declares the bus width
    def.add_wire(p(0, 0), p(5, 0));
    let splitter = |id, bus_at: Point, ch_x: i32| {
        Component::new(
            id,
            vec![
                Port::new("bus", bus_at, PortKind::Bus, 1, Direction::Inout),
                Port::new("c0", p(ch_x, 10), PortKind::Channel(0), 1, Direction::Inout),
                Port::new("c1", p(ch_x, 20), PortKind::Channel(1), 1, Direction::Inout),
            ],
        )
    };
    def.add_component(splitter(1, p(0, 0), 0));
    def.add_component(splitter(2, p(5, 0), 5));
    for (component, x, name) in [(10, 0, "a0"), (11, 0, "a1"), (12, 5, "b0"), (13, 5, "b1")] {
        let y = if name.ends_with('0') { 10 } else { 20 };
        def.add_wire(p(x, y), p(x - 3, y));
        def.add_component(Component::new(component, vec![sink(name, p(x - 3, y))]));
    }

    let netlist = identify(vec![def], "top");
    assert_eq!(netlist.nets.len(), 2);
    let a0 = netlist.nets_of(&IoId::new("a0", Suffix::new(10, 0)));
    let b0 = netlist.nets_of(&IoId::new("b0", Suffix::new(12, 0)));
    assert_eq!(a0, b0);
    let a1 = netlist.nets_of(&IoId::new("a1", Suffix::new(11, 0)));
    let b1 = netlist.nets_of(&IoId::new("b1", Suffix::new(13, 0)));
    assert_eq!(a1, b1);
    assert_ne!(a0, a1);
}

#[test]
fn recursive_circuit_is_rejected() {
    let mut def = CircuitDef::new("loop");
    def.add_component(Component::subcircuit(
        1,
        vec![Port::new("a", p(0, 0), PortKind::Descend, 1, Direction::In)],
        "loop",
    ));

    let design = Design::new(vec![def]).unwrap();
    let err = design.identify("loop", &ResolveOptions::default());
    assert!(matches!(err, Err(NetError::RecursiveCircuit(_))));
}

#[test]
fn missing_top_is_rejected() {
    let design = Design::new(vec![CircuitDef::new("top")]).unwrap();
    let err = design.identify("nope", &ResolveOptions::default());
    assert!(matches!(err, Err(NetError::NoSuchCircuit(_))));
}
