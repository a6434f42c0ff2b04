use circuitry::nodes::FnHooks;
use circuitry::{Circuit, CircuitError, Node, NodeId, NodeKind};
use rstest::rstest;
use std::cell::RefCell;
use std::rc::Rc;

fn output_states(circuit: &Circuit) -> Vec<(NodeId, String, bool)> {
    circuit
        .live_nodes()
        .into_iter()
        .flat_map(|id| {
            let node = circuit.node(id).unwrap();
            node.outputs()
                .iter()
                .map(|out| (id, out.id.clone(), out.state))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn emitted(circuit: &Circuit) -> Vec<(NodeId, Vec<(String, bool)>)> {
    circuit
        .live_nodes()
        .into_iter()
        .map(|id| {
            let mut values: Vec<_> = circuit
                .last_emitted(id)
                .unwrap()
                .iter()
                .map(|(p, v)| (p.clone(), *v))
                .collect();
            values.sort();
            (id, values)
        })
        .collect()
}

#[test]
fn single_and_gate() {
    let mut circuit = Circuit::new();
    let and = circuit.add_node(Node::new(NodeKind::And)).unwrap();
    let led = circuit.add_node(Node::led()).unwrap();
    circuit.connect(and, "out", led, "in").unwrap();

    // Settle so the gate has emitted once
    circuit.request_update(and).unwrap();
    circuit.calc();
    assert!(circuit.pending().is_empty());

    circuit.set_input(and, "a", true).unwrap();
    assert_eq!(circuit.pending(), vec![and]);
    circuit.tick();
    assert!(!circuit.get_state(and, "out").unwrap());
    assert!(circuit.pending().is_empty());

    circuit.set_input(and, "b", true).unwrap();
    circuit.tick();
    assert!(circuit.get_state(and, "out").unwrap());
    assert_eq!(circuit.last_emitted(and).unwrap().get("out"), Some(&true));
    assert_eq!(circuit.pending(), vec![led]);

    circuit.tick();
    assert_eq!(circuit.node(led).unwrap().is_lit(), Some(true));
}

#[test]
fn and_chain_settles_in_two_ticks() {
    let mut circuit = Circuit::new();
    let first = circuit.add_node(Node::new(NodeKind::And)).unwrap();
    let second = circuit.add_node(Node::new(NodeKind::And)).unwrap();
    circuit.connect(first, "out", second, "a").unwrap();
    circuit.set_input(second, "b", true).unwrap();
    circuit.request_update(first).unwrap();
    circuit.calc();

    circuit.set_input(first, "a", true).unwrap();
    circuit.set_input(first, "b", true).unwrap();
    assert_eq!(circuit.calc(), 2);
    assert!(circuit.get_state(second, "out").unwrap());
}

#[test]
fn settled_circuit_is_a_fixed_point() {
    let mut circuit = Circuit::new();
    let t = circuit.add_node(Node::new(NodeKind::True)).unwrap();
    let not = circuit.add_node(Node::new(NodeKind::Not)).unwrap();
    let led = circuit.add_node(Node::led()).unwrap();
    circuit.connect(t, "out", not, "in").unwrap();
    circuit.connect(not, "out", led, "in").unwrap();

    assert!(circuit.calc() > 0);
    let before = output_states(&circuit);
    let values = emitted(&circuit);

    circuit.tick();
    assert_eq!(output_states(&circuit), before);
    assert_eq!(emitted(&circuit), values);
    assert!(circuit.pending().is_empty());
    assert_eq!(circuit.calc(), 0);
}

#[test]
fn unchanged_output_schedules_nothing() {
    let mut circuit = Circuit::new();
    let t = circuit.add_node(Node::new(NodeKind::True)).unwrap();
    let led = circuit.add_node(Node::led()).unwrap();
    circuit.connect(t, "out", led, "in").unwrap();
    circuit.calc();

    circuit.request_update(t).unwrap();
    circuit.tick();
    assert!(circuit.pending().is_empty());
}

#[test]
fn removed_driver_reads_as_undriven() {
    let mut circuit = Circuit::new();
    let t = circuit.add_node(Node::new(NodeKind::True)).unwrap();
    let led = circuit.add_node(Node::led()).unwrap();
    circuit.connect(t, "out", led, "in").unwrap();
    circuit.calc();
    assert!(circuit.get_input(led, "in").unwrap());

    circuit.remove_node(t).unwrap();
    assert!(!circuit.get_input(led, "in").unwrap());
    assert!(matches!(circuit.get_state(t, "out"), Err(CircuitError::UnknownNode(_))));

    circuit.request_update(led).unwrap();
    circuit.calc();
    assert_eq!(circuit.node(led).unwrap().is_lit(), Some(false));
}

#[test]
fn reset_schedules_force_update_nodes_only() {
    let mut circuit = Circuit::new();
    let button = circuit.add_node(Node::button()).unwrap();
    let t = circuit.add_node(Node::new(NodeKind::True)).unwrap();
    let or = circuit.add_node(Node::new(NodeKind::Or)).unwrap();
    let led = circuit.add_node(Node::led()).unwrap();
    circuit.connect(button, "out", or, "a").unwrap();
    circuit.connect(t, "out", or, "b").unwrap();
    circuit.connect(or, "out", led, "in").unwrap();

    circuit.click(button).unwrap();
    circuit.calc();
    assert!(circuit.get_state(button, "out").unwrap());

    circuit.reset();
    let mut expected = vec![button, t];
    expected.sort();
    assert_eq!(circuit.pending(), expected);
    assert!(output_states(&circuit).iter().all(|(_, _, v)| !v));
    assert!(circuit.last_emitted(or).unwrap().is_empty());
    assert_eq!(circuit.node(led).unwrap().is_lit(), Some(false));

    circuit.calc();
    // The click did not survive the reset
    assert!(!circuit.get_state(button, "out").unwrap());
    assert_eq!(circuit.node(led).unwrap().is_lit(), Some(true));
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(0xdead_beef)]
fn reset_is_deterministic(#[case] seed: u64) {
    let mut template = Circuit::new();
    let r1 = template.add_node(Node::random(seed)).unwrap();
    let r2 = template.add_node(Node::random(seed.wrapping_add(1))).unwrap();
    let xor = template.add_node(Node::new(NodeKind::Xor)).unwrap();
    let led = template.add_node(Node::led()).unwrap();
    template.connect(r1, "out", xor, "a").unwrap();
    template.connect(r2, "out", xor, "b").unwrap();
    template.connect(xor, "out", led, "in").unwrap();

    let run = |circuit: &mut Circuit| {
        circuit.reset();
        let mut ticks = vec![circuit.calc()];
        for _ in 0..5 {
            circuit.request_update(r1).unwrap();
            circuit.request_update(r2).unwrap();
            ticks.push(circuit.calc());
        }
        (ticks, output_states(circuit), emitted(circuit))
    };

    let mut first = Circuit::from_nodes(template.snapshot()).unwrap();
    let mut second = Circuit::from_nodes(template.snapshot()).unwrap();
    let a = run(&mut first);
    assert_eq!(a, run(&mut second));
    // Running the same circuit again after another reset repeats itself
    assert_eq!(a, run(&mut first));
}

#[test]
fn oscillator_never_settles() {
    let mut circuit = Circuit::new();
    let not = circuit.add_node(Node::new(NodeKind::Not)).unwrap();
    let nop = circuit.add_node(Node::new(NodeKind::Nop)).unwrap();
    circuit.connect(not, "out", nop, "in").unwrap();
    circuit.connect(nop, "out", not, "in").unwrap();

    circuit.reset();
    circuit.request_update(not).unwrap();
    let mut seen = Vec::new();
    for _ in 0..8 {
        circuit.tick();
        seen.push(circuit.get_state(not, "out").unwrap());
    }
    assert!(seen.contains(&true) && seen.contains(&false));
    assert!(matches!(
        circuit.calc_bounded(100),
        Err(CircuitError::NoFixedPoint { ticks: 100 })
    ));
}

#[test]
fn hooks_stop_after_removal() {
    let removed = Rc::new(RefCell::new(0));
    let counter = removed.clone();

    struct CountRemoval(Rc<RefCell<usize>>);
    impl circuitry::nodes::NodeHooks for CountRemoval {
        fn on_node_removed(&mut self, _node: &Node) {
            *self.0.borrow_mut() += 1;
        }
    }

    let mut circuit = Circuit::new();
    let button = circuit.add_node(Node::button()).unwrap();
    circuit.set_hooks(button, Box::new(CountRemoval(counter))).unwrap();
    circuit.remove_node(button).unwrap();
    assert_eq!(*removed.borrow(), 1);
    assert!(circuit
        .set_hooks(button, Box::new(FnHooks::new(|_: &Node| {}, |_: &Node| {})))
        .is_err());
}

#[test]
fn click_requires_a_button() {
    let mut circuit = Circuit::new();
    let led = circuit.add_node(Node::led()).unwrap();
    assert!(matches!(circuit.click(led), Err(CircuitError::NotAButton(_))));
    assert!(matches!(
        circuit.set_input(led, "nope", true),
        Err(CircuitError::UnknownInputPort { .. })
    ));
}
