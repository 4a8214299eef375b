//! Integration tests for the cirq library

use cirq::prelude::*;
use cirq::{CircuitOptions, CircuitRepresentation, ConnectionTuple, PortId};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

struct MachZehnder {
    circuit: Circuit,
    field: Arc<Domain>,
    wire: Arc<Domain>,
}

/// Two beamsplitters with a phase shifter in one arm.
fn mach_zehnder() -> MachZehnder {
    let field = Arc::new(Domain::one_to_one("fieldmode"));
    let wire = Arc::new(Domain::undirected("electrical"));

    let mut bs_ports = inputs(&["In1", "In2"], &field).unwrap();
    bs_ports.extend(outputs(&["Out1", "Out2"], &field).unwrap());
    let beamsplitter = Arc::new(ComponentType::new("Beamsplitter", bs_ports).unwrap());

    let mut phase_ports = inputs(&["In1"], &field).unwrap();
    phase_ports.extend(inouts(&["Control"], &wire).unwrap());
    phase_ports.extend(outputs(&["Out1"], &field).unwrap());
    let phase = Arc::new(ComponentType::new("Phase", phase_ports).unwrap());

    let mut ports = inputs(&["In1", "In2"], &field).unwrap();
    ports.extend(inouts(&["Control"], &wire).unwrap());
    ports.extend(outputs(&["Out1", "Out2"], &field).unwrap());

    let mut circuit = Circuit::build(
        "MachZehnder",
        ports,
        vec![
            beamsplitter.make_instance("b1"),
            beamsplitter.make_instance("b2"),
            phase.make_instance("phi"),
        ],
    )
    .unwrap();

    let pairs = [
        ("MachZehnder", "In1", "b1", "In1"),
        ("MachZehnder", "In2", "b1", "In2"),
        ("b1", "Out1", "phi", "In1"),
        ("b1", "Out2", "b2", "In1"),
        ("phi", "Out1", "b2", "In2"),
        ("b2", "Out1", "MachZehnder", "Out1"),
        ("b2", "Out2", "MachZehnder", "Out2"),
        ("MachZehnder", "Control", "phi", "Control"),
    ];
    for (so, sp, to, tp) in pairs {
        let s = circuit.resolve_port(so, sp).unwrap();
        let t = circuit.resolve_port(to, tp).unwrap();
        circuit
            .try_connect(s, t, true)
            .unwrap_or_else(|e| panic!("{}.{} -> {}.{}: {}", so, sp, to, tp, e));
    }

    MachZehnder {
        circuit,
        field,
        wire,
    }
}

fn port(c: &Circuit, owner: &str, name: &str) -> PortId {
    c.resolve_port(owner, name).unwrap()
}

#[test]
fn test_mach_zehnder_round_trip() {
    let mz = mach_zehnder();
    let repr = mz.circuit.to_representation();
    let reloaded = Circuit::from_representation(&repr).unwrap();

    assert_eq!(reloaded.name(), "MachZehnder");
    assert_eq!(reloaded.port_names(), mz.circuit.port_names());
    let mut names: Vec<&str> = reloaded.instances().map(|i| i.name()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["b1", "b2", "phi"]);
    assert_eq!(reloaded.connection_count(), 8);
    assert_eq!(reloaded.to_representation(), repr);
}

#[test]
fn test_mach_zehnder_matches_fixture() {
    let mz = mach_zehnder();
    let loaded = cirq::load_circuit(&fixture_path("mach_zehnder.json")).unwrap();
    assert_eq!(loaded.to_representation(), mz.circuit.to_representation());
}

#[test]
fn test_mach_zehnder_nets() {
    let mz = mach_zehnder();
    let c = &mz.circuit;

    let electrical = c.get_nets(&mz.wire);
    assert_eq!(
        electrical,
        vec![vec![port(c, "MachZehnder", "Control"), port(c, "phi", "Control")]]
    );

    // every fieldmode connection pairs exactly two ports
    let field = c.get_nets(&mz.field);
    assert_eq!(field.len(), 7);
    assert!(field.iter().all(|net| net.len() == 2));
    assert_eq!(
        field[0],
        vec![port(c, "MachZehnder", "In1"), port(c, "b1", "In1")]
    );
}

#[test]
fn test_one_to_one_blocks_second_connection() {
    let mut mz = mach_zehnder();
    let c = &mut mz.circuit;
    let in1 = port(c, "MachZehnder", "In1");
    let b1_in1 = port(c, "b1", "In1");
    let b2_in1 = port(c, "b2", "In1");
    let phi_in1 = port(c, "phi", "In1");

    assert_eq!(
        c.try_connect(in1, b2_in1, true),
        Err(Rejection::PortOccupied("fieldmode".into()))
    );
    assert_eq!(
        c.try_connect(in1, phi_in1, true),
        Err(Rejection::PortOccupied("fieldmode".into()))
    );

    let existing = c.connections_out(in1)[0];
    c.delete_connection(existing).unwrap();
    // b2.In1 is still fed by b1.Out2
    assert!(c.connect(in1, b2_in1, true).is_none());
    assert!(c.connect(in1, b1_in1, true).is_some());
}

#[test]
fn test_non_causal_reverse_duplicate() {
    let mut mz = mach_zehnder();
    let c = &mut mz.circuit;
    let control = port(c, "MachZehnder", "Control");
    let phi_control = port(c, "phi", "Control");

    assert_eq!(
        c.try_connect(phi_control, control, true),
        Err(Rejection::AlreadyConnected)
    );
    assert_eq!(
        c.try_connect(control, phi_control, true),
        Err(Rejection::AlreadyConnected)
    );
}

#[test]
fn test_delete_instance_removes_its_connections() {
    let mut mz = mach_zehnder();
    let c = &mut mz.circuit;
    let phi = c.instance_named("phi").unwrap().id();
    let before = c.connection_count();

    let detached = c.remove_instance(phi).unwrap();
    assert_eq!(detached.component_type().name(), "Phase");
    // b1.Out1 -> phi.In1, phi.Out1 -> b2.In2, Control -> phi.Control
    assert_eq!(c.connection_count(), before - 3);

    for (_, conn) in c.connections() {
        assert!(c.port(conn.source).is_some());
        assert!(c.port(conn.target).is_some());
    }
    assert!(c.connections_out(port(c, "b1", "Out1")).is_empty());
    assert!(c.connections_in(port(c, "b2", "In2")).is_empty());
    assert_eq!(c.get_nets(&mz.wire), vec![vec![port(c, "MachZehnder", "Control")]]);

    let repr = c.to_representation();
    assert!(!repr.component_instances.contains_key("phi"));
    assert!(repr
        .connections
        .iter()
        .all(|t| t.0 != "phi" && t.2 != "phi"));
}

#[test]
fn test_nets_ignore_insertion_order() {
    let mz = mach_zehnder();
    let mut repr = mz.circuit.to_representation();
    let forward = Circuit::from_representation(&repr).unwrap();
    repr.connections.reverse();
    let backward = Circuit::from_representation(&repr).unwrap();

    let labels = |c: &Circuit, d: &Domain| -> Vec<Vec<String>> {
        c.get_nets(d)
            .into_iter()
            .map(|net| net.into_iter().filter_map(|p| c.port_label(p)).collect())
            .collect()
    };
    assert_eq!(labels(&forward, &mz.field), labels(&backward, &mz.field));
    assert_eq!(labels(&forward, &mz.wire), labels(&backward, &mz.wire));
}

#[test]
fn test_four_way_role_matrix() {
    let signal = Arc::new(Domain::causal("signal"));
    let mut ports = inputs(&["i"], &signal).unwrap();
    ports.extend(outputs(&["o"], &signal).unwrap());
    let buffer = Arc::new(ComponentType::new("Buffer", ports.clone()).unwrap());
    let mut c = Circuit::build("Box", ports, vec![buffer.make_instance("buf")]).unwrap();

    let ext_in = port(&c, "Box", "i");
    let ext_out = port(&c, "Box", "o");
    let int_in = port(&c, "buf", "i");
    let int_out = port(&c, "buf", "o");

    // sources: external in, internal out; targets: external out, internal in
    assert_eq!(c.valid_connection(int_in, ext_in), Ok((ext_in, int_in)));
    assert_eq!(c.valid_connection(ext_out, int_out), Ok((int_out, ext_out)));
    assert_eq!(c.valid_connection(ext_in, ext_out), Ok((ext_in, ext_out)));
    assert_eq!(c.valid_connection(int_out, int_in), Ok((int_out, int_in)));
    assert_eq!(c.valid_connection(ext_in, int_out), Err(Rejection::NoSourceTargetPair));
    assert_eq!(c.valid_connection(ext_out, int_in), Err(Rejection::NoSourceTargetPair));

    // fan-out is fine outside one-to-one domains
    c.connect(ext_in, int_in, true).unwrap();
    c.connect(ext_in, ext_out, true).unwrap();
    assert_eq!(c.connections_out(ext_in).len(), 2);
}

#[test]
fn test_verified_load_of_fixture() {
    let path = fixture_path("overbooked.json");
    let json = std::fs::read_to_string(&path).unwrap();
    let repr = CircuitRepresentation::from_json(&json).unwrap();

    let trusted = Circuit::load_json(&path).unwrap();
    assert_eq!(trusted.connection_count(), 5);

    let report = repr.load(CircuitOptions::verified()).unwrap();
    assert_eq!(report.circuit.connection_count(), 3);
    let rejected: Vec<(&ConnectionTuple, &Rejection)> =
        report.rejected.iter().map(|r| (&r.connection, &r.reason)).collect();
    assert_eq!(rejected.len(), 2);
    assert_eq!(rejected[0].0 .3, "In1");
    assert_eq!(*rejected[0].1, Rejection::PortOccupied("fieldmode".into()));
    assert_eq!(*rejected[1].1, Rejection::AlreadyConnected);
}

#[test]
fn test_load_missing_file() {
    let result = Circuit::load_json(fixture_path("does_not_exist.json"));
    assert!(matches!(result, Err(CircuitError::Io(_))));
}

#[test]
fn test_save_and_reload() {
    let mz = mach_zehnder();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mz.json");
    mz.circuit.save_json(&path).unwrap();

    let reloaded = Circuit::load_json(&path).unwrap();
    assert_eq!(reloaded.to_representation(), mz.circuit.to_representation());
    assert_eq!(reloaded.stats(), mz.circuit.stats());
}
