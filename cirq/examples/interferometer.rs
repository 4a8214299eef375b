//! Interferometer example: build a Mach-Zehnder circuit, print its document
//! and its nets.

use cirq::prelude::*;
use std::sync::Arc;

fn main() -> Result<(), CircuitError> {
    let field = Arc::new(Domain::one_to_one("fieldmode"));
    let wire = Arc::new(Domain::undirected("electrical"));

    let mut bs_ports = inputs(&["In1", "In2"], &field)?;
    bs_ports.extend(outputs(&["Out1", "Out2"], &field)?);
    let beamsplitter = Arc::new(ComponentType::new("Beamsplitter", bs_ports)?);

    let mut phase_ports = inputs(&["In1"], &field)?;
    phase_ports.extend(inouts(&["Control"], &wire)?);
    phase_ports.extend(outputs(&["Out1"], &field)?);
    let phase = Arc::new(ComponentType::new("Phase", phase_ports)?);

    let mut ports = inputs(&["In1", "In2"], &field)?;
    ports.extend(inouts(&["Control"], &wire)?);
    ports.extend(outputs(&["Out1", "Out2"], &field)?);

    let mut circuit = Circuit::build(
        "MachZehnder",
        ports,
        vec![
            beamsplitter.make_instance("b1"),
            beamsplitter.make_instance("b2"),
            phase.make_instance("phi"),
        ],
    )?;

    let links = [
        ("MachZehnder", "In1", "b1", "In1"),
        ("MachZehnder", "In2", "b1", "In2"),
        ("b1", "Out1", "phi", "In1"),
        ("b1", "Out2", "b2", "In1"),
        ("phi", "Out1", "b2", "In2"),
        ("b2", "Out1", "MachZehnder", "Out1"),
        ("b2", "Out2", "MachZehnder", "Out2"),
        ("MachZehnder", "Control", "phi", "Control"),
    ];
    for (so, sp, to, tp) in links {
        let (Some(s), Some(t)) = (circuit.resolve_port(so, sp), circuit.resolve_port(to, tp)) else {
            eprintln!("Unknown port in {}.{} -> {}.{}", so, sp, to, tp);
            std::process::exit(1);
        };
        circuit.try_connect(s, t, true)?;
    }

    println!("{}", circuit.to_json_pretty()?);
    println!();

    for domain in [&field, &wire] {
        println!("Nets of {}:", domain.name());
        for net in circuit.get_nets(domain) {
            let labels: Vec<String> = net.iter().filter_map(|p| circuit.port_label(*p)).collect();
            println!("  - {}", labels.join(", "));
        }
    }

    Ok(())
}
