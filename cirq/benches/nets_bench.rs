use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cirq::prelude::*;
use std::sync::Arc;

/// A ladder of `n` two-port cells whose wires all meet in a few long nets.
fn ladder(n: usize) -> (Circuit, Arc<Domain>) {
    let wire = Arc::new(Domain::undirected("electrical"));
    let cell = Arc::new(ComponentType::new("Cell", inouts(&["a", "b"], &wire).unwrap()).unwrap());

    let instances = (0..n).map(|i| cell.make_instance(format!("c{}", i))).collect();
    let mut circuit = Circuit::build("Ladder", inouts(&["top", "bottom"], &wire).unwrap(), instances).unwrap();

    for i in 1..n {
        let prev_a = circuit.resolve_port(&format!("c{}", i - 1), "a").unwrap();
        let a = circuit.resolve_port(&format!("c{}", i), "a").unwrap();
        circuit.connect(a, prev_a, true);
        if i % 7 != 0 {
            let prev_b = circuit.resolve_port(&format!("c{}", i - 1), "b").unwrap();
            let b = circuit.resolve_port(&format!("c{}", i), "b").unwrap();
            circuit.connect(prev_b, b, true);
        }
    }
    (circuit, wire)
}

fn bench_get_nets(c: &mut Criterion) {
    let (circuit, wire) = ladder(500);
    c.bench_function("get_nets_ladder_500", |b| {
        b.iter(|| circuit.get_nets(black_box(&wire)));
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let (circuit, _) = ladder(200);
    let repr = circuit.to_representation();
    c.bench_function("from_representation_ladder_200", |b| {
        b.iter(|| Circuit::from_representation(black_box(&repr)));
    });
}

criterion_group!(benches, bench_get_nets, bench_round_trip);
criterion_main!(benches);
