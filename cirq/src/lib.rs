//! Cirq - typed circuit graphs with domain-checked connections
//!
//! This library models circuits as graphs of component instances whose
//! ports are connected under the rules of their connection domain
//! (directed or undirected, one-to-one or fan-out). It resolves nets and
//! round-trips circuits through a name-based JSON document.
//!
//! # Quick Start
//!
//! ```
//! use cirq::prelude::*;
//! use std::sync::Arc;
//!
//! let signal = Arc::new(Domain::causal("signal"));
//! let mut ports = inputs(&["i"], &signal).unwrap();
//! ports.extend(outputs(&["o"], &signal).unwrap());
//! let buffer = Arc::new(ComponentType::new("Buffer", ports).unwrap());
//!
//! let mut circuit = Circuit::new("Chain");
//! circuit.add_instance(buffer.make_instance("b1")).unwrap();
//! circuit.add_instance(buffer.make_instance("b2")).unwrap();
//!
//! let o1 = circuit.resolve_port("b1", "o").unwrap();
//! let i2 = circuit.resolve_port("b2", "i").unwrap();
//! // argument order does not matter for causal domains
//! let id = circuit.connect(i2, o1, true).unwrap();
//! assert_eq!(circuit.connection(id).unwrap().source, o1);
//!
//! let nets = circuit.get_nets(&signal);
//! assert_eq!(nets.len(), 3);
//! ```
//!
//! # Features
//!
//! - **Connection policy**: source/target roles, one-to-one domains
//! - **Net resolution**: connected port groups per domain
//! - **Persistence**: JSON documents via `serde`
//! - **Editing**: click events, selection, editor commands, snapshots

pub mod circuit;
pub mod component;
pub mod config;
pub mod connection;
pub mod domain;
pub mod editor;
pub mod error;
pub mod events;
pub mod nets;
pub mod port;
pub mod representation;
pub mod shared;

// Re-export main types
pub use circuit::{Circuit, CircuitStats, PortMove};
pub use component::{ComponentInstance, ComponentType, InstanceId, PlacedInstance};
pub use config::CircuitOptions;
pub use connection::{Connection, ConnectionId, PortGraph};
pub use domain::{Direction, Domain};
pub use editor::{Editor, EditorCommand, Panel};
pub use error::{CircuitError, Rejection, Result};
pub use events::{EditorEvent, EditorRequest, Element, EventOutcome, Snapshot};
pub use port::{inouts, inputs, outputs, Named, Owner, Port, PortId, PortOwner, PortSpec};
pub use representation::{CircuitRepresentation, ConnectionTuple, LoadReport, RejectedConnection};
pub use shared::SharedCircuit;

/// Load a circuit document from disk (convenience wrapper).
pub fn load_circuit(path: &std::path::Path) -> Result<Circuit> {
    Circuit::load_json(path)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        inouts, inputs, outputs, Circuit, CircuitError, ComponentType, Direction, Domain,
        EditorEvent, Element, EventOutcome, Named, PortOwner, Rejection,
    };
}
