//! Connections and the port graph that stores them.
//!
//! Ports are nodes and connections are directed edges of a
//! [`StableDiGraph`]. A port's incoming and outgoing edges are its
//! `connections_in` / `connections_out`, so adding or removing an edge
//! registers or unregisters the connection at both endpoints in one step.

use petgraph::stable_graph::{EdgeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction as EdgeDirection;
use serde::{Deserialize, Serialize};

use crate::port::{Port, PortId};

/// Handle of a connection in a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub(crate) EdgeIndex);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "connection#{}", self.0.index())
    }
}

/// A directed connection between two ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub source: PortId,
    pub target: PortId,
}

impl Connection {
    pub fn involves(&self, port: PortId) -> bool {
        self.source == port || self.target == port
    }

    /// The endpoint opposite to `port`, if `port` is an endpoint.
    pub fn other_end(&self, port: PortId) -> Option<PortId> {
        if self.source == port {
            Some(self.target)
        } else if self.target == port {
            Some(self.source)
        } else {
            None
        }
    }
}

/// Edge weight; the serial keeps adjacency lists in creation order.
#[derive(Debug, Clone, Copy)]
struct Link {
    serial: u64,
}

/// Arena of placed ports and the connections between them.
#[derive(Debug, Clone, Default)]
pub struct PortGraph {
    graph: StableDiGraph<Port, Link>,
    next_serial: u64,
}

impl PortGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_port(&mut self, port: Port) -> PortId {
        PortId(self.graph.add_node(port))
    }

    /// Remove a port node. Callers detach its connections first.
    pub(crate) fn remove_port(&mut self, id: PortId) -> Option<Port> {
        debug_assert_eq!(self.degree(id), 0, "removing a port that still has connections");
        self.graph.remove_node(id.0)
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.graph.node_weight(id.0)
    }

    pub(crate) fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.graph.node_weight_mut(id.0)
    }

    pub fn contains_port(&self, id: PortId) -> bool {
        self.graph.contains_node(id.0)
    }

    pub fn ports(&self) -> impl Iterator<Item = (PortId, &Port)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|p| (PortId(idx), p)))
    }

    pub fn port_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Add the edge `source -> target`. No policy check happens here.
    pub(crate) fn link(&mut self, source: PortId, target: PortId) -> Option<ConnectionId> {
        if !self.contains_port(source) || !self.contains_port(target) {
            return None;
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        Some(ConnectionId(self.graph.add_edge(source.0, target.0, Link { serial })))
    }

    pub(crate) fn unlink(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connection(id)?;
        self.graph.remove_edge(id.0);
        Some(connection)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<Connection> {
        self.graph
            .edge_endpoints(id.0)
            .map(|(s, t)| Connection {
                source: PortId(s),
                target: PortId(t),
            })
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the directed edge `source -> target` exists.
    pub fn are_linked(&self, source: PortId, target: PortId) -> bool {
        self.graph.find_edge(source.0, target.0).is_some()
    }

    /// Connections ending at `port`, oldest first.
    pub fn connections_in(&self, port: PortId) -> Vec<ConnectionId> {
        self.adjacent(port, EdgeDirection::Incoming)
    }

    /// Connections starting at `port`, oldest first.
    pub fn connections_out(&self, port: PortId) -> Vec<ConnectionId> {
        self.adjacent(port, EdgeDirection::Outgoing)
    }

    /// Number of connections touching `port` in either direction.
    pub fn degree(&self, port: PortId) -> usize {
        if !self.contains_port(port) {
            return 0;
        }
        self.graph.edges_directed(port.0, EdgeDirection::Incoming).count()
            + self.graph.edges_directed(port.0, EdgeDirection::Outgoing).count()
    }

    fn adjacent(&self, port: PortId, direction: EdgeDirection) -> Vec<ConnectionId> {
        if !self.contains_port(port) {
            return Vec::new();
        }
        let mut edges: Vec<(u64, ConnectionId)> = self
            .graph
            .edges_directed(port.0, direction)
            .map(|e| (e.weight().serial, ConnectionId(e.id())))
            .collect();
        edges.sort_by_key(|(serial, _)| *serial);
        edges.into_iter().map(|(_, id)| id).collect()
    }
}
