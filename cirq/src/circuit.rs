//! Circuits: external ports, placed instances and their connections
//!
//! A [`Circuit`] owns its external ports, its placed component instances and
//! every connection between their ports. All ports live in one
//! [`PortGraph`]; owners refer to them by [`PortId`] and ports refer back to
//! their owner by [`Owner`], so there are no reference cycles.
//!
//! The circuit is only ever mutated through its own methods. Each method
//! validates, mutates and refreshes the derived name indices in one go.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::{ComponentInstance, ComponentType, InstanceId, PlacedInstance};
use crate::config::CircuitOptions;
use crate::connection::{Connection, ConnectionId, PortGraph};
use crate::domain::Domain;
use crate::error::{CircuitError, Rejection, Result};
use crate::events::{Element, SnapshotStore};
use crate::nets::resolve_nets;
use crate::port::{Named, Owner, Port, PortId, PortList, PortOwner, PortSlot, PortSpec};

/// Where to move an external port in the circuit's port order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMove {
    Up,
    Down,
}

/// The main Circuit struct
#[derive(Debug)]
pub struct Circuit {
    name: String,
    options: CircuitOptions,

    /// Every placed port and every connection
    pub(crate) graph: PortGraph,

    /// External ports, in declaration order
    ports: PortList<PortSlot>,

    /// Placed instances, in placement order
    instances: Vec<PlacedInstance>,

    /// Index mapping: instance name -> id
    instance_names: HashMap<String, InstanceId>,

    next_instance: u64,

    /// Connections, in creation order
    connections: Vec<ConnectionId>,

    pub(crate) selected: Option<Element>,
    pub(crate) snapshots: SnapshotStore,
}

impl Circuit {
    /// Create a new empty circuit
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, CircuitOptions::default())
    }

    pub fn with_options(name: impl Into<String>, options: CircuitOptions) -> Self {
        Self {
            name: name.into(),
            options,
            graph: PortGraph::new(),
            ports: PortList::default(),
            instances: Vec::new(),
            instance_names: HashMap::new(),
            next_instance: 0,
            connections: Vec::new(),
            selected: None,
            snapshots: SnapshotStore::default(),
        }
    }

    /// Create a circuit with initial external ports and instances.
    ///
    /// Fails on the first duplicate name or conflicting domain/type.
    pub fn build(
        name: impl Into<String>,
        ports: Vec<PortSpec>,
        instances: Vec<ComponentInstance>,
    ) -> Result<Self> {
        let mut circuit = Self::new(name);
        for port in ports {
            circuit.add_port(port)?;
        }
        for instance in instances {
            circuit.add_instance(instance)?;
        }
        Ok(circuit)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &CircuitOptions {
        &self.options
    }

    pub fn port_graph(&self) -> &PortGraph {
        &self.graph
    }

    /// Rename the circuit. The name may not collide with an instance name,
    /// since both act as owner names in the persisted connection list.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(CircuitError::EmptyName);
        }
        if self.instance_names.contains_key(&name) {
            return Err(CircuitError::NameConflict(name));
        }
        debug!("Renamed circuit {:?} to {:?}", self.name, name);
        self.name = name;
        Ok(())
    }

    // ---- ports ----

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.graph.port(id)
    }

    /// External port by name.
    pub fn external_port(&self, name: &str) -> Option<PortId> {
        self.ports.get(name).map(PortSlot::id)
    }

    pub fn external_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.ports.iter().map(PortSlot::id)
    }

    /// Add an external port.
    pub fn add_port(&mut self, spec: PortSpec) -> Result<PortId> {
        if self.ports.contains(spec.name()) {
            return Err(CircuitError::DuplicatePortName {
                owner: self.name.clone(),
                name: spec.name().to_string(),
            });
        }
        self.check_domain(spec.domain())?;

        let name = spec.name().to_string();
        let id = self.graph.insert_port(Port::attach(spec, Owner::Circuit));
        self.ports.push(&self.name, PortSlot::new(name.as_str(), id))?;
        debug!("Added external port {} ({})", name, id);
        Ok(id)
    }

    /// Remove an external port together with its connections.
    pub fn remove_port(&mut self, id: PortId) -> Option<PortSpec> {
        let port = self.graph.port(id)?;
        if !port.is_external() {
            return None;
        }
        let name = port.name().to_string();

        let removed = self.disconnect_port(id);
        self.ports.remove(&name);
        if self.selected == Some(Element::Port(id)) {
            self.selected = None;
        }
        let spec = self.graph.remove_port(id).map(Port::detach);
        debug!("Removed external port {} and {} connection(s)", name, removed);
        spec
    }

    /// Rename an external port, keeping names unique within the circuit.
    ///
    /// Instance ports keep the names declared by their component type.
    pub fn rename_port(&mut self, id: PortId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let Some(port) = self.graph.port(id) else {
            return Err(CircuitError::UnknownPort {
                owner: self.name.clone(),
                port: id.to_string(),
            });
        };
        let old = port.name().to_string();
        if let Owner::Instance(instance) = port.owner() {
            let owner = self
                .instance(instance)
                .map_or_else(|| instance.to_string(), |i| i.name().to_string());
            return Err(CircuitError::NotExternalPort { owner, port: old });
        }

        self.ports.rename(&self.name, &old, &name)?;
        if let Some(port) = self.graph.port_mut(id) {
            port.rename(name.clone());
        }
        debug!("Renamed port {:?} to {:?}", old, name);
        Ok(())
    }

    /// Move an external port one step up or down the port order.
    ///
    /// Returns `false` if `id` is not an external port.
    pub fn move_port(&mut self, id: PortId, step: PortMove) -> bool {
        let Some(name) = self
            .graph
            .port(id)
            .filter(|p| p.is_external())
            .map(|p| p.name().to_string())
        else {
            return false;
        };
        let Some(from) = self.ports.position(&name) else {
            return false;
        };
        let to = match step {
            PortMove::Up => from.max(1) - 1,
            PortMove::Down => from + 1,
        };
        self.ports.move_to(from, to);
        true
    }

    /// Ports attached to `domain`, in net enumeration order: external ports
    /// first, then each instance's ports in placement order.
    pub fn ports_for_domain(&self, domain: &Domain) -> Vec<PortId> {
        self.all_ports()
            .filter(|id| self.graph.port(*id).is_some_and(|p| p.domain().as_ref() == domain))
            .collect()
    }

    fn all_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.external_ports().chain(
            self.instances
                .iter()
                .flat_map(|i| i.port_list().iter().map(PortSlot::id)),
        )
    }

    /// Owner name as used in persisted connection tuples.
    pub fn owner_of(&self, port: PortId) -> Option<&str> {
        match self.graph.port(port)?.owner() {
            Owner::Circuit => Some(&self.name),
            Owner::Instance(id) => self.instance(id).map(PlacedInstance::name),
        }
    }

    /// Resolve `owner.port`, where `owner` is either the circuit's own name
    /// or an instance name.
    pub fn resolve_port(&self, owner: &str, port: &str) -> Option<PortId> {
        if owner == self.name {
            return self.external_port(port);
        }
        self.instance_named(owner)?.port_named(port).map(PortSlot::id)
    }

    /// Human readable `owner.port` label.
    pub fn port_label(&self, port: PortId) -> Option<String> {
        let name = self.graph.port(port)?.name();
        Some(format!("{}.{}", self.owner_of(port)?, name))
    }

    // ---- domains ----

    /// Domains used by any port, first occurrence first.
    pub fn domains(&self) -> Vec<Arc<Domain>> {
        let mut seen: Vec<Arc<Domain>> = Vec::new();
        for id in self.all_ports() {
            if let Some(port) = self.graph.port(id) {
                if !seen.iter().any(|d| d.name() == port.domain().name()) {
                    seen.push(Arc::clone(port.domain()));
                }
            }
        }
        seen
    }

    pub fn domain_named(&self, name: &str) -> Option<Arc<Domain>> {
        self.graph
            .ports()
            .map(|(_, p)| p.domain())
            .find(|d| d.name() == name)
            .cloned()
    }

    fn check_domain(&self, domain: &Domain) -> Result<()> {
        match self.domain_named(domain.name()) {
            Some(known) if known.as_ref() != domain => {
                Err(CircuitError::DomainConflict(domain.name().to_string()))
            }
            _ => Ok(()),
        }
    }

    // ---- instances ----

    pub fn instance(&self, id: InstanceId) -> Option<&PlacedInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    pub fn instance_named(&self, name: &str) -> Option<&PlacedInstance> {
        self.instance_names.get(name).and_then(|&id| self.instance(id))
    }

    /// Placed instances in placement order.
    pub fn instances(&self) -> impl Iterator<Item = &PlacedInstance> {
        self.instances.iter()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// `(column, row)` of an instance in the editor's placement grid.
    pub fn grid_cell(&self, id: InstanceId) -> Option<(usize, usize)> {
        self.instance(id)
            .map(|i| self.options.grid_cell(i.layout_index()))
    }

    /// Distinct component types in use, first occurrence first.
    pub fn component_types(&self) -> Vec<Arc<ComponentType>> {
        let mut seen: Vec<Arc<ComponentType>> = Vec::new();
        for placed in &self.instances {
            if !seen.iter().any(|t| t.name() == placed.component_type().name()) {
                seen.push(Arc::clone(placed.component_type()));
            }
        }
        seen
    }

    /// Place a detached instance in the circuit.
    pub fn add_instance(&mut self, instance: ComponentInstance) -> Result<InstanceId> {
        let name = instance.name().to_string();
        self.check_instance_name(&name)?;

        let ctype = instance.component_type();
        if let Some(known) = self.component_types().iter().find(|t| t.name() == ctype.name()) {
            if !known.same_interface(ctype) {
                return Err(CircuitError::ComponentTypeConflict(ctype.name().to_string()));
            }
        }
        for spec in instance.port_list() {
            self.check_domain(spec.domain())?;
        }

        let id = InstanceId(self.next_instance);
        self.next_instance += 1;

        let (name, ctype, specs) = instance.into_parts();
        let slots: Vec<PortSlot> = specs
            .into_iter()
            .map(|spec| {
                let slot_name = spec.name().to_string();
                let port = self.graph.insert_port(Port::attach(spec, Owner::Instance(id)));
                PortSlot::new(slot_name, port)
            })
            .collect();
        let ports = match PortList::new(&name, slots.clone()) {
            Ok(ports) => ports,
            Err(e) => {
                for slot in slots {
                    self.graph.remove_port(slot.id());
                }
                return Err(e);
            }
        };

        let layout_index = self.instances.len();
        debug!("Placed {} {:?} of type {:?}", id, name, ctype.name());
        self.instance_names.insert(name.clone(), id);
        self.instances
            .push(PlacedInstance::new(id, name, ctype, ports, layout_index));
        Ok(id)
    }

    /// Remove an instance. Every connection touching one of its ports is
    /// removed first. The instance is handed back detached, with fresh ports
    /// from its component type.
    pub fn remove_instance(&mut self, id: InstanceId) -> Option<ComponentInstance> {
        let position = self.instances.iter().position(|i| i.id() == id)?;
        let port_ids: Vec<PortId> = self.instances[position]
            .port_list()
            .iter()
            .map(PortSlot::id)
            .collect();

        let removed: usize = port_ids.iter().map(|&p| self.disconnect_port(p)).sum();

        let placed = self.instances.remove(position);
        self.instance_names.remove(placed.name());

        for &port in &port_ids {
            self.graph.remove_port(port);
        }

        if let Some(selected) = self.selected {
            let stale = match selected {
                Element::Instance(i) => i == id,
                Element::Port(p) => port_ids.contains(&p),
                Element::Connection(_) => false,
            };
            if stale {
                self.selected = None;
            }
        }

        debug!(
            "Removed instance {:?} and {} connection(s)",
            placed.name(),
            removed
        );
        Some(placed.component_type().make_instance(placed.name()))
    }

    pub fn rename_instance(&mut self, id: InstanceId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.check_instance_name(&name)?;
        let Some(placed) = self.instances.iter_mut().find(|i| i.id() == id) else {
            return Err(CircuitError::UnknownInstance(id.to_string()));
        };
        debug!("Renamed instance {:?} to {:?}", placed.name(), name);
        self.instance_names.remove(placed.name());
        self.instance_names.insert(name.clone(), id);
        placed.set_name(name);
        Ok(())
    }

    fn check_instance_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CircuitError::EmptyName);
        }
        if name == self.name {
            return Err(CircuitError::NameConflict(name.to_string()));
        }
        if self.instance_names.contains_key(name) {
            return Err(CircuitError::DuplicateInstanceName(name.to_string()));
        }
        Ok(())
    }

    // ---- connections ----

    /// Check whether `p1` and `p2` may be connected; see
    /// [`Domain::valid_connection`].
    pub fn valid_connection(&self, p1: PortId, p2: PortId) -> std::result::Result<(PortId, PortId), Rejection> {
        Domain::valid_connection(&self.graph, p1, p2)
    }

    /// Connect two ports and return the new connection.
    ///
    /// With `verify == false` the policy check is skipped (trusted bulk
    /// loads), but causal pairs are still oriented source first.
    pub fn try_connect(
        &mut self,
        p1: PortId,
        p2: PortId,
        verify: bool,
    ) -> std::result::Result<ConnectionId, Rejection> {
        let (source, target) = if verify {
            self.valid_connection(p1, p2)?
        } else {
            let first = self.graph.port(p1).ok_or(Rejection::UnknownPort)?;
            if first.domain().is_causal() && !first.is_source() {
                (p2, p1)
            } else {
                (p1, p2)
            }
        };

        let id = self.graph.link(source, target).ok_or(Rejection::UnknownPort)?;
        self.connections.push(id);
        debug!("Connected {} -> {} as {}", source, target, id);
        Ok(id)
    }

    /// Interactive connect: an invalid pair is silently ignored.
    pub fn connect(&mut self, p1: PortId, p2: PortId, verify: bool) -> Option<ConnectionId> {
        match self.try_connect(p1, p2, verify) {
            Ok(id) => Some(id),
            Err(reason) => {
                debug!("Ignored connection {} / {}: {}", p1, p2, reason);
                None
            }
        }
    }

    /// Remove a connection from the circuit and from both endpoints.
    pub fn delete_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let position = self.connections.iter().position(|&c| c == id)?;
        self.connections.remove(position);
        let connection = self.graph.unlink(id);
        if self.selected == Some(Element::Connection(id)) {
            self.selected = None;
        }
        debug!("Deleted {}", id);
        connection
    }

    /// Remove every connection touching `port`; returns how many.
    fn disconnect_port(&mut self, port: PortId) -> usize {
        let mut touching = self.graph.connections_in(port);
        touching.extend(self.graph.connections_out(port));
        touching.dedup();
        touching
            .into_iter()
            .filter_map(|c| self.delete_connection(c))
            .count()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<Connection> {
        self.graph.connection(id)
    }

    /// Connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, Connection)> + '_ {
        self.connections
            .iter()
            .filter_map(move |&id| self.graph.connection(id).map(|c| (id, c)))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connections_in(&self, port: PortId) -> Vec<ConnectionId> {
        self.graph.connections_in(port)
    }

    pub fn connections_out(&self, port: PortId) -> Vec<ConnectionId> {
        self.graph.connections_out(port)
    }

    // ---- analysis ----

    /// Nets of `domain`: maximal groups of mutually connected ports.
    ///
    /// External ports come before instance ports inside each net; nets are
    /// ordered by their first member. Unconnected ports form their own net.
    pub fn get_nets(&self, domain: &Domain) -> Vec<Vec<PortId>> {
        let ports = self.ports_for_domain(domain);
        resolve_nets(&ports, self.connections().map(|(_, c)| (c.source, c.target)))
    }

    /// Get statistics about the circuit
    pub fn stats(&self) -> CircuitStats {
        CircuitStats {
            external_port_count: self.ports.len(),
            instance_count: self.instances.len(),
            port_count: self.graph.port_count(),
            connection_count: self.connections.len(),
            domain_count: self.domains().len(),
            component_type_count: self.component_types().len(),
        }
    }
}

impl PortOwner for Circuit {
    type Port = PortSlot;

    fn owner_name(&self) -> &str {
        &self.name
    }

    fn port_list(&self) -> &PortList<PortSlot> {
        &self.ports
    }
}

/// Statistics about a circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    pub external_port_count: usize,
    pub instance_count: usize,
    pub port_count: usize,
    pub connection_count: usize,
    pub domain_count: usize,
    pub component_type_count: usize,
}
