//! Component types and their instances.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::{CircuitError, Result};
use crate::port::{PortList, PortOwner, PortSlot, PortSpec};

/// Handle of an instance placed in a circuit. Never reused within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub(crate) u64);

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// A reusable port template.
#[derive(Debug, Clone)]
pub struct ComponentType {
    name: String,
    ports: PortList<PortSpec>,
}

impl ComponentType {
    pub fn new(name: impl Into<String>, ports: Vec<PortSpec>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CircuitError::EmptyName);
        }
        let mut policies: HashMap<&str, &Domain> = HashMap::new();
        for spec in &ports {
            let domain = spec.domain().as_ref();
            match policies.insert(domain.name(), domain) {
                Some(known) if known != domain => {
                    return Err(CircuitError::DomainConflict(domain.name().to_string()));
                }
                _ => {}
            }
        }
        let ports = PortList::new(&name, ports)?;
        Ok(Self { name, ports })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ports(&self) -> &PortList<PortSpec> {
        &self.ports
    }

    /// Create a detached instance with its own copy of every port.
    pub fn make_instance(self: &Arc<Self>, name: impl Into<String>) -> ComponentInstance {
        ComponentInstance {
            name: name.into(),
            ctype: Arc::clone(self),
            ports: self.ports.clone(),
        }
    }

    /// Same name and identical port declarations.
    pub fn same_interface(&self, other: &ComponentType) -> bool {
        self.name == other.name && self.ports.iter().eq(other.ports.iter())
    }
}

impl PortOwner for ComponentType {
    type Port = PortSpec;

    fn owner_name(&self) -> &str {
        &self.name
    }

    fn port_list(&self) -> &PortList<PortSpec> {
        &self.ports
    }
}

/// An instance that is not (or no longer) part of a circuit.
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    name: String,
    ctype: Arc<ComponentType>,
    ports: PortList<PortSpec>,
}

impl ComponentInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_type(&self) -> &Arc<ComponentType> {
        &self.ctype
    }

    pub(crate) fn into_parts(self) -> (String, Arc<ComponentType>, Vec<PortSpec>) {
        (self.name, self.ctype, self.ports.into_items())
    }
}

impl PortOwner for ComponentInstance {
    type Port = PortSpec;

    fn owner_name(&self) -> &str {
        &self.name
    }

    fn port_list(&self) -> &PortList<PortSpec> {
        &self.ports
    }
}

/// An instance owned by a circuit. Its ports live in the circuit's port graph.
#[derive(Debug, Clone)]
pub struct PlacedInstance {
    id: InstanceId,
    name: String,
    ctype: Arc<ComponentType>,
    ports: PortList<PortSlot>,
    layout_index: usize,
}

impl PlacedInstance {
    pub(crate) fn new(
        id: InstanceId,
        name: String,
        ctype: Arc<ComponentType>,
        ports: PortList<PortSlot>,
        layout_index: usize,
    ) -> Self {
        Self {
            id,
            name,
            ctype,
            ports,
            layout_index,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_type(&self) -> &Arc<ComponentType> {
        &self.ctype
    }

    /// Order in which the instance was placed; feeds the editor's grid layout.
    pub fn layout_index(&self) -> usize {
        self.layout_index
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

impl PortOwner for PlacedInstance {
    type Port = PortSlot;

    fn owner_name(&self) -> &str {
        &self.name
    }

    fn port_list(&self) -> &PortList<PortSlot> {
        &self.ports
    }
}
