//! Ports and port collections.
//!
//! A [`PortSpec`] is a detached port description (name, domain, direction),
//! used by component types and by instances that are not yet placed in a
//! circuit. Once placed, every port becomes a [`Port`] node inside the
//! circuit's port graph and is referenced by [`PortId`].

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::component::InstanceId;
use crate::domain::{Direction, Domain};
use crate::error::{CircuitError, Result};

/// Handle of a port placed in a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub(crate) NodeIndex);

impl PortId {
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port#{}", self.0.index())
    }
}

/// Who holds a placed port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// An external port of the circuit itself
    Circuit,
    /// A port of a placed component instance
    Instance(InstanceId),
}

/// Anything stored in a [`PortList`].
pub trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

/// Detached port description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    name: String,
    domain: Arc<Domain>,
    direction: Direction,
}

impl PortSpec {
    /// Create a port description.
    ///
    /// Ports of non-causal domains always end up `inout`. An `inout` port on
    /// a causal domain is rejected.
    pub fn new(name: impl Into<String>, domain: Arc<Domain>, direction: Direction) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CircuitError::EmptyName);
        }
        let Some(direction) = domain.normalize_direction(direction) else {
            return Err(CircuitError::IllegalDirection {
                port: name,
                domain: domain.name().to_string(),
                direction,
            });
        };
        Ok(Self {
            name,
            domain,
            direction,
        })
    }

    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl Named for PortSpec {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

fn directed(names: &[&str], domain: &Arc<Domain>, direction: Direction) -> Result<Vec<PortSpec>> {
    let expected_causal = direction != Direction::Inout;
    if domain.is_causal() != expected_causal {
        return Err(CircuitError::IllegalDirection {
            port: names.first().copied().unwrap_or_default().to_string(),
            domain: domain.name().to_string(),
            direction,
        });
    }
    names
        .iter()
        .map(|name| PortSpec::new(*name, domain.clone(), direction))
        .collect()
}

/// Input ports for a causal domain.
pub fn inputs(names: &[&str], domain: &Arc<Domain>) -> Result<Vec<PortSpec>> {
    directed(names, domain, Direction::In)
}

/// Output ports for a causal domain.
pub fn outputs(names: &[&str], domain: &Arc<Domain>) -> Result<Vec<PortSpec>> {
    directed(names, domain, Direction::Out)
}

/// Bidirectional ports for a non-causal domain.
pub fn inouts(names: &[&str], domain: &Arc<Domain>) -> Result<Vec<PortSpec>> {
    directed(names, domain, Direction::Inout)
}

/// A port placed in a circuit's port graph.
#[derive(Debug, Clone)]
pub struct Port {
    spec: PortSpec,
    owner: Owner,
}

impl Port {
    pub(crate) fn attach(spec: PortSpec, owner: Owner) -> Self {
        Self { spec, owner }
    }

    pub(crate) fn detach(self) -> PortSpec {
        self.spec
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.spec.set_name(name);
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn domain(&self) -> &Arc<Domain> {
        self.spec.domain()
    }

    pub fn direction(&self) -> Direction {
        self.spec.direction()
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    /// External ports belong to the circuit itself.
    pub fn is_external(&self) -> bool {
        matches!(self.owner, Owner::Circuit)
    }

    /// Valid start of a causal connection.
    ///
    /// An external `in` port feeds the internal network, so it acts as a
    /// source.
    pub fn is_source(&self) -> bool {
        match self.direction() {
            Direction::Out => true,
            Direction::In => self.is_external(),
            Direction::Inout => false,
        }
    }

    /// Valid end of a causal connection.
    ///
    /// An external `out` port collects from the internal network, so it
    /// acts as a target.
    pub fn is_target(&self) -> bool {
        match self.direction() {
            Direction::In => true,
            Direction::Out => self.is_external(),
            Direction::Inout => false,
        }
    }
}

/// Name and handle of a placed port, as kept in its owner's port list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSlot {
    name: String,
    id: PortId,
}

impl PortSlot {
    pub(crate) fn new(name: impl Into<String>, id: PortId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }
}

impl Named for PortSlot {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

/// Ordered sequence of uniquely named ports with a name index.
///
/// The index is rebuilt after every structural change.
#[derive(Debug, Clone)]
pub struct PortList<P> {
    items: Vec<P>,
    index: HashMap<String, usize>,
}

impl<P> Default for PortList<P> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<P: Named> PortList<P> {
    /// Build a list, failing on the first duplicate name.
    pub fn new(owner: &str, items: Vec<P>) -> Result<Self> {
        let mut list = Self::default();
        for item in items {
            list.push(owner, item)?;
        }
        Ok(list)
    }

    pub fn get(&self, name: &str) -> Option<&P> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|p| p.name()).collect()
    }

    pub(crate) fn push(&mut self, owner: &str, item: P) -> Result<()> {
        if self.index.contains_key(item.name()) {
            return Err(CircuitError::DuplicatePortName {
                owner: owner.to_string(),
                name: item.name().to_string(),
            });
        }
        self.index.insert(item.name().to_string(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<P> {
        let position = self.index.get(name).copied()?;
        let item = self.items.remove(position);
        self.reindex();
        Some(item)
    }

    pub(crate) fn rename(&mut self, owner: &str, old: &str, new: &str) -> Result<()> {
        if new.is_empty() {
            return Err(CircuitError::EmptyName);
        }
        if self.index.contains_key(new) {
            return Err(CircuitError::DuplicatePortName {
                owner: owner.to_string(),
                name: new.to_string(),
            });
        }
        let Some(position) = self.index.get(old).copied() else {
            return Err(CircuitError::UnknownPort {
                owner: owner.to_string(),
                port: old.to_string(),
            });
        };
        self.items[position].set_name(new.to_string());
        self.reindex();
        Ok(())
    }

    /// Move the item at `from` so that it ends up at `to` (clamped).
    pub(crate) fn move_to(&mut self, from: usize, to: usize) {
        if from >= self.items.len() {
            return;
        }
        let item = self.items.remove(from);
        let to = to.min(self.items.len());
        self.items.insert(to, item);
        self.reindex();
    }

    pub(crate) fn into_items(self) -> Vec<P> {
        self.items
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name().to_string(), i))
            .collect();
    }
}

impl<'a, P> IntoIterator for &'a PortList<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Shared capability of everything that holds named ports: component
/// types, component instances and circuits.
pub trait PortOwner {
    type Port: Named;

    fn owner_name(&self) -> &str;

    fn port_list(&self) -> &PortList<Self::Port>;

    /// Look a port up by name.
    fn port_named(&self, name: &str) -> Option<&Self::Port> {
        self.port_list().get(name)
    }

    fn port_names(&self) -> Vec<&str> {
        self.port_list().names()
    }
}
