//! Persisted circuit documents.
//!
//! A [`CircuitRepresentation`] is a plain, name-based description of a
//! circuit. Keyed collections use `BTreeMap` so two representations of
//! isomorphic circuits compare (and serialize) equal.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::component::ComponentType;
use crate::config::CircuitOptions;
use crate::domain::{Direction, Domain};
use crate::error::{CircuitError, Rejection, Result};
use crate::port::{Named, PortId, PortOwner, PortSpec};

/// Connection policy of a persisted domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    pub causal: bool,
    #[serde(default)]
    pub one2one: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRepresentation {
    pub name: String,
    pub domain: String,
    pub direction: Direction,
}

impl PortRepresentation {
    fn from_spec(spec: &PortSpec) -> Self {
        Self {
            name: spec.name().to_string(),
            domain: spec.domain().name().to_string(),
            direction: spec.direction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentTypeRepresentation {
    #[serde(default)]
    pub ports: Vec<PortRepresentation>,
}

/// `(source_owner, source_port, target_owner, target_port)`.
///
/// The owner of an external port is the circuit's own name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTuple(pub String, pub String, pub String, pub String);

impl std::fmt::Display for ConnectionTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} -> {}.{}", self.0, self.1, self.2, self.3)
    }
}

/// Serializable circuit document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CircuitRepresentation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domains: BTreeMap<String, DomainSpec>,
    #[serde(default)]
    pub ports: Vec<PortRepresentation>,
    #[serde(default)]
    pub component_types: BTreeMap<String, ComponentTypeRepresentation>,
    /// instance name -> component type name
    #[serde(default)]
    pub component_instances: BTreeMap<String, String>,
    #[serde(default)]
    pub connections: Vec<ConnectionTuple>,
}

/// A connection of a document that the connection policy refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedConnection {
    pub connection: ConnectionTuple,
    pub reason: Rejection,
}

/// Result of loading a document.
#[derive(Debug)]
pub struct LoadReport {
    pub circuit: Circuit,
    /// Only populated when loading with `verify_on_load`.
    pub rejected: Vec<RejectedConnection>,
}

impl CircuitRepresentation {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a circuit from this document, reporting refused connections
    /// instead of failing on them.
    pub fn load(&self, options: CircuitOptions) -> Result<LoadReport> {
        if self.name.is_empty() {
            return Err(CircuitError::MissingName);
        }
        let verify = options.verify_on_load;

        let domains: HashMap<&str, Arc<Domain>> = self
            .domains
            .iter()
            .map(|(name, spec)| {
                (
                    name.as_str(),
                    Arc::new(Domain::new(name.clone(), spec.causal, spec.one2one)),
                )
            })
            .collect();
        let port_spec = |port: &PortRepresentation| -> Result<PortSpec> {
            let domain = domains
                .get(port.domain.as_str())
                .ok_or_else(|| CircuitError::UnknownDomain(port.domain.clone()))?;
            PortSpec::new(port.name.clone(), Arc::clone(domain), port.direction)
        };

        let mut circuit = Circuit::with_options(self.name.clone(), options);
        for port in &self.ports {
            circuit.add_port(port_spec(port)?)?;
        }

        let mut types: HashMap<&str, Arc<ComponentType>> = HashMap::new();
        for (name, ctype) in &self.component_types {
            let ports = ctype.ports.iter().map(&port_spec).collect::<Result<Vec<_>>>()?;
            types.insert(name.as_str(), Arc::new(ComponentType::new(name.clone(), ports)?));
        }

        for (name, type_name) in &self.component_instances {
            let ctype = types
                .get(type_name.as_str())
                .ok_or_else(|| CircuitError::UnknownComponentType(type_name.clone()))?;
            circuit.add_instance(ctype.make_instance(name.clone()))?;
        }

        let mut rejected = Vec::new();
        for tuple in &self.connections {
            let source = lookup_port(&circuit, &tuple.0, &tuple.1)?;
            let target = lookup_port(&circuit, &tuple.2, &tuple.3)?;
            match circuit.try_connect(source, target, verify) {
                Ok(_) => {}
                Err(reason) if verify => {
                    tracing::warn!("Dropped connection {}: {}", tuple, reason);
                    rejected.push(RejectedConnection {
                        connection: tuple.clone(),
                        reason,
                    });
                }
                Err(reason) => return Err(reason.into()),
            }
        }

        tracing::info!(
            "Loaded circuit {:?}: {} port(s), {} instance(s), {} connection(s)",
            circuit.name(),
            circuit.port_list().len(),
            circuit.instance_count(),
            circuit.connection_count()
        );
        Ok(LoadReport { circuit, rejected })
    }
}

fn lookup_port(circuit: &Circuit, owner: &str, port: &str) -> Result<PortId> {
    if owner != circuit.name() && circuit.instance_named(owner).is_none() {
        return Err(CircuitError::UnknownInstance(owner.to_string()));
    }
    circuit
        .resolve_port(owner, port)
        .ok_or_else(|| CircuitError::UnknownPort {
            owner: owner.to_string(),
            port: port.to_string(),
        })
}

impl Circuit {
    /// Describe the circuit by names only.
    pub fn to_representation(&self) -> CircuitRepresentation {
        let domains = self
            .domains()
            .iter()
            .map(|d| {
                (
                    d.name().to_string(),
                    DomainSpec {
                        causal: d.is_causal(),
                        one2one: d.one2one(),
                    },
                )
            })
            .collect();

        let ports = self
            .external_ports()
            .filter_map(|id| self.port(id))
            .map(|p| PortRepresentation::from_spec(p.spec()))
            .collect();

        let component_types = self
            .component_types()
            .iter()
            .map(|t| {
                (
                    t.name().to_string(),
                    ComponentTypeRepresentation {
                        ports: t.ports().iter().map(PortRepresentation::from_spec).collect(),
                    },
                )
            })
            .collect();

        let component_instances = self
            .instances()
            .map(|i| (i.name().to_string(), i.component_type().name().to_string()))
            .collect();

        let connections = self
            .connections()
            .filter_map(|(_, c)| {
                let source = self.port(c.source)?;
                let target = self.port(c.target)?;
                Some(ConnectionTuple(
                    self.owner_of(c.source)?.to_string(),
                    source.name().to_string(),
                    self.owner_of(c.target)?.to_string(),
                    target.name().to_string(),
                ))
            })
            .collect();

        CircuitRepresentation {
            name: self.name().to_string(),
            domains,
            ports,
            component_types,
            component_instances,
            connections,
        }
    }

    /// Rebuild a circuit from a document with default options.
    pub fn from_representation(repr: &CircuitRepresentation) -> Result<Self> {
        Self::from_representation_with(repr, CircuitOptions::default())
    }

    pub fn from_representation_with(repr: &CircuitRepresentation, options: CircuitOptions) -> Result<Self> {
        Ok(repr.load(options)?.circuit)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_representation())?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        self.to_representation().to_json_pretty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_representation(&CircuitRepresentation::from_json(json)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_pretty()?)?;
        tracing::info!("Saved circuit {:?} to {:?}", self.name(), path);
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_json_with(path, CircuitOptions::default())
    }

    pub fn load_json_with(path: impl AsRef<Path>, options: CircuitOptions) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_representation_with(&CircuitRepresentation::from_json(&content)?, options)
    }
}
