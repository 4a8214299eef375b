//! Circuit editing commands.
//!
//! An [`Editor`] pairs a circuit with a palette of domains and component
//! types the user may pick from. Commands act on the current selection;
//! anything that does not apply is ignored, mirroring a form whose submit
//! button does nothing on bad input.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit::{Circuit, PortMove};
use crate::component::{ComponentType, InstanceId};
use crate::domain::{Direction, Domain};
use crate::events::{EditorEvent, Element, EventOutcome};
use crate::port::{PortId, PortSpec};

/// A user command coming from the editor's controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    RenameCircuit {
        name: String,
    },
    AddPort {
        name: String,
        domain: String,
        direction: Direction,
    },
    AddComponent {
        component_type: String,
        name: String,
    },
    /// Rename the selected external port or instance.
    RenameSelected {
        name: String,
    },
    /// Delete the selected external port or instance.
    DeleteSelected,
    MoveSelectedPort {
        step: PortMove,
    },
}

/// Which group of controls applies to the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Basic,
    ModifyPort(PortId),
    ModifyComponent(InstanceId),
}

#[derive(Debug)]
pub struct Editor {
    circuit: Circuit,
    domains: BTreeMap<String, Arc<Domain>>,
    component_types: BTreeMap<String, Arc<ComponentType>>,
}

impl Editor {
    pub fn new(
        domains: Vec<Arc<Domain>>,
        component_types: Vec<Arc<ComponentType>>,
        circuit: Circuit,
    ) -> Self {
        Self {
            circuit,
            domains: domains.into_iter().map(|d| (d.name().to_string(), d)).collect(),
            component_types: component_types
                .into_iter()
                .map(|t| (t.name().to_string(), t))
                .collect(),
        }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    pub fn domains(&self) -> impl Iterator<Item = &Arc<Domain>> {
        self.domains.values()
    }

    pub fn component_types(&self) -> impl Iterator<Item = &Arc<ComponentType>> {
        self.component_types.values()
    }

    /// Whether the port form should offer a direction for `domain`.
    pub fn direction_choice(&self, domain: &str) -> bool {
        self.domains.get(domain).is_some_and(|d| d.is_causal())
    }

    pub fn handle_event(&mut self, event: EditorEvent) -> EventOutcome {
        self.circuit.handle_event(event)
    }

    pub fn panel(&self) -> Panel {
        match self.circuit.selected() {
            Some(Element::Port(id)) if self.circuit.port(id).is_some_and(|p| p.is_external()) => {
                Panel::ModifyPort(id)
            }
            Some(Element::Instance(id)) => Panel::ModifyComponent(id),
            _ => Panel::Basic,
        }
    }

    pub fn apply(&mut self, command: EditorCommand) -> EventOutcome {
        match command {
            EditorCommand::RenameCircuit { name } => self.rename_circuit(name),
            EditorCommand::AddPort {
                name,
                domain,
                direction,
            } => self.add_port(name, &domain, direction),
            EditorCommand::AddComponent {
                component_type,
                name,
            } => self.add_component(&component_type, name),
            EditorCommand::RenameSelected { name } => self.rename_selected(name),
            EditorCommand::DeleteSelected => self.delete_selected(),
            EditorCommand::MoveSelectedPort { step } => self.move_selected_port(step),
        }
    }

    fn rename_circuit(&mut self, name: String) -> EventOutcome {
        match self.circuit.rename(name) {
            Ok(()) => EventOutcome::Renamed,
            Err(e) => ignored(e),
        }
    }

    fn add_port(&mut self, name: String, domain: &str, direction: Direction) -> EventOutcome {
        let Some(domain) = self.domains.get(domain) else {
            debug!("Unknown domain {:?}", domain);
            return EventOutcome::Ignored;
        };
        let spec = match PortSpec::new(name, Arc::clone(domain), direction) {
            Ok(spec) => spec,
            Err(e) => return ignored(e),
        };
        match self.circuit.add_port(spec) {
            Ok(id) => EventOutcome::PortAdded(id),
            Err(e) => ignored(e),
        }
    }

    fn add_component(&mut self, component_type: &str, name: String) -> EventOutcome {
        let Some(ctype) = self.component_types.get(component_type) else {
            debug!("Unknown component type {:?}", component_type);
            return EventOutcome::Ignored;
        };
        match self.circuit.add_instance(ctype.make_instance(name)) {
            Ok(id) => EventOutcome::InstanceAdded(id),
            Err(e) => ignored(e),
        }
    }

    fn rename_selected(&mut self, name: String) -> EventOutcome {
        let result = match self.panel() {
            Panel::ModifyPort(id) => self.circuit.rename_port(id, name),
            Panel::ModifyComponent(id) => self.circuit.rename_instance(id, name),
            Panel::Basic => return EventOutcome::Ignored,
        };
        match result {
            Ok(()) => EventOutcome::Renamed,
            Err(e) => ignored(e),
        }
    }

    fn delete_selected(&mut self) -> EventOutcome {
        match self.panel() {
            Panel::ModifyPort(id) => {
                self.circuit.remove_port(id);
                EventOutcome::Removed(Element::Port(id))
            }
            Panel::ModifyComponent(id) => {
                self.circuit.remove_instance(id);
                EventOutcome::Removed(Element::Instance(id))
            }
            Panel::Basic => EventOutcome::Ignored,
        }
    }

    fn move_selected_port(&mut self, step: PortMove) -> EventOutcome {
        match self.panel() {
            Panel::ModifyPort(id) if self.circuit.move_port(id, step) => EventOutcome::PortMoved,
            _ => EventOutcome::Ignored,
        }
    }
}

fn ignored(reason: impl std::fmt::Display) -> EventOutcome {
    debug!("Ignored editor command: {}", reason);
    EventOutcome::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{inouts, inputs, outputs, PortOwner};

    fn editor() -> Editor {
        let field = Arc::new(Domain::one_to_one("fieldmode"));
        let wire = Arc::new(Domain::undirected("electrical"));
        let mut ports = inputs(&["In1"], &field).unwrap();
        ports.extend(outputs(&["Out1"], &field).unwrap());
        ports.extend(inouts(&["Control"], &wire).unwrap());
        let phase = Arc::new(ComponentType::new("Phase", ports).unwrap());
        Editor::new(vec![field, wire], vec![phase], Circuit::new("Draft"))
    }

    fn add_port(e: &mut Editor, name: &str, domain: &str, direction: Direction) -> EventOutcome {
        e.apply(EditorCommand::AddPort {
            name: name.into(),
            domain: domain.into(),
            direction,
        })
    }

    #[test]
    fn test_add_port() {
        let mut e = editor();
        assert!(matches!(add_port(&mut e, "a", "fieldmode", Direction::In), EventOutcome::PortAdded(_)));
        // non-causal ports always end up inout
        let EventOutcome::PortAdded(v) = add_port(&mut e, "v", "electrical", Direction::Out) else {
            panic!("port not added");
        };
        assert_eq!(e.circuit().port(v).unwrap().direction(), Direction::Inout);

        assert_eq!(add_port(&mut e, "a", "fieldmode", Direction::Out), EventOutcome::Ignored);
        assert_eq!(add_port(&mut e, "", "fieldmode", Direction::Out), EventOutcome::Ignored);
        assert_eq!(add_port(&mut e, "x", "acoustic", Direction::In), EventOutcome::Ignored);
        assert_eq!(add_port(&mut e, "x", "fieldmode", Direction::Inout), EventOutcome::Ignored);
        assert_eq!(e.circuit().port_names(), vec!["a", "v"]);
    }

    #[test]
    fn test_direction_choice() {
        let e = editor();
        assert!(e.direction_choice("fieldmode"));
        assert!(!e.direction_choice("electrical"));
        assert!(!e.direction_choice("acoustic"));
    }

    #[test]
    fn test_add_component() {
        let mut e = editor();
        let add = |e: &mut Editor, t: &str, n: &str| {
            e.apply(EditorCommand::AddComponent {
                component_type: t.into(),
                name: n.into(),
            })
        };
        assert!(matches!(add(&mut e, "Phase", "phi"), EventOutcome::InstanceAdded(_)));
        assert_eq!(add(&mut e, "Phase", "phi"), EventOutcome::Ignored);
        assert_eq!(add(&mut e, "Phase", ""), EventOutcome::Ignored);
        assert_eq!(add(&mut e, "Mirror", "m"), EventOutcome::Ignored);
        assert_eq!(e.circuit().instance_count(), 1);
    }

    #[test]
    fn test_panel_follows_selection() {
        let mut e = editor();
        let EventOutcome::PortAdded(a) = add_port(&mut e, "a", "fieldmode", Direction::In) else {
            panic!("port not added");
        };
        let EventOutcome::InstanceAdded(phi) = e.apply(EditorCommand::AddComponent {
            component_type: "Phase".into(),
            name: "phi".into(),
        }) else {
            panic!("instance not added");
        };
        assert_eq!(e.panel(), Panel::Basic);

        e.handle_event(EditorEvent::Click { target: Some(Element::Port(a)) });
        assert_eq!(e.panel(), Panel::ModifyPort(a));

        e.handle_event(EditorEvent::Click { target: Some(Element::Instance(phi)) });
        assert_eq!(e.panel(), Panel::ModifyComponent(phi));

        // instance ports have no form of their own
        let in1 = e.circuit().resolve_port("phi", "In1").unwrap();
        e.handle_event(EditorEvent::Click { target: Some(Element::Port(in1)) });
        assert_eq!(e.panel(), Panel::Basic);
    }

    #[test]
    fn test_rename_and_delete_selected() {
        let mut e = editor();
        add_port(&mut e, "a", "fieldmode", Direction::In);
        e.apply(EditorCommand::AddComponent {
            component_type: "Phase".into(),
            name: "phi".into(),
        });
        let a = e.circuit().external_port("a").unwrap();
        let in1 = e.circuit().resolve_port("phi", "In1").unwrap();
        e.circuit_mut().connect(a, in1, true).unwrap();

        assert_eq!(e.apply(EditorCommand::RenameSelected { name: "x".into() }), EventOutcome::Ignored);

        let phi = e.circuit().instance_named("phi").unwrap().id();
        e.circuit_mut().select(Element::Instance(phi));
        assert_eq!(e.apply(EditorCommand::RenameSelected { name: "shifter".into() }), EventOutcome::Renamed);
        assert!(e.circuit().instance_named("shifter").is_some());

        assert_eq!(e.apply(EditorCommand::DeleteSelected), EventOutcome::Removed(Element::Instance(phi)));
        assert_eq!(e.circuit().instance_count(), 0);
        assert_eq!(e.circuit().connection_count(), 0);
        assert_eq!(e.circuit().selected(), None);
        assert_eq!(e.apply(EditorCommand::DeleteSelected), EventOutcome::Ignored);

        e.circuit_mut().select(Element::Port(a));
        assert_eq!(e.apply(EditorCommand::DeleteSelected), EventOutcome::Removed(Element::Port(a)));
        assert!(e.circuit().port_names().is_empty());
    }

    #[test]
    fn test_move_selected_port() {
        let mut e = editor();
        for name in ["a", "b", "c"] {
            add_port(&mut e, name, "fieldmode", Direction::Out);
        }
        let c = e.circuit().external_port("c").unwrap();
        assert_eq!(e.apply(EditorCommand::MoveSelectedPort { step: PortMove::Up }), EventOutcome::Ignored);

        e.circuit_mut().select(Element::Port(c));
        assert_eq!(e.apply(EditorCommand::MoveSelectedPort { step: PortMove::Up }), EventOutcome::PortMoved);
        e.apply(EditorCommand::MoveSelectedPort { step: PortMove::Up });
        e.apply(EditorCommand::MoveSelectedPort { step: PortMove::Up });
        assert_eq!(e.circuit().port_names(), vec!["c", "a", "b"]);
        e.apply(EditorCommand::MoveSelectedPort { step: PortMove::Down });
        assert_eq!(e.circuit().port_names(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_rename_circuit() {
        let mut e = editor();
        assert_eq!(e.apply(EditorCommand::RenameCircuit { name: String::new() }), EventOutcome::Ignored);
        assert_eq!(e.apply(EditorCommand::RenameCircuit { name: "MZI".into() }), EventOutcome::Renamed);
        assert_eq!(e.circuit().name(), "MZI");
    }

    #[test]
    fn test_command_json() {
        let command: EditorCommand = serde_json::from_str(
            r#"{"command": "add_port", "name": "a", "domain": "fieldmode", "direction": "in"}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            EditorCommand::AddPort {
                name: "a".into(),
                domain: "fieldmode".into(),
                direction: Direction::In,
            }
        );
    }
}
