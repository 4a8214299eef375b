//! Editor events, selection and snapshots.
//!
//! A display surface delivers discrete [`EditorEvent`]s; the circuit answers
//! with an [`EventOutcome`]. Snapshot round-trips are asynchronous: the
//! model issues [`EditorRequest::CaptureSnapshot`] together with a pending
//! callback, and the surface later answers with
//! [`EditorEvent::SnapshotCaptured`]. Callbacks fire oldest first.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit::Circuit;
use crate::component::InstanceId;
use crate::connection::ConnectionId;
use crate::error::{CircuitError, Result};
use crate::port::PortId;

/// Something the user can select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Element {
    Port(PortId),
    Instance(InstanceId),
    Connection(ConnectionId),
}

/// Inbound events from the display surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    /// A click on an element, or on the empty canvas when `target` is `None`.
    Click { target: Option<Element> },
    /// Serialized SVG of the current drawing.
    SnapshotCaptured { data: String },
}

/// Outbound requests for the display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum EditorRequest {
    CaptureSnapshot,
}

/// What an event or editor command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Selected(Element),
    SelectionCleared,
    Connected(ConnectionId),
    ConnectionDeleted(ConnectionId),
    SnapshotStored { callback_fired: bool },
    PortAdded(PortId),
    InstanceAdded(InstanceId),
    Renamed,
    Removed(Element),
    PortMoved,
    /// Nothing changed.
    Ignored,
}

/// A captured drawing of the circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: String,
    pub captured_at: DateTime<Utc>,
}

pub type SnapshotCallback = Box<dyn FnOnce(&Circuit, &Snapshot) + Send>;

/// Captured snapshots plus callbacks still waiting for one.
#[derive(Default)]
pub struct SnapshotStore {
    snapshots: Vec<Snapshot>,
    pending: VecDeque<SnapshotCallback>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("snapshots", &self.snapshots.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Image suffixes that can never be written.
const REFUSED_SUFFIXES: [&str; 4] = [".jpg", ".eps", ".bmp", ".tif"];
/// Image suffixes that need a rasteriser.
const RASTER_SUFFIXES: [&str; 2] = [".png", ".pdf"];

impl Circuit {
    pub fn selected(&self) -> Option<Element> {
        self.selected
    }

    /// Whether `element` currently exists in the circuit.
    pub fn contains(&self, element: Element) -> bool {
        match element {
            Element::Port(id) => self.port(id).is_some(),
            Element::Instance(id) => self.instance(id).is_some(),
            Element::Connection(id) => self.connection(id).is_some(),
        }
    }

    /// Select an existing element; returns `false` for stale ids.
    pub fn select(&mut self, element: Element) -> bool {
        if !self.contains(element) {
            return false;
        }
        self.selected = Some(element);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn handle_event(&mut self, event: EditorEvent) -> EventOutcome {
        match event {
            EditorEvent::Click { target: None } => {
                self.selected = None;
                EventOutcome::SelectionCleared
            }
            EditorEvent::Click { target: Some(element) } if !self.contains(element) => {
                debug!("Ignored click on stale {:?}", element);
                EventOutcome::Ignored
            }
            EditorEvent::Click {
                target: Some(Element::Port(port)),
            } => self.click_port(port),
            EditorEvent::Click {
                target: Some(Element::Instance(id)),
            } => {
                if self.selected == Some(Element::Instance(id)) {
                    return EventOutcome::Ignored;
                }
                self.selected = Some(Element::Instance(id));
                EventOutcome::Selected(Element::Instance(id))
            }
            EditorEvent::Click {
                target: Some(Element::Connection(id)),
            } => {
                if self.selected == Some(Element::Connection(id)) {
                    self.delete_connection(id);
                    return EventOutcome::ConnectionDeleted(id);
                }
                self.selected = Some(Element::Connection(id));
                EventOutcome::Selected(Element::Connection(id))
            }
            EditorEvent::SnapshotCaptured { data } => self.store_snapshot(data),
        }
    }

    fn click_port(&mut self, port: PortId) -> EventOutcome {
        if let Some(Element::Port(current)) = self.selected {
            if current == port {
                self.selected = None;
                return EventOutcome::SelectionCleared;
            }
            if let Some(id) = self.connect(current, port, true) {
                return EventOutcome::Connected(id);
            }
        }
        self.selected = Some(Element::Port(port));
        EventOutcome::Selected(Element::Port(port))
    }

    /// Queue `callback` for the next captured snapshot and return the
    /// request the transport has to deliver.
    pub fn request_snapshot<F>(&mut self, callback: F) -> EditorRequest
    where
        F: FnOnce(&Circuit, &Snapshot) + Send + 'static,
    {
        self.snapshots.pending.push_back(Box::new(callback));
        EditorRequest::CaptureSnapshot
    }

    pub fn pending_snapshot_requests(&self) -> usize {
        self.snapshots.pending.len()
    }

    fn store_snapshot(&mut self, data: String) -> EventOutcome {
        self.snapshots.snapshots.push(Snapshot {
            data,
            captured_at: Utc::now(),
        });
        let callback = self.snapshots.pending.pop_front();
        let callback_fired = callback.is_some();
        if let (Some(callback), Some(snapshot)) = (callback, self.snapshots.snapshots.last()) {
            callback(&*self, snapshot);
        }
        EventOutcome::SnapshotStored { callback_fired }
    }

    /// Captured snapshots, oldest first.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots.snapshots
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.snapshots.last()
    }

    /// Write the most recent snapshot as SVG.
    ///
    /// Returns the path written, or `None` when nothing was captured yet.
    /// A file name without an image suffix gets `.svg` appended.
    pub fn save_last_snapshot(&self, path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let Some(snapshot) = self.last_snapshot() else {
            return Ok(None);
        };

        let mut name = path.as_ref().to_string_lossy().into_owned();
        if let Some(suffix) = REFUSED_SUFFIXES
            .iter()
            .chain(RASTER_SUFFIXES.iter())
            .copied()
            .find(|s| name.ends_with(s))
        {
            return Err(CircuitError::UnsupportedFormat(suffix[1..].to_uppercase()));
        }
        if !name.ends_with(".svg") {
            name.push_str(".svg");
        }

        let path = PathBuf::from(name);
        std::fs::write(&path, &snapshot.data)?;
        tracing::info!("Saved snapshot to {:?}", path);
        Ok(Some(path))
    }
}
