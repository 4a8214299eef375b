//! Error types shared by the whole model.
//!
//! Two families live here. [`Rejection`] is the reason an interactive
//! connection attempt was refused; callers driven by UI input usually drop
//! it. [`CircuitError`] covers invariant violations, malformed documents and
//! I/O, and is always propagated.

use thiserror::Error;

use crate::domain::Direction;

/// Why a pair of ports may not be connected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("a port cannot be connected to itself")]
    SamePort,

    #[error("port does not belong to this circuit")]
    UnknownPort,

    #[error("ports belong to different domains ({0} / {1})")]
    DomainMismatch(String, String),

    #[error("exactly one port must be a source and the other a target")]
    NoSourceTargetPair,

    #[error("ports are already connected")]
    AlreadyConnected,

    #[error("one-to-one domain {0}: port already has a connection")]
    PortOccupied(String),
}

/// Errors raised by circuit construction, loading and export.
#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("duplicate port name {name:?} on {owner:?}")]
    DuplicatePortName { owner: String, name: String },

    #[error("duplicate component instance name {0:?}")]
    DuplicateInstanceName(String),

    #[error("name {0:?} is already used by the circuit or one of its instances")]
    NameConflict(String),

    #[error("names must not be empty")]
    EmptyName,

    #[error("port {port:?}: causal domain {domain:?} does not allow direction {direction}")]
    IllegalDirection {
        port: String,
        domain: String,
        direction: Direction,
    },

    #[error("domain {0:?} is already used with a different connection policy")]
    DomainConflict(String),

    #[error("component type {0:?} is already used with a different port list")]
    ComponentTypeConflict(String),

    #[error("circuit document has no name")]
    MissingName,

    #[error("unknown domain {0:?}")]
    UnknownDomain(String),

    #[error("unknown component type {0:?}")]
    UnknownComponentType(String),

    #[error("unknown component instance {0:?}")]
    UnknownInstance(String),

    #[error("unknown port {port:?} on {owner:?}")]
    UnknownPort { owner: String, port: String },

    #[error("port {port:?} belongs to instance {owner:?} and keeps its component type's name")]
    NotExternalPort { owner: String, port: String },

    #[error("cannot write format {0}")]
    UnsupportedFormat(String),

    #[error("connection rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CircuitError>;
