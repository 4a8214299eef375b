//! Connection domains and the connection policy.
//!
//! A [`Domain`] describes one kind of link (electrical wire, optical mode,
//! signal flow...). Causal domains carry directed connections between
//! `in` and `out` ports; non-causal domains connect `inout` ports in either
//! orientation.

use serde::{Deserialize, Serialize};

use crate::connection::PortGraph;
use crate::error::Rejection;
use crate::port::PortId;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Inout,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Inout => "inout",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connection domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    name: String,
    causal: bool,
    one2one: bool,
}

impl Domain {
    pub fn new(name: impl Into<String>, causal: bool, one2one: bool) -> Self {
        Self {
            name: name.into(),
            causal,
            one2one,
        }
    }

    /// Non-causal domain, e.g. an electrical wire.
    pub fn undirected(name: impl Into<String>) -> Self {
        Self::new(name, false, false)
    }

    /// Causal domain with unrestricted fan-out.
    pub fn causal(name: impl Into<String>) -> Self {
        Self::new(name, true, false)
    }

    /// Causal domain where every port takes at most one connection.
    pub fn one_to_one(name: impl Into<String>) -> Self {
        Self::new(name, true, true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_causal(&self) -> bool {
        self.causal
    }

    /// The raw `one2one` flag as declared.
    pub fn one2one(&self) -> bool {
        self.one2one
    }

    /// `one2one` only has an effect on causal domains.
    pub fn is_one_to_one(&self) -> bool {
        self.causal && self.one2one
    }

    /// Direction a port of this domain ends up with.
    ///
    /// Non-causal domains coerce everything to `inout`. Causal domains keep
    /// `in`/`out` and refuse `inout` by returning `None`.
    pub fn normalize_direction(&self, direction: Direction) -> Option<Direction> {
        match (self.causal, direction) {
            (false, _) => Some(Direction::Inout),
            (true, Direction::Inout) => None,
            (true, d) => Some(d),
        }
    }

    /// Decide whether `p1` and `p2` may be connected.
    ///
    /// On success returns the pair oriented as `(source, target)`. For
    /// non-causal domains the given order is kept.
    pub fn valid_connection(
        graph: &PortGraph,
        p1: PortId,
        p2: PortId,
    ) -> Result<(PortId, PortId), Rejection> {
        if p1 == p2 {
            return Err(Rejection::SamePort);
        }

        let (Some(a), Some(b)) = (graph.port(p1), graph.port(p2)) else {
            return Err(Rejection::UnknownPort);
        };

        if a.domain() != b.domain() {
            return Err(Rejection::DomainMismatch(
                a.domain().name().to_string(),
                b.domain().name().to_string(),
            ));
        }

        let domain = a.domain();
        if !domain.is_causal() {
            if graph.are_linked(p1, p2) || graph.are_linked(p2, p1) {
                return Err(Rejection::AlreadyConnected);
            }
            return Ok((p1, p2));
        }

        let (source, target) = if a.is_source() && b.is_target() {
            (p1, p2)
        } else if b.is_source() && a.is_target() {
            (p2, p1)
        } else {
            return Err(Rejection::NoSourceTargetPair);
        };

        if graph.are_linked(source, target) {
            return Err(Rejection::AlreadyConnected);
        }

        if domain.is_one_to_one() && (graph.degree(source) > 0 || graph.degree(target) > 0) {
            return Err(Rejection::PortOccupied(domain.name().to_string()));
        }

        Ok((source, target))
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Domain(name={}, causal={}, one2one={})",
            self.name, self.causal, self.one2one
        )
    }
}
