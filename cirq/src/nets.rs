//! Net resolution.
//!
//! Groups mutually connected ports into cliques. Every port gets a stable
//! index from its enumeration order and starts as its own clique. Each link
//! merges two cliques under the smaller key, so the result only depends on
//! the final partition, never on the order links were added.

use std::collections::{BTreeMap, HashMap};

use crate::port::PortId;

/// Resolve the connected components of `ports` under `links`.
///
/// Links with an endpoint outside `ports` are skipped. Each returned net is
/// sorted by enumeration index; nets are ordered by their smallest index.
/// Unconnected ports come back as singleton nets.
pub fn resolve_nets<I>(ports: &[PortId], links: I) -> Vec<Vec<PortId>>
where
    I: IntoIterator<Item = (PortId, PortId)>,
{
    let index: HashMap<PortId, usize> = ports.iter().enumerate().map(|(i, &p)| (p, i)).collect();

    // clique key of every port, and the members of every live clique
    let mut key_of: Vec<usize> = (0..ports.len()).collect();
    let mut members: BTreeMap<usize, Vec<usize>> = (0..ports.len()).map(|i| (i, vec![i])).collect();

    for (source, target) in links {
        let (Some(&s), Some(&t)) = (index.get(&source), index.get(&target)) else {
            continue;
        };
        let (ks, kt) = (key_of[s], key_of[t]);
        if ks == kt {
            continue;
        }
        let (low, high) = (ks.min(kt), ks.max(kt));
        let moved = members.remove(&high).unwrap_or_default();
        for &m in &moved {
            key_of[m] = low;
        }
        members.entry(low).or_default().extend(moved);
    }

    members
        .into_values()
        .map(|mut net| {
            net.sort_unstable();
            net.into_iter().map(|i| ports[i]).collect()
        })
        .collect()
}
