//! Load ordering for units that declare prerequisites.
//!
//! The sort repeatedly sweeps the not-yet-placed units and places every unit
//! whose prerequisites are all placed. A sweep that places nothing while units
//! remain means the remainder forms a cycle. Every sweep either places a unit
//! or fails, so the sort terminates.

use crate::error::{ConfigError, Result};
use std::collections::HashSet;

/// Something that can be placed in load order.
pub(crate) trait Dependent {
    fn key(&self) -> &str;
    fn pre_units(&self) -> &[String];
}

/// Order `nodes` so every node comes after all of its prerequisites.
///
/// `registered` is the set of every known unit key. A prerequisite outside it
/// fails with [`ConfigError::UnitNotFound`]; a cycle fails with
/// [`ConfigError::UnitLoop`] listing the units that could not be placed.
pub(crate) fn topological_sort<N>(nodes: &[N], registered: &HashSet<String>) -> Result<Vec<N>>
where
    N: Dependent + Clone,
{
    let mut placed: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut order = Vec::with_capacity(nodes.len());

    while order.len() < nodes.len() {
        let before = order.len();

        for node in nodes {
            if placed.contains(node.key()) {
                continue;
            }
            let mut ready = true;
            for pre in node.pre_units() {
                if !registered.contains(pre) {
                    return Err(ConfigError::UnitNotFound(pre.clone()));
                }
                if !placed.contains(pre.as_str()) {
                    ready = false;
                }
            }
            if ready {
                placed.insert(node.key());
                order.push(node.clone());
            }
        }

        if order.len() == before {
            let remaining = nodes
                .iter()
                .map(|node| node.key())
                .filter(|key| !placed.contains(key))
                .map(str::to_string)
                .collect();
            return Err(ConfigError::UnitLoop(remaining));
        }
    }

    Ok(order)
}
