//! Reconciles held leases against a fresh resource listing.
//!
//! Given held set `H` and listing `L`, the diff yields:
//! - `to_extend` = leases in `H` whose resource is in `L`
//! - `to_release` = leases in `H` whose resource is not in `L`
//! - `resource_ids` = every id in `L`, deduplicated, in listing order
//!
//! `resource_ids` is what the acquire-or-extend call receives together with
//! `to_extend`. A resource destined for release never appears in it.

use std::collections::{HashMap, HashSet};

use crate::core::Lease;

/// Partition of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseDiff {
    /// Listed resource ids (new and to-extend), deduplicated.
    pub resource_ids: Vec<String>,
    /// Held leases whose resource is still listed.
    pub to_extend: Vec<Lease>,
    /// Held leases whose resource disappeared from the listing.
    pub to_release: Vec<Lease>,
}

impl LeaseDiff {
    /// Listed ids with no held lease; these need a first acquisition.
    pub fn new_resource_ids(&self) -> Vec<&str> {
        let extending: HashSet<&str> = self
            .to_extend
            .iter()
            .map(|lease| lease.resource_id.as_str())
            .collect();
        self.resource_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !extending.contains(id))
            .collect()
    }
}

/// Compute the extend/release/acquire partition for one resource kind.
pub fn diff_leases<S: AsRef<str>>(listed: &[S], held: &[Lease]) -> LeaseDiff {
    let mut by_resource: HashMap<&str, &Lease> = held
        .iter()
        .map(|lease| (lease.resource_id.as_str(), lease))
        .collect();

    let mut seen = HashSet::with_capacity(listed.len());
    let mut resource_ids = Vec::with_capacity(listed.len());
    let mut to_extend = Vec::with_capacity(listed.len().min(held.len()));

    for id in listed {
        let id = id.as_ref();
        if !seen.insert(id) {
            continue;
        }
        resource_ids.push(id.to_owned());
        if let Some(lease) = by_resource.remove(id) {
            to_extend.push(lease.clone());
        }
    }

    // Whatever is left was held but is no longer listed. Keep held order so
    // release batches are deterministic.
    let to_release = held
        .iter()
        .filter(|lease| by_resource.contains_key(lease.resource_id.as_str()))
        .cloned()
        .collect();

    LeaseDiff {
        resource_ids,
        to_extend,
        to_release,
    }
}
