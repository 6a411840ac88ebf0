//! Resource holdings and storage capacities.
//!
//! Every resource except research is capped. Crediting never pushes a
//! holding past its cap: the excess is dropped at the point of credit.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Wood,
    Stone,
    Research,
    Iron,
    IronIngot,
    Fish,
    Lithium,
    Motor,
}

impl Resource {
    pub const ALL: [Resource; 8] = [
        Resource::Wood,
        Resource::Stone,
        Resource::Research,
        Resource::Iron,
        Resource::IronIngot,
        Resource::Fish,
        Resource::Lithium,
        Resource::Motor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Stone => "stone",
            Resource::Research => "research",
            Resource::Iron => "iron",
            Resource::IronIngot => "iron_ingot",
            Resource::Fish => "fish",
            Resource::Lithium => "lithium",
            Resource::Motor => "motor",
        }
    }

    /// Research is the only unbounded currency.
    pub fn is_capped(self) -> bool {
        !matches!(self, Resource::Research)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static list of resource line items, used for build, upgrade and
/// recipe costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cost(&'static [(Resource, u32)]);

impl Cost {
    pub const fn new(items: &'static [(Resource, u32)]) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &'static [(Resource, u32)] {
        self.0
    }

    pub fn amount(&self, resource: Resource) -> u32 {
        self.0
            .iter()
            .filter(|(r, _)| *r == resource)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Half of every line item, rounded down.
    pub fn refund(&self) -> impl Iterator<Item = (Resource, u32)> + 'static {
        let items: &'static [(Resource, u32)] = self.0;
        items.iter().map(|(resource, amount)| (*resource, amount / 2))
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (resource, amount) in self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{amount} {resource}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("insufficient {resource}: required {required}, available {available}")]
    InsufficientFunds {
        resource: Resource,
        required: f64,
        available: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    quantities: BTreeMap<Resource, f64>,
    /// Missing entries are unbounded.
    capacities: BTreeMap<Resource, f64>,
}

impl Ledger {
    pub fn new(base_capacity: f64) -> Self {
        let base_capacity = base_capacity.max(0.0);
        let quantities = Resource::ALL.iter().map(|r| (*r, 0.0)).collect();
        let capacities = Resource::ALL
            .iter()
            .filter(|r| r.is_capped())
            .map(|r| (*r, base_capacity))
            .collect();
        Self {
            quantities,
            capacities,
        }
    }

    pub fn quantity(&self, resource: Resource) -> f64 {
        self.quantities.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn capacity(&self, resource: Resource) -> Option<f64> {
        self.capacities.get(&resource).copied()
    }

    pub fn quantities(&self) -> &BTreeMap<Resource, f64> {
        &self.quantities
    }

    pub fn capacities(&self) -> &BTreeMap<Resource, f64> {
        &self.capacities
    }

    /// True while the holding sits strictly below its cap.
    pub fn has_room(&self, resource: Resource) -> bool {
        match self.capacity(resource) {
            Some(cap) => self.quantity(resource) < cap,
            None => true,
        }
    }

    /// Overwrites a holding, clamped to `0..=capacity`.
    pub fn set(&mut self, resource: Resource, amount: f64) {
        let mut amount = amount.max(0.0);
        if let Some(cap) = self.capacity(resource) {
            amount = amount.min(cap);
        }
        self.quantities.insert(resource, amount);
    }

    /// Adds up to `amount`, truncated at capacity. Returns what was actually
    /// credited, which is zero when the store is already full.
    pub fn credit(&mut self, resource: Resource, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let current = self.quantity(resource);
        let accepted = match self.capacity(resource) {
            Some(cap) => amount.min((cap - current).max(0.0)),
            None => amount,
        };
        if accepted > 0.0 {
            self.quantities.insert(resource, current + accepted);
        }
        accepted
    }

    pub fn debit(&mut self, resource: Resource, amount: f64) -> Result<(), LedgerError> {
        let available = self.quantity(resource);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                resource,
                required: amount,
                available,
            });
        }
        self.quantities.insert(resource, available - amount);
        Ok(())
    }

    pub fn can_afford(&self, cost: Cost) -> bool {
        self.shortfall(cost).is_none()
    }

    /// Debits every line item, or nothing at all.
    pub fn pay(&mut self, cost: Cost) -> Result<(), LedgerError> {
        if let Some(err) = self.shortfall(cost) {
            return Err(err);
        }
        for (resource, amount) in cost.items() {
            self.debit(*resource, f64::from(*amount))?;
        }
        Ok(())
    }

    /// Shifts every cap by `delta`. Holdings above a lowered cap are discarded.
    pub fn adjust_capacity(&mut self, delta: f64) {
        for (resource, cap) in self.capacities.iter_mut() {
            *cap = (*cap + delta).max(0.0);
            if let Some(quantity) = self.quantities.get_mut(resource) {
                if *quantity > *cap {
                    log::trace!("{resource} holdings trimmed from {quantity} to {cap}");
                    *quantity = *cap;
                }
            }
        }
    }

    fn shortfall(&self, cost: Cost) -> Option<LedgerError> {
        cost.items().iter().find_map(|(resource, _)| {
            let required = f64::from(cost.amount(*resource));
            let available = self.quantity(*resource);
            if available < required {
                Some(LedgerError::InsufficientFunds {
                    resource: *resource,
                    required,
                    available,
                })
            } else {
                None
            }
        })
    }
}
