//! Contract subtype selection.
//!
//! After a response resolves into a resource, a selection strategy decides
//! which capability contracts the wrapped result must satisfy. The default
//! returns the requested contract unchanged; the profile-aware strategy
//! consults profile metadata embedded in the resource and appends registered
//! refinements.

use indexmap::IndexMap;
use tracing::debug;

use crate::resource::Resource;

/// Chooses the ordered set of capability contracts for a resolved resource.
pub trait SelectionStrategy: Send + Sync {
    /// Returns the contracts the wrapped result satisfies, requested contract
    /// first.
    fn select(&self, requested: &str, resource: &dyn Resource) -> Vec<String>;
}

/// Always the requested contract alone.
pub struct SimpleSelectionStrategy;

impl SelectionStrategy for SimpleSelectionStrategy {
    fn select(&self, requested: &str, _resource: &dyn Resource) -> Vec<String> {
        vec![requested.to_string()]
    }
}

/// Profile-URI-to-contract registrations.
///
/// Profiles the resource advertises that have a registration contribute their
/// contract as an additional capability; unregistered profiles fall back to
/// the requested contract alone.
#[derive(Default)]
pub struct ProfileSelectionStrategy {
    registrations: IndexMap<String, String>,
}

impl ProfileSelectionStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a contract refinement for a profile URI.
    pub fn register(mut self, profile: impl Into<String>, contract: impl Into<String>) -> Self {
        self.registrations.insert(profile.into(), contract.into());
        self
    }
}

impl SelectionStrategy for ProfileSelectionStrategy {
    fn select(&self, requested: &str, resource: &dyn Resource) -> Vec<String> {
        let mut selected = vec![requested.to_string()];
        for profile in resource.profiles() {
            match self.registrations.get(&profile) {
                Some(contract) if !selected.contains(contract) => {
                    debug!(profile = %profile, contract = %contract, "profile refines contract selection");
                    selected.push(contract.clone());
                }
                _ => {}
            }
        }
        selected
    }
}
