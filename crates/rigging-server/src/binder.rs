//! Binding engine
//!
//! Turns a service object into a frozen table of action descriptors. Every
//! registered method runs through the naming resolver and the signature
//! classifier once; methods that are not valid actions are skipped with a
//! debug log and never reach the router.

use crate::error::BindError;
use crate::method::{BoundMethod, Invoke, MethodTable};
use crate::service::Service;
use rigging_core::{classify, short_type_name, ActionPlan};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A bound action: its plan plus an invoker tied to the service instance
pub struct ActionDescriptor {
    pub plan: ActionPlan,
    pub invoker: Arc<dyn Invoke>,
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// Immutable descriptors for every action of one service
#[derive(Debug)]
pub struct DescriptorTable {
    service: &'static str,
    version: String,
    actions: BTreeMap<&'static str, Arc<ActionDescriptor>>,
}

impl DescriptorTable {
    /// Short type name of the bound service
    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Version segment used by every route of the service
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up an action by its method name
    pub fn get(&self, method: &str) -> Option<&Arc<ActionDescriptor>> {
        self.actions.get(method)
    }

    pub fn contains(&self, method: &str) -> bool {
        self.actions.contains_key(method)
    }

    /// Descriptors ordered by method name
    pub fn actions(&self) -> impl Iterator<Item = &Arc<ActionDescriptor>> {
        self.actions.values()
    }

    /// Plans ordered by method name
    pub fn plans(&self) -> impl Iterator<Item = &ActionPlan> {
        self.actions.values().map(|descriptor| &descriptor.plan)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Build the descriptor table for `service`
pub(crate) fn bind_service<S: Service>(
    service: Arc<S>,
    default_version: &str,
) -> Result<DescriptorTable, BindError> {
    let full_name = std::any::type_name::<S>();
    if !is_nominal(full_name) {
        return Err(BindError::InvalidInstance(full_name));
    }
    let type_name = short_type_name(full_name);

    let version = service
        .version()
        .map(|v| normalize_version(&v))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_version.to_string());

    let mut table = MethodTable::<S>::new();
    S::methods(&mut table);

    let mut actions = BTreeMap::new();
    for entry in table.into_entries() {
        let plan = match classify(entry.name, type_name, &entry.signature) {
            Ok(plan) => plan,
            Err(reason) => {
                debug!(
                    service = type_name,
                    method = entry.name,
                    signature = %entry.signature,
                    %reason,
                    "Skipping method"
                );
                continue;
            }
        };

        match actions.entry(entry.name) {
            Entry::Occupied(_) => {
                warn!(
                    service = type_name,
                    method = entry.name,
                    "Method registered twice, keeping the first registration"
                );
            }
            Entry::Vacant(slot) => {
                let invoker: Arc<dyn Invoke> = Arc::new(BoundMethod {
                    service: Arc::clone(&service),
                    method: entry.method,
                });
                slot.insert(Arc::new(ActionDescriptor { plan, invoker }));
            }
        }
    }

    Ok(DescriptorTable {
        service: type_name,
        version,
        actions,
    })
}

/// Remove all whitespace from a version string
pub(crate) fn normalize_version(version: &str) -> String {
    version.chars().filter(|c| !c.is_whitespace()).collect()
}

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32",
    "i64", "i128", "isize", "f32", "f64", "!",
];

/// Standard library wrappers, by defining path
const WRAPPERS: &[&str] = &[
    "alloc::boxed::Box",
    "alloc::rc::Rc",
    "alloc::sync::Arc",
    "alloc::string::String",
    "alloc::vec::Vec",
    "alloc::borrow::Cow",
    "core::option::Option",
    "std::boxed::Box",
    "std::rc::Rc",
    "std::sync::Arc",
    "std::string::String",
    "std::vec::Vec",
    "std::borrow::Cow",
    "std::option::Option",
];

/// Only named struct-like types can carry actions
///
/// Decided from `std::any::type_name`, whose output is best effort: tuples,
/// slices, references, pointers, function types, trait objects, primitives
/// and the standard wrappers are rejected. A user type sharing a wrapper's
/// short name is accepted because its path differs. Enums cannot be told
/// apart from structs this way and are accepted. Outside this crate the
/// orphan rule already keeps `Service` off foreign types, so in practice
/// only references and `Box` of a local type reach the rejecting branches.
fn is_nominal(full_name: &str) -> bool {
    const NON_NOMINAL_PREFIXES: &[&str] = &["(", "[", "&", "*", "fn", "dyn ", "impl "];
    if NON_NOMINAL_PREFIXES
        .iter()
        .any(|prefix| full_name.starts_with(prefix))
    {
        return false;
    }
    if PRIMITIVES.contains(&full_name) {
        return false;
    }

    let base = match full_name.find('<') {
        Some(idx) => &full_name[..idx],
        None => full_name,
    };
    !WRAPPERS.contains(&base)
}
