//! Naming conventions for verbs, resources and actions
//!
//! The owning type names the resource; the method name picks the verb by
//! prefix and, once the prefix is stripped, names the action.

use crate::plan::Verb;

const GET_PREFIX: &str = "Get";
const OPTIONS_PREFIX: &str = "Options";

/// Verb and path segments derived for one method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub verb: Verb,
    pub resource: String,
    pub action: String,
}

/// Derive the verb, resource and action of a method
///
/// The first matching rule wins:
/// 1. `Get...` binds to GET with the rest of the name as action
/// 2. `Options...` binds to OPTIONS with the rest of the name as action
/// 3. anything else binds to POST with the whole name as action
pub fn resolve(method: &str, type_name: &str) -> Route {
    let resource = type_name.to_lowercase();

    let (verb, action) = if let Some(rest) = method.strip_prefix(GET_PREFIX) {
        (Verb::Get, rest)
    } else if let Some(rest) = method.strip_prefix(OPTIONS_PREFIX) {
        (Verb::Options, rest)
    } else {
        (Verb::Post, method)
    };

    Route {
        verb,
        resource,
        action: action.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_prefix() {
        let route = resolve("GetData", "Inventory");
        assert_eq!(route.verb, Verb::Get);
        assert_eq!(route.resource, "inventory");
        assert_eq!(route.action, "data");
    }

    #[test]
    fn test_options_prefix() {
        let route = resolve("OptionsEmpty", "Inventory");
        assert_eq!(route.verb, Verb::Options);
        assert_eq!(route.action, "empty");
    }

    #[test]
    fn test_post_fallback() {
        let route = resolve("Add", "Inventory");
        assert_eq!(route.verb, Verb::Post);
        assert_eq!(route.action, "add");

        // Prefix match is case sensitive
        let route = resolve("getter", "Inventory");
        assert_eq!(route.verb, Verb::Post);
        assert_eq!(route.action, "getter");
    }

    #[test]
    fn test_get_wins_over_longer_names() {
        // "GetOptions" starts with Get, so the Options rule never applies
        let route = resolve("GetOptions", "Inventory");
        assert_eq!(route.verb, Verb::Get);
        assert_eq!(route.action, "options");
    }

    #[test]
    fn test_resource_independent_of_method() {
        for method in ["GetData", "OptionsEmpty", "Remove", "Get", "Options"] {
            assert_eq!(resolve(method, "StockLedger").resource, "stockledger");
        }
    }

    #[test]
    fn test_bare_prefixes() {
        let route = resolve("Get", "Inventory");
        assert_eq!(route.verb, Verb::Get);
        assert_eq!(route.action, "");

        let route = resolve("Options", "Inventory");
        assert_eq!(route.verb, Verb::Options);
        assert_eq!(route.action, "");
    }
}
