//! Signature classification
//!
//! Decides whether a method is a valid action and, if it is, assigns every
//! parameter after the execution context to a header, query or body slot.
//! Rejections are not errors for the caller of `bind`; they only explain why
//! a route is absent.

use crate::naming::resolve;
use crate::plan::{ActionPlan, ResultArity, Slot, SlotKind};
use crate::probe;
use crate::shape::{Signature, TypeInfo};
use thiserror::Error;

/// Maximum number of parameters after the execution context
pub const MAX_SLOTS: usize = 3;

/// Why a method is not an action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Disqualified {
    #[error("method `{0}` is not exported")]
    NotExported(String),

    #[error("expected 1 or 2 return values, found {0}")]
    ReturnCount(usize),

    #[error("last return value `{0}` is not a failure signal")]
    NotFailureSignal(&'static str),

    #[error("first return value `{0}` is not a record or a sequence of records")]
    PayloadNotRecord(&'static str),

    #[error("method declares no parameters; an execution context is required")]
    MissingContext,

    #[error("first parameter `{0}` is not an execution context")]
    NotContext(&'static str),

    #[error("expected at most {max} parameters after the context, found {found}", max = MAX_SLOTS)]
    TooManyParams { found: usize },

    #[error("parameter {position} `{name}` is neither a header map nor a record")]
    UnsupportedParam { position: usize, name: &'static str },

    #[error("parameters {first} and {second} both bind the {kind} slot")]
    DuplicateSlot {
        kind: SlotKind,
        first: usize,
        second: usize,
    },
}

/// Classify one method of a service type
pub fn classify(
    method: &str,
    type_name: &str,
    signature: &Signature,
) -> Result<ActionPlan, Disqualified> {
    if !is_exported(method) {
        return Err(Disqualified::NotExported(method.to_string()));
    }

    let arity = check_returns(signature.returns())?;
    let slots = assign_slots(signature.params())?;

    Ok(ActionPlan {
        method: method.to_string(),
        route: resolve(method, type_name),
        slots,
        arity,
    })
}

/// Exported methods start with an upper-case ASCII letter
fn is_exported(method: &str) -> bool {
    method
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

fn check_returns(returns: &[TypeInfo]) -> Result<ResultArity, Disqualified> {
    let last = match returns {
        [_] | [_, _] => returns[returns.len() - 1],
        _ => return Err(Disqualified::ReturnCount(returns.len())),
    };

    if !probe::is_failure_signal(&last) {
        return Err(Disqualified::NotFailureSignal(last.name()));
    }

    if let [payload, _] = returns {
        if !probe::is_payload(payload) {
            return Err(Disqualified::PayloadNotRecord(payload.name()));
        }
        return Ok(ResultArity::PayloadAndSignal);
    }

    Ok(ResultArity::SignalOnly)
}

fn assign_slots(params: &[TypeInfo]) -> Result<Vec<Slot>, Disqualified> {
    let (context, rest) = params.split_first().ok_or(Disqualified::MissingContext)?;

    if !probe::is_execution_context(context) {
        return Err(Disqualified::NotContext(context.name()));
    }

    if rest.len() > MAX_SLOTS {
        return Err(Disqualified::TooManyParams { found: rest.len() });
    }

    let mut slots: Vec<Slot> = Vec::with_capacity(rest.len());
    for (offset, ty) in rest.iter().enumerate() {
        let position = offset + 1;
        let kind = if probe::is_header_map(ty) {
            SlotKind::Header
        } else if probe::is_query_record(ty) {
            SlotKind::Query
        } else if probe::is_record(ty) {
            SlotKind::Body
        } else {
            return Err(Disqualified::UnsupportedParam {
                position,
                name: ty.name(),
            });
        };

        if let Some(taken) = slots.iter().find(|slot| slot.kind == kind) {
            return Err(Disqualified::DuplicateSlot {
                kind,
                first: taken.position,
                second: position,
            });
        }

        slots.push(Slot {
            kind,
            position,
            type_info: *ty,
        });
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Verb;

    fn ctx() -> TypeInfo {
        TypeInfo::context("CallContext")
    }

    fn failure() -> TypeInfo {
        TypeInfo::failure_signal("Failure")
    }

    fn sig(params: Vec<TypeInfo>, returns: Vec<TypeInfo>) -> Signature {
        Signature::new(params, returns)
    }

    #[test]
    fn test_body_action() {
        let plan = classify(
            "Add",
            "Inventory",
            &sig(
                vec![ctx(), TypeInfo::record("InventoryRecord")],
                vec![failure()],
            ),
        )
        .unwrap();

        assert_eq!(plan.verb(), Verb::Post);
        assert_eq!(plan.resource(), "inventory");
        assert_eq!(plan.action(), "add");
        assert_eq!(plan.arity, ResultArity::SignalOnly);
        assert_eq!(plan.slots.len(), 1);
        assert_eq!(plan.slots[0].kind, SlotKind::Body);
        assert_eq!(plan.slots[0].position, 1);
    }

    #[test]
    fn test_query_action_with_payload() {
        let plan = classify(
            "GetData",
            "Inventory",
            &sig(
                vec![ctx(), TypeInfo::record("InventoryQuery")],
                vec![TypeInfo::record("InventoryRecord"), failure()],
            ),
        )
        .unwrap();

        assert_eq!(plan.verb(), Verb::Get);
        assert_eq!(plan.action(), "data");
        assert_eq!(plan.arity, ResultArity::PayloadAndSignal);
        assert_eq!(plan.slot(SlotKind::Query).unwrap().position, 1);
    }

    #[test]
    fn test_query_slot_independent_of_order() {
        let plan = classify(
            "Header",
            "Inventory",
            &sig(
                vec![
                    ctx(),
                    TypeInfo::record("InventoryRecord"),
                    TypeInfo::header_map(),
                    TypeInfo::record("InventoryQuery").by_ref(),
                ],
                vec![failure()],
            ),
        )
        .unwrap();

        assert_eq!(plan.slot(SlotKind::Body).unwrap().position, 1);
        assert_eq!(plan.slot(SlotKind::Header).unwrap().position, 2);
        let query = plan.slot(SlotKind::Query).unwrap();
        assert_eq!(query.position, 3);
        assert!(query.type_info.is_by_ref());
    }

    #[test]
    fn test_sequence_payload() {
        let plan = classify(
            "List",
            "Inventory",
            &sig(
                vec![ctx()],
                vec![TypeInfo::record_sequence("InventoryRecord"), failure()],
            ),
        )
        .unwrap();
        assert_eq!(plan.arity, ResultArity::PayloadAndSignal);
        assert!(plan.slots.is_empty());
    }

    #[test]
    fn test_return_count() {
        let none = classify("Nothing", "Inventory", &sig(vec![ctx()], vec![]));
        assert_eq!(none, Err(Disqualified::ReturnCount(0)));

        let three = classify(
            "Triple",
            "Inventory",
            &sig(
                vec![ctx()],
                vec![
                    TypeInfo::record("A"),
                    TypeInfo::record("B"),
                    failure(),
                ],
            ),
        );
        assert_eq!(three, Err(Disqualified::ReturnCount(3)));
    }

    #[test]
    fn test_last_return_must_signal() {
        let result = classify(
            "Count",
            "Inventory",
            &sig(vec![ctx()], vec![TypeInfo::record("InventoryRecord")]),
        );
        assert_eq!(result, Err(Disqualified::NotFailureSignal("InventoryRecord")));
    }

    #[test]
    fn test_payload_must_be_record() {
        let result = classify(
            "Name",
            "Inventory",
            &sig(vec![ctx()], vec![TypeInfo::scalar("String"), failure()]),
        );
        assert_eq!(result, Err(Disqualified::PayloadNotRecord("String")));
    }

    #[test]
    fn test_context_required() {
        let missing = classify("Ping", "Inventory", &sig(vec![], vec![failure()]));
        assert_eq!(missing, Err(Disqualified::MissingContext));

        let wrong = classify(
            "Add",
            "Inventory",
            &sig(vec![TypeInfo::record("InventoryRecord")], vec![failure()]),
        );
        assert_eq!(wrong, Err(Disqualified::NotContext("InventoryRecord")));
    }

    #[test]
    fn test_too_many_params() {
        let result = classify(
            "Crowded",
            "Inventory",
            &sig(
                vec![
                    ctx(),
                    TypeInfo::header_map(),
                    TypeInfo::record("InventoryQuery"),
                    TypeInfo::record("InventoryRecord"),
                    TypeInfo::record("Extra"),
                ],
                vec![failure()],
            ),
        );
        assert_eq!(result, Err(Disqualified::TooManyParams { found: 4 }));
    }

    #[test]
    fn test_duplicate_body() {
        let result = classify(
            "Merge",
            "Inventory",
            &sig(
                vec![
                    ctx(),
                    TypeInfo::record("InventoryRecord"),
                    TypeInfo::record("Other"),
                ],
                vec![failure()],
            ),
        );
        assert_eq!(
            result,
            Err(Disqualified::DuplicateSlot {
                kind: SlotKind::Body,
                first: 1,
                second: 2,
            })
        );
    }

    #[test]
    fn test_scalar_param_rejected() {
        let result = classify(
            "Rename",
            "Inventory",
            &sig(vec![ctx(), TypeInfo::scalar("String")], vec![failure()]),
        );
        assert_eq!(
            result,
            Err(Disqualified::UnsupportedParam {
                position: 1,
                name: "String",
            })
        );
    }

    #[test]
    fn test_unexported_method() {
        let result = classify("helper", "Inventory", &sig(vec![ctx()], vec![failure()]));
        assert_eq!(result, Err(Disqualified::NotExported("helper".to_string())));
    }
}
