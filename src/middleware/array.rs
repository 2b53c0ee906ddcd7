use super::{Middleware, Next};
use crate::action::{types, Action, Dispatchable, Dispatched};
use crate::error::{Result, StoreError};
use crate::store::Store;

/// Expands batch actions into independent dispatches.
///
/// Each member of a [`types::BATCH`] payload is dispatched from the top of
/// the chain in order; the batch itself never reaches later middlewares.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayMiddleware;

impl ArrayMiddleware {
    fn unpack(batch: &Action) -> Result<Vec<Action>> {
        let members = batch
            .payload()
            .as_array()
            .ok_or_else(|| StoreError::MalformedBatch("payload is not an array".to_string()))?;

        members
            .iter()
            .enumerate()
            .map(|(index, member)| {
                Action::from_value(member.clone()).ok_or_else(|| {
                    StoreError::MalformedBatch(format!("member {index} is not an action"))
                })
            })
            .collect()
    }
}

impl Middleware for ArrayMiddleware {
    fn name(&self) -> &'static str {
        "array"
    }

    fn handle(&self, store: &Store, item: Dispatchable, next: Next<'_>) -> Result<Dispatched> {
        match item {
            Dispatchable::Action(batch) if batch.is(types::BATCH) => {
                // Validate everything before dispatching anything.
                let members = Self::unpack(&batch)?;
                for member in members {
                    store.dispatch(member)?;
                }
                Ok(Dispatched::Action(batch))
            }
            other => next.run(other),
        }
    }
}
