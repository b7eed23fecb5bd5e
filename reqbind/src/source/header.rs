use tracing::trace;

use super::{coercion, not_settable};
use crate::{BindError, Hooks, Node, RequestContext, Section, coerce, flatten};

/// Binds header fields, looking each slot's identifier up in the request.
/// Absent and empty headers are skipped.
pub(crate) fn bind_header(
    node: &mut Node,
    ctx: &dyn RequestContext,
    hooks: &Hooks,
) -> Result<(), BindError> {
    let mut slots = flatten(Section::Header, node, hooks)?;
    for (identifier, slot) in slots.iter_mut() {
        let Some(value) = ctx.header(identifier).filter(|value| !value.is_empty()) else {
            continue;
        };
        if !slot.is_settable() {
            return Err(not_settable(Section::Header, identifier));
        }
        coerce(slot.node_mut(), value, hooks)
            .map_err(|source| coercion(Section::Header, identifier, source))?;
        trace!(identifier, value, "bound header");
    }
    Ok(())
}
