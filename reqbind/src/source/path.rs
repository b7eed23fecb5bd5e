use tracing::trace;

use super::{coercion, not_settable};
use crate::{
    BindError, BindErrorKind, Hooks, Node, RequestContext, Section, SlotMap, coerce, flatten,
};

/// Binds route parameters. Every parameter needs a slot.
pub(crate) fn bind_path(
    node: &mut Node,
    ctx: &dyn RequestContext,
    hooks: &Hooks,
) -> Result<(), BindError> {
    let mut slots = flatten(Section::Path, node, hooks)?;
    for (name, value) in ctx.path_params() {
        let Some(slot) = slots.get_mut(name) else {
            return Err(BindErrorKind::MissingParam {
                location: Section::Path,
                param: name.to_owned(),
            }
            .into());
        };
        if !slot.is_settable() {
            return Err(not_settable(Section::Path, name));
        }
        coerce(slot.node_mut(), value, hooks)
            .map_err(|source| coercion(Section::Path, name, source))?;
        trace!(name, value, "bound path param");
    }
    Ok(())
}

/// Binds route parameters into an already flattened target, skipping those
/// without a slot.
pub(crate) fn bind_path_lenient(
    slots: &mut SlotMap<'_>,
    ctx: &dyn RequestContext,
    hooks: &Hooks,
) -> Result<(), BindError> {
    for (name, value) in ctx.path_params() {
        let Some(slot) = slots.get_mut(name) else {
            trace!(name, "no slot for path param");
            continue;
        };
        if !slot.is_settable() {
            return Err(not_settable(Section::Path, name));
        }
        coerce(slot.node_mut(), value, hooks)
            .map_err(|source| coercion(Section::Path, name, source))?;
    }
    Ok(())
}
