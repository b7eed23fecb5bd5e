//! One binder per request section.

use http::Method;
use tracing::trace;

use crate::{
    BindError, BindErrorKind, CoerceError, Hooks, Node, NodeKind, ParamMap, Section, SlotMap,
    coerce,
};

mod body;
pub(crate) use body::{bind_body, decode_into, store_presence};

mod form;
pub(crate) use form::{bind_form, is_form};

mod header;
pub(crate) use header::bind_header;

mod path;
pub(crate) use path::{bind_path, bind_path_lenient};

mod query;
pub(crate) use query::{bind_query, query_allowed};

/// Merges multi-valued parameters into flattened slots. Shared by the query
/// and form binders.
///
/// Unmapped keys are ignored. A list slot is replaced by one element per
/// value, and only once every value has been converted; any other slot
/// takes the first value.
pub(crate) fn merge_params(
    section: Section,
    slots: &mut SlotMap<'_>,
    params: &ParamMap,
    hooks: &Hooks,
) -> Result<(), BindError> {
    for (key, values) in params.iter() {
        let Some(slot) = slots.get_mut(key) else {
            trace!(%section, key, "no slot for param");
            continue;
        };
        if !slot.is_settable() {
            return Err(not_settable(section, key));
        }

        let node = slot.node_mut();
        let item_shape = node.item_shape().filter(|_| !hooks.contains(node.shape()));
        match item_shape {
            Some(item_shape) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    let mut item = Node::zero(item_shape).ok_or_else(|| {
                        coercion(section, key, CoerceError::Unsupported { shape: item_shape })
                    })?;
                    coerce(&mut item, value, hooks)
                        .map_err(|source| coercion(section, key, source))?;
                    items.push(item);
                }
                *node.kind_mut() = NodeKind::List(items);
                trace!(%section, key, len = values.len(), "bound list");
            }
            None => {
                if let Some(first) = values.first() {
                    coerce(node, first, hooks).map_err(|source| coercion(section, key, source))?;
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn not_settable(location: Section, param: &str) -> BindError {
    BindErrorKind::NotSettable {
        location,
        param: param.to_owned(),
    }
    .into()
}

pub(crate) fn coercion(location: Section, param: &str, source: CoerceError) -> BindError {
    BindErrorKind::Coercion {
        location,
        param: param.to_owned(),
        source,
    }
    .into()
}

pub(crate) fn unsupported_method(location: Section, method: &Method) -> BindError {
    BindErrorKind::UnsupportedMethod {
        location,
        method: method.clone(),
    }
    .into()
}
