use std::borrow::Cow;

use facet_core::{Field, Shape};
use serde_json::{Map, Value};
use tracing::trace;

use super::{DecodeError, kind_of};
use crate::flatten::{descend, record_like};
use crate::node::option_inner;
use crate::{ATTR_NS, Hooks, Member, Node, NodeKind, Scalar, coerce};

/// Writes a decoded value into `node`.
///
/// Records take objects by field identifier, lists take arrays, options take
/// `null` as `None`. With `text_scalars`, strings are accepted for every
/// scalar kind, a single value for a list, and a blank string for a record.
pub(crate) fn assign(
    node: &mut Node,
    value: &Value,
    text_scalars: bool,
    path: &str,
    hooks: &Hooks,
) -> Result<(), DecodeError> {
    let shape = node.shape();
    if hooks.contains(shape) {
        return assign_hooked(node, value, path, hooks);
    }

    let item_shape = node.item_shape();
    match node.kind_mut() {
        NodeKind::Option(slot) => {
            if value.is_null() {
                *slot = None;
                return Ok(());
            }
            let inner = match slot.take() {
                Some(inner) => inner,
                None => Box::new(zero(option_inner(shape), shape, path)?),
            };
            assign(slot.insert(inner), value, text_scalars, path, hooks)
        }
        NodeKind::Record(members) => match value {
            Value::Object(map) => assign_record(members, map, text_scalars, path, hooks),
            Value::Null => Ok(()),
            Value::String(text) if text_scalars && text.trim().is_empty() => {
                trace!(path, "empty element read as an empty record");
                Ok(())
            }
            other => Err(mismatch(path, shape, other)),
        },
        NodeKind::List(items) => match value {
            Value::Array(values) => {
                let mut fresh = Vec::with_capacity(values.len());
                for (index, value) in values.iter().enumerate() {
                    let item_path = format!("{path}[{index}]");
                    let mut item = zero(item_shape, shape, &item_path)?;
                    assign(&mut item, value, text_scalars, &item_path, hooks)?;
                    fresh.push(item);
                }
                *items = fresh;
                Ok(())
            }
            Value::Null => {
                items.clear();
                Ok(())
            }
            other if text_scalars => {
                let item_path = format!("{path}[0]");
                let mut item = zero(item_shape, shape, &item_path)?;
                assign(&mut item, other, text_scalars, &item_path, hooks)?;
                *items = vec![item];
                Ok(())
            }
            other => Err(mismatch(path, shape, other)),
        },
        NodeKind::Scalar(scalar) => {
            if value.is_null() {
                trace!(path, "null leaves the scalar untouched");
                return Ok(());
            }
            let Some(raw) = scalar_text(scalar, value, text_scalars) else {
                return Err(mismatch(path, shape, value));
            };
            coerce(node, &raw, hooks).map_err(|source| DecodeError::Coerce {
                path: path.to_owned(),
                source,
            })
        }
    }
}

fn assign_record(
    members: &mut [Member],
    map: &Map<String, Value>,
    text_scalars: bool,
    path: &str,
    hooks: &Hooks,
) -> Result<(), DecodeError> {
    for Member { field, node } in members.iter_mut() {
        let field: &'static Field = *field;
        if field.is_flattened() {
            let not_flattenable = || DecodeError::NotFlattenable {
                path: join(path, field.name),
            };
            if !record_like(node, hooks) {
                return Err(not_flattenable());
            }
            let nested = descend(node).ok_or_else(not_flattenable)?;
            assign_record(nested, map, text_scalars, path, hooks)?;
            continue;
        }
        if field.should_skip_deserializing() || field.has_attr(Some(ATTR_NS), "readonly") {
            continue;
        }
        let Some(value) = lookup(map, field) else {
            continue;
        };
        assign(node, value, text_scalars, &join(path, field.effective_name()), hooks)?;
    }
    Ok(())
}

/// Exact identifier first, then a case-insensitive match.
fn lookup<'m>(map: &'m Map<String, Value>, field: &Field) -> Option<&'m Value> {
    let identifier = field.effective_name();
    map.get(identifier).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(identifier))
            .map(|(_, value)| value)
    })
}

/// Hooked types take the text of any scalar value.
fn assign_hooked(
    node: &mut Node,
    value: &Value,
    path: &str,
    hooks: &Hooks,
) -> Result<(), DecodeError> {
    let raw: Cow<'_, str> = match value {
        Value::Null => return Ok(()),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        other => return Err(mismatch(path, node.shape(), other)),
    };
    coerce(node, &raw, hooks).map_err(|source| DecodeError::Coerce {
        path: path.to_owned(),
        source,
    })
}

/// Text handed to coercion for a scalar, or `None` on a kind mismatch.
fn scalar_text<'v>(scalar: &Scalar, value: &'v Value, text_scalars: bool) -> Option<Cow<'v, str>> {
    let raw = match (scalar, value) {
        (Scalar::Bool(_), Value::Bool(b)) => Cow::Owned(b.to_string()),
        (Scalar::F32(_) | Scalar::F64(_), Value::Number(n)) => Cow::Owned(n.to_string()),
        (Scalar::String(_) | Scalar::Char(_), Value::String(s)) => Cow::Borrowed(s.as_str()),
        (_, Value::Number(n)) if is_integer(scalar) && !n.is_f64() => Cow::Owned(n.to_string()),
        (_, Value::String(s)) if text_scalars => Cow::Borrowed(s.as_str()),
        _ => return None,
    };
    Some(raw)
}

fn is_integer(scalar: &Scalar) -> bool {
    !matches!(
        scalar,
        Scalar::Bool(_) | Scalar::Char(_) | Scalar::String(_) | Scalar::F32(_) | Scalar::F64(_)
    )
}

fn zero(
    shape: Option<&'static Shape>,
    outer: &'static Shape,
    path: &str,
) -> Result<Node, DecodeError> {
    shape
        .and_then(Node::zero)
        .ok_or_else(|| DecodeError::Coerce {
            path: path.to_owned(),
            source: crate::CoerceError::Unsupported { shape: outer },
        })
}

fn mismatch(path: &str, expected: &'static Shape, found: &Value) -> DecodeError {
    DecodeError::Mismatch {
        path: if path.is_empty() { ".".to_owned() } else { path.to_owned() },
        expected,
        found: kind_of(found),
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_owned()
    } else {
        format!("{path}.{segment}")
    }
}
