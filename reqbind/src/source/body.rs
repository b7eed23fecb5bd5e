use facet_core::Facet;
use facet_reflect::Peek;
use http::Method;
use serde_json::Value;
use tracing::{debug, trace};

use super::{not_settable, unsupported_method};
use crate::decode::{self, BodyDecoder, assign};
use crate::node::{is_record, option_inner};
use crate::{
    ATTR_NS, BindError, BindErrorKind, Hooks, Member, Node, PresenceTable, RequestContext,
    SENT_FIELDS, Section,
};

/// Binds the body section. Returns the decoded payload when the body is a
/// record, for the presence table.
pub(crate) fn bind_body(
    node: &mut Node,
    ctx: &dyn RequestContext,
    decoders: &[Box<dyn BodyDecoder>],
    hooks: &Hooks,
) -> Result<Option<Value>, BindError> {
    let method = ctx.method();
    if *method == Method::GET {
        return Err(unsupported_method(Section::Body, method));
    }

    let shape = node.shape();
    let is_record = !hooks.contains(shape)
        && (is_record(shape) || option_inner(shape).is_some_and(is_record));
    let value = decode_into(node, ctx, decoders, hooks)?;
    Ok(value.filter(|_| is_record))
}

/// Decodes the body with the matching decoder and assigns it into `target`.
/// Returns the decoded value, or `None` if there was nothing to decode.
pub(crate) fn decode_into(
    target: &mut Node,
    ctx: &dyn RequestContext,
    decoders: &[Box<dyn BodyDecoder>],
    hooks: &Hooks,
) -> Result<Option<Value>, BindError> {
    if ctx.content_length() == Some(0) || ctx.body().is_empty() {
        trace!("empty body");
        return Ok(None);
    }
    let Some(decoder) = decode::select(ctx.content_type(), decoders) else {
        debug!(content_type = ?ctx.content_type(), "no decoder for content type");
        return Ok(None);
    };

    let decode_error = |source| BindErrorKind::Decode {
        location: Section::Body,
        source,
    };
    let value = decoder.decode(ctx.body()).map_err(decode_error)?;
    assign(target, &value, decoder.text_scalars(), "", hooks).map_err(decode_error)?;
    Ok(Some(value))
}

/// Stores the keys present in `value` into the sent-fields member.
pub(crate) fn store_presence(member: &mut Member, value: &Value) -> Result<(), BindError> {
    let actual = member.node.shape();
    if actual != PresenceTable::SHAPE {
        return Err(BindErrorKind::InvalidTypeAtLocation {
            location: SENT_FIELDS,
            expected: "PresenceTable",
            actual,
        }
        .into());
    }
    if member.field.has_attr(Some(ATTR_NS), "readonly") {
        return Err(not_settable(Section::Body, SENT_FIELDS));
    }

    let table = PresenceTable::from_value(value);
    member.node = Node::snapshot(Peek::new(&table))
        .map_err(|source| BindErrorKind::Target { source })?;
    trace!(keys = table.len(), "stored presence table");
    Ok(())
}
