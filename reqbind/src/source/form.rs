use http::Method;
use tracing::trace;

use super::{merge_params, unsupported_method};
use crate::{
    BindError, Hooks, MIME_FORM_URLENCODED, MIME_MULTIPART_FORM, Node, RequestContext, Section,
    flatten, mime_matches,
};

/// Returns true if the request declares a urlencoded or multipart body
pub(crate) fn is_form(ctx: &dyn RequestContext) -> bool {
    ctx.content_type().is_some_and(|content_type| {
        mime_matches(content_type, MIME_FORM_URLENCODED)
            || mime_matches(content_type, MIME_MULTIPART_FORM)
    })
}

/// Binds form fields. Requests that carry no form are left alone.
pub(crate) fn bind_form(
    node: &mut Node,
    ctx: &dyn RequestContext,
    hooks: &Hooks,
) -> Result<(), BindError> {
    let method = ctx.method();
    if *method == Method::GET {
        return Err(unsupported_method(Section::Form, method));
    }
    if ctx.content_length() == Some(0) {
        trace!("empty body, no form to bind");
        return Ok(());
    }
    if !is_form(ctx) {
        trace!(content_type = ?ctx.content_type(), "not a form");
        return Ok(());
    }

    let mut slots = flatten(Section::Form, node, hooks)?;
    let params = ctx.form_params()?;
    merge_params(Section::Form, &mut slots, &params, hooks)
}
