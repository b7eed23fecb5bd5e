use http::Method;

use super::{merge_params, unsupported_method};
use crate::{BindError, Hooks, Node, RequestContext, Section, flatten};

/// Query parameters are only bound for requests without a body.
pub(crate) fn query_allowed(method: &Method) -> bool {
    [Method::GET, Method::DELETE, Method::HEAD].contains(method)
}

/// Binds query parameters.
pub(crate) fn bind_query(
    node: &mut Node,
    ctx: &dyn RequestContext,
    hooks: &Hooks,
) -> Result<(), BindError> {
    let method = ctx.method();
    if !query_allowed(method) {
        return Err(unsupported_method(Section::Query, method));
    }
    let mut slots = flatten(Section::Query, node, hooks)?;
    merge_params(Section::Query, &mut slots, &ctx.query_params(), hooks)
}
