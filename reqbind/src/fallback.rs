use tracing::debug;

use crate::decode::{BodyDecoder, default_decoders};
use crate::flatten::record_like;
use crate::source::{bind_path_lenient, decode_into, is_form, merge_params, query_allowed};
use crate::{BindError, Hooks, Node, RequestContext, Section, flatten};

/// Binds targets that do not declare sections, when the [`crate::Binder`]
/// is configured to fall back.
pub trait FallbackBinder: Send + Sync {
    /// Binds the whole request into `target`
    fn bind(
        &self,
        target: &mut Node,
        ctx: &dyn RequestContext,
        hooks: &Hooks,
    ) -> Result<(), BindError>;
}

/// The built-in fallback: the target is one flattened namespace, filled from
/// path parameters, then query parameters (for `GET`, `DELETE` and `HEAD`),
/// then the form fields of a urlencoded or multipart body, or else the
/// decoded body.
///
/// Unlike the section binders, path parameters without a slot are ignored
/// and `GET` bodies are decoded.
pub struct FlatBinder {
    decoders: Vec<Box<dyn BodyDecoder>>,
}

impl FlatBinder {
    /// Creates a fallback with the JSON and XML decoders
    pub fn new() -> Self {
        Self {
            decoders: default_decoders(),
        }
    }

    /// Registers a decoder, ahead of the built-in ones
    pub fn with_decoder(mut self, decoder: impl BodyDecoder + 'static) -> Self {
        self.decoders.insert(0, Box::new(decoder));
        self
    }
}

impl Default for FlatBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FlatBinder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlatBinder")
            .field(
                "decoders",
                &self.decoders.iter().map(|d| d.format()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FallbackBinder for FlatBinder {
    fn bind(
        &self,
        target: &mut Node,
        ctx: &dyn RequestContext,
        hooks: &Hooks,
    ) -> Result<(), BindError> {
        debug!(shape = %target.shape(), "binding flat");
        if record_like(target, hooks) {
            let mut slots = flatten(Section::Path, target, hooks)?;
            bind_path_lenient(&mut slots, ctx, hooks)?;
            if query_allowed(ctx.method()) {
                merge_params(Section::Query, &mut slots, &ctx.query_params(), hooks)?;
            }
            if is_form(ctx) {
                if ctx.content_length() != Some(0) {
                    merge_params(Section::Form, &mut slots, &ctx.form_params()?, hooks)?;
                }
                return Ok(());
            }
        }
        decode_into(target, ctx, &self.decoders, hooks)?;
        Ok(())
    }
}
