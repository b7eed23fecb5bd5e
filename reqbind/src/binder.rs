use core::fmt;

use facet_core::Facet;
use facet_reflect::Peek;
use tracing::debug;

use crate::decode::{BodyDecoder, default_decoders};
use crate::flatten::record_like;
use crate::source::{bind_body, bind_form, bind_header, bind_path, bind_query, store_presence};
use crate::{
    BindError, BindErrorKind, FallbackBinder, FlatBinder, Hooks, Node, NodeKind, ParseParam,
    ParseText, RequestContext, RuleValidator, SENT_FIELDS, Section, Validator,
};

/// Binds requests into records.
///
/// A record declares what it reads through top-level fields named after the
/// sections: `path`, `query`, `header`, `form` and `body`, plus an optional
/// `body_sent_fields` presence table. Sections are bound in declaration
/// order, then the whole record is validated.
///
/// ```
/// use reqbind::{Binder, Facet, Request};
/// use reqbind as bind;
///
/// #[derive(Facet, Default)]
/// struct GetUser {
///     path: UserPath,
///     query: UserQuery,
/// }
///
/// #[derive(Facet, Default)]
/// struct UserPath {
///     #[facet(bind::min = "1")]
///     id: u64,
/// }
///
/// #[derive(Facet, Default)]
/// struct UserQuery {
///     fields: Vec<String>,
/// }
///
/// let req = Request::get("/users/3?fields=name&fields=email").with_path_param("id", "3");
/// let mut target = GetUser::default();
/// Binder::new().bind(&mut target, &req).unwrap();
/// assert_eq!(target.path.id, 3);
/// assert_eq!(target.query.fields, ["name", "email"]);
/// ```
///
/// Each section is bound as a unit: when one fails, the sections bound
/// before it keep their values and the failing one keeps its old value.
///
/// A `Binder` is immutable once built and can be shared between threads.
pub struct Binder {
    validator: Option<Box<dyn Validator>>,
    decoders: Vec<Box<dyn BodyDecoder>>,
    hooks: Hooks,
    fallback: Box<dyn FallbackBinder>,
    call_fallback_on_error: bool,
}

impl Binder {
    /// Creates a binder with the [`RuleValidator`], the JSON and XML
    /// decoders, no parse hooks, and the [`FlatBinder`] fallback (disabled).
    pub fn new() -> Self {
        Self {
            validator: Some(Box::new(RuleValidator::new())),
            decoders: default_decoders(),
            hooks: Hooks::new(),
            fallback: Box::new(FlatBinder::new()),
            call_fallback_on_error: false,
        }
    }

    /// Replaces the validator
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Skips validation
    pub fn without_validator(mut self) -> Self {
        self.validator = None;
        self
    }

    /// Registers a body decoder, ahead of the ones already registered
    pub fn with_decoder(mut self, decoder: impl BodyDecoder + 'static) -> Self {
        self.decoders.insert(0, Box::new(decoder));
        self
    }

    /// Replaces the parse hooks
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Lets `T` parse itself from parameter strings
    pub fn with_param_hook<T: ParseParam + Facet<'static>>(mut self) -> Self {
        self.hooks = core::mem::take(&mut self.hooks).param::<T>();
        self
    }

    /// Lets `T` parse itself from raw bytes
    pub fn with_text_hook<T: ParseText + Facet<'static>>(mut self) -> Self {
        self.hooks = core::mem::take(&mut self.hooks).text::<T>();
        self
    }

    /// Replaces the fallback binder
    pub fn with_fallback(mut self, fallback: impl FallbackBinder + 'static) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    /// When enabled, targets that are not records, that have a section of
    /// the wrong shape, or that declare no section at all are handed to the
    /// fallback binder instead of failing. Their result is not validated.
    pub fn call_fallback_on_error(mut self, enabled: bool) -> Self {
        self.call_fallback_on_error = enabled;
        self
    }

    /// Binds `ctx` into `target`, then validates it.
    ///
    /// `target` is read once, bound as an owned tree and written back, also
    /// when binding fails partway.
    pub fn bind<T: Facet<'static>>(
        &self,
        target: &mut T,
        ctx: &impl RequestContext,
    ) -> Result<(), BindError> {
        let mut root = Node::snapshot(Peek::new(&*target))
            .map_err(|source| BindErrorKind::Target { source })?;
        let outcome = self.bind_node(&mut root, ctx);
        *target = root
            .build()
            .map_err(|source| BindErrorKind::Target { source })?;

        if outcome?
            && let Some(validator) = &self.validator
        {
            validator.validate(Peek::new(&*target))?;
        }
        Ok(())
    }

    /// Binds `ctx` into `root`. Returns false when the fallback did the
    /// binding, which skips validation.
    fn bind_node(&self, root: &mut Node, ctx: &dyn RequestContext) -> Result<bool, BindError> {
        let shape = root.shape();
        let outcome = if matches!(root.kind(), NodeKind::Record(_)) {
            self.bind_sections(root, ctx)
        } else {
            Err(BindErrorKind::InvalidType { shape }.into())
        };

        match outcome {
            Ok(true) => Ok(true),
            Ok(false) if self.call_fallback_on_error => {
                debug!(%shape, "no section declared, falling back");
                self.fallback.bind(root, ctx, &self.hooks)?;
                Ok(false)
            }
            Ok(false) => {
                debug!(%shape, "no section declared");
                Ok(true)
            }
            Err(err) if err.is_structural() && self.call_fallback_on_error => {
                debug!(error = %err, "falling back");
                self.fallback.bind(root, ctx, &self.hooks)?;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Binds every declared section. Returns false if there were none.
    ///
    /// Section shapes are checked before anything is bound. Each section is
    /// bound into a copy that replaces the original only on success, and
    /// the first failure stops the sections after it.
    fn bind_sections(&self, root: &mut Node, ctx: &dyn RequestContext) -> Result<bool, BindError> {
        let NodeKind::Record(members) = root.kind_mut() else {
            return Ok(false);
        };

        let mut sections = Vec::new();
        let mut sent_fields = None;
        for (index, member) in members.iter().enumerate() {
            if member.field.name == SENT_FIELDS {
                sent_fields = Some(index);
            } else if let Some(section) = Section::from_field_name(member.field.name) {
                sections.push((section, index));
            }
        }
        if sections.is_empty() {
            return Ok(false);
        }

        for &(section, index) in &sections {
            let member = &members[index];
            if section != Section::Body && !record_like(&member.node, &self.hooks) {
                return Err(BindErrorKind::InvalidTypeAtLocation {
                    location: member.field.name,
                    expected: "record",
                    actual: member.node.shape(),
                }
                .into());
            }
        }

        for (section, index) in sections {
            let mut staged = members[index].node.clone();
            debug!(%section, shape = %staged.shape(), "binding section");
            let decoded = match section {
                Section::Path => bind_path(&mut staged, ctx, &self.hooks).map(|()| None),
                Section::Query => bind_query(&mut staged, ctx, &self.hooks).map(|()| None),
                Section::Header => bind_header(&mut staged, ctx, &self.hooks).map(|()| None),
                Section::Form => bind_form(&mut staged, ctx, &self.hooks).map(|()| None),
                Section::Body => bind_body(&mut staged, ctx, &self.decoders, &self.hooks),
            }?;
            members[index].node = staged;

            if let (Some(value), Some(sent_fields)) = (decoded, sent_fields) {
                store_presence(&mut members[sent_fields], &value)?;
            }
        }
        Ok(true)
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("validator", &self.validator.is_some())
            .field(
                "decoders",
                &self.decoders.iter().map(|d| d.format()).collect::<Vec<_>>(),
            )
            .field("hooks", &self.hooks)
            .field("call_fallback_on_error", &self.call_fallback_on_error)
            .finish_non_exhaustive()
    }
}
