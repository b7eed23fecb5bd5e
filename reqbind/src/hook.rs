use core::error::Error;
use core::fmt;

use facet_core::{Facet, Shape};
use facet_reflect::Peek;
use tracing::trace;

use crate::Node;

/// Error returned by a parse hook. It is surfaced to the caller unchanged.
pub type HookError = Box<dyn Error + Send + Sync + 'static>;

/// A type that parses itself from a raw parameter string.
///
/// Takes precedence over every built-in coercion once registered with
/// [`Hooks::param`].
pub trait ParseParam: Sized {
    /// Parses a value from `raw`
    fn parse_param(raw: &str) -> Result<Self, HookError>;
}

/// A type that parses itself from raw bytes.
///
/// Registered with [`Hooks::text`].
pub trait ParseText: Sized {
    /// Parses a value from `raw`
    fn parse_text(raw: &[u8]) -> Result<Self, HookError>;
}

type ParseFn = Box<dyn Fn(&str) -> Result<Node, HookError> + Send + Sync>;

/// Types that parse themselves, keyed by shape.
///
/// A hooked type is a leaf everywhere: sections never descend into it and
/// body decoding hands it the raw text of a string, number or bool. Its
/// fields must still be reflectable, because the parsed value is stored
/// like any other.
#[derive(Default)]
pub struct Hooks {
    entries: Vec<(&'static Shape, ParseFn)>,
}

impl Hooks {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` as parsing itself from parameter strings
    pub fn param<T: ParseParam + Facet<'static>>(self) -> Self {
        self.with(T::SHAPE, |raw| T::parse_param(raw))
    }

    /// Registers `T` as parsing itself from raw bytes
    pub fn text<T: ParseText + Facet<'static>>(self) -> Self {
        self.with(T::SHAPE, |raw| T::parse_text(raw.as_bytes()))
    }

    fn with<T: Facet<'static>>(
        mut self,
        shape: &'static Shape,
        parse: impl Fn(&str) -> Result<T, HookError> + Send + Sync + 'static,
    ) -> Self {
        trace!(%shape, "registering parse hook");
        self.entries.retain(|(known, _)| *known != shape);
        self.entries.push((
            shape,
            Box::new(move |raw: &str| {
                let value = parse(raw)?;
                Node::snapshot(Peek::new(&value)).map_err(|err| HookError::from(err.to_string()))
            }),
        ));
        self
    }

    /// Returns true if `shape` parses itself
    pub fn contains(&self, shape: &'static Shape) -> bool {
        self.entries.iter().any(|(known, _)| *known == shape)
    }

    /// Runs the hook for `shape` on `raw`, if there is one
    pub(crate) fn parse(
        &self,
        shape: &'static Shape,
        raw: &str,
    ) -> Option<Result<Node, HookError>> {
        self.entries
            .iter()
            .find(|(known, _)| *known == shape)
            .map(|(_, parse)| parse(raw))
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(shape, _)| shape.type_identifier))
            .finish()
    }
}
