#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate self as reqbind;

pub use facet::Facet;
pub use facet_reflect::Peek;

// Binding and validation attributes, written `#[facet(bind::required)]`
// after `use reqbind as bind;`.
facet::define_attr_grammar! {
    ns "bind";
    crate_path ::reqbind;

    /// Attributes understood by the binder and the [`RuleValidator`].
    ///
    /// Bounds are written as string literals and parsed when validating.
    pub enum Attr {
        /// Sources may match the field but never write it.
        ///
        /// Usage: `#[facet(bind::readonly)]`
        Readonly,
        /// The zero value is a violation.
        ///
        /// Usage: `#[facet(bind::required)]`
        Required,
        /// Lower bound on a number, or on the length of a string or list.
        ///
        /// Usage: `#[facet(bind::min = "1")]`
        Min(&'static str),
        /// Upper bound on a number, or on the length of a string or list.
        ///
        /// Usage: `#[facet(bind::max = "100")]`
        Max(&'static str),
        /// Lower bound on the length of a string or list.
        ///
        /// Usage: `#[facet(bind::min_length = "3")]`
        MinLength(&'static str),
        /// Upper bound on the length of a string or list.
        ///
        /// Usage: `#[facet(bind::max_length = "12")]`
        MaxLength(&'static str),
        /// Regular expression a string must match.
        ///
        /// Usage: `#[facet(bind::pattern = "^[a-z]+$")]`
        Pattern(&'static str),
    }
}

/// Namespace of the attributes declared by [`Attr`]
pub const ATTR_NS: &str = "bind";

mod binder;
pub use binder::*;

mod coerce;
pub use coerce::{CoerceError, coerce};

mod decode;
pub use decode::{BodyDecoder, DecodeError, JsonDecoder, XmlDecoder};

mod error;
pub use error::*;

mod fallback;
pub use fallback::*;

mod flatten;
pub use flatten::{Slot, SlotMap, flatten};

mod hook;
pub use hook::{HookError, Hooks, ParseParam, ParseText};

mod node;
pub use node::{Member, Node, NodeError, NodeKind, Scalar};

mod params;
pub use params::ParamMap;

mod presence;
pub use presence::PresenceTable;

mod request;
pub use request::*;

mod section;
pub use section::{SENT_FIELDS, Section};

mod source;

mod validate;
pub use validate::*;
