use core::fmt;

use facet_core::Shape;
use http::{Method, StatusCode};

use crate::{CoerceError, DecodeError, NodeError, Section, ValidationErrors};

/// Error returned when a request cannot be bound into a record.
///
/// Every binding error is the client's fault as far as HTTP is concerned:
/// [`BindError::status`] is always `400 Bad Request`.
#[derive(Debug)]
pub struct BindError {
    kind: BindErrorKind,
}

/// What went wrong while binding
#[derive(Debug)]
#[non_exhaustive]
pub enum BindErrorKind {
    /// the binding target is not a record
    InvalidType {
        /// shape of the target
        shape: &'static Shape,
    },

    /// a section field (or the sent-fields slot) has the wrong shape
    InvalidTypeAtLocation {
        /// name of the offending top-level field
        location: &'static str,
        /// what it should have been
        expected: &'static str,
        /// what it is
        actual: &'static Shape,
    },

    /// a `#[facet(flatten)]` field is not a record
    InvalidAnonymousField {
        /// section being flattened
        location: Section,
        /// name of the flattened field
        field: &'static str,
    },

    /// a path parameter has no field to go into
    MissingParam {
        /// section being bound
        location: Section,
        /// the parameter name
        param: String,
    },

    /// a source tried to write a `#[facet(bind::readonly)]` field
    NotSettable {
        /// section being bound
        location: Section,
        /// the identifier of the field
        param: String,
    },

    /// the section cannot be bound for this request method
    UnsupportedMethod {
        /// section being bound
        location: Section,
        /// the request method
        method: Method,
    },

    /// a raw value could not be converted into its slot
    Coercion {
        /// section being bound
        location: Section,
        /// the identifier of the field
        param: String,
        /// why the conversion failed
        source: CoerceError,
    },

    /// the body decoder rejected the payload
    Decode {
        /// section being bound
        location: Section,
        /// decoder error
        source: DecodeError,
    },

    /// the request could not produce its form values
    Form {
        /// transport error
        source: Box<dyn core::error::Error + Send + Sync + 'static>,
    },

    /// the bound record failed validation
    Validation(ValidationErrors),

    /// the target could not be read or written back through reflection
    Target {
        /// reflection error
        source: NodeError,
    },
}

impl BindError {
    /// Creates an error of the given kind
    pub fn new(kind: BindErrorKind) -> Self {
        Self { kind }
    }

    /// Returns what went wrong
    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }

    /// Consumes the error, returning what went wrong
    pub fn into_kind(self) -> BindErrorKind {
        self.kind
    }

    /// Returns the status code for this error.
    pub const fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Returns true for errors about the shape of the target rather than the
    /// request: these hand the request to the fallback binder when enabled.
    pub fn is_structural(&self) -> bool {
        matches!(
            self.kind,
            BindErrorKind::InvalidType { .. } | BindErrorKind::InvalidTypeAtLocation { .. }
        )
    }

    /// Returns the validation errors, if validation is what failed
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match &self.kind {
            BindErrorKind::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<BindErrorKind> for BindError {
    fn from(kind: BindErrorKind) -> Self {
        Self { kind }
    }
}

impl From<ValidationErrors> for BindError {
    fn from(errors: ValidationErrors) -> Self {
        BindErrorKind::Validation(errors).into()
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BindErrorKind::InvalidType { shape } => {
                write!(f, "binding target must be a record, got `{shape}`")
            }
            BindErrorKind::InvalidTypeAtLocation {
                location,
                expected,
                actual,
            } => write!(
                f,
                "binding element at `{location}` must be a {expected}, got `{actual}`"
            ),
            BindErrorKind::InvalidAnonymousField { location, field } => write!(
                f,
                "binding element at `{location}` cannot flatten `{field}`, which is not a record"
            ),
            BindErrorKind::MissingParam { location, param } => {
                write!(f, "missing param `{param}` at `{location}`")
            }
            BindErrorKind::NotSettable { location, param } => {
                write!(f, "param `{param}` at `{location}` is not settable")
            }
            BindErrorKind::UnsupportedMethod { location, method } => {
                write!(f, "unsupported http method `{method}` at `{location}`")
            }
            BindErrorKind::Coercion {
                location,
                param,
                source,
            } => write!(f, "cannot bind param `{param}` at `{location}`: {source}"),
            BindErrorKind::Decode { location, source } => {
                write!(f, "cannot decode `{location}`: {source}")
            }
            BindErrorKind::Form { source } => write!(f, "cannot read form values: {source}"),
            BindErrorKind::Validation(errors) => write!(f, "validation failed: {errors}"),
            BindErrorKind::Target { source } => write!(f, "cannot reflect the target: {source}"),
        }
    }
}

impl core::error::Error for BindError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match &self.kind {
            BindErrorKind::Coercion { source, .. } => Some(source),
            BindErrorKind::Decode { source, .. } => Some(source),
            BindErrorKind::Form { source } => Some(&**source),
            BindErrorKind::Validation(errors) => Some(errors),
            BindErrorKind::Target { source } => Some(source),
            _ => None,
        }
    }
}
