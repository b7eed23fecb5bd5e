use core::fmt;
use core::num::IntErrorKind;
use core::str::FromStr;

use facet_core::Shape;
use tracing::trace;

use crate::node::option_inner;
use crate::{HookError, Hooks, Node, NodeKind, Scalar};

/// Error returned when a raw value cannot be converted into its slot
#[derive(Debug)]
pub enum CoerceError {
    /// the value does not parse as the slot's type
    Invalid {
        /// the raw value
        value: String,
        /// shape of the slot
        shape: &'static Shape,
        /// parser message
        reason: String,
    },

    /// the value parses but does not fit the slot's width
    OutOfRange {
        /// the raw value
        value: String,
        /// shape of the slot
        shape: &'static Shape,
    },

    /// the slot is not something a single raw value can go into
    Unsupported {
        /// shape of the slot
        shape: &'static Shape,
    },

    /// the type's own parse hook failed
    Hook {
        /// shape of the slot
        shape: &'static Shape,
        /// the hook's error, untouched
        source: HookError,
    },
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoerceError::Invalid {
                value,
                shape,
                reason,
            } => write!(f, "invalid value `{value}` for `{shape}`: {reason}"),
            CoerceError::OutOfRange { value, shape } => {
                write!(f, "value `{value}` is out of range for `{shape}`")
            }
            CoerceError::Unsupported { shape } => write!(f, "unknown type `{shape}`"),
            CoerceError::Hook { source, .. } => write!(f, "{source}"),
        }
    }
}

impl core::error::Error for CoerceError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            CoerceError::Hook { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Converts `raw` into `node`.
///
/// Hooked types parse themselves. `None` options get a zero value first.
/// An empty string means the zero value of the node's type.
pub fn coerce(node: &mut Node, raw: &str, hooks: &Hooks) -> Result<(), CoerceError> {
    let shape = node.shape();
    if let Some(parsed) = hooks.parse(shape, raw) {
        *node = parsed.map_err(|source| CoerceError::Hook { shape, source })?;
        trace!(%shape, raw, "parsed by hook");
        return Ok(());
    }

    match node.kind_mut() {
        NodeKind::Scalar(scalar) => coerce_scalar(scalar, shape, raw),
        NodeKind::Option(slot) => {
            let inner = match slot.take() {
                Some(inner) => inner,
                None => {
                    trace!(%shape, "allocating before coercion");
                    let zero = option_inner(shape)
                        .and_then(Node::zero)
                        .ok_or(CoerceError::Unsupported { shape })?;
                    Box::new(zero)
                }
            };
            coerce(slot.insert(inner), raw, hooks)
        }
        NodeKind::List(_) | NodeKind::Record(_) => Err(CoerceError::Unsupported { shape }),
    }
}

fn coerce_scalar(scalar: &mut Scalar, shape: &'static Shape, raw: &str) -> Result<(), CoerceError> {
    match scalar {
        Scalar::Bool(slot) => *slot = parse_bool(raw, shape)?,
        Scalar::Char(slot) => {
            *slot = raw.parse().map_err(|err: core::char::ParseCharError| CoerceError::Invalid {
                value: raw.to_owned(),
                shape,
                reason: err.to_string(),
            })?
        }
        Scalar::String(slot) => raw.clone_into(slot),
        Scalar::I8(slot) => *slot = parse_int(raw, shape)?,
        Scalar::I16(slot) => *slot = parse_int(raw, shape)?,
        Scalar::I32(slot) => *slot = parse_int(raw, shape)?,
        Scalar::I64(slot) => *slot = parse_int(raw, shape)?,
        Scalar::I128(slot) => *slot = parse_int(raw, shape)?,
        Scalar::ISize(slot) => *slot = parse_int(raw, shape)?,
        Scalar::U8(slot) => *slot = parse_uint(raw, shape)?,
        Scalar::U16(slot) => *slot = parse_uint(raw, shape)?,
        Scalar::U32(slot) => *slot = parse_uint(raw, shape)?,
        Scalar::U64(slot) => *slot = parse_uint(raw, shape)?,
        Scalar::U128(slot) => *slot = parse_uint(raw, shape)?,
        Scalar::USize(slot) => *slot = parse_uint(raw, shape)?,
        Scalar::F32(slot) => *slot = parse_float(raw, shape, f32::is_infinite)?,
        Scalar::F64(slot) => *slot = parse_float(raw, shape, f64::is_infinite)?,
    }
    trace!(%shape, raw, "coerced");
    Ok(())
}

fn parse_bool(raw: &str, shape: &'static Shape) -> Result<bool, CoerceError> {
    match raw {
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        _ => Err(CoerceError::Invalid {
            value: raw.to_owned(),
            shape,
            reason: "expected one of 1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False"
                .to_owned(),
        }),
    }
}

fn parse_int<T>(raw: &str, shape: &'static Shape) -> Result<T, CoerceError>
where
    T: FromStr<Err = core::num::ParseIntError>,
{
    let raw = if raw.is_empty() { "0" } else { raw };
    raw.parse().map_err(|err: core::num::ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => CoerceError::OutOfRange {
            value: raw.to_owned(),
            shape,
        },
        _ => CoerceError::Invalid {
            value: raw.to_owned(),
            shape,
            reason: err.to_string(),
        },
    })
}

/// Like [`parse_int`], but an explicit `+` sign is rejected too.
fn parse_uint<T>(raw: &str, shape: &'static Shape) -> Result<T, CoerceError>
where
    T: FromStr<Err = core::num::ParseIntError>,
{
    if raw.starts_with('+') {
        return Err(CoerceError::Invalid {
            value: raw.to_owned(),
            shape,
            reason: "invalid digit found in string".to_owned(),
        });
    }
    parse_int(raw, shape)
}

fn parse_float<T>(
    raw: &str,
    shape: &'static Shape,
    is_infinite: fn(T) -> bool,
) -> Result<T, CoerceError>
where
    T: FromStr<Err = core::num::ParseFloatError> + Copy,
{
    let raw = if raw.is_empty() { "0.0" } else { raw };
    let value: T = raw.parse().map_err(|err: core::num::ParseFloatError| CoerceError::Invalid {
        value: raw.to_owned(),
        shape,
        reason: err.to_string(),
    })?;
    let spelled_infinite = raw
        .trim_start_matches(['+', '-'])
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("inf"));
    if is_infinite(value) && !spelled_infinite {
        return Err(CoerceError::OutOfRange {
            value: raw.to_owned(),
            shape,
        });
    }
    Ok(value)
}
