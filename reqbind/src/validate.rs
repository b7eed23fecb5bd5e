use core::fmt;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use facet_core::{Def, Field, ScalarType, Type, UserType};
use facet_reflect::Peek;
use regex::Regex;
use tracing::trace;

use crate::{ATTR_NS, Node};

/// Checks a bound record, after every section has been bound.
pub trait Validator: Send + Sync {
    /// Validates the value, returning every violation found
    fn validate(&self, value: Peek<'_, '_>) -> Result<(), ValidationErrors>;
}

/// A validation rule attached to a field with a `bind::` attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// the value must not be the zero value of its type
    Required,
    /// numbers must be at least this; strings and lists must be at least this long
    Min(&'static str),
    /// numbers must be at most this; strings and lists must be at most this long
    Max(&'static str),
    /// strings and lists must be at least this long
    MinLength(&'static str),
    /// strings and lists must be at most this long
    MaxLength(&'static str),
    /// strings must match this regular expression
    Pattern(&'static str),
}

impl Rule {
    /// The rules declared on `field`, in declaration order
    pub fn of(field: &'static Field) -> impl Iterator<Item = Rule> {
        field
            .attributes
            .iter()
            .filter(|attr| attr.ns == Some(ATTR_NS))
            .filter_map(|attr| {
                let arg = || attr.get_as::<&str>().copied();
                let rule = match attr.key {
                    "required" => Rule::Required,
                    "min" => Rule::Min(arg()?),
                    "max" => Rule::Max(arg()?),
                    "min_length" => Rule::MinLength(arg()?),
                    "max_length" => Rule::MaxLength(arg()?),
                    "pattern" => Rule::Pattern(arg()?),
                    _ => return None,
                };
                Some(rule)
            })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("required"),
            Rule::Min(n) => write!(f, "min={n}"),
            Rule::Max(n) => write!(f, "max={n}"),
            Rule::MinLength(n) => write!(f, "min_length={n}"),
            Rule::MaxLength(n) => write!(f, "max_length={n}"),
            Rule::Pattern(p) => write!(f, "pattern={p}"),
        }
    }
}

/// One failed rule
#[derive(Clone, Debug, PartialEq)]
pub struct Violation {
    /// dotted path of the field, by field name
    pub path: String,
    /// the rule that failed
    pub rule: Rule,
    /// what is wrong with the value
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.path, self.message)
    }
}

/// Every rule a value failed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    /// Creates an empty set of errors
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a violation
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// The violations, in field order
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true if nothing failed
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl core::error::Error for ValidationErrors {}

/// The default [`Validator`]: checks the `bind::` rules of every field,
/// descending into nested records, options and lists.
///
/// `None` options only answer to `required`. A bound that does not parse as
/// a number is reported as a violation. Patterns are compiled on first use
/// and cached.
#[derive(Debug, Default)]
pub struct RuleValidator {
    patterns: Mutex<HashMap<&'static str, Result<Regex, String>>>,
}

impl RuleValidator {
    /// Creates a validator with an empty pattern cache
    pub fn new() -> Self {
        Self::default()
    }

    fn walk(&self, value: Peek<'_, '_>, path: &str, errors: &mut ValidationErrors) {
        let shape = value.shape();
        match (&shape.def, &shape.ty) {
            (Def::Option(_), _) => {
                if let Some(inner) = value.into_option().ok().and_then(|option| option.value()) {
                    self.walk(inner, path, errors);
                }
            }
            (Def::List(_), _) => {
                let Ok(list) = value.into_list_like() else {
                    return;
                };
                for (index, item) in list.iter().enumerate() {
                    self.walk(item, &format!("{path}[{index}]"), errors);
                }
            }
            (_, Type::User(UserType::Struct(struct_type))) => {
                let Ok(record) = value.into_struct() else {
                    return;
                };
                for (index, field) in struct_type.fields.iter().enumerate() {
                    let Ok(value) = record.field(index) else {
                        continue;
                    };
                    let field_path = if field.is_flattened() {
                        path.to_owned()
                    } else if path.is_empty() {
                        field.name.to_owned()
                    } else {
                        format!("{path}.{}", field.name)
                    };
                    for rule in Rule::of(field) {
                        if let Some(message) = self.check(rule, value) {
                            trace!(path = %field_path, %rule, "rule failed");
                            errors.push(Violation {
                                path: field_path.clone(),
                                rule,
                                message,
                            });
                        }
                    }
                    self.walk(value, &field_path, errors);
                }
            }
            _ => {}
        }
    }

    fn check(&self, rule: Rule, value: Peek<'_, '_>) -> Option<String> {
        if let Rule::Required = rule {
            let zero = Node::snapshot(value).is_ok_and(|node| node.is_zero());
            return zero.then(|| "is required".to_owned());
        }
        let value = deref_option(value)?;
        match rule {
            Rule::Required => None,
            Rule::Min(raw) => {
                let Ok(min) = raw.parse::<f64>() else {
                    return Some(invalid_bound(raw));
                };
                match measure(value)? {
                    Measure::Number(n) if n < min => Some(format!("must be at least {raw}")),
                    Measure::Length(len) if (len as f64) < min => {
                        Some(format!("must have a length of at least {raw}"))
                    }
                    _ => None,
                }
            }
            Rule::Max(raw) => {
                let Ok(max) = raw.parse::<f64>() else {
                    return Some(invalid_bound(raw));
                };
                match measure(value)? {
                    Measure::Number(n) if n > max => Some(format!("must be at most {raw}")),
                    Measure::Length(len) if (len as f64) > max => {
                        Some(format!("must have a length of at most {raw}"))
                    }
                    _ => None,
                }
            }
            Rule::MinLength(raw) => {
                let Ok(min) = raw.parse::<usize>() else {
                    return Some(invalid_bound(raw));
                };
                match measure(value)? {
                    Measure::Length(len) if len < min => {
                        Some(format!("must have a length of at least {raw}"))
                    }
                    _ => None,
                }
            }
            Rule::MaxLength(raw) => {
                let Ok(max) = raw.parse::<usize>() else {
                    return Some(invalid_bound(raw));
                };
                match measure(value)? {
                    Measure::Length(len) if len > max => {
                        Some(format!("must have a length of at most {raw}"))
                    }
                    _ => None,
                }
            }
            Rule::Pattern(pattern) => {
                let text = value.as_str()?;
                match self.matches(pattern, text) {
                    Ok(true) => None,
                    Ok(false) => Some(format!("must match `{pattern}`")),
                    Err(err) => Some(format!("has an invalid pattern `{pattern}`: {err}")),
                }
            }
        }
    }

    fn matches(&self, pattern: &'static str, text: &str) -> Result<bool, String> {
        let mut patterns = self
            .patterns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let compiled = patterns
            .entry(pattern)
            .or_insert_with(|| Regex::new(pattern).map_err(|err| err.to_string()));
        match compiled {
            Ok(re) => Ok(re.is_match(text)),
            Err(err) => Err(err.clone()),
        }
    }
}

impl Validator for RuleValidator {
    fn validate(&self, value: Peek<'_, '_>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.walk(value, "", &mut errors);
        errors.into_result()
    }
}

fn invalid_bound(raw: &str) -> String {
    format!("has an invalid bound `{raw}`")
}

/// Looks through one `Option` level. `None` options yield `None`.
fn deref_option<'mem, 'facet>(value: Peek<'mem, 'facet>) -> Option<Peek<'mem, 'facet>> {
    match value.shape().def {
        Def::Option(_) => value.into_option().ok()?.value(),
        _ => Some(value),
    }
}

enum Measure {
    Number(f64),
    Length(usize),
}

macro_rules! numbers {
    ($value:ident: $($variant:ident => $ty:ty),* $(,)?) => {
        match $value.scalar_type()? {
            $(ScalarType::$variant => *$value.get::<$ty>().ok()? as f64,)*
            _ => return None,
        }
    };
}

fn measure(value: Peek<'_, '_>) -> Option<Measure> {
    if let Some(text) = value.as_str() {
        return Some(Measure::Length(text.chars().count()));
    }
    if let Def::List(_) = value.shape().def {
        return Some(Measure::Length(value.into_list_like().ok()?.len()));
    }
    let number = numbers!(value:
        U8 => u8, U16 => u16, U32 => u32, U64 => u64, U128 => u128, USize => usize,
        I8 => i8, I16 => i16, I32 => i32, I64 => i64, I128 => i128, ISize => isize,
        F32 => f32, F64 => f64,
    );
    Some(Measure::Number(number))
}
