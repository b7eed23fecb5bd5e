//! Owned snapshots of reflected values.
//!
//! Binding reads the target once through [`Peek`] into a [`Node`] tree,
//! writes section values into that tree, and rebuilds the target from it
//! through [`Partial`]. Every write lands on an owned copy, so a section
//! that fails halfway leaves nothing behind.

use core::fmt;

use facet_core::{Def, Facet, Field, ScalarType, Shape, Type, UserType};
use facet_reflect::{Partial, Peek, ReflectError};
use tracing::trace;

/// Error returned when a value cannot be snapshotted or rebuilt
#[derive(Debug)]
pub enum NodeError {
    /// the shape is not a scalar, option, list or struct
    Unsupported {
        /// the offending shape
        shape: &'static Shape,
    },

    /// the tree was built for another type
    WrongShape {
        /// the type being rebuilt
        expected: &'static Shape,
        /// the type of the tree
        actual: &'static Shape,
    },

    /// facet-reflect rejected an operation
    Reflect(ReflectError),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Unsupported { shape } => write!(f, "unknown type `{shape}`"),
            NodeError::WrongShape { expected, actual } => {
                write!(f, "cannot build `{expected}` from a `{actual}` tree")
            }
            NodeError::Reflect(err) => write!(f, "{err}"),
        }
    }
}

impl core::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            NodeError::Reflect(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReflectError> for NodeError {
    fn from(err: ReflectError) -> Self {
        NodeError::Reflect(err)
    }
}

type Wip = Partial<'static, false>;

macro_rules! scalars {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// A scalar leaf, stored at its declared type
        #[derive(Clone, Debug, PartialEq)]
        pub enum Scalar {
            $(
                #[doc = concat!("`", stringify!($ty), "`")]
                $variant($ty),
            )*
        }

        impl Scalar {
            fn read(peek: Peek<'_, '_>) -> Result<Option<Self>, ReflectError> {
                let scalar = match peek.scalar_type() {
                    $(Some(ScalarType::$variant) => Scalar::$variant(peek.get::<$ty>()?.clone()),)*
                    _ => return Ok(None),
                };
                Ok(Some(scalar))
            }

            fn zero(shape: &'static Shape) -> Option<Self> {
                match ScalarType::try_from_shape(shape)? {
                    $(ScalarType::$variant => Some(Scalar::$variant(<$ty>::default())),)*
                    _ => None,
                }
            }

            fn write(&self, wip: Wip) -> Result<Wip, ReflectError> {
                match self {
                    $(Scalar::$variant(value) => wip.set(value.clone()),)*
                }
            }
        }
    };
}

scalars! {
    Bool(bool),
    Char(char),
    String(String),
    F32(f32),
    F64(f64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    USize(usize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    ISize(isize),
}

/// An owned value together with the shape it was read from
#[derive(Clone, Debug)]
pub struct Node {
    shape: &'static Shape,
    kind: NodeKind,
}

/// What a [`Node`] holds
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// a scalar
    Scalar(Scalar),
    /// an `Option`; `None` carries no inner node
    Option(Option<Box<Node>>),
    /// a `Vec`
    List(Vec<Node>),
    /// a struct, one member per field in declaration order
    Record(Vec<Member>),
}

/// One field of a record node
#[derive(Clone, Debug)]
pub struct Member {
    /// the field, as reflected
    pub field: &'static Field,
    /// its value
    pub node: Node,
}

impl Node {
    pub(crate) fn new(shape: &'static Shape, kind: NodeKind) -> Self {
        Self { shape, kind }
    }

    /// Reads the value behind `peek` into an owned tree.
    pub fn snapshot(peek: Peek<'_, '_>) -> Result<Self, NodeError> {
        let shape = peek.shape();
        if let Some(scalar) = Scalar::read(peek)? {
            return Ok(Self::new(shape, NodeKind::Scalar(scalar)));
        }

        let kind = match (&shape.def, &shape.ty) {
            (Def::Option(_), _) => {
                let inner = match peek.into_option()?.value() {
                    Some(inner) => Some(Box::new(Self::snapshot(inner)?)),
                    None => None,
                };
                NodeKind::Option(inner)
            }
            (Def::List(_), _) => {
                let items = peek
                    .into_list_like()?
                    .iter()
                    .map(Self::snapshot)
                    .collect::<Result<_, _>>()?;
                NodeKind::List(items)
            }
            (_, Type::User(UserType::Struct(struct_type))) => {
                let record = peek.into_struct()?;
                let mut members = Vec::with_capacity(struct_type.fields.len());
                for (index, field) in struct_type.fields.iter().enumerate() {
                    let value = record.field(index).map_err(|_| NodeError::Unsupported {
                        shape: field.shape(),
                    })?;
                    members.push(Member {
                        field,
                        node: Self::snapshot(value)?,
                    });
                }
                NodeKind::Record(members)
            }
            _ => return Err(NodeError::Unsupported { shape }),
        };
        Ok(Self::new(shape, kind))
    }

    /// The zero value of `shape`: `false`, `0`, empty strings and lists,
    /// `None`, and records of zero values. Returns `None` for shapes a
    /// node cannot hold.
    pub fn zero(shape: &'static Shape) -> Option<Self> {
        if let Some(scalar) = Scalar::zero(shape) {
            return Some(Self::new(shape, NodeKind::Scalar(scalar)));
        }
        let kind = match (&shape.def, &shape.ty) {
            (Def::Option(_), _) => NodeKind::Option(None),
            (Def::List(_), _) => NodeKind::List(Vec::new()),
            (_, Type::User(UserType::Struct(struct_type))) => NodeKind::Record(
                struct_type
                    .fields
                    .iter()
                    .map(|field| {
                        Some(Member {
                            field,
                            node: Self::zero(field.shape())?,
                        })
                    })
                    .collect::<Option<_>>()?,
            ),
            _ => return None,
        };
        Some(Self::new(shape, kind))
    }

    /// Builds a fresh `T` from this tree.
    pub fn build<T: Facet<'static>>(&self) -> Result<T, NodeError> {
        if self.shape != T::SHAPE {
            return Err(NodeError::WrongShape {
                expected: T::SHAPE,
                actual: self.shape,
            });
        }
        let wip = self.write(Partial::alloc_owned::<T>().map_err(ReflectError::from)?)?;
        let value = wip
            .build()?
            .materialize::<T>()
            .map_err(|err| NodeError::WrongShape {
                expected: err.expected,
                actual: err.actual,
            })?;
        trace!(shape = %self.shape, "rebuilt");
        Ok(value)
    }

    fn write(&self, mut wip: Wip) -> Result<Wip, ReflectError> {
        match &self.kind {
            NodeKind::Scalar(scalar) => scalar.write(wip),
            NodeKind::Option(None) => wip.set_default(),
            NodeKind::Option(Some(inner)) => {
                wip = wip.begin_some()?;
                wip = inner.write(wip)?;
                wip.end()
            }
            NodeKind::List(items) => {
                wip = wip.init_list()?;
                for item in items {
                    wip = wip.begin_list_item()?;
                    wip = item.write(wip)?;
                    wip = wip.end()?;
                }
                Ok(wip)
            }
            NodeKind::Record(members) => {
                for (index, member) in members.iter().enumerate() {
                    wip = wip.begin_nth_field(index)?;
                    wip = member.node.write(wip)?;
                    wip = wip.end()?;
                }
                Ok(wip)
            }
        }
    }

    /// The shape this node was read from
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// What the node holds
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// What the node holds, mutably
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// Returns true for the zero value of the node's type: `false`, `0`,
    /// empty strings and lists, `None`, and records whose members are all
    /// zero.
    pub fn is_zero(&self) -> bool {
        match &self.kind {
            NodeKind::Scalar(scalar) => {
                Scalar::zero(self.shape).is_some_and(|zero| zero == *scalar)
            }
            NodeKind::Option(inner) => inner.is_none(),
            NodeKind::List(items) => items.is_empty(),
            NodeKind::Record(members) => members.iter().all(|member| member.node.is_zero()),
        }
    }

    /// Shape of the elements, for list nodes
    pub(crate) fn item_shape(&self) -> Option<&'static Shape> {
        match &self.shape.def {
            Def::List(list) => Some(list.t),
            _ => None,
        }
    }
}

/// Returns true for struct shapes
pub(crate) fn is_record(shape: &'static Shape) -> bool {
    matches!(&shape.ty, Type::User(UserType::Struct(_)))
}

/// Shape behind an `Option`
pub(crate) fn option_inner(shape: &'static Shape) -> Option<&'static Shape> {
    match &shape.def {
        Def::Option(option) => Some(option.t),
        _ => None,
    }
}
