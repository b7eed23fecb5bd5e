use facet_core::Field;
use indexmap::IndexMap;
use tracing::trace;

use crate::node::{is_record, option_inner};
use crate::{ATTR_NS, BindError, BindErrorKind, Hooks, Member, Node, NodeKind, Section};

/// A bindable leaf of a section: the field it came from and its value.
pub struct Slot<'a> {
    field: &'static Field,
    node: &'a mut Node,
}

impl<'a> Slot<'a> {
    /// Creates a slot
    pub fn new(field: &'static Field, node: &'a mut Node) -> Self {
        Self { field, node }
    }

    /// The field this slot came from
    pub fn field(&self) -> &'static Field {
        self.field
    }

    /// Returns false for `#[facet(bind::readonly)]` fields
    pub fn is_settable(&self) -> bool {
        !self.field.has_attr(Some(ATTR_NS), "readonly")
    }

    /// Borrows the slot's value
    pub fn node_mut(&mut self) -> &mut Node {
        self.node
    }
}

/// Identifier → slot mapping of a section, in declaration order
pub type SlotMap<'a> = IndexMap<&'static str, Slot<'a>>;

/// Flattens a section record into one namespace.
///
/// Nested records (named or `#[facet(flatten)]`) are descended into, and a
/// `None` option of a record is allocated first. Leaves are keyed by their
/// identifier; skipped leaves are dropped. When two leaves share an
/// identifier, the one seen last wins. Types with a parse hook are leaves.
pub fn flatten<'a>(
    section: Section,
    node: &'a mut Node,
    hooks: &Hooks,
) -> Result<SlotMap<'a>, BindError> {
    let actual = node.shape();
    let not_a_record = || BindErrorKind::InvalidTypeAtLocation {
        location: section.field_name(),
        expected: "record",
        actual,
    };
    if !record_like(node, hooks) {
        return Err(not_a_record().into());
    }
    let members = descend(node).ok_or_else(not_a_record)?;

    let mut slots = SlotMap::new();
    flatten_into(section, members, hooks, &mut slots)?;
    Ok(slots)
}

fn flatten_into<'a>(
    section: Section,
    members: &'a mut [Member],
    hooks: &Hooks,
    slots: &mut SlotMap<'a>,
) -> Result<(), BindError> {
    for Member { field, node } in members.iter_mut() {
        let field: &'static Field = *field;
        if record_like(node, hooks) {
            trace!(%section, field = field.name, "descending into nested record");
            if let Some(nested) = descend(node) {
                flatten_into(section, nested, hooks, slots)?;
            }
            continue;
        }

        if field.is_flattened() {
            return Err(BindErrorKind::InvalidAnonymousField {
                location: section,
                field: field.name,
            }
            .into());
        }
        if field.should_skip_deserializing() {
            trace!(%section, field = field.name, "skipped");
            continue;
        }

        let identifier = field.effective_name();
        if slots.insert(identifier, Slot::new(field, node)).is_some() {
            trace!(%section, identifier, "identifier shadowed by a later field");
        }
    }
    Ok(())
}

/// Returns true for records and options of records, unless they parse
/// themselves.
pub(crate) fn record_like(node: &Node, hooks: &Hooks) -> bool {
    let shape = node.shape();
    if hooks.contains(shape) {
        return false;
    }
    match node.kind() {
        NodeKind::Record(_) => true,
        NodeKind::Option(_) => {
            option_inner(shape).is_some_and(|inner| is_record(inner) && !hooks.contains(inner))
        }
        _ => false,
    }
}

/// Returns the members of a record node, allocating a `None` option of a
/// record first.
pub(crate) fn descend(node: &mut Node) -> Option<&mut [Member]> {
    let shape = node.shape();
    match node.kind_mut() {
        NodeKind::Record(members) => Some(members.as_mut_slice()),
        NodeKind::Option(slot) => {
            if slot.is_none() {
                trace!(%shape, "allocating nested record");
                *slot = Some(Box::new(Node::zero(option_inner(shape)?)?));
            }
            descend(slot.as_deref_mut()?)
        }
        _ => None,
    }
}
