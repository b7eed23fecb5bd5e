use facet::Facet;
use serde_json::Value;

/// Records which keys were present in a decoded body, so that "absent" can
/// be told apart from "sent as the zero value".
///
/// Declare it as a top-level `body_sent_fields` field next to `body`:
///
/// ```
/// use reqbind::{Binder, Facet, PresenceTable, Request};
///
/// #[derive(Facet, Default)]
/// struct Patch {
///     body: PatchBody,
///     body_sent_fields: PresenceTable,
/// }
///
/// #[derive(Facet, Default)]
/// struct PatchBody {
///     nickname: String,
///     age: u32,
/// }
///
/// let mut patch = Patch::default();
/// let req = Request::patch("/me").with_json(r#"{"nickname":""}"#);
/// Binder::new().bind(&mut patch, &req).unwrap();
/// assert!(patch.body_sent_fields.exists("nickname"));
/// assert!(!patch.body_sent_fields.exists("age"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Facet)]
pub struct PresenceTable {
    #[facet(recursive_type)]
    entries: Vec<PresenceEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Facet)]
struct PresenceEntry {
    key: String,
    #[facet(recursive_type)]
    children: PresenceTable,
}

impl PresenceTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table of a decoded value. Objects recurse; any other value,
    /// arrays included, is a terminal node with no children.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                entries: map
                    .iter()
                    .map(|(key, value)| PresenceEntry {
                        key: key.clone(),
                        children: Self::from_value(value),
                    })
                    .collect(),
            },
            _ => Self::default(),
        }
    }

    /// Returns true if every segment of the dot-separated `path` was present,
    /// each one inside the previous.
    pub fn exists(&self, path: &str) -> bool {
        let mut node = self;
        for segment in path.split('.') {
            match node.get(segment) {
                Some(child) => node = child,
                None => return false,
            }
        }
        true
    }

    /// Returns the node under a single key
    pub fn get(&self, key: &str) -> Option<&PresenceTable> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.children)
    }

    /// Iterates over the keys of this node, in payload order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Number of keys at this node
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true for terminal nodes
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
