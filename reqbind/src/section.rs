use core::fmt;

/// Name of the top-level field receiving the body's [`crate::PresenceTable`]
pub const SENT_FIELDS: &str = "body_sent_fields";

/// The five request sections a record can declare, each as a top-level
/// field of that name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    /// `path`: route parameters
    Path,
    /// `query`: URL query parameters
    Query,
    /// `header`: header fields
    Header,
    /// `form`: urlencoded or multipart form fields
    Form,
    /// `body`: the decoded payload
    Body,
}

impl Section {
    /// Every section
    pub const ALL: [Section; 5] = [
        Section::Path,
        Section::Query,
        Section::Header,
        Section::Form,
        Section::Body,
    ];

    /// Returns the section a top-level field name declares
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.field_name() == name)
    }

    /// The top-level field name declaring this section
    pub const fn field_name(self) -> &'static str {
        match self {
            Section::Path => "path",
            Section::Query => "query",
            Section::Header => "header",
            Section::Form => "form",
            Section::Body => "body",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}
