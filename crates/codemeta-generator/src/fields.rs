//! Names of the form fields and repeated groups, and which CodeMeta
//! properties they map to.

/// Licenses are stored as identifiers and emitted under this prefix.
pub const SPDX_PREFIX: &str = "https://spdx.org/licenses/";

/// Single-valued fields copied verbatim to the property of the same name.
pub const DIRECT_FIELDS: [&str; 17] = [
    "codeRepository",
    "contIntegration",
    "dateCreated",
    "datePublished",
    "dateModified",
    "downloadUrl",
    "issueTracker",
    "name",
    "version",
    "identifier",
    "description",
    "applicationCategory",
    "releaseNotes",
    "funding",
    "developmentStatus",
    "isSourceCodeOf",
    "isPartOf",
];

/// A text field holding several values separated by `delimiter`.
#[derive(Clone, Copy, Debug)]
pub struct SplitField {
    pub name: &'static str,
    pub delimiter: &'static str,
}

pub const SPLIT_FIELDS: [SplitField; 5] = [
    SplitField { name: "keywords", delimiter: "," },
    SplitField { name: "programmingLanguage", delimiter: "," },
    SplitField { name: "runtimePlatform", delimiter: "," },
    SplitField { name: "operatingSystem", delimiter: "," },
    SplitField { name: "relatedLink", delimiter: "\n" },
];

/// One logical field written under several property names.
///
/// On import the last name present wins.
pub const CROSS_FIELDS: [(&str, &[&str]); 1] =
    [("contIntegration", &["contIntegration", "continuousIntegration"])];

pub const FUNDER_FIELD: &str = "funder";

/// Reference publication: (property, field).
pub const PUBLICATION_FIELDS: [(&str, &str); 5] = [
    ("identifier", "publicationDOI"),
    ("url", "referencePublicationUrl"),
    ("name", "publicationTitle"),
    ("datePublished", "publicationDatePublished"),
    ("issn", "issn"),
];

pub const PERSON_FIELDS: [&str; 3] = ["givenName", "familyName", "email"];
pub const ORGANIZATION_FIELDS: [&str; 2] = ["name", "email"];
pub const ROLE_FIELDS: [&str; 3] = ["roleName", "startDate", "endDate"];

pub mod groups {
    pub const AUTHOR: &str = "author";
    pub const CONTRIBUTOR: &str = "contributor";
    pub const PUBLICATION_AUTHOR: &str = "author_reference";
    pub const KEYWORD: &str = "keyword";
    pub const REQUIREMENT: &str = "requirement";

    /// Groups whose entries are actors, with the property they are listed under.
    pub const ACTOR_GROUPS: [(&str, &str); 2] = [(AUTHOR, "author"), (CONTRIBUTOR, "contributor")];

    pub const ALL: [&str; 5] = [AUTHOR, CONTRIBUTOR, PUBLICATION_AUTHOR, KEYWORD, REQUIREMENT];
}

/// Field id of `field` in entry `index` (1-based) of `group`.
pub fn entry_field(group: &str, index: usize, field: &str) -> String {
    format!("{group}_{index}_{field}")
}

/// Group holding the roles of entry `index` of an actor group.
pub fn role_group(actor_group: &str, index: usize) -> String {
    entry_field(actor_group, index, "role")
}

/// Every single-valued field the form has outside of groups.
pub fn single_fields() -> impl Iterator<Item = &'static str> {
    DIRECT_FIELDS
        .into_iter()
        .chain(SPLIT_FIELDS.iter().map(|f| f.name))
        .chain(PUBLICATION_FIELDS.iter().map(|(_, field)| *field))
        .chain(std::iter::once(FUNDER_FIELD))
}

/// What a field's content has to look like.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Url,
    /// One URL per line.
    UrlLines,
    Date,
    Email,
}

pub fn field_kind(field_id: &str) -> FieldKind {
    match field_id {
        "codeRepository" | "contIntegration" | "downloadUrl" | "issueTracker" | "isPartOf"
        | "referencePublicationUrl" => FieldKind::Url,
        "relatedLink" => FieldKind::UrlLines,
        "dateCreated" | "datePublished" | "dateModified" | "publicationDatePublished" => {
            FieldKind::Date
        }
        id if id.ends_with("_id") => FieldKind::Url,
        id if id.ends_with("_email") => FieldKind::Email,
        id if id.ends_with("_startDate") || id.ends_with("_endDate") => FieldKind::Date,
        _ => FieldKind::Text,
    }
}
