/*!
 * Typed view of a CodeMeta software document.
 *
 * Generation builds a [`SoftwareDocument`] from the form and turns it into a
 * JSON-LD draft written against both vocabulary contexts. Import goes the
 * other way, reading a document compacted against the merged contexts.
 *
 * Authors and contributors are [`ActorEntry`] values: the actor plus the
 * roles it holds. In JSON-LD the roles are sibling `Role` nodes in the same
 * array, each pointing back to its actor by id.
 */

use std::collections::BTreeMap;
use std::fmt;

use codemeta_jsonld::CodemetaVersion;
use codemeta_jsonld::node::{
    document_id, get_property, has_type, is_blank_node_id, is_url, one_or_many,
};
use serde_json::{Map, Value, json};

use crate::fields::{CROSS_FIELDS, SPDX_PREFIX};

/// Who an actor is: a real URI or a label only meaningful inside one document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Uri(String),
    /// Serialised as the blank node id `_:{label}`.
    Local(String),
}

impl Identity {
    pub fn from_id(id: &str) -> Self {
        match id.strip_prefix("_:") {
            Some(label) => Identity::Local(label.to_string()),
            None => Identity::Uri(id.to_string()),
        }
    }

    /// The persistent identifier, if this is one.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Identity::Uri(uri) => Some(uri),
            Identity::Local(_) => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Uri(uri) => write!(f, "{uri}"),
            Identity::Local(label) => write!(f, "_:{label}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActorKind {
    #[default]
    Person,
    Organization,
}

impl ActorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorKind::Person => "Person",
            ActorKind::Organization => "Organization",
        }
    }

    /// Anything but `Organization` is a person.
    pub fn from_name(name: &str) -> Self {
        if name.trim() == "Organization" {
            ActorKind::Organization
        } else {
            ActorKind::Person
        }
    }

    fn of_node(node: &Value) -> Option<Self> {
        if has_type(node, "Person") {
            Some(ActorKind::Person)
        } else if has_type(node, "Organization") {
            Some(ActorKind::Organization)
        } else {
            None
        }
    }
}

/// An organization given only by URI or by name, as for affiliations and funders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShortOrganization {
    Uri(String),
    Name(String),
}

impl ShortOrganization {
    /// URLs are identifiers, everything else is a name.
    pub fn from_text(text: &str) -> Self {
        if is_url(text) {
            ShortOrganization::Uri(text.to_string())
        } else {
            ShortOrganization::Name(text.to_string())
        }
    }

    /// Reads a compacted organization, preferring its id over its name.
    pub fn from_value(value: &Value) -> Option<Self> {
        let value = one_or_many(value).first()?;
        if let Some(text) = value.as_str() {
            return (!text.is_empty()).then(|| Self::from_text(text));
        }
        if let Some(id) = document_id(value).filter(|id| !is_blank_node_id(id)) {
            return Some(ShortOrganization::Uri(id.to_string()));
        }
        get_property(value, "name")
            .and_then(value_text)
            .map(ShortOrganization::Name)
    }

    pub fn as_text(&self) -> &str {
        match self {
            ShortOrganization::Uri(text) | ShortOrganization::Name(text) => text,
        }
    }

    pub fn to_node(&self) -> Value {
        match self {
            ShortOrganization::Uri(uri) => json!({"@type": "Organization", "@id": uri}),
            ShortOrganization::Name(name) => json!({"@type": "Organization", "name": name}),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RoleAssignment {
    pub fn is_empty(&self) -> bool {
        self.role_name.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    /// A `Role` node pointing at `actor` through `schema:{property}`.
    ///
    /// The compact IRI keeps the reference out of the ordered `author` list.
    fn to_node(&self, property: &str, actor: &Identity) -> Value {
        let mut node = Map::new();
        node.insert("@type".into(), json!("Role"));
        insert_opt(&mut node, "roleName", &self.role_name);
        insert_opt(&mut node, "startDate", &self.start_date);
        insert_opt(&mut node, "endDate", &self.end_date);
        node.insert(
            format!("schema:{property}"),
            json!({"@id": actor.to_string()}),
        );
        Value::Object(node)
    }

    fn from_node(node: &Value) -> Self {
        RoleAssignment {
            role_name: text_property(node, "roleName"),
            start_date: text_property(node, "startDate"),
            end_date: text_property(node, "endDate"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Actor {
    pub kind: ActorKind,
    pub identity: Option<Identity>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub affiliation: Option<ShortOrganization>,
}

impl Actor {
    /// Two actors are the same when their ids match or, if neither has one,
    /// when given name, family name and email all match.
    pub fn same_as(&self, other: &Actor) -> bool {
        if self.identity.is_some() || other.identity.is_some() {
            return self.identity == other.identity;
        }
        self.given_name == other.given_name
            && self.family_name == other.family_name
            && self.email == other.email
    }

    pub fn to_node(&self) -> Value {
        let mut node = Map::new();
        node.insert("@type".into(), json!(self.kind.as_str()));
        if let Some(identity) = &self.identity {
            node.insert("@id".into(), json!(identity.to_string()));
        }
        if self.kind == ActorKind::Person {
            insert_opt(&mut node, "givenName", &self.given_name);
            insert_opt(&mut node, "familyName", &self.family_name);
        }
        insert_opt(&mut node, "name", &self.name);
        insert_opt(&mut node, "email", &self.email);
        if self.kind == ActorKind::Person {
            if let Some(affiliation) = &self.affiliation {
                node.insert("affiliation".into(), affiliation.to_node());
            }
        }
        Value::Object(node)
    }

    /// Reads an actor node, or a bare id string as found in role references.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(id) = value.as_str() {
            return (!id.is_empty()).then(|| Actor {
                identity: Some(Identity::from_id(id)),
                ..Actor::default()
            });
        }
        if !value.is_object() {
            return None;
        }
        Some(Actor {
            kind: ActorKind::of_node(value).unwrap_or_default(),
            identity: document_id(value).map(Identity::from_id),
            given_name: text_property(value, "givenName"),
            family_name: text_property(value, "familyName"),
            name: text_property(value, "name"),
            email: text_property(value, "email"),
            affiliation: get_property(value, "affiliation").and_then(ShortOrganization::from_value),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorEntry {
    pub actor: Actor,
    pub roles: Vec<RoleAssignment>,
}

/// Actor nodes, each followed by its role nodes.
///
/// Actors without an identity cannot be referenced, so their roles are dropped.
pub fn actors_to_nodes(entries: &[ActorEntry], property: &str) -> Vec<Value> {
    let mut nodes = Vec::new();
    for entry in entries {
        nodes.push(entry.actor.to_node());
        if let Some(identity) = &entry.actor.identity {
            nodes.extend(
                entry
                    .roles
                    .iter()
                    .filter(|role| !role.is_empty())
                    .map(|role| role.to_node(property, identity)),
            );
        }
    }
    nodes
}

/// Regroups actors and the roles referencing them.
///
/// Plain actor nodes come first, then actors only known through a role.
/// Duplicates are merged with [`Actor::same_as`].
pub fn actors_from_nodes(value: &Value, property: &str) -> Vec<ActorEntry> {
    let nodes = one_or_many(value);
    let curie = format!("schema:{property}");

    let roles: Vec<(Actor, RoleAssignment)> = nodes
        .iter()
        .filter(|node| has_type(node, "Role"))
        .filter_map(|node| {
            let reference = node
                .get(curie.as_str())
                .or_else(|| node.get(property))
                .and_then(|reference| one_or_many(reference).first())?;
            Some((Actor::from_value(reference)?, RoleAssignment::from_node(node)))
        })
        .collect();

    let mut actors: Vec<Actor> = Vec::new();
    let candidates = nodes
        .iter()
        .filter(|node| ActorKind::of_node(node).is_some())
        .filter_map(Actor::from_value)
        .chain(roles.iter().map(|(actor, _)| actor.clone()));
    for candidate in candidates {
        if !actors.iter().any(|known| known.same_as(&candidate)) {
            actors.push(candidate);
        }
    }

    actors
        .into_iter()
        .map(|actor| {
            let roles = roles
                .iter()
                .filter(|(referenced, _)| referenced.same_as(&actor))
                .map(|(_, role)| role.clone())
                .collect();
            ActorEntry { actor, roles }
        })
        .collect()
}

/// A keyword, shaped by which of name and id it has.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Text(String),
    Url(String),
    DefinedTerm { name: String, id: String },
}

impl Keyword {
    pub fn from_parts(name: Option<String>, id: Option<String>) -> Option<Self> {
        match (name, id) {
            (Some(name), Some(id)) => Some(Keyword::DefinedTerm { name, id }),
            (None, Some(id)) => Some(Keyword::Url(id)),
            (Some(name), None) => Some(Keyword::Text(name)),
            (None, None) => None,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => Self::from_parts(
                text_property(value, "name"),
                document_id(value).map(str::to_string),
            ),
            other => value_text(other).map(Keyword::Text),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Keyword::Text(name) | Keyword::DefinedTerm { name, .. } => Some(name),
            Keyword::Url(_) => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Keyword::Url(id) | Keyword::DefinedTerm { id, .. } => Some(id),
            Keyword::Text(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Keyword::Text(name) => json!(name),
            Keyword::Url(id) => json!({"@type": "URL", "@id": id}),
            Keyword::DefinedTerm { name, id } => {
                json!({"@type": "DefinedTerm", "name": name, "@id": id})
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    Name(String),
    Versioned { name: String, version: String },
}

impl Requirement {
    /// A version without a name describes nothing.
    pub fn from_parts(name: Option<String>, version: Option<String>) -> Option<Self> {
        match (name, version) {
            (Some(name), Some(version)) => Some(Requirement::Versioned { name, version }),
            (Some(name), None) => Some(Requirement::Name(name)),
            (None, _) => None,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) if document_id(value).is_some() && text_property(value, "name").is_none() => {
                document_id(value).map(|id| Requirement::Name(id.to_string()))
            }
            Value::Object(_) => Self::from_parts(
                text_property(value, "name"),
                text_property(value, "softwareVersion").or_else(|| text_property(value, "version")),
            ),
            other => value_text(other).map(Requirement::Name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Requirement::Name(name) | Requirement::Versioned { name, .. } => name,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Requirement::Versioned { version, .. } => Some(version),
            Requirement::Name(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Requirement::Name(name) => json!(name),
            Requirement::Versioned { name, version } => json!({
                "@type": "SoftwareApplication",
                "name": name,
                "softwareVersion": version,
            }),
        }
    }
}

/// A `ScholarlyArticle` describing the software.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Publication {
    pub identifier: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub date_published: Option<String>,
    pub issn: Option<String>,
    pub authors: Vec<ActorEntry>,
}

impl Publication {
    pub fn is_empty(&self) -> bool {
        self.identifier.is_none()
            && self.url.is_none()
            && self.name.is_none()
            && self.date_published.is_none()
            && self.issn.is_none()
            && self.authors.is_empty()
    }

    pub fn to_node(&self) -> Value {
        let mut node = Map::new();
        node.insert("@type".into(), json!("ScholarlyArticle"));
        insert_opt(&mut node, "identifier", &self.identifier);
        insert_opt(&mut node, "url", &self.url);
        insert_opt(&mut node, "name", &self.name);
        insert_opt(&mut node, "datePublished", &self.date_published);
        // `issn` has no term in either context.
        insert_opt(&mut node, "schema:issn", &self.issn);
        if !self.authors.is_empty() {
            node.insert(
                "author".into(),
                Value::Array(actors_to_nodes(&self.authors, "author")),
            );
        }
        Value::Object(node)
    }

    pub fn from_node(node: &Value) -> Self {
        Publication {
            identifier: text_property(node, "identifier"),
            url: text_property(node, "url"),
            name: text_property(node, "name"),
            date_published: text_property(node, "datePublished"),
            issn: text_property(node, "issn"),
            authors: get_property(node, "author")
                .map(|authors| actors_from_nodes(authors, "author"))
                .unwrap_or_default(),
        }
    }
}

/// Everything the form can express about one piece of software.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SoftwareDocument {
    /// Single-valued properties by name.
    pub properties: BTreeMap<String, String>,
    /// SPDX identifiers, without the registry prefix.
    pub licenses: Vec<String>,
    /// Multi-valued text properties (other than keywords) by name.
    pub lists: BTreeMap<String, Vec<String>>,
    pub keywords: Vec<Keyword>,
    pub authors: Vec<ActorEntry>,
    pub contributors: Vec<ActorEntry>,
    pub requirements: Vec<Requirement>,
    pub publications: Vec<Publication>,
    pub funder: Option<ShortOrganization>,
}

impl SoftwareDocument {
    /// The JSON-LD draft, written against both vocabulary contexts at once.
    ///
    /// Every surface name of a cross-version field gets the value.
    pub fn to_draft(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(
            "@context".into(),
            json!(CodemetaVersion::all_context_urls()),
        );
        doc.insert("@type".into(), json!("SoftwareSourceCode"));

        if !self.licenses.is_empty() {
            let licenses: Vec<String> = self
                .licenses
                .iter()
                .map(|id| format!("{SPDX_PREFIX}{id}"))
                .collect();
            doc.insert("license".into(), json!(licenses));
        }
        for (property, value) in &self.properties {
            doc.insert(property.clone(), json!(value));
        }
        if let Some(funder) = &self.funder {
            doc.insert("funder".into(), funder.to_node());
        }
        let publications: Vec<Value> = self
            .publications
            .iter()
            .filter(|publication| !publication.is_empty())
            .map(Publication::to_node)
            .collect();
        if !publications.is_empty() {
            doc.insert("referencePublication".into(), Value::Array(publications));
        }
        for (property, values) in &self.lists {
            if !values.is_empty() {
                doc.insert(property.clone(), json!(values));
            }
        }
        if !self.authors.is_empty() {
            doc.insert(
                "author".into(),
                Value::Array(actors_to_nodes(&self.authors, "author")),
            );
        }
        if !self.contributors.is_empty() {
            doc.insert(
                "contributor".into(),
                Value::Array(actors_to_nodes(&self.contributors, "contributor")),
            );
        }
        if !self.keywords.is_empty() {
            doc.insert(
                "keywords".into(),
                Value::Array(self.keywords.iter().map(Keyword::to_value).collect()),
            );
        }
        if !self.requirements.is_empty() {
            doc.insert(
                "softwareRequirements".into(),
                Value::Array(self.requirements.iter().map(Requirement::to_value).collect()),
            );
        }
        for (field, names) in CROSS_FIELDS {
            if let Some(value) = self.properties.get(field) {
                for name in names {
                    doc.insert((*name).to_string(), json!(value));
                }
            }
        }
        Value::Object(doc)
    }
}

/// Text of a scalar, value object or node reference.
///
/// Nodes without an id fall back to their name. Arrays join their items.
pub fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => {
            if let Some(inner) = map.get("@value") {
                return value_text(inner);
            }
            match document_id(value) {
                Some(id) => id.to_string(),
                None => return get_property(value, "name").and_then(value_text),
            }
        }
        Value::Null => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn text_property(node: &Value, name: &str) -> Option<String> {
    get_property(node, name).and_then(value_text)
}

fn insert_opt(node: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        node.insert(key.to_string(), json!(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, given: &str) -> Actor {
        Actor {
            identity: Some(Identity::from_id(id)),
            given_name: Some(given.to_string()),
            ..Actor::default()
        }
    }

    #[test]
    fn identity_display() {
        assert_eq!(Identity::from_id("_:author_1"), Identity::Local("author_1".into()));
        assert_eq!(Identity::Local("author_1".into()).to_string(), "_:author_1");
        assert_eq!(
            Identity::from_id("https://orcid.org/0000-0002").uri(),
            Some("https://orcid.org/0000-0002")
        );
    }

    #[test]
    fn keyword_shape_follows_name_and_id() {
        assert_eq!(
            Keyword::from_parts(Some("foo".into()), None).unwrap().to_value(),
            json!("foo")
        );
        assert_eq!(
            Keyword::from_parts(None, Some("https://example.org/foo".into()))
                .unwrap()
                .to_value(),
            json!({"@type": "URL", "@id": "https://example.org/foo"})
        );
        assert_eq!(
            Keyword::from_parts(Some("foo".into()), Some("https://example.org/foo".into()))
                .unwrap()
                .to_value(),
            json!({"@type": "DefinedTerm", "name": "foo", "@id": "https://example.org/foo"})
        );
        assert_eq!(Keyword::from_parts(None, None), None);
    }

    #[test]
    fn keyword_read_from_compacted_node() {
        assert_eq!(
            Keyword::from_value(&json!({"type": "DefinedTerm", "name": "foo", "id": "https://example.org/foo"})),
            Some(Keyword::DefinedTerm {
                name: "foo".into(),
                id: "https://example.org/foo".into()
            })
        );
        assert_eq!(
            Keyword::from_value(&json!({"type": "URL", "id": "https://example.org/foo"})),
            Some(Keyword::Url("https://example.org/foo".into()))
        );
    }

    #[test]
    fn requirement_without_name_is_dropped() {
        assert_eq!(Requirement::from_parts(None, Some("1.0".into())), None);
        assert_eq!(
            Requirement::from_parts(Some("numpy".into()), Some("1.26".into()))
                .unwrap()
                .to_value(),
            json!({"@type": "SoftwareApplication", "name": "numpy", "softwareVersion": "1.26"})
        );
        assert_eq!(
            Requirement::from_value(&json!("pandas")),
            Some(Requirement::Name("pandas".into()))
        );
    }

    #[test]
    fn roles_follow_their_actor() {
        let entries = vec![ActorEntry {
            actor: person("_:author_1", "Jane"),
            roles: vec![
                RoleAssignment {
                    role_name: Some("Developer".into()),
                    ..RoleAssignment::default()
                },
                RoleAssignment::default(),
            ],
        }];
        assert_eq!(
            actors_to_nodes(&entries, "author"),
            vec![
                json!({"@type": "Person", "@id": "_:author_1", "givenName": "Jane"}),
                json!({
                    "@type": "Role",
                    "roleName": "Developer",
                    "schema:author": {"@id": "_:author_1"}
                }),
            ]
        );
    }

    #[test]
    fn actors_regrouped_with_roles() {
        let nodes = json!([
            {"type": "Person", "id": "_:author_1", "givenName": "Jane"},
            {"type": "Role", "roleName": "Developer", "schema:author": {"id": "_:author_1"}},
            {"type": "Role", "roleName": "Maintainer", "schema:author": {"id": "_:author_1"}},
            {"type": "Role", "roleName": "Tester", "schema:author": "https://orcid.org/0000-0001"}
        ]);
        let entries = actors_from_nodes(&nodes, "author");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].actor.given_name.as_deref(), Some("Jane"));
        let names: Vec<_> = entries[0]
            .roles
            .iter()
            .filter_map(|role| role.role_name.as_deref())
            .collect();
        assert_eq!(names, ["Developer", "Maintainer"]);
        assert_eq!(
            entries[1].actor.identity,
            Some(Identity::Uri("https://orcid.org/0000-0001".into()))
        );
        assert_eq!(entries[1].roles.len(), 1);
    }

    #[test]
    fn actors_without_ids_compare_by_name_and_email() {
        let a = Actor {
            given_name: Some("Jane".into()),
            email: Some("jane@example.org".into()),
            ..Actor::default()
        };
        let mut b = a.clone();
        assert!(a.same_as(&b));
        b.email = None;
        assert!(!a.same_as(&b));
        assert!(!a.same_as(&person("_:author_1", "Jane")));
    }

    #[test]
    fn contributor_role_reference_without_prefix() {
        let nodes = json!([
            {"type": "Person", "id": "https://orcid.org/0000-0003", "familyName": "Doe"},
            {"type": "Role", "roleName": "Reviewer", "contributor": {"id": "https://orcid.org/0000-0003"}}
        ]);
        let entries = actors_from_nodes(&nodes, "contributor");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].roles[0].role_name.as_deref(), Some("Reviewer"));
    }

    #[test]
    fn short_organization_prefers_id() {
        assert_eq!(
            ShortOrganization::from_value(&json!({"type": "Organization", "name": "ACME", "id": "https://acme.example.org"})),
            Some(ShortOrganization::Uri("https://acme.example.org".into()))
        );
        assert_eq!(
            ShortOrganization::from_value(&json!({"type": "Organization", "name": "ACME"})),
            Some(ShortOrganization::Name("ACME".into()))
        );
        assert_eq!(
            ShortOrganization::from_text("https://acme.example.org").to_node(),
            json!({"@type": "Organization", "@id": "https://acme.example.org"})
        );
    }

    #[test]
    fn draft_copies_cross_fields() {
        let mut doc = SoftwareDocument::default();
        doc.properties
            .insert("contIntegration".into(), "https://ci.example.org".into());
        let draft = doc.to_draft();
        assert_eq!(draft["contIntegration"], "https://ci.example.org");
        assert_eq!(draft["continuousIntegration"], "https://ci.example.org");
        assert_eq!(draft["@type"], "SoftwareSourceCode");
    }

    #[test]
    fn value_text_shapes() {
        assert_eq!(value_text(&json!(" x ")), Some("x".into()));
        assert_eq!(value_text(&json!(3)), Some("3".into()));
        assert_eq!(value_text(&json!({"@value": "2024-01-01"})), Some("2024-01-01".into()));
        assert_eq!(value_text(&json!({"id": "https://a.example.org"})), Some("https://a.example.org".into()));
        assert_eq!(value_text(&json!("")), None);
        assert_eq!(value_text(&Value::Null), None);
    }
}
