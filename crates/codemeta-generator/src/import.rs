//! codemeta.json to form.
//!
//! Import is best effort: the document is validated for feedback, then
//! whatever can be read is written to the form even if validation failed.

use codemeta_jsonld::node::{has_type, one_or_many};
use codemeta_jsonld::{CodemetaVersion, JsonLdProcessor, recompact_with_contexts};
use serde_json::Value;
use tracing::{Level, event};

use crate::errors::{Result, ValidationError};
use crate::fields::{
    CROSS_FIELDS, DIRECT_FIELDS, FUNDER_FIELD, SPDX_PREFIX, SPLIT_FIELDS, entry_field, groups,
    role_group, single_fields,
};
use crate::model::{
    ActorEntry, Keyword, Publication, Requirement, ShortOrganization, SoftwareDocument,
    actors_from_nodes, value_text,
};
use crate::sink::FieldSink;
use crate::validate::{parse_document, validate_document};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Why the imported document is not valid, if it is not.
    pub validation: Option<ValidationError>,
}

impl ImportReport {
    pub fn is_valid(&self) -> bool {
        self.validation.is_none()
    }
}

/// Replaces the form content with what `text` describes.
///
/// Text that is not JSON fails before the form is touched, and so does a
/// document whose contexts cannot be resolved.
pub async fn import(
    processor: &dyn JsonLdProcessor,
    text: &str,
    sink: &mut dyn FieldSink,
) -> Result<ImportReport> {
    let doc = parse_document(text)?;

    let validation = validate_document(&doc).err();
    if let Some(err) = &validation {
        event!(Level::WARN, error = %err, "importing an invalid codemeta document");
    }

    let recompacted =
        recompact_with_contexts(processor, &doc, &CodemetaVersion::all_context_urls()).await?;
    let software = read_document(main_node(&recompacted));

    clear_form(sink);
    populate_form(sink, &software);

    event!(
        Level::INFO,
        valid = validation.is_none(),
        authors = software.authors.len(),
        contributors = software.contributors.len(),
        "codemeta document imported"
    );
    Ok(ImportReport { validation })
}

/// The software node: the document itself, or the first software node of
/// a `@graph` (the first node if none is typed as software).
fn main_node(doc: &Value) -> &Value {
    match doc.get("@graph").and_then(Value::as_array) {
        Some(nodes) => nodes
            .iter()
            .find(|node| {
                has_type(node, "SoftwareSourceCode") || has_type(node, "SoftwareApplication")
            })
            .or_else(|| nodes.first())
            .unwrap_or(doc),
        None => doc,
    }
}

/// Reads a node compacted against the merged contexts.
pub fn read_document(node: &Value) -> SoftwareDocument {
    let mut doc = SoftwareDocument::default();

    if let Some(licenses) = node.get("license") {
        doc.licenses = one_or_many(licenses)
            .iter()
            .filter_map(value_text)
            .filter_map(|license| license.strip_prefix(SPDX_PREFIX).map(str::to_string))
            .filter(|id| !id.is_empty())
            .collect();
    }

    for field in DIRECT_FIELDS {
        if let Some(value) = node.get(field).and_then(value_text) {
            doc.properties.insert(field.to_string(), value);
        }
    }

    // The last surface name present wins.
    for (field, names) in CROSS_FIELDS {
        let value = names
            .iter()
            .filter_map(|name| node.get(*name).and_then(value_text))
            .last();
        if let Some(value) = value {
            doc.properties.insert(field.to_string(), value);
        }
    }

    for split in SPLIT_FIELDS.iter().filter(|split| split.name != "keywords") {
        if let Some(value) = node.get(split.name) {
            let values: Vec<String> = one_or_many(value).iter().filter_map(value_text).collect();
            if !values.is_empty() {
                doc.lists.insert(split.name.to_string(), values);
            }
        }
    }

    if let Some(keywords) = node.get("keywords") {
        doc.keywords = one_or_many(keywords)
            .iter()
            .flat_map(keywords_from_value)
            .collect();
    }

    if let Some(authors) = node.get("author") {
        doc.authors = actors_from_nodes(authors, "author");
    }
    if let Some(contributors) = node.get("contributor") {
        doc.contributors = actors_from_nodes(contributors, "contributor");
    }

    if let Some(requirements) = node.get("softwareRequirements") {
        doc.requirements = one_or_many(requirements)
            .iter()
            .filter_map(Requirement::from_value)
            .collect();
    }

    if let Some(publications) = node.get("referencePublication") {
        doc.publications = one_or_many(publications)
            .iter()
            .filter(|publication| publication.is_object())
            .map(Publication::from_node)
            .collect();
    }

    doc.funder = node.get("funder").and_then(ShortOrganization::from_value);

    doc
}

/// Empties every group, single field and license selection.
pub fn clear_form(sink: &mut dyn FieldSink) {
    for group in groups::ALL {
        sink.set_group_count(group, 0);
    }
    for field in single_fields() {
        sink.set_field(field, "");
    }
    sink.set_license_selections(Vec::new());
}

/// Writes a document into an empty form. Only the first publication is kept.
pub fn populate_form(sink: &mut dyn FieldSink, doc: &SoftwareDocument) {
    sink.set_license_selections(doc.licenses.clone());

    for (field, value) in &doc.properties {
        sink.set_field(field, value);
    }

    for split in SPLIT_FIELDS {
        if let Some(values) = doc.lists.get(split.name) {
            sink.set_field(split.name, &values.join(split.delimiter));
        }
    }

    if let Some(funder) = &doc.funder {
        sink.set_field(FUNDER_FIELD, funder.as_text());
    }

    write_actors(sink, groups::AUTHOR, &doc.authors);
    write_actors(sink, groups::CONTRIBUTOR, &doc.contributors);

    for keyword in &doc.keywords {
        let i = sink.add_group_entry(groups::KEYWORD);
        set_opt(sink, &entry_field(groups::KEYWORD, i, "name"), keyword.name());
        set_opt(sink, &entry_field(groups::KEYWORD, i, "id"), keyword.id());
    }

    for requirement in &doc.requirements {
        let i = sink.add_group_entry(groups::REQUIREMENT);
        sink.set_field(
            &entry_field(groups::REQUIREMENT, i, "name"),
            requirement.name(),
        );
        set_opt(
            sink,
            &entry_field(groups::REQUIREMENT, i, "version"),
            requirement.version(),
        );
    }

    if let Some(publication) = doc.publications.first() {
        set_opt(sink, "publicationDOI", publication.identifier.as_deref());
        set_opt(sink, "referencePublicationUrl", publication.url.as_deref());
        set_opt(sink, "publicationTitle", publication.name.as_deref());
        set_opt(
            sink,
            "publicationDatePublished",
            publication.date_published.as_deref(),
        );
        set_opt(sink, "issn", publication.issn.as_deref());
        write_actors(sink, groups::PUBLICATION_AUTHOR, &publication.authors);
    }
}

/// One group entry per actor, blank node ids left out.
pub(crate) fn write_actors(sink: &mut dyn FieldSink, group: &str, entries: &[ActorEntry]) {
    for entry in entries {
        let actor = &entry.actor;
        let i = sink.add_group_entry(group);
        let field = |name: &str| entry_field(group, i, name);

        sink.set_field(&field("type"), actor.kind.as_str());
        set_opt(
            sink,
            &field("id"),
            actor.identity.as_ref().and_then(|identity| identity.uri()),
        );
        set_opt(sink, &field("givenName"), actor.given_name.as_deref());
        set_opt(sink, &field("familyName"), actor.family_name.as_deref());
        set_opt(sink, &field("name"), actor.name.as_deref());
        set_opt(sink, &field("email"), actor.email.as_deref());
        set_opt(
            sink,
            &field("affiliation"),
            actor.affiliation.as_ref().map(ShortOrganization::as_text),
        );

        let roles_group = role_group(group, i);
        for role in &entry.roles {
            let j = sink.add_group_entry(&roles_group);
            let role_field = |name: &str| entry_field(&roles_group, j, name);
            set_opt(sink, &role_field("roleName"), role.role_name.as_deref());
            set_opt(sink, &role_field("startDate"), role.start_date.as_deref());
            set_opt(sink, &role_field("endDate"), role.end_date.as_deref());
        }
    }
}

/// Text keywords may hold several comma separated keywords.
fn keywords_from_value(value: &Value) -> Vec<Keyword> {
    match value {
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| Keyword::Text(keyword.to_string()))
            .collect(),
        other => Keyword::from_value(other).into_iter().collect(),
    }
}

fn set_opt(sink: &mut dyn FieldSink, id: &str, value: Option<&str>) {
    if let Some(value) = value {
        sink.set_field(id, value);
    }
}
