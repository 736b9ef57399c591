//! Form to codemeta.json.

use codemeta_jsonld::{CodemetaVersion, JsonLdProcessor, normalize, normalize_keyword_aliases};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{Level, event};

use crate::errors::{CodemetaError, Result};
use crate::fields::{
    DIRECT_FIELDS, FUNDER_FIELD, SPLIT_FIELDS, entry_field, groups, role_group,
};
use crate::model::{
    Actor, ActorEntry, ActorKind, Identity, Keyword, Publication, Requirement, RoleAssignment,
    ShortOrganization, SoftwareDocument,
};
use crate::sink::FieldSink;
use crate::validate::validate_document;

#[derive(Debug)]
pub struct GeneratedDocument {
    /// The document, pretty printed with four-space indentation.
    pub text: String,
    pub document: Value,
    /// Set when the generated document fails validation. The document is
    /// still returned, but this is a bug to report.
    pub internal_error: Option<CodemetaError>,
}

/// Reads the whole form into a [`SoftwareDocument`].
pub fn collect_document(sink: &dyn FieldSink) -> SoftwareDocument {
    let mut doc = SoftwareDocument::default();

    for field in DIRECT_FIELDS {
        if let Some(value) = sink.field_value(field) {
            doc.properties.insert(field.to_string(), value);
        }
    }

    doc.licenses = sink
        .license_selections()
        .into_iter()
        .map(|license| license.trim().to_string())
        .filter(|license| !license.is_empty())
        .collect();

    for split in SPLIT_FIELDS {
        let Some(value) = sink.field_value(split.name) else {
            continue;
        };
        let pieces: Vec<String> = value
            .split(split.delimiter)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();
        if split.name == "keywords" {
            doc.keywords.extend(pieces.into_iter().map(Keyword::Text));
        } else if !pieces.is_empty() {
            doc.lists.insert(split.name.to_string(), pieces);
        }
    }

    doc.authors = collect_actors(sink, groups::AUTHOR);
    doc.contributors = collect_actors(sink, groups::CONTRIBUTOR);

    doc.keywords.extend((1..=sink.group_count(groups::KEYWORD)).filter_map(|i| {
        Keyword::from_parts(
            sink.field_value(&entry_field(groups::KEYWORD, i, "name")),
            sink.field_value(&entry_field(groups::KEYWORD, i, "id")),
        )
    }));

    doc.requirements = (1..=sink.group_count(groups::REQUIREMENT))
        .filter_map(|i| {
            Requirement::from_parts(
                sink.field_value(&entry_field(groups::REQUIREMENT, i, "name")),
                sink.field_value(&entry_field(groups::REQUIREMENT, i, "version")),
            )
        })
        .collect();

    let publication = Publication {
        identifier: sink.field_value("publicationDOI"),
        url: sink.field_value("referencePublicationUrl"),
        name: sink.field_value("publicationTitle"),
        date_published: sink.field_value("publicationDatePublished"),
        issn: sink.field_value("issn"),
        authors: collect_actors(sink, groups::PUBLICATION_AUTHOR),
    };
    if !publication.is_empty() {
        doc.publications.push(publication);
    }

    doc.funder = sink
        .field_value(FUNDER_FIELD)
        .map(|funder| ShortOrganization::from_text(&funder));

    doc
}

/// Entries of an actor group. Actors without an id get a blank node id
/// made from the group and index.
fn collect_actors(sink: &dyn FieldSink, group: &str) -> Vec<ActorEntry> {
    (1..=sink.group_count(group))
        .map(|i| {
            let field = |name: &str| sink.field_value(&entry_field(group, i, name));
            let identity = field("id")
                .map(Identity::Uri)
                .unwrap_or_else(|| Identity::Local(format!("{group}_{i}")));
            let actor = Actor {
                kind: field("type")
                    .map(|kind| ActorKind::from_name(&kind))
                    .unwrap_or_default(),
                identity: Some(identity),
                given_name: field("givenName"),
                family_name: field("familyName"),
                name: field("name"),
                email: field("email"),
                affiliation: field("affiliation").map(|org| ShortOrganization::from_text(&org)),
            };

            let roles_group = role_group(group, i);
            let roles = (1..=sink.group_count(&roles_group))
                .map(|j| {
                    let role_field =
                        |name: &str| sink.field_value(&entry_field(&roles_group, j, name));
                    RoleAssignment {
                        role_name: role_field("roleName"),
                        start_date: role_field("startDate"),
                        end_date: role_field("endDate"),
                    }
                })
                .collect();

            ActorEntry { actor, roles }
        })
        .collect()
}

/// Builds the codemeta document for `version` from the form.
///
/// Nothing is produced when the form has invalid fields. The result is run
/// through the validator; a failure there does not stop generation but is
/// reported in [`GeneratedDocument::internal_error`].
pub async fn generate(
    processor: &dyn JsonLdProcessor,
    sink: &dyn FieldSink,
    version: CodemetaVersion,
) -> Result<GeneratedDocument> {
    let invalid = sink.invalid_fields();
    if !invalid.is_empty() {
        event!(Level::WARN, fields = ?invalid, "form has invalid fields, nothing generated");
        return Err(CodemetaError::InputInvalid(invalid.join(", ")));
    }

    let draft = collect_document(sink).to_draft();
    let compacted = normalize(processor, &draft, &[version.context_url().to_string()]).await?;
    let document = normalize_keyword_aliases(compacted);
    let text = to_pretty_json(&document)?;

    let internal_error = match validate_document(&document) {
        Ok(()) => None,
        Err(err) => {
            event!(
                Level::ERROR,
                error = %err,
                document = %text,
                "generated document failed validation"
            );
            Some(CodemetaError::InternalInconsistency(err.to_string()))
        }
    };

    event!(Level::INFO, %version, "codemeta document generated");
    Ok(GeneratedDocument {
        text,
        document,
        internal_error,
    })
}

/// Pretty prints `value` with four-space indentation.
pub fn to_pretty_json(value: &Value) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(|err| CodemetaError::InternalInconsistency(err.to_string()))?;
    String::from_utf8(out).map_err(|err| CodemetaError::InternalInconsistency(err.to_string()))
}
