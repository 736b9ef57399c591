//! Checks for nodes derived from `schema:Thing`, dispatched by declared type.

use codemeta_jsonld::node::{
    document_id, document_type, is_compact_type_equal, is_url_or_blank_node_id,
};
use serde_json::Value;

use super::{is_ignored_field, primitives};
use crate::errors::ValidationError;

type Check = Result<(), ValidationError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThingType {
    SoftwareSourceCode,
    SoftwareApplication,
    CreativeWork,
    Role,
    Person,
    Organization,
    Review,
}

impl ThingType {
    pub fn name(self) -> &'static str {
        match self {
            ThingType::SoftwareSourceCode => "SoftwareSourceCode",
            ThingType::SoftwareApplication => "SoftwareApplication",
            ThingType::CreativeWork => "CreativeWork",
            ThingType::Role => "Role",
            ThingType::Person => "Person",
            ThingType::Organization => "Organization",
            ThingType::Review => "Review",
        }
    }
}

const CREATIVE_WORK_TYPES: &[ThingType] = &[
    ThingType::CreativeWork,
    ThingType::SoftwareSourceCode,
    ThingType::SoftwareApplication,
];
const ACTOR_TYPES: &[ThingType] = &[ThingType::Role, ThingType::Person, ThingType::Organization];
const PERSON_TYPES: &[ThingType] = &[ThingType::Person];
const ORGANIZATION_TYPES: &[ThingType] = &[ThingType::Organization];
const REVIEW_TYPES: &[ThingType] = &[ThingType::Review];

/// How the value of one field is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Checker {
    Skip,
    Url,
    Urls,
    UrlOrBlankNode,
    Text,
    Texts,
    TextsOrUrls,
    Numbers,
    NumberOrText,
    Boolean,
    Date,
    CreativeWorks,
    Actor,
    Actors,
    Persons,
    Organizations,
    Keywords,
    Review,
}

impl Checker {
    pub fn check(self, field: &str, value: &Value) -> Check {
        match self {
            Checker::Skip => Ok(()),
            Checker::Url => primitives::url(field, value),
            Checker::Urls => primitives::urls(field, value),
            Checker::UrlOrBlankNode => primitives::url_or_blank_node(field, value),
            Checker::Text => primitives::text(field, value),
            Checker::Texts => primitives::texts(field, value),
            Checker::TextsOrUrls => primitives::texts_or_urls(field, value),
            Checker::Numbers => primitives::numbers(field, value),
            Checker::NumberOrText => primitives::number_or_text(field, value),
            Checker::Boolean => primitives::boolean(field, value),
            Checker::Date => primitives::date(field, value),
            Checker::CreativeWorks => primitives::list_or_single(value, |item| {
                thing_or_id(field, CREATIVE_WORK_TYPES, item)
            }),
            Checker::Actor => thing_or_id(field, ACTOR_TYPES, value),
            Checker::Actors => {
                primitives::list_or_single(value, |item| thing_or_id(field, ACTOR_TYPES, item))
            }
            Checker::Persons => {
                primitives::list_or_single(value, |item| thing_or_id(field, PERSON_TYPES, item))
            }
            Checker::Organizations => primitives::list_or_single(value, |item| {
                thing_or_id(field, ORGANIZATION_TYPES, item)
            }),
            Checker::Keywords => primitives::list_or_single(value, |item| keyword(field, item)),
            Checker::Review => thing_or_id(field, REVIEW_TYPES, value),
        }
    }
}

/// The checker for `field` on a node of type `thing`, `None` for unknown fields.
pub fn field_checker(thing: ThingType, field: &str) -> Option<Checker> {
    match thing {
        ThingType::SoftwareSourceCode | ThingType::SoftwareApplication => software_field(field),
        ThingType::CreativeWork => creative_work_field(field),
        ThingType::Role => role_field(field),
        ThingType::Person => person_field(field),
        ThingType::Organization => organization_field(field),
        ThingType::Review => review_field(field),
    }
}

fn software_field(field: &str) -> Option<Checker> {
    let checker = match field {
        "codeRepository" | "downloadUrl" | "installUrl" | "relatedLink" | "contIntegration"
        | "continuousIntegration" | "buildInstructions" | "issueTracker" | "readme" => Checker::Urls,
        "programmingLanguage" | "targetProduct" | "softwareRequirements" | "supportingData"
        | "softwareSuggestions" | "referencePublication" => Checker::Skip,
        "runtimePlatform" | "operatingSystem" | "permissions" | "processorRequirements" => {
            Checker::Texts
        }
        "applicationCategory" | "applicationSubCategory" | "memoryRequirements"
        | "releaseNotes" | "storageRequirements" | "isSourceCodeOf" => Checker::TextsOrUrls,
        "fileSize" | "softwareVersion" | "developmentStatus" | "funding" => Checker::Text,
        "softwareHelp" => Checker::CreativeWorks,
        "maintainer" => Checker::Actors,
        "embargoDate" | "embargoEndDate" => Checker::Date,
        "keywords" => Checker::Keywords,
        "review" => Checker::Review,
        other => return creative_work_field(other),
    };
    Some(checker)
}

fn creative_work_field(field: &str) -> Option<Checker> {
    let checker = match field {
        "@id" | "id" => Checker::Url,
        "author" | "contributor" | "copyrightHolder" | "creator" | "funder" | "producer"
        | "provider" | "publisher" | "sponsor" => Checker::Actors,
        "citation" | "license" | "isPartOf" | "hasPart" => Checker::CreativeWorks,
        "copyrightYear" => Checker::Numbers,
        "dateCreated" | "dateModified" | "datePublished" => Checker::Date,
        "editor" => Checker::Persons,
        "encoding" | "position" | "identifier" => Checker::Skip,
        "keywords" => Checker::Texts,
        "version" => Checker::NumberOrText,
        "isAccessibleForFree" => Checker::Boolean,
        "description" | "name" => Checker::Text,
        "sameAs" | "url" => Checker::Urls,
        _ => return None,
    };
    Some(checker)
}

fn role_field(field: &str) -> Option<Checker> {
    match field {
        "roleName" => Some(Checker::Text),
        "startDate" | "endDate" => Some(Checker::Date),
        "schema:author" | "contributor" => Some(Checker::Actor),
        _ => None,
    }
}

fn person_field(field: &str) -> Option<Checker> {
    match field {
        "@id" | "id" => Some(Checker::UrlOrBlankNode),
        "givenName" | "familyName" | "email" | "name" => Some(Checker::Text),
        "affiliation" => Some(Checker::Organizations),
        "identifier" | "url" => Some(Checker::Urls),
        _ => None,
    }
}

fn organization_field(field: &str) -> Option<Checker> {
    match field {
        "@id" | "id" => Some(Checker::UrlOrBlankNode),
        "email" | "name" | "address" => Some(Checker::Text),
        "identifier" | "url" => Some(Checker::Urls),
        "sponsor" | "funder" => Some(Checker::Actors),
        "isPartOf" => Some(Checker::Organizations),
        _ => None,
    }
}

fn review_field(field: &str) -> Option<Checker> {
    match field {
        "reviewAspect" | "reviewBody" => Some(Checker::Text),
        _ => None,
    }
}

fn accepted_names(accepted: &[ThingType]) -> String {
    accepted
        .iter()
        .map(|thing| thing.name())
        .collect::<Vec<_>>()
        .join("/")
}

/// A URI (or blank node id) standing for a node, or the node itself.
pub fn thing_or_id(parent: &str, accepted: &[ThingType], value: &Value) -> Check {
    match value {
        Value::String(s) if is_url_or_blank_node_id(s) => Ok(()),
        Value::String(_) => Err(ValidationError::Field(format!(
            "\"{parent}\" must be an URL or a {} object, not: {value}",
            accepted_names(accepted)
        ))),
        Value::Object(_) => thing(parent, accepted, value),
        other => Err(ValidationError::Field(format!(
            "\"{parent}\" must be a {} object or URI, not {other}",
            accepted_names(accepted)
        ))),
    }
}

/// A node whose type must be one of `accepted`.
///
/// A node with an id but no type is an opaque reference and passes.
pub fn thing(parent: &str, accepted: &[ThingType], node: &Value) -> Check {
    let id = document_id(node);
    if let Some(id) = id {
        if !is_url_or_blank_node_id(id) {
            return Err(ValidationError::Field(format!(
                "\"{parent}\" has an invalid URI as id: {}\"",
                Value::from(id)
            )));
        }
    }

    let Some(node_type) = document_type(node) else {
        if id.is_none() {
            return Err(ValidationError::Type(format!(
                "\"{parent}\" must be a (list of) {} object(s) or an URI, but is missing a type/@type.",
                accepted_names(accepted)
            )));
        }
        return Ok(());
    };

    let Some(thing_type) = accepted
        .iter()
        .copied()
        .find(|thing| is_compact_type_equal(node_type, thing.name()))
    else {
        return Err(ValidationError::Type(format!(
            "\"{parent}\" type must be a (list of) {} object(s), not {node_type}",
            accepted_names(accepted)
        )));
    };

    node.as_object()
        .into_iter()
        .flatten()
        .filter(|(field, _)| !matches!(field.as_str(), "type" | "@type"))
        .filter(|(field, _)| !is_ignored_field(field))
        .try_for_each(|(field, value)| match field_checker(thing_type, field) {
            Some(checker) => checker.check(field, value),
            None => Err(ValidationError::Field(format!(
                "Unknown field \"{field}\" in \"{parent}\"."
            ))),
        })
}

/// A plain keyword, a `URL` node or a `DefinedTerm` node.
fn keyword(field: &str, value: &Value) -> Check {
    if value.is_string() {
        return Ok(());
    }
    if value.is_object() {
        let valid_id = document_id(value).is_some_and(is_url_or_blank_node_id);
        let node_type = document_type(value);
        if node_type.is_some_and(|t| is_compact_type_equal(t, "URL")) {
            if !valid_id {
                return Err(ValidationError::Field(format!(
                    "\"{field}\" (URL) must have a valid \"@id\" field."
                )));
            }
            return Ok(());
        }
        if node_type.is_some_and(|t| is_compact_type_equal(t, "DefinedTerm")) {
            if !value
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| !name.is_empty())
            {
                return Err(ValidationError::Field(format!(
                    "\"{field}\" (DefinedTerm) must have a \"name\" field."
                )));
            }
            if !valid_id {
                return Err(ValidationError::Field(format!(
                    "\"{field}\" (DefinedTerm) must have a valid \"@id\" field."
                )));
            }
            return Ok(());
        }
    }
    Err(ValidationError::Field(format!(
        "\"{field}\" must be a string, a URL object, or a DefinedTerm object."
    )))
}
