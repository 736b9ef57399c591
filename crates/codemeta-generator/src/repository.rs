/*!
 * Pre-filling the form from a source code repository.
 *
 * A metadata extraction service reads the repository and answers with a
 * CodeMeta-like JSON document. Most values come as plain strings, some as
 * arrays of `{"result": {"value": ...}}` entries.
 */

use std::time::Duration;

use codemeta_jsonld::node::document_id;
use serde_json::Value;
use tracing::{Level, event};
use url::Url;

use crate::errors::{CodemetaError, Result};
use crate::fields::{entry_field, groups};
use crate::sink::FieldSink;

pub const DEFAULT_THRESHOLD: f64 = 0.8;

#[derive(Clone, Debug)]
pub struct RepositoryMetadataClient {
    client: reqwest::Client,
    service_url: String,
    threshold: f64,
    ignore_classifiers: bool,
}

impl RepositoryMetadataClient {
    pub fn new(service_url: &str) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .use_rustls_tls()
            .timeout(Duration::from_secs(120))
            .user_agent(format!("CodeMeta Generator {}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CodemetaError::Transport(format!("couldn't create HTTP client: {err}")))?;
        Ok(Self::with_client(client, service_url))
    }

    pub fn with_client(client: reqwest::Client, service_url: &str) -> Self {
        RepositoryMetadataClient {
            client,
            service_url: service_url.trim_end_matches('/').to_string(),
            threshold: DEFAULT_THRESHOLD,
            ignore_classifiers: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_ignore_classifiers(mut self, ignore_classifiers: bool) -> Self {
        self.ignore_classifiers = ignore_classifiers;
        self
    }

    /// `{service}/metadata?url=...&threshold=...&ignoreClassifiers=...`
    pub fn request_url(&self, repository_url: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/metadata", self.service_url)).map_err(|err| {
            CodemetaError::Transport(format!(
                "invalid metadata service URL ({}): {err}",
                self.service_url
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("url", repository_url)
            .append_pair("threshold", &self.threshold.to_string())
            .append_pair("ignoreClassifiers", &self.ignore_classifiers.to_string());
        Ok(url)
    }

    /// Asks the service for the metadata of `repository_url`.
    pub async fn fetch(&self, repository_url: &str) -> Result<Value> {
        let url = self.request_url(repository_url)?;
        event!(Level::INFO, repository = repository_url, "requesting repository metadata");

        let response = self
            .client
            .get(url.clone())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|err| CodemetaError::Transport(format!("{url}: {err}")))?;
        if !response.status().is_success() {
            return Err(CodemetaError::Transport(format!(
                "{url}: metadata service answered {}",
                response.status()
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| CodemetaError::Transport(format!("{url}: invalid response: {err}")))
    }
}

/// Copies what the metadata service found into the form.
///
/// Fields the service says nothing about are left alone. Authors and
/// requirements, when present, replace the existing entries.
pub fn populate_from_repository_metadata(sink: &mut dyn FieldSink, metadata: &Value) {
    set(sink, "keywords", metadata.get("keywords").map(|v| joined(v, ", ")));
    set(sink, "description", metadata.get("description").map(|v| joined(v, " ")));
    set(sink, "applicationCategory", metadata.get("@type").map(|v| joined(v, ", ")));
    set(sink, "name", metadata.get("name").map(|v| joined(v, ", ")));
    set(sink, "identifier", metadata.get("identifier").map(|v| joined(v, ", ")));
    for field in ["dateCreated", "dateModified", "datePublished"] {
        set(sink, field, metadata.get(field).map(dates));
    }
    for field in ["codeRepository", "issueTracker", "downloadUrl", "releaseNotes"] {
        set(sink, field, metadata.get(field).map(|v| joined(v, ", ")));
    }
    set(sink, "version", metadata.get("softwareVersion").map(|v| joined(v, ", ")));
    set(
        sink,
        "programmingLanguage",
        metadata.get("programmingLanguage").map(|v| joined(v, ", ")),
    );

    if let Some(license) = metadata.get("license") {
        let licenses: Vec<String> = items(license).filter_map(license_id).collect();
        if !licenses.is_empty() {
            sink.set_license_selections(licenses);
        }
    }

    if let Some(publications) = metadata.get("referencePublication").and_then(Value::as_array) {
        if let Some(first) = publications.first() {
            for (property, field) in [
                ("url", "referencePublicationUrl"),
                ("name", "publicationTitle"),
                ("identifier", "publicationDOI"),
                ("issn", "issn"),
                ("datePublished", "publicationDatePublished"),
            ] {
                set(sink, field, first.get(property).and_then(Value::as_str).map(str::to_string));
            }
            let mut links: Vec<&str> = Vec::new();
            for url in publications.iter().filter_map(|p| p.get("url").and_then(Value::as_str)) {
                if !url.is_empty() && !links.contains(&url) {
                    links.push(url);
                }
            }
            set(sink, "relatedLink", Some(links.join("\n")));
        }
    }

    if let Some(requirements) = metadata.get("softwareRequirements") {
        let requirements: Vec<String> = items(&requirement_values(requirements))
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|requirement| !requirement.is_empty() && *requirement != "/")
            .map(str::to_string)
            .collect();
        if !requirements.is_empty() {
            sink.set_group_count(groups::REQUIREMENT, 0);
            for requirement in requirements {
                let i = sink.add_group_entry(groups::REQUIREMENT);
                sink.set_field(&entry_field(groups::REQUIREMENT, i, "name"), &requirement);
            }
        }
    }

    if let Some(authors) = metadata.get("author").and_then(Value::as_array) {
        if !authors.is_empty() {
            populate_authors(sink, authors);
        }
    }
}

fn set(sink: &mut dyn FieldSink, field: &str, value: Option<String>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        sink.set_field(field, &value);
    }
}

/// Replaces the authors with the `Person` entries of `authors`.
fn populate_authors(sink: &mut dyn FieldSink, authors: &[Value]) {
    sink.set_group_count(groups::AUTHOR, 0);
    for author in authors
        .iter()
        .filter(|author| author.get("@type").and_then(Value::as_str) == Some("Person"))
    {
        let i = sink.add_group_entry(groups::AUTHOR);
        sink.set_field(&entry_field(groups::AUTHOR, i, "type"), "Person");
        for (property, field) in [
            ("familyName", "familyName"),
            ("givenName", "givenName"),
            ("email", "email"),
        ] {
            if let Some(value) = author.get(property).and_then(Value::as_str) {
                sink.set_field(&entry_field(groups::AUTHOR, i, field), value.trim());
            }
        }
        if let Some(id) = document_id(author) {
            sink.set_field(&entry_field(groups::AUTHOR, i, "id"), id);
        }
    }
    event!(
        Level::DEBUG,
        count = sink.group_count(groups::AUTHOR),
        "authors replaced from repository metadata"
    );
}

fn items(value: &Value) -> impl Iterator<Item = &Value> {
    match value {
        Value::Array(items) => items.iter(),
        other => std::slice::from_ref(other).iter(),
    }
}

/// Text of one extracted value: a string or `{"result": {"value": ...}}`.
fn result_value(value: &Value) -> Option<&str> {
    value
        .as_str()
        .or_else(|| value.pointer("/result/value").and_then(Value::as_str))
}

fn joined(value: &Value, separator: &str) -> String {
    items(value)
        .filter_map(result_value)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Dates with any time part cut off.
fn dates(value: &Value) -> String {
    items(value)
        .filter_map(result_value)
        .map(|date| date.split('T').next().unwrap_or(date))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The SPDX id at the end of a license URL or identifier.
fn license_id(license: &Value) -> Option<String> {
    let identifier = license.as_str().or_else(|| {
        license
            .get("identifier")
            .and_then(Value::as_str)
            .or_else(|| license.get("spdx_id").and_then(Value::as_str))
            .or_else(|| document_id(license))
    })?;
    identifier
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Requirements may come as one comma-separated string.
fn requirement_values(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::Array(s.split(',').map(|r| Value::from(r.trim())).collect()),
        other => other.clone(),
    }
}
