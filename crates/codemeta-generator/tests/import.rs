//! Importing codemeta.json documents into the form.

use codemeta_generator::{CodemetaEngine, CodemetaError, FieldSink, MemorySink, ValidationError};
use serde_json::{Value, json};

async fn import(doc: &Value) -> (MemorySink, codemeta_generator::ImportReport) {
    let mut sink = MemorySink::new();
    let report = CodemetaEngine::offline()
        .unwrap()
        .import(&doc.to_string(), &mut sink)
        .await
        .unwrap();
    (sink, report)
}

fn field(sink: &MemorySink, id: &str) -> Option<String> {
    sink.get_field(id)
}

/// A 2.0 document with the 3.0 property as a compact IRI: the 3.0 name wins
#[tokio::test]
async fn alias_precedence_v2() {
    let (sink, report) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "contIntegration": "https://a.example.org",
        "codemeta:continuousIntegration": {"id": "https://b.example.org"}
    }))
    .await;
    assert!(report.is_valid());
    assert_eq!(field(&sink, "contIntegration").as_deref(), Some("https://b.example.org"));
}

/// A 3.0 document with the 2.0 property as a compact IRI: the 3.0 name wins
#[tokio::test]
async fn alias_precedence_v3() {
    let (sink, _) = import(&json!({
        "@context": "https://w3id.org/codemeta/3.0",
        "@type": "SoftwareSourceCode",
        "continuousIntegration": "https://a.example.org",
        "codemeta:contIntegration": {"id": "https://b.example.org"}
    }))
    .await;
    assert_eq!(field(&sink, "contIntegration").as_deref(), Some("https://a.example.org"));
}

/// A wrong document type is reported, but the fields are imported anyway
#[tokio::test]
async fn unknown_type_still_imports() {
    let (sink, report) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "foo",
        "name": "My Software",
        "codeRepository": "https://github.com/example/my-software"
    }))
    .await;
    assert_eq!(
        report.validation,
        Some(ValidationError::Type(
            "Wrong document type: must be \"SoftwareSourceCode\"/\"SoftwareApplication\", not \"foo\""
                .into()
        ))
    );
    assert_eq!(field(&sink, "name").as_deref(), Some("My Software"));
    assert_eq!(
        field(&sink, "codeRepository").as_deref(),
        Some("https://github.com/example/my-software")
    );
}

/// Not JSON: nothing in the form changes
#[tokio::test]
async fn malformed_json_changes_nothing() {
    let mut sink = MemorySink::new();
    sink.set_field("name", "Kept");
    sink.set_group_count("author", 1);
    let before = sink.clone();

    let err = CodemetaEngine::offline()
        .unwrap()
        .import("{\"name\": \"My Software\",", &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, CodemetaError::Parse(_)));
    assert_eq!(sink, before);
}

/// A person and a role pointing at it become one author with one role
#[tokio::test]
async fn role_reassociated_with_person() {
    let (sink, report) = import(&json!({
        "@context": "https://w3id.org/codemeta/3.0",
        "@type": "SoftwareSourceCode",
        "author": [
            {"@type": "Person", "@id": "https://orcid.org/0000-0002-1825-0097", "givenName": "Josiah", "familyName": "Carberry"},
            {"@type": "Role", "roleName": "Developer", "startDate": "2020-01-01",
             "schema:author": {"@id": "https://orcid.org/0000-0002-1825-0097"}}
        ]
    }))
    .await;
    assert!(report.is_valid(), "{:?}", report.validation);
    assert_eq!(sink.group_count("author"), 1);
    assert_eq!(
        field(&sink, "author_1_id").as_deref(),
        Some("https://orcid.org/0000-0002-1825-0097")
    );
    assert_eq!(field(&sink, "author_1_type").as_deref(), Some("Person"));
    assert_eq!(sink.group_count("author_1_role"), 1);
    assert_eq!(field(&sink, "author_1_role_1_roleName").as_deref(), Some("Developer"));
    assert_eq!(field(&sink, "author_1_role_1_startDate").as_deref(), Some("2020-01-01"));
}

/// Blank node ids link roles to authors but never reach the form
#[tokio::test]
async fn blank_ids_are_not_imported() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "author": [
            {"@type": "Person", "@id": "_:author_1", "givenName": "Jane"},
            {"@type": "Person", "@id": "_:author_2", "givenName": "John"},
            {"@type": "schema:Role", "schema:roleName": "Maintainer", "schema:author": {"@id": "_:author_2"}}
        ]
    }))
    .await;
    assert_eq!(sink.group_count("author"), 2);
    assert_eq!(field(&sink, "author_1_id"), None);
    assert_eq!(sink.group_count("author_1_role"), 0);
    assert_eq!(field(&sink, "author_2_givenName").as_deref(), Some("John"));
    assert_eq!(field(&sink, "author_2_role_1_roleName").as_deref(), Some("Maintainer"));
}

/// Authors without ids are merged when name and email match
#[tokio::test]
async fn duplicate_authors_merged() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "author": [
            {"@type": "Person", "givenName": "Jane", "familyName": "Doe"},
            {"@type": "Person", "givenName": "Jane", "familyName": "Doe"},
            {"@type": "Person", "givenName": "Jane", "familyName": "Doe", "email": "jane@example.org"}
        ]
    }))
    .await;
    assert_eq!(sink.group_count("author"), 2);
    assert_eq!(field(&sink, "author_2_email").as_deref(), Some("jane@example.org"));
}

/// A single contributor compacts to an object and is still imported
#[tokio::test]
async fn single_contributor_object() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "contributor": {"@type": "Organization", "name": "ACME", "email": "contact@acme.example.org"}
    }))
    .await;
    assert_eq!(sink.group_count("contributor"), 1);
    assert_eq!(field(&sink, "contributor_1_type").as_deref(), Some("Organization"));
    assert_eq!(field(&sink, "contributor_1_name").as_deref(), Some("ACME"));
}

/// Keywords always land in the keyword entries, shaped by name and id
#[tokio::test]
async fn keywords_become_entries() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "keywords": [
            "foo",
            {"@type": "URL", "@id": "https://example.org/terms/bar"},
            {"@type": "DefinedTerm", "name": "baz", "@id": "https://example.org/terms/baz"}
        ]
    }))
    .await;
    assert_eq!(field(&sink, "keywords"), None);
    assert_eq!(sink.group_count("keyword"), 3);
    assert_eq!(field(&sink, "keyword_1_name").as_deref(), Some("foo"));
    assert_eq!(field(&sink, "keyword_1_id"), None);
    assert_eq!(field(&sink, "keyword_2_name"), None);
    assert_eq!(field(&sink, "keyword_2_id").as_deref(), Some("https://example.org/terms/bar"));
    assert_eq!(field(&sink, "keyword_3_name").as_deref(), Some("baz"));
    assert_eq!(field(&sink, "keyword_3_id").as_deref(), Some("https://example.org/terms/baz"));
}

/// A comma separated keywords string gives one entry per keyword
#[tokio::test]
async fn keyword_string_is_split() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "name": "My Software",
        "keywords": "a, b"
    }))
    .await;
    assert_eq!(sink.group_count("keyword"), 2);
    assert_eq!(field(&sink, "keyword_1_name").as_deref(), Some("a"));
    assert_eq!(field(&sink, "keyword_2_name").as_deref(), Some("b"));
}

/// A context that cannot be fetched fails the import before the form changes
#[tokio::test]
async fn unresolvable_context_changes_nothing() {
    let mut sink = MemorySink::new();
    sink.set_field("name", "Kept");
    let before = sink.clone();

    let doc = json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "name": "Replaced",
        "author": {
            "@context": "https://example.org/ctx",
            "@type": "Person",
            "givenName": "Jane"
        }
    });
    let result = CodemetaEngine::offline()
        .unwrap()
        .import(&doc.to_string(), &mut sink)
        .await;
    assert!(result.is_err());
    assert_eq!(sink, before);
    assert_eq!(field(&sink, "name").as_deref(), Some("Kept"));
}

/// Licenses keep their SPDX id; other license URLs are skipped
#[tokio::test]
async fn licenses() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "license": ["https://spdx.org/licenses/MIT", "https://example.org/my-license"]
    }))
    .await;
    assert_eq!(sink.license_selections(), vec!["MIT"]);
}

/// Multi-valued text fields are joined with their delimiter
#[tokio::test]
async fn joined_fields() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "programmingLanguage": ["Python", "Rust"],
        "relatedLink": ["https://a.example.org", "https://b.example.org"],
        "operatingSystem": "Linux"
    }))
    .await;
    assert_eq!(field(&sink, "programmingLanguage").as_deref(), Some("Python,Rust"));
    assert_eq!(
        field(&sink, "relatedLink").as_deref(),
        Some("https://a.example.org\nhttps://b.example.org")
    );
    assert_eq!(field(&sink, "operatingSystem").as_deref(), Some("Linux"));
}

/// Import replaces whatever the form held before
#[tokio::test]
async fn previous_form_is_cleared() {
    let mut sink = MemorySink::new();
    sink.set_field("description", "Old description");
    sink.set_group_count("author", 3);
    sink.set_field("author_3_givenName", "Old");
    sink.set_license_selections(vec!["GPL-3.0".into()]);

    CodemetaEngine::offline()
        .unwrap()
        .import(
            &json!({"@context": "https://w3id.org/codemeta/3.0", "@type": "SoftwareSourceCode", "name": "New"})
                .to_string(),
            &mut sink,
        )
        .await
        .unwrap();

    let mut expected = MemorySink::new();
    expected.set_field("name", "New");
    assert_eq!(sink, expected);
}

/// Expanded documents, even as a top-level array, import like compacted ones
#[tokio::test]
async fn expanded_document() {
    let (sink, _) = import(&json!([{
        "@type": ["http://schema.org/SoftwareSourceCode"],
        "http://schema.org/name": [{"@value": "My Software"}],
        "http://schema.org/codeRepository": [{"@id": "https://github.com/example/my-software"}]
    }]))
    .await;
    assert_eq!(field(&sink, "name").as_deref(), Some("My Software"));
    assert_eq!(
        field(&sink, "codeRepository").as_deref(),
        Some("https://github.com/example/my-software")
    );
}

/// The first reference publication fills the publication fields
#[tokio::test]
async fn reference_publication() {
    let (sink, _) = import(&json!({
        "@context": "https://doi.org/10.5063/schema/codemeta-2.0",
        "@type": "SoftwareSourceCode",
        "referencePublication": [
            {
                "@type": "ScholarlyArticle",
                "name": "My Paper",
                "identifier": "10.1000/182",
                "datePublished": "2021-03-04",
                "schema:issn": "1234-5678",
                "author": [{"@type": "Person", "givenName": "Jane", "familyName": "Doe"}]
            },
            {"@type": "ScholarlyArticle", "name": "Another Paper"}
        ]
    }))
    .await;
    assert_eq!(field(&sink, "publicationTitle").as_deref(), Some("My Paper"));
    assert_eq!(field(&sink, "publicationDOI").as_deref(), Some("10.1000/182"));
    assert_eq!(field(&sink, "publicationDatePublished").as_deref(), Some("2021-03-04"));
    assert_eq!(field(&sink, "issn").as_deref(), Some("1234-5678"));
    assert_eq!(sink.group_count("author_reference"), 1);
    assert_eq!(field(&sink, "author_reference_1_familyName").as_deref(), Some("Doe"));
}
