//! Generate, import, generate again: the two documents must match.

use codemeta_generator::{CodemetaEngine, CodemetaVersion, FieldSink, MemorySink};

fn full_form() -> MemorySink {
    let mut sink = MemorySink::new();
    sink.set_field("name", "My Test Software");
    sink.set_field("description", "Does things with data.");
    sink.set_field("codeRepository", "https://github.com/example/my-software");
    sink.set_field("contIntegration", "https://ci.example.org/my-software");
    sink.set_field("issueTracker", "https://github.com/example/my-software/issues");
    sink.set_field("dateCreated", "2019-05-06");
    sink.set_field("datePublished", "2020-01-02");
    sink.set_field("version", "1.2.0");
    sink.set_field("developmentStatus", "active");
    sink.set_field("releaseNotes", "Fixed the bugs.");
    sink.set_field("isSourceCodeOf", "Bigger Application");
    sink.set_field("programmingLanguage", "Python, Rust");
    sink.set_field("operatingSystem", "Linux");
    sink.set_field("relatedLink", "https://docs.example.org\nhttps://blog.example.org");
    sink.set_field("keywords", "foo, bar");
    sink.set_field("funder", "https://ror.org/05f950310");
    sink.set_license_selections(vec!["MIT".into(), "Apache-2.0".into()]);

    sink.add_group_entry("author");
    sink.set_field("author_1_type", "Person");
    sink.set_field("author_1_id", "https://orcid.org/0000-0002-1825-0097");
    sink.set_field("author_1_givenName", "Josiah");
    sink.set_field("author_1_familyName", "Carberry");
    sink.set_field("author_1_affiliation", "Brown University");
    sink.add_group_entry("author_1_role");
    sink.set_field("author_1_role_1_roleName", "Developer");
    sink.set_field("author_1_role_1_startDate", "2019-05-06");
    sink.add_group_entry("author");
    sink.set_field("author_2_type", "Person");
    sink.set_field("author_2_givenName", "Jane");
    sink.set_field("author_2_email", "jane@example.org");
    sink.add_group_entry("author_2_role");
    sink.set_field("author_2_role_1_roleName", "Maintainer");

    sink.add_group_entry("contributor");
    sink.set_field("contributor_1_type", "Organization");
    sink.set_field("contributor_1_name", "ACME");

    sink.add_group_entry("keyword");
    sink.set_field("keyword_1_name", "data");
    sink.set_field("keyword_1_id", "https://example.org/terms/data");

    sink.add_group_entry("requirement");
    sink.set_field("requirement_1_name", "pandas");
    sink.add_group_entry("requirement");
    sink.set_field("requirement_2_name", "numpy");
    sink.set_field("requirement_2_version", "1.26");

    sink.set_field("publicationTitle", "My Paper");
    sink.set_field("publicationDOI", "10.1000/182");
    sink.set_field("publicationDatePublished", "2021-03-04");
    sink.add_group_entry("author_reference");
    sink.set_field("author_reference_1_type", "Person");
    sink.set_field("author_reference_1_familyName", "Carberry");
    sink
}

async fn round_trip(version: CodemetaVersion) {
    let engine = CodemetaEngine::offline().unwrap();
    let first = engine.generate(&full_form(), version).await.unwrap();
    assert!(first.internal_error.is_none(), "{}", first.text);

    let mut imported = MemorySink::new();
    let report = engine.import(&first.text, &mut imported).await.unwrap();
    assert!(report.is_valid(), "{:?}", report.validation);

    let second = engine.generate(&imported, version).await.unwrap();
    assert_eq!(first.document, second.document);
    assert_eq!(first.text, second.text);
}

/// A full 2.0 document survives the trip unchanged
#[tokio::test]
async fn round_trip_v2() {
    round_trip(CodemetaVersion::V2).await;
}

/// A full 3.0 document survives the trip unchanged
#[tokio::test]
async fn round_trip_v3() {
    round_trip(CodemetaVersion::V3).await;
}

/// A 2.0 document imported and generated as 3.0 keeps its content
#[tokio::test]
async fn upgrade_v2_to_v3() {
    let engine = CodemetaEngine::offline().unwrap();
    let v2 = engine
        .generate(&full_form(), CodemetaVersion::V2)
        .await
        .unwrap();

    let mut imported = MemorySink::new();
    engine.import(&v2.text, &mut imported).await.unwrap();
    let upgraded = engine
        .generate(&imported, CodemetaVersion::V3)
        .await
        .unwrap();
    let direct = engine
        .generate(&full_form(), CodemetaVersion::V3)
        .await
        .unwrap();
    assert_eq!(upgraded.document, direct.document);
}
