//! End-to-end normalisation between the CodeMeta 2.0 and 3.0 contexts.

use std::sync::Arc;

use codemeta_jsonld::{
    CODEMETA_V2_URL, CODEMETA_V3_URL, CodemetaVersion, ContextRegistry, LocalProcessor, normalize,
    normalize_keyword_aliases, recompact_with_contexts,
};
use serde_json::{Value, json};

fn processor() -> LocalProcessor {
    LocalProcessor::offline(Arc::new(ContextRegistry::bundled().unwrap()))
}

fn draft_with_aliases() -> Value {
    json!({
        "@context": CodemetaVersion::all_context_urls(),
        "@type": "SoftwareSourceCode",
        "name": "My Test Software",
        "contIntegration": "https://test-ci.example.org/my-software",
        "continuousIntegration": "https://test-ci.example.org/my-software",
        "isSourceCodeOf": "Bigger Application"
    })
}

async fn generate(version: CodemetaVersion) -> Value {
    let compacted = normalize(
        &processor(),
        &draft_with_aliases(),
        &[version.context_url().to_string()],
    )
    .await
    .unwrap();
    normalize_keyword_aliases(compacted)
}

/// 2.0 keeps `contIntegration` as a term and falls back to compact IRIs for 3.0-only properties
#[tokio::test]
async fn aliases_compacted_to_v2() {
    assert_eq!(
        generate(CodemetaVersion::V2).await,
        json!({
            "@context": CODEMETA_V2_URL,
            "@type": "SoftwareSourceCode",
            "name": "My Test Software",
            "contIntegration": "https://test-ci.example.org/my-software",
            "codemeta:continuousIntegration": {"@id": "https://test-ci.example.org/my-software"},
            "codemeta:isSourceCodeOf": {"@id": "Bigger Application"}
        })
    );
}

/// 3.0 has `continuousIntegration` and `isSourceCodeOf` but no `contIntegration`
#[tokio::test]
async fn aliases_compacted_to_v3() {
    assert_eq!(
        generate(CodemetaVersion::V3).await,
        json!({
            "@context": CODEMETA_V3_URL,
            "@type": "SoftwareSourceCode",
            "name": "My Test Software",
            "continuousIntegration": "https://test-ci.example.org/my-software",
            "codemeta:contIntegration": {"@id": "https://test-ci.example.org/my-software"},
            "isSourceCodeOf": "Bigger Application"
        })
    );
}

/// Authors and their roles survive the trip through the merged contexts
#[tokio::test]
async fn roles_stay_beside_authors() {
    let draft = json!({
        "@context": CodemetaVersion::all_context_urls(),
        "@type": "SoftwareSourceCode",
        "author": [
            {"@type": "Person", "@id": "_:author_1", "givenName": "Jane"},
            {"@type": "Role", "roleName": "Developer", "schema:author": {"@id": "_:author_1"}}
        ]
    });

    let v2 = normalize_keyword_aliases(
        normalize(&processor(), &draft, &[CODEMETA_V2_URL.to_string()])
            .await
            .unwrap(),
    );
    assert_eq!(
        v2["author"],
        json!([
            {"@id": "_:author_1", "@type": "Person", "givenName": "Jane"},
            {
                "@type": "schema:Role",
                "schema:author": {"@id": "_:author_1"},
                "schema:roleName": "Developer"
            }
        ])
    );

    let v3 = normalize_keyword_aliases(
        normalize(&processor(), &draft, &[CODEMETA_V3_URL.to_string()])
            .await
            .unwrap(),
    );
    assert_eq!(
        v3["author"][1],
        json!({
            "@type": "Role",
            "roleName": "Developer",
            "schema:author": {"@id": "_:author_1"}
        })
    );
}

/// Expanded input recompacts to the merged term names
#[tokio::test]
async fn expanded_document_recompacts() {
    let doc = json!([{
        "http://schema.org/name": [{"@value": "My Test Software"}],
        "@type": ["http://schema.org/SoftwareSourceCode"]
    }]);
    let compacted = recompact_with_contexts(&processor(), &doc, &CodemetaVersion::all_context_urls())
        .await
        .unwrap();
    assert_eq!(compacted["name"], "My Test Software");
    assert_eq!(compacted["type"], "SoftwareSourceCode");
}
