/*!
 * CodeMeta generator engine.
 *
 * Turns a metadata form into a CodeMeta 2.0 or 3.0 `codemeta.json`
 * ([`generate`]) and back ([`import`]), and checks documents with
 * user-oriented messages ([`validate`]).
 *
 * The form is reached only through [`sink::FieldSink`]; JSON-LD processing
 * goes through [`codemeta_jsonld::JsonLdProcessor`].
 */

pub mod engine;
pub mod errors;
pub mod fields;
pub mod generate;
pub mod import;
pub mod model;
pub mod repository;
pub mod sink;
pub mod storage;
pub mod validate;

pub use codemeta_jsonld::CodemetaVersion;
pub use engine::CodemetaEngine;
pub use errors::{CodemetaError, Result, ValidationError};
pub use generate::GeneratedDocument;
pub use import::ImportReport;
pub use repository::{RepositoryMetadataClient, populate_from_repository_metadata};
pub use sink::{FieldSink, MemorySink};
pub use storage::{FileStateStore, MemoryStateStore, STATE_KEY, StateStore};
