/*!
 * JSON-LD processing for CodeMeta documents.
 *
 * The crate knows the CodeMeta 2.0 and 3.0 vocabulary contexts
 * ([`registry`]), resolves context URLs through a pluggable
 * [`loader::DocumentLoader`], and implements the subset of JSON-LD expansion
 * and compaction CodeMeta documents need ([`processor::LocalProcessor`]).
 *
 * [`node`] holds small helpers for reading compacted nodes.
 */

pub mod compact;
pub mod context;
pub mod error;
pub mod expand;
pub mod loader;
pub mod node;
pub mod processor;
pub mod registry;

pub use error::{JsonLdError, Result};
pub use loader::{DocumentLoader, HttpLoader, RegistryLoader};
pub use processor::{
    JsonLdProcessor, LocalProcessor, context_reference, normalize, normalize_keyword_aliases,
    recompact_with_contexts,
};
pub use registry::{CODEMETA_V2_URL, CODEMETA_V3_URL, CodemetaVersion, ContextRegistry};
