//! One function per subcommand. Each reads and writes the form file itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use codemeta_generator::{
    CodemetaEngine, CodemetaError, CodemetaVersion, FileStateStore, RepositoryMetadataClient,
    populate_from_repository_metadata,
};
use codemeta_jsonld::{ContextRegistry, HttpLoader, LocalProcessor, RegistryLoader};
use tracing::{Level, event};

use crate::config::Config;
use crate::errors::CliError;
use crate::form::{load_form, save_form};

/// Builds the engine the configuration describes.
pub async fn build_engine(config: &Config) -> Result<CodemetaEngine, CliError> {
    let registry = match &config.contexts.paths {
        Some((v2, v3)) => ContextRegistry::from_paths(v2, v3)
            .await
            .map_err(CodemetaError::from)?,
        None => ContextRegistry::bundled().map_err(CodemetaError::from)?,
    };

    let mut loader = RegistryLoader::new(Arc::new(registry));
    if config.contexts.remote {
        loader = loader.with_fallback(Arc::new(HttpLoader::new().map_err(CodemetaError::from)?));
    }

    let engine = CodemetaEngine::new(Arc::new(LocalProcessor::new(Arc::new(loader))));
    Ok(match &config.state_file {
        Some(path) => engine.with_store(Arc::new(FileStateStore::new(path))),
        None => engine,
    })
}

/// Generates from the form, to `output` or stdout.
pub async fn generate(
    engine: &CodemetaEngine,
    form: &Path,
    version: CodemetaVersion,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let sink = load_form(form).await?;
    let generated = engine.generate(&sink, version).await?;
    if let Some(err) = &generated.internal_error {
        eprintln!("{err}");
    }
    write_output(output, &generated.text).await
}

/// Imports a codemeta.json file into the form, reporting validation problems.
pub async fn import(engine: &CodemetaEngine, input: &Path, form: &Path) -> Result<(), CliError> {
    let text = read_input(input).await?;
    let mut sink = load_form(form).await?;
    let report = engine.import(&text, &mut sink).await?;
    save_form(form, &sink).await?;

    match report.validation {
        Some(err) => println!("Imported, but the document is not valid: {err}"),
        None => println!("Imported {}", input.display()),
    }
    Ok(())
}

/// Checks a codemeta.json file. Validation errors come back as `Err`.
pub fn validate(engine: &CodemetaEngine, text: &str) -> Result<(), CliError> {
    engine.validate(text)?;
    println!("Document is valid.");
    Ok(())
}

/// Re-imports the last generated document into the form.
pub async fn restore(engine: &CodemetaEngine, form: &Path) -> Result<(), CliError> {
    let mut sink = load_form(form).await?;
    match engine.restore(&mut sink).await? {
        Some(report) => {
            save_form(form, &sink).await?;
            if let Some(err) = report.validation {
                println!("Restored, but the document is not valid: {err}");
            } else {
                println!("Restored the last generated document.");
            }
        }
        None => println!("Nothing to restore."),
    }
    Ok(())
}

/// Fills the form from a repository, then optionally generates.
pub async fn fetch(
    engine: &CodemetaEngine,
    config: &Config,
    repository: Option<String>,
    form: &Path,
    version: Option<CodemetaVersion>,
) -> Result<(), CliError> {
    let Some(repository) = repository.or_else(|| config.default_repository.clone()) else {
        return Err(CliError::Config(
            "no repository given and repository.default_repository is not set".into(),
        ));
    };

    let client = RepositoryMetadataClient::new(&config.metadata_service_url)?
        .with_threshold(config.threshold)
        .with_ignore_classifiers(config.ignore_classifiers);
    event!(Level::INFO, repository = %repository, "fetching repository metadata");
    let metadata = client.fetch(&repository).await?;

    let mut sink = load_form(form).await?;
    populate_from_repository_metadata(&mut sink, &metadata);
    save_form(form, &sink).await?;

    if let Some(version) = version {
        let generated = engine.generate(&sink, version).await?;
        write_output(None, &generated.text).await?;
    }
    Ok(())
}

pub async fn read_input(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| CliError::io(path.display(), err))
}

async fn write_output(output: Option<&Path>, text: &str) -> Result<(), CliError> {
    match output {
        Some(path) => tokio::fs::write(path, format!("{text}\n"))
            .await
            .map_err(|err| CliError::io(path.display(), err)),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// Default form location when none is given.
pub fn default_form() -> PathBuf {
    PathBuf::from("codemeta-form.json")
}
