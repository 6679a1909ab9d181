//! Inkmath - handwritten stroke recognition into LaTeX documents
//!
//! This library turns pen strokes into symbol ids with a recurrent
//! classifier, resolves the ids through a symbol registry and assembles the
//! results into a LaTeX document that can be compiled with external tools.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use inkmath::{
//!     ModelConfig, ModelParams, Pipeline, SequenceClassifier, SymbolRegistry,
//! };
//!
//! let registry = SymbolRegistry::from_json(
//!     r#"{"plus": {"command": "+", "mathmode": true, "textmode": false, "css_class": "plus"}}"#,
//! ).unwrap();
//! let config = ModelConfig::new().with_hidden_size(4).with_num_layers(1).with_num_classes(1);
//! let params = ModelParams::initialized(&config, vec!["plus".to_string()], 7);
//! let classifier = SequenceClassifier::from_params(params, config).unwrap();
//! let pipeline = Pipeline::new(Arc::new(registry), classifier);
//!
//! let mut doc = pipeline.new_document();
//! pipeline
//!     .transcribe(r#"{"strokes": [[[0, 0, 0], [1, 1, 1]]]}"#, &mut doc)
//!     .unwrap();
//! assert!(doc.render().contains("$+$"));
//! ```

pub mod classifier;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod registry;
pub mod stroke;

use std::sync::Arc;

pub use classifier::{ModelConfig, ModelError, ModelParams, ReadoutPolicy, SequenceClassifier};
pub use config::{AppConfig, ConfigError};
pub use document::{
    CompileError, CompileReport, CompileWorker, DocumentAssembler, DocumentConfig,
    ExternalToolError, SharedDocument, Toolchain, ToolchainConfig,
};
pub use error::ParseError;
pub use registry::{LoadError, SymbolId, SymbolInfo, SymbolRegistry, UnknownSymbolError};
pub use stroke::{parse_payload, preprocess, InputError, StrokeSet};

use stroke::payload::PayloadError;
use thiserror::Error;

/// Errors that can occur while recognizing a submission
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The payload was well-formed but unusable
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// The payload was not valid JSON or had malformed fields
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The classifier produced an id the registry does not know
    #[error(transparent)]
    UnknownSymbol(#[from] UnknownSymbolError),
}

impl From<PayloadError> for PipelineError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Input(e) => PipelineError::Input(e),
            PayloadError::Parse(e) => PipelineError::Parse(e),
        }
    }
}

/// Errors that prevent the pipeline from starting
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load symbol registry: {0}")]
    Registry(#[from] LoadError),

    #[error("failed to load model: {0}")]
    Model(#[from] ModelError),
}

/// Loaded registry and classifier plus the document settings they feed
///
/// The pipeline itself is immutable and can be shared across threads;
/// documents are created from it and owned by the caller.
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: Arc<SymbolRegistry>,
    classifier: SequenceClassifier,
    document: DocumentConfig,
    toolchain: ToolchainConfig,
}

impl Pipeline {
    /// Assemble a pipeline with default document and toolchain settings
    pub fn new(registry: Arc<SymbolRegistry>, classifier: SequenceClassifier) -> Self {
        Self {
            registry,
            classifier,
            document: DocumentConfig::default(),
            toolchain: ToolchainConfig::default(),
        }
    }

    /// Load the registry and model named by `config`.
    ///
    /// A registry or parameter file that is missing, malformed or of the
    /// wrong shape stops startup here.
    pub fn load(config: &AppConfig) -> Result<Self, ConfigurationError> {
        let registry = SymbolRegistry::from_file(&config.registry.path)?;
        let classifier =
            SequenceClassifier::load(&config.model.weights, config.model.architecture.clone())?;

        let unmapped: Vec<&str> = classifier
            .labels()
            .iter()
            .filter(|label| !registry.contains(&SymbolId::new(label.as_str())))
            .map(String::as_str)
            .collect();
        if !unmapped.is_empty() {
            log::warn!(
                "event=pipeline_load status=unmapped_labels count={} labels={:?}",
                unmapped.len(),
                unmapped
            );
        }

        Ok(Self {
            registry: Arc::new(registry),
            classifier,
            document: config.document.clone(),
            toolchain: config.toolchain.clone(),
        })
    }

    /// Set the document templates
    pub fn with_document_config(mut self, config: DocumentConfig) -> Self {
        self.document = config;
        self
    }

    /// Set the output location and external tools
    pub fn with_toolchain_config(mut self, config: ToolchainConfig) -> Self {
        self.toolchain = config;
        self
    }

    pub fn registry(&self) -> &Arc<SymbolRegistry> {
        &self.registry
    }

    pub fn classifier(&self) -> &SequenceClassifier {
        &self.classifier
    }

    /// Parse, preprocess and classify a JSON payload
    pub fn recognize(&self, payload: &str) -> Result<Vec<SymbolId>, PipelineError> {
        let strokes = parse_payload(payload)?;
        self.recognize_strokes(&strokes)
    }

    /// Classify already validated strokes, one id per stroke in input order
    pub fn recognize_strokes(&self, strokes: &StrokeSet) -> Result<Vec<SymbolId>, PipelineError> {
        let batch = preprocess(strokes);
        let ids = self.classifier.classify(&batch)?;
        log::info!(
            "event=recognize status=ok strokes={} symbols={}",
            strokes.len(),
            ids.len()
        );
        Ok(ids)
    }

    /// Recognize a payload and append the result to `document`.
    ///
    /// On any error the document is left unchanged.
    pub fn transcribe(
        &self,
        payload: &str,
        document: &mut DocumentAssembler,
    ) -> Result<Vec<SymbolId>, PipelineError> {
        let ids = self.recognize(payload)?;
        document.add_symbols(&ids)?;
        Ok(ids)
    }

    /// A fresh, empty document bound to this pipeline's registry
    pub fn new_document(&self) -> DocumentAssembler {
        DocumentAssembler::new(Arc::clone(&self.registry), self.document.clone())
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(self.toolchain.clone())
    }

    /// A fresh document for concurrent request flows, with its own
    /// compile worker
    pub fn shared_document(&self) -> std::io::Result<SharedDocument> {
        let worker = CompileWorker::spawn(self.toolchain())?;
        Ok(SharedDocument::new(self.new_document(), worker))
    }
}
