pub mod evaluator;
pub use evaluator::ConstantEvaluator;
pub use evaluator::EvaluationError;
pub use evaluator::Evaluator;

pub mod metadata;
pub use metadata::BasicMetadata;
pub use metadata::Metadata;

pub mod objects;
use objects::Command;

pub mod rewriter;
pub use rewriter::Rewriter;
pub use rewriter::RewriterError;

use crate::config::{ConfigError, RewriterConfig};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Takes resolved commands from the resolver and hands rewritten ones to the planner.
#[derive(Clone)]
pub struct Engine {
    metadata: Arc<dyn Metadata>,
    evaluator: Arc<dyn Evaluator>,
    config: RewriterConfig,
}

impl Engine {
    pub fn new(
        metadata: Arc<dyn Metadata>,
        evaluator: Arc<dyn Evaluator>,
        config: RewriterConfig,
    ) -> Engine {
        Engine {
            metadata,
            evaluator,
            config,
        }
    }

    /// Engine using the constant evaluator and the settings found at `config_path`.
    pub fn with_config_file(
        metadata: Arc<dyn Metadata>,
        config_path: &Path,
    ) -> Result<Engine, EngineError> {
        let config = RewriterConfig::load(config_path)?;
        Ok(Engine::new(
            metadata,
            Arc::new(ConstantEvaluator::new()),
            config,
        ))
    }

    pub fn config(&self) -> &RewriterConfig {
        &self.config
    }

    pub fn rewrite(&self, command: Command) -> Result<Command, EngineError> {
        debug!("Rewriting {}", command);

        //Each pass gets its own overlay for inline views
        let rewriter = Rewriter::new(self.metadata.as_ref(), self.evaluator.as_ref(), &self.config);
        let rewritten = rewriter.rewrite(command)?;

        debug!("Rewritten to {}", rewritten);
        Ok(rewritten)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    RewriterError(#[from] RewriterError),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
}
