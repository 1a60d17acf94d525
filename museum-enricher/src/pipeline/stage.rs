//! Steps and the stages grouping them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::item::PipelineItem;
use crate::errors::StepError;

/// A single enrichment operation on a [`PipelineItem`].
///
/// Steps of the same stage run concurrently against the same item. A step
/// that depends on results of an earlier stage should return `Ok(())` without
/// doing anything when those results are missing.
#[async_trait]
pub trait Step<T>: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Enrich `item`. `ctx` is cancelled on shutdown.
    async fn run(&self, ctx: &CancellationToken, item: &PipelineItem<T>) -> Result<(), StepError>;
}

/// Steps that may run concurrently for one item.
pub struct Stage<T> {
    steps: Vec<Arc<dyn Step<T>>>,
}

impl<T> Stage<T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the stage.
    pub fn with_step(mut self, step: impl Step<T> + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn steps(&self) -> &[Arc<dyn Step<T>>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<T> Default for Stage<T> {
    fn default() -> Self {
        Self::new()
    }
}
