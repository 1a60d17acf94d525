//! Staged enrichment pipeline.
//!
//! Items are processed one at a time. For each item the stages run in order;
//! within a stage every step runs concurrently and the stage only completes
//! once all of them have finished. A failing step is logged and the item
//! carries on to the next stage.

mod item;
mod stage;

pub use item::PipelineItem;
pub use stage::{Stage, Step};

use futures::future::join_all;
use museum_shared::StreamMessage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Ordered list of stages applied to every item.
pub struct Pipeline<T> {
    stages: Vec<Stage<T>>,
}

impl<T> Pipeline<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(stages: Vec<Stage<T>>) -> Self {
        Self { stages }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run every stage against `item`.
    ///
    /// Returns the number of steps that failed.
    pub async fn process_item(&self, ctx: &CancellationToken, item: &PipelineItem<T>) -> usize {
        let mut failures = 0;

        for (index, stage) in self.stages.iter().enumerate() {
            if stage.is_empty() {
                continue;
            }

            let results = join_all(stage.steps().iter().map(|step| async move {
                (step.name(), step.run(ctx, item).await)
            }))
            .await;

            for (name, result) in results {
                if let Err(e) = result {
                    failures += 1;
                    item.record_failure();
                    warn!(stage = index, step = %name, error = %e, "Step failed");
                }
            }

            debug!(stage = index, steps = stage.len(), "Stage completed");
        }

        failures
    }

    /// Drain `input` through the pipeline into `output`, preserving order.
    ///
    /// Error elements are forwarded untouched. `output` receives
    /// [`StreamMessage::End`] once `input` ends. Steps observe `ctx`; the
    /// pipeline itself runs until its input is exhausted.
    pub async fn process(
        &self,
        ctx: CancellationToken,
        mut input: mpsc::Receiver<StreamMessage<PipelineItem<T>>>,
        output: mpsc::Sender<StreamMessage<PipelineItem<T>>>,
    ) {
        let mut processed = 0usize;

        while let Some(message) = input.recv().await {
            let message = match message {
                StreamMessage::Item(item) => {
                    let failures = self.process_item(&ctx, &item).await;
                    processed += 1;
                    debug!(failures = failures, "Item processed");
                    StreamMessage::Item(item)
                }
                StreamMessage::Error(e) => StreamMessage::Error(e),
                StreamMessage::End => break,
            };

            if output.send(message).await.is_err() {
                warn!(processed = processed, "Pipeline output dropped, stopping");
                return;
            }
        }

        info!(processed = processed, "Pipeline input exhausted");
        let _ = output.send(StreamMessage::End).await;
    }
}
