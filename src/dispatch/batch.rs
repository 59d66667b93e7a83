//! Batch rendering: one job per record on a bounded worker pool.
//!
//! Records are independent. Each gets its own [`RenderJob`] and its own
//! [`DispatchOutcome`]; a failed record never stops the others. Results come
//! back in input order.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::{DispatchOutcome, Dispatcher, PrintTarget, RenderJob};
use crate::binder::DataRecord;
use crate::template::Template;

/// Outcome for one record of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    /// Primary identifier of the record.
    pub reference: String,
    pub outcome: DispatchOutcome,
}

/// Dispatch `template` once per record with at most `workers` jobs in
/// flight (0 lets the pool decide).
///
/// Falls back to running sequentially if the pool cannot be created.
pub fn render_batch(
    dispatcher: &Dispatcher,
    template: &Template,
    records: &[DataRecord],
    copies: u32,
    target: &PrintTarget,
    workers: usize,
) -> Vec<BatchEntry> {
    let run = |record: &DataRecord| BatchEntry {
        reference: record.reference(template.kind),
        outcome: dispatcher.dispatch(&RenderJob {
            template,
            record,
            copies,
            target: target.clone(),
        }),
    };

    let entries: Vec<BatchEntry> = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| records.par_iter().map(run).collect()),
        Err(e) => {
            warn!(error = %e, "batch pool unavailable, rendering sequentially");
            records.iter().map(run).collect()
        }
    };

    let failed = entries.iter().filter(|e| !e.outcome.success).count();
    info!(records = entries.len(), failed, "batch complete");
    entries
}
