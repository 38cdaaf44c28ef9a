//! Streaming filter pipeline.
//!
//! Every condition runs on its own thread. Stages are chained by bounded
//! channels, so a later stage works on early batches while an earlier stage is
//! still producing, and a slow stage throttles the ones before it.

use std::{thread, time::Instant};

use crossbeam::channel::{Receiver, Sender, bounded};
use tracing::debug;

use crate::{
    filter::FilterCondition,
    structs::{package::PkgInfo, progress::ProgressReporter},
};

pub const BATCH_SIZE: usize = 20;

/// Keep the packages matching every condition, in their original order
pub fn filter_packages<'a>(
    packages: Vec<&'a PkgInfo>,
    conditions: &[FilterCondition],
    progress: &ProgressReporter,
) -> Vec<&'a PkgInfo> {
    if conditions.is_empty() {
        return packages;
    }
    let start = Instant::now();
    let input_len = packages.len();
    let total = conditions.len();

    let filtered: Vec<&'a PkgInfo> = thread::scope(|s| {
        let (input_tx, mut stage_rx) = bounded::<&'a PkgInfo>(BATCH_SIZE);
        s.spawn(move || {
            for pkg in packages {
                if input_tx.send(pkg).is_err() {
                    break;
                }
            }
        });

        //each stage's output is the next stage's input
        for (index, condition) in conditions.iter().enumerate() {
            let (output_tx, output_rx) = bounded(BATCH_SIZE);
            let input_rx = std::mem::replace(&mut stage_rx, output_rx);
            s.spawn(move || {
                run_stage(condition, input_rx, output_tx);
                progress(index + 1, total, condition.phase_name.as_str());
            });
        }

        stage_rx.iter().collect()
    });

    debug!(
        stages = total,
        input = input_len,
        output = filtered.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "filtered packages"
    );
    filtered
}

fn run_stage<'a>(
    condition: &FilterCondition,
    input: Receiver<&'a PkgInfo>,
    output: Sender<&'a PkgInfo>,
) {
    let mut batch = Vec::with_capacity(BATCH_SIZE);
    let mut drained = false;
    while !drained {
        while batch.len() < BATCH_SIZE {
            match input.recv() {
                Ok(pkg) => batch.push(pkg),
                Err(_) => {
                    drained = true;
                    break;
                }
            }
        }
        for pkg in batch.drain(..) {
            if condition.matches(pkg) && output.send(pkg).is_err() {
                return;
            }
        }
    }
}
