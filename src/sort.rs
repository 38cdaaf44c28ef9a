use std::{cmp::Ordering, thread, time::Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    error::{AppError, Result},
    structs::{
        fieldtype::FieldType, package::PkgInfo, progress::ProgressReporter,
        sortoption::SortOption,
    },
};

/// Below this a single threaded sort wins
pub const CONCURRENT_SORT_THRESHOLD: usize = 500;
pub const MIN_CHUNK_SIZE: usize = 100;

const SORT_PHASE: &str = "Sorting packages";

pub type Comparator = fn(&PkgInfo, &PkgInfo) -> Ordering;

pub fn comparator(field: FieldType) -> Result<Comparator> {
    let compare: Comparator = match field {
        FieldType::Date => |a, b| a.timestamp.cmp(&b.timestamp),
        FieldType::Size => |a, b| a.size.cmp(&b.size),
        FieldType::Name => |a, b| cmp_ignore_case(&a.name, &b.name),
        FieldType::Version => |a, b| cmp_ignore_case(&a.version, &b.version),
        FieldType::License => |a, b| cmp_ignore_case(&a.license, &b.license),
        other => return Err(AppError::Sort(format!("cannot sort by '{other}'"))),
    };
    Ok(compare)
}

pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

pub fn sort_packages<'a>(
    packages: Vec<&'a PkgInfo>,
    option: SortOption,
    progress: &ProgressReporter,
) -> Result<Vec<&'a PkgInfo>> {
    sort_packages_with(packages, option, num_cpus::get(), progress)
}

/// Stable sort by one field.
/// Large inputs are sorted in parallel chunks and merged.
pub fn sort_packages_with<'a>(
    packages: Vec<&'a PkgInfo>,
    option: SortOption,
    cpus: usize,
    progress: &ProgressReporter,
) -> Result<Vec<&'a PkgInfo>> {
    let start = Instant::now();
    let compare = comparator(option.field)?;
    let ascending = option.ascending;
    let cmp = move |a: &&PkgInfo, b: &&PkgInfo| {
        if ascending {
            compare(a, b)
        } else {
            compare(b, a)
        }
    };

    let len = packages.len();
    let sorted = if len < CONCURRENT_SORT_THRESHOLD {
        sort_normally(packages, &cmp, SORT_PHASE, progress)
    } else {
        sort_concurrently(packages, &cmp, cpus, SORT_PHASE, progress)
    };

    debug!(
        packages = len,
        field = %option.field,
        ascending,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "sorted packages"
    );
    Ok(sorted)
}

pub fn sort_normally<T>(
    mut items: Vec<T>,
    cmp: &(dyn Fn(&T, &T) -> Ordering + Sync),
    phase: &str,
    progress: &ProgressReporter,
) -> Vec<T> {
    items.sort_by(cmp);
    progress(100, 100, phase);
    items
}

/// Parallel chunked merge sort.
/// Progress runs 0-50 while chunks are sorted and 50-100 over the merge rounds.
pub fn sort_concurrently<T: Send>(
    items: Vec<T>,
    cmp: &(dyn Fn(&T, &T) -> Ordering + Sync),
    cpus: usize,
    phase: &str,
    progress: &ProgressReporter,
) -> Vec<T> {
    let chunk_size = (items.len() / (2 * cpus.max(1))).max(MIN_CHUNK_SIZE);
    let mut chunks: Vec<Vec<T>> = vec![];
    let mut rest = items.into_iter();
    loop {
        let chunk: Vec<T> = rest.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    let chunk_count = chunks.len();
    if chunk_count == 0 {
        progress(100, 100, phase);
        return vec![];
    }

    let completed = Mutex::new(Vec::with_capacity(chunk_count));
    thread::scope(|s| {
        for (index, mut chunk) in chunks.into_iter().enumerate() {
            let completed = &completed;
            s.spawn(move || {
                chunk.sort_by(cmp);
                let mut done = completed.lock();
                done.push((index, chunk));
                progress(done.len() * 50 / chunk_count, 100, phase);
            });
        }
    });

    //chunks finish in any order, merge them back in input order
    let mut completed = completed.into_inner();
    completed.sort_by_key(|(index, _)| *index);
    let mut chunks: Vec<Vec<T>> = completed.into_iter().map(|(_, chunk)| chunk).collect();

    let total_rounds = chunk_count.next_power_of_two().trailing_zeros() as usize;
    let mut round = 0;
    while chunks.len() > 1 {
        chunks = merge_round(chunks, cmp);
        round += 1;
        progress(50 + round * 50 / total_rounds, 100, phase);
    }
    if total_rounds == 0 {
        progress(100, 100, phase);
    }

    chunks.pop().unwrap_or_default()
}

//merges neighbours pairwise, an odd chunk out waits for the next round
fn merge_round<T: Send>(
    chunks: Vec<Vec<T>>,
    cmp: &(dyn Fn(&T, &T) -> Ordering + Sync),
) -> Vec<Vec<T>> {
    let mut pairs = vec![];
    let mut leftover = None;
    let mut it = chunks.into_iter();
    while let Some(left) = it.next() {
        match it.next() {
            Some(right) => pairs.push((left, right)),
            None => leftover = Some(left),
        }
    }

    let mut merged: Vec<Vec<T>> = thread::scope(|s| {
        let handles: Vec<_> = pairs
            .into_iter()
            .map(|(left, right)| s.spawn(move || merge(left, right, cmp)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("Thread error"))
            .collect()
    });
    merged.extend(leftover);
    merged
}

/// Ties are taken from the left so equal elements keep their order
fn merge<T>(left: Vec<T>, right: Vec<T>, cmp: &(dyn Fn(&T, &T) -> Ordering + Sync)) -> Vec<T> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        if take_right {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged
}
