//! Glue between the parts: where the packages come from, and how a user query
//! narrows and orders them.

use tracing::{debug, warn};

use crate::{
    cache::PackageCache,
    config::Config,
    error::Result,
    filter::{FilterCondition, compile_conditions, filter_packages},
    pman::fetch_packages,
    reverse::calculate_reverse_dependencies,
    sort::{comparator, sort_packages},
    structs::{package::PkgInfo, progress::ProgressReporter, sortoption::SortOption},
};

#[derive(Debug, Default)]
pub struct Dataset {
    pub packages: Vec<PkgInfo>,
    pub from_cache: bool,
}

/// Cache first, full scan on a miss.
/// A failed scan is logged and gives an empty dataset.
pub fn load_packages(config: &Config) -> Dataset {
    let cache = config
        .cache_path
        .as_ref()
        .map(|path| PackageCache::new(path, &config.db_path));

    let cached = cache.as_ref().and_then(|cache| match cache.load() {
        Ok(packages) => Some(packages),
        Err(e) => {
            debug!("{e}, rescanning");
            None
        }
    });

    let (mut packages, from_cache) = match cached {
        Some(packages) => (packages, true),
        None => match fetch_packages(&config.db_path) {
            Ok(packages) => (packages, false),
            Err(e) => {
                warn!("Package database could not be read, no packages to report:\n{e}");
                return Dataset::default();
            }
        },
    };

    if config.needs_required_by() {
        calculate_reverse_dependencies(&mut packages);
    }

    if !from_cache {
        if let Some(cache) = &cache {
            if let Err(e) = cache.save(&packages) {
                warn!("{e}");
            }
        }
    }

    Dataset {
        packages,
        from_cache,
    }
}

/// A compiled filter and sort request
#[derive(Debug)]
pub struct Query {
    conditions: Vec<FilterCondition>,
    sort: SortOption,
    limit: Option<usize>,
}

impl Query {
    /// Everything that can be wrong with the query fails here, before any work is done
    pub fn compile(config: &Config) -> Result<Self> {
        let conditions = compile_conditions(&config.filters, &config.time_zone)?;
        comparator(config.sort.field)?;
        Ok(Self {
            conditions,
            sort: config.sort,
            limit: config.limit,
        })
    }

    /// Filter, sort, then keep the last `limit` rows
    pub fn apply<'a>(
        &self,
        packages: &'a [PkgInfo],
        progress: &ProgressReporter,
    ) -> Result<Vec<&'a PkgInfo>> {
        let filtered = filter_packages(packages.iter().collect(), &self.conditions, progress);
        let mut sorted = sort_packages(filtered, self.sort, progress)?;
        if let Some(limit) = self.limit {
            let cut = sorted.len().saturating_sub(limit);
            sorted.drain(..cut);
        }
        Ok(sorted)
    }
}
