pub mod condition;
pub mod pipeline;

use std::fmt::Debug;

use jiff::tz::TimeZone;

use crate::{
    error::Result,
    structs::{fieldtype::FieldType, filterquery::FilterQuery, package::PkgInfo},
};

pub use pipeline::filter_packages;

pub type Filter = Box<dyn Fn(&PkgInfo) -> bool + Send + Sync>;

/// One compiled predicate, run as one stage of the filter pipeline
pub struct FilterCondition {
    pub field: FieldType,
    pub phase_name: String,
    filter: Filter,
}

impl FilterCondition {
    pub fn new(field: FieldType, filter: Filter) -> Self {
        Self {
            field,
            phase_name: format!("Filtering by {field}"),
            filter,
        }
    }

    pub fn matches(&self, pkg: &PkgInfo) -> bool {
        (self.filter)(pkg)
    }
}

impl Debug for FilterCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCondition")
            .field("field", &self.field)
            .field("phase_name", &self.phase_name)
            .finish_non_exhaustive()
    }
}

/// Compile every query, failing on the first bad one.
/// The result is ordered cheapest field first so early stages shed the most work.
pub fn compile_conditions(queries: &[FilterQuery], tz: &TimeZone) -> Result<Vec<FilterCondition>> {
    let mut conditions = queries
        .iter()
        .map(|q| condition::compile(q, tz))
        .collect::<Result<Vec<_>>>()?;
    conditions.sort_by_key(|c| c.field);
    Ok(conditions)
}
