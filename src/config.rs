use std::path::PathBuf;

use jiff::tz::TimeZone;

use crate::structs::{fieldtype::FieldType, filterquery::FilterQuery, sortoption::SortOption};

pub const PACMAN_DB_PATH: &str = "/var/lib/pacman/local";

/// Everything the core needs from the outside world.
/// Built by the binary from command line flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    //None disables the cache entirely
    pub cache_path: Option<PathBuf>,
    pub fields: Vec<FieldType>,
    pub filters: Vec<FilterQuery>,
    pub sort: SortOption,
    //keep only the last n rows after sorting
    pub limit: Option<usize>,
    //calendar used by date filters and date output
    pub time_zone: TimeZone,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(PACMAN_DB_PATH),
            cache_path: default_cache_path(),
            fields: FieldType::DEFAULT.to_vec(),
            filters: vec![],
            sort: SortOption::default(),
            limit: Some(20),
            time_zone: TimeZone::system(),
        }
    }
}

impl Config {
    /// Reverse dependencies are only worth computing when something will look at them
    pub fn needs_required_by(&self) -> bool {
        self.fields.contains(&FieldType::RequiredBy)
            || self.filters.iter().any(|f| f.field == FieldType::RequiredBy)
    }
}

pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("pachist").join("packages.cache"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_required_by() {
        let mut config = Config {
            cache_path: None,
            ..Default::default()
        };
        assert!(!config.needs_required_by());

        config.filters.push(FilterQuery::new(FieldType::RequiredBy, "glibc"));
        assert!(config.needs_required_by());

        config.filters.clear();
        config.fields.push(FieldType::RequiredBy);
        assert!(config.needs_required_by());
    }
}
