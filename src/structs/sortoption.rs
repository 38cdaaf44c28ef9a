use std::str::FromStr;

use crate::{error::AppError, structs::fieldtype::FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOption {
    pub field: FieldType,
    pub ascending: bool,
}

impl Default for SortOption {
    fn default() -> Self {
        SortOption {
            field: FieldType::Date,
            ascending: true,
        }
    }
}

/// `field` or `field:asc` / `field:desc`
impl FromStr for SortOption {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.split_once(':').unwrap_or((s, "asc"));
        let field: FieldType = field.parse()?;
        if !field.is_sortable() {
            return Err(AppError::Sort(format!("cannot sort by '{field}'")));
        }
        let ascending = match direction.trim().to_lowercase().as_str() {
            "asc" => true,
            "desc" => false,
            other => {
                return Err(AppError::Sort(format!(
                    "direction must be 'asc' or 'desc', got '{other}'"
                )));
            }
        };
        Ok(SortOption { field, ascending })
    }
}
