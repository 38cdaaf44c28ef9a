use std::str::FromStr;

use crate::{error::AppError, structs::fieldtype::FieldType};

/// An uncompiled `field=query` filter as given by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub field: FieldType,
    pub query: String,
}

impl FilterQuery {
    pub fn new(field: FieldType, query: &str) -> Self {
        FilterQuery {
            field,
            query: query.to_string(),
        }
    }
}

impl FromStr for FilterQuery {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((field, query)) = s.split_once('=') else {
            return Err(AppError::filter(s, "expected <field>=<query>"));
        };
        Ok(FilterQuery::new(field.parse()?, query.trim()))
    }
}
