use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::AppError, structs::fieldtype::FieldType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    #[default]
    Explicit,
    Dependency,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Explicit => "explicit",
            Reason::Dependency => "dependency",
        }
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explicit" => Ok(Reason::Explicit),
            "dependency" => Ok(Reason::Dependency),
            _ => Err(AppError::filter(
                FieldType::Reason,
                format!("install reason must be 'explicit' or 'dependency', got '{s}'"),
            )),
        }
    }
}
