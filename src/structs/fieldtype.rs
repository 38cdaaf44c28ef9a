use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Every reportable field.
/// Declared in filter efficiency order: cheap scalar checks first, relation scans last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Reason,
    Arch,
    License,
    Name,
    Description,
    Url,
    Size,
    Date,
    Version,
    Depends,
    RequiredBy,
    Provides,
    Conflicts,
}

impl FieldType {
    pub const ALL: [FieldType; 13] = [
        FieldType::Date,
        FieldType::Name,
        FieldType::Reason,
        FieldType::Size,
        FieldType::Version,
        FieldType::Depends,
        FieldType::RequiredBy,
        FieldType::Provides,
        FieldType::Conflicts,
        FieldType::Arch,
        FieldType::License,
        FieldType::Url,
        FieldType::Description,
    ];

    pub const DEFAULT: [FieldType; 4] = [
        FieldType::Date,
        FieldType::Name,
        FieldType::Reason,
        FieldType::Size,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Reason => "reason",
            FieldType::Arch => "arch",
            FieldType::License => "license",
            FieldType::Name => "name",
            FieldType::Description => "description",
            FieldType::Url => "url",
            FieldType::Size => "size",
            FieldType::Date => "date",
            FieldType::Version => "version",
            FieldType::Depends => "depends",
            FieldType::RequiredBy => "required-by",
            FieldType::Provides => "provides",
            FieldType::Conflicts => "conflicts",
        }
    }

    pub fn is_sortable(&self) -> bool {
        matches!(
            self,
            FieldType::Date
                | FieldType::Size
                | FieldType::Name
                | FieldType::Version
                | FieldType::License
        )
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        //short aliases are case sensitive: 'd' is date, 'D' is depends
        let field = match s {
            "d" => FieldType::Date,
            "n" => FieldType::Name,
            "r" => FieldType::Reason,
            "s" => FieldType::Size,
            "v" => FieldType::Version,
            "D" => FieldType::Depends,
            "R" => FieldType::RequiredBy,
            "p" => FieldType::Provides,
            _ => {
                let lower = s.to_lowercase();
                FieldType::ALL
                    .into_iter()
                    .find(|f| f.name() == lower)
                    .ok_or_else(|| AppError::UnknownField(s.to_string()))?
            }
        };
        Ok(field)
    }
}
