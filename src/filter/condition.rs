use jiff::{Timestamp, civil::Date, tz::TimeZone};

use crate::{
    error::{AppError, Result},
    filter::{Filter, FilterCondition},
    structs::{
        fieldtype::FieldType, filterquery::FilterQuery, package::PkgInfo, reason::Reason,
        relation::Relation,
    },
    utils::{parse_size, round_sig},
};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const SIZE_DIGITS: u32 = 3;

/// `start:end` with either side optional, or a single exact value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSelector<T> {
    pub start: Option<T>,
    pub end: Option<T>,
    pub is_exact: bool,
}

pub fn compile(query: &FilterQuery, tz: &TimeZone) -> Result<FilterCondition> {
    let value = query.query.as_str();
    match query.field {
        FieldType::Reason => reason_condition(value),
        FieldType::Size => size_condition(value),
        FieldType::Date => date_condition(value, tz),
        FieldType::Name | FieldType::Arch | FieldType::License => {
            string_condition(query.field, value)
        }
        FieldType::Depends | FieldType::RequiredBy | FieldType::Provides | FieldType::Conflicts => {
            relation_condition(query.field, value)
        }
        other => Err(AppError::filter(other, "filtering by this field is not supported")),
    }
}

pub fn parse_range<T: PartialOrd>(
    input: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> std::result::Result<RangeSelector<T>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty query".to_string());
    }
    if input == ":" {
        return Err("':' must be accompanied by a value".to_string());
    }
    let parse_side = |side: &str| -> std::result::Result<Option<T>, String> {
        let side = side.trim();
        if side.is_empty() {
            return Ok(None);
        }
        parse(side)
            .map(Some)
            .ok_or_else(|| format!("invalid value {side:?}"))
    };

    let selector = match input.split_once(':') {
        None => RangeSelector {
            start: parse_side(input)?,
            end: None,
            is_exact: true,
        },
        Some((start, end)) => RangeSelector {
            start: parse_side(start)?,
            end: parse_side(end)?,
            is_exact: false,
        },
    };

    if let (Some(start), Some(end)) = (&selector.start, &selector.end) {
        if start > end {
            return Err("start of range is after its end".to_string());
        }
    }
    Ok(selector)
}

fn reason_condition(value: &str) -> Result<FilterCondition> {
    let reason: Reason = value.trim().parse()?;
    Ok(FilterCondition::new(
        FieldType::Reason,
        Box::new(move |pkg| pkg.reason == reason),
    ))
}

fn size_condition(value: &str) -> Result<FilterCondition> {
    let range = parse_range(value, parse_size).map_err(|e| AppError::filter(FieldType::Size, e))?;
    let start = range.start.map(|s| round_sig(s, SIZE_DIGITS));
    let end = range.end.map(|e| round_sig(e, SIZE_DIGITS));

    let filter: Filter = if range.is_exact {
        Box::new(move |pkg| Some(round_sig(pkg.size, SIZE_DIGITS)) == start)
    } else {
        Box::new(move |pkg| {
            let size = round_sig(pkg.size, SIZE_DIGITS);
            start.is_none_or(|s| size >= s) && end.is_none_or(|e| size <= e)
        })
    };
    Ok(FilterCondition::new(FieldType::Size, filter))
}

fn date_condition(value: &str, tz: &TimeZone) -> Result<FilterCondition> {
    let range = parse_range(value, |s| s.parse::<Date>().ok())
        .map_err(|e| AppError::filter(FieldType::Date, e))?;
    let tz = tz.clone();

    if range.is_exact {
        let Some(date) = range.start else {
            return Err(AppError::filter(FieldType::Date, "missing date"));
        };
        let day = (date.year(), date.day_of_year());
        return Ok(FilterCondition::new(
            FieldType::Date,
            Box::new(move |pkg| {
                Timestamp::from_second(pkg.timestamp)
                    .map(|ts| tz.to_datetime(ts))
                    .is_ok_and(|dt| (dt.year(), dt.day_of_year()) == day)
            }),
        ));
    }

    let start_of_day = |date: Date| -> Result<i64> {
        date.to_zoned(tz.clone())
            .map(|z| z.timestamp().as_second())
            .map_err(|e| AppError::filter(FieldType::Date, e))
    };
    let start = range.start.map(start_of_day).transpose()?;
    //the whole end day is included
    let end = range
        .end
        .map(start_of_day)
        .transpose()?
        .map(|e| e + SECONDS_PER_DAY);

    Ok(FilterCondition::new(
        FieldType::Date,
        Box::new(move |pkg| {
            start.is_none_or(|s| pkg.timestamp >= s) && end.is_none_or(|e| pkg.timestamp <= e)
        }),
    ))
}

fn parse_targets(field: FieldType, value: &str) -> Result<Vec<String>> {
    let targets: Vec<String> = value
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if targets.is_empty() {
        return Err(AppError::filter(field, "empty target list"));
    }
    Ok(targets)
}

fn string_condition(field: FieldType, value: &str) -> Result<FilterCondition> {
    let targets = parse_targets(field, value)?;
    let select: fn(&PkgInfo) -> &str = match field {
        FieldType::Name => |pkg| pkg.name.as_str(),
        FieldType::Arch => |pkg| pkg.arch.as_str(),
        FieldType::License => |pkg| pkg.license.as_str(),
        other => return Err(AppError::filter(other, "not a text field")),
    };
    Ok(FilterCondition::new(
        field,
        Box::new(move |pkg| {
            let value = select(pkg).to_lowercase();
            targets.iter().any(|t| value.contains(t.as_str()))
        }),
    ))
}

fn relation_condition(field: FieldType, value: &str) -> Result<FilterCondition> {
    let targets = parse_targets(field, value)?;
    let select: fn(&PkgInfo) -> &[Relation] = match field {
        FieldType::Depends => |pkg| pkg.depends.as_slice(),
        FieldType::RequiredBy => |pkg| pkg.required_by.as_slice(),
        FieldType::Provides => |pkg| pkg.provides.as_slice(),
        FieldType::Conflicts => |pkg| pkg.conflicts.as_slice(),
        other => return Err(AppError::filter(other, "not a relation field")),
    };
    Ok(FilterCondition::new(
        field,
        Box::new(move |pkg| {
            select(pkg).iter().any(|rel| {
                let name = rel.name.to_lowercase();
                targets.iter().any(|t| *t == name)
            })
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn compile_one(field: FieldType, query: &str) -> Result<FilterCondition> {
        compile(&FilterQuery::new(field, query), &TimeZone::UTC)
    }

    fn sized(size: u64) -> PkgInfo {
        PkgInfo {
            name: "sized".to_string(),
            size,
            ..Default::default()
        }
    }

    fn dated(timestamp: i64) -> PkgInfo {
        PkgInfo {
            name: "dated".to_string(),
            timestamp,
            ..Default::default()
        }
    }

    //2024-03-10T00:00:00Z
    const MARCH_10: i64 = 1_710_028_800;

    #[test]
    fn test_parse_range() {
        let parse = |s: &str| s.parse::<u64>().ok();
        assert_eq!(
            parse_range("5", parse).unwrap(),
            RangeSelector {
                start: Some(5),
                end: None,
                is_exact: true
            }
        );
        assert_eq!(
            parse_range("5:", parse).unwrap(),
            RangeSelector {
                start: Some(5),
                end: None,
                is_exact: false
            }
        );
        assert_eq!(
            parse_range(":7", parse).unwrap(),
            RangeSelector {
                start: None,
                end: Some(7),
                is_exact: false
            }
        );
        assert!(parse_range(":", parse).is_err());
        assert!(parse_range("", parse).is_err());
        assert!(parse_range("x:7", parse).is_err());
        assert!(parse_range("9:7", parse).is_err());
        assert!(parse_range("1:2:3", parse).is_err());
    }

    #[test]
    fn test_size_exact_tolerates_unit_rounding() {
        let cond = compile_one(FieldType::Size, "1MB").unwrap();
        //1MB = 1_048_576 -> 1_050_000
        assert!(cond.matches(&sized(1_048_576)));
        assert!(cond.matches(&sized(1_049_999)));
        assert!(cond.matches(&sized(1_045_000)));
        assert!(!cond.matches(&sized(1_044_999)));
        assert!(!cond.matches(&sized(1_000_000)));
    }

    #[test]
    fn test_size_ranges() {
        let cond = compile_one(FieldType::Size, "1KB:2KB").unwrap();
        assert!(cond.matches(&sized(1024)));
        assert!(cond.matches(&sized(2048)));
        assert!(cond.matches(&sized(2049)));
        assert!(!cond.matches(&sized(3000)));
        assert!(!cond.matches(&sized(500)));

        let cond = compile_one(FieldType::Size, "10MB:").unwrap();
        assert!(cond.matches(&sized(u64::MAX)));
        assert!(!cond.matches(&sized(1024)));

        let cond = compile_one(FieldType::Size, ":1kb").unwrap();
        assert!(cond.matches(&sized(0)));
        assert!(!cond.matches(&sized(5000)));
    }

    #[test]
    fn test_size_errors() {
        for bad in [":", "ten", "5TB", "2MB:1MB", ""] {
            assert!(
                matches!(compile_one(FieldType::Size, bad), Err(AppError::Filter { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_exact_date_matches_whole_day() {
        let cond = compile_one(FieldType::Date, "2024-03-10").unwrap();
        assert!(cond.matches(&dated(MARCH_10)));
        assert!(cond.matches(&dated(MARCH_10 + SECONDS_PER_DAY - 1)));
        assert!(!cond.matches(&dated(MARCH_10 - 1)));
        assert!(!cond.matches(&dated(MARCH_10 + SECONDS_PER_DAY)));
        //same day of year, different year
        assert!(!cond.matches(&dated(MARCH_10 - 366 * SECONDS_PER_DAY)));
    }

    #[test]
    fn test_date_range_includes_end_day() {
        let cond = compile_one(FieldType::Date, "2024-03-01:2024-03-10").unwrap();
        let end = MARCH_10 + SECONDS_PER_DAY;
        assert!(cond.matches(&dated(MARCH_10)));
        assert!(cond.matches(&dated(end)));
        assert!(!cond.matches(&dated(end + 1)));
        assert!(cond.matches(&dated(MARCH_10 - 9 * SECONDS_PER_DAY)));
        assert!(!cond.matches(&dated(MARCH_10 - 9 * SECONDS_PER_DAY - 1)));

        let cond = compile_one(FieldType::Date, "2024-03-10:").unwrap();
        assert!(cond.matches(&dated(i64::from(i32::MAX))));
        assert!(!cond.matches(&dated(MARCH_10 - 1)));

        let cond = compile_one(FieldType::Date, ":2024-03-10").unwrap();
        assert!(cond.matches(&dated(0)));
        assert!(!cond.matches(&dated(end + 1)));
    }

    #[test]
    fn test_date_uses_time_zone() {
        //01:00 on the 10th in UTC is still the 9th at UTC-5
        let tz = TimeZone::fixed(jiff::tz::offset(-5));
        let cond = compile(&FilterQuery::new(FieldType::Date, "2024-03-09"), &tz).unwrap();
        assert!(cond.matches(&dated(MARCH_10 + 3600)));
    }

    #[test]
    fn test_date_errors() {
        for bad in [":", "2024-13-01", "yesterday", "2024-03-10:2024-03-01", "2024/03/10"] {
            assert!(
                matches!(compile_one(FieldType::Date, bad), Err(AppError::Filter { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_string_conditions() {
        let pkg = PkgInfo {
            name: "Python-Requests".to_string(),
            arch: "any".to_string(),
            license: "Apache-2.0".to_string(),
            ..Default::default()
        };
        assert!(compile_one(FieldType::Name, "requests").unwrap().matches(&pkg));
        assert!(compile_one(FieldType::Name, "rust, PYTHON").unwrap().matches(&pkg));
        assert!(!compile_one(FieldType::Name, "rust,go").unwrap().matches(&pkg));
        assert!(compile_one(FieldType::Arch, "x86_64,any").unwrap().matches(&pkg));
        assert!(compile_one(FieldType::License, "apache").unwrap().matches(&pkg));
        assert!(compile_one(FieldType::Name, " , ").is_err());
    }

    #[test]
    fn test_relation_conditions_match_whole_names() {
        let pkg = PkgInfo {
            name: "bash".to_string(),
            depends: vec![Relation::from("glibc>=2.40"), Relation::new("readline")],
            provides: vec![Relation::from("sh=5")],
            required_by: vec![Relation::new("base")],
            ..Default::default()
        };
        assert!(compile_one(FieldType::Depends, "GLIBC").unwrap().matches(&pkg));
        assert!(!compile_one(FieldType::Depends, "glib").unwrap().matches(&pkg));
        assert!(compile_one(FieldType::Provides, "zsh,sh").unwrap().matches(&pkg));
        assert!(compile_one(FieldType::RequiredBy, "base").unwrap().matches(&pkg));
        assert!(!compile_one(FieldType::Conflicts, "anything").unwrap().matches(&pkg));
    }

    #[test]
    fn test_reason_condition() {
        let dep = PkgInfo {
            reason: Reason::Dependency,
            ..Default::default()
        };
        assert!(compile_one(FieldType::Reason, "dependency").unwrap().matches(&dep));
        assert!(!compile_one(FieldType::Reason, "explicit").unwrap().matches(&dep));
        assert!(compile_one(FieldType::Reason, "orphan").is_err());
    }

    #[test]
    fn test_unsupported_fields() {
        for field in [FieldType::Version, FieldType::Url, FieldType::Description] {
            assert!(matches!(
                compile_one(field, "x"),
                Err(AppError::Filter { .. })
            ));
        }
    }

    proptest! {
        #[test]
        fn prop_exact_size_is_rounded_equality(size in 0u64..1 << 40, query in 0u64..1 << 40) {
            let cond = compile_one(FieldType::Size, &query.to_string()).unwrap();
            prop_assert_eq!(
                cond.matches(&sized(size)),
                round_sig(size, 3) == round_sig(query, 3)
            );
        }
    }
}
