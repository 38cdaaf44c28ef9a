use std::path::PathBuf;

use clap::Parser;
use jiff::{Timestamp, tz::TimeZone};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pachist::{
    config::{Config, PACMAN_DB_PATH, default_cache_path},
    report::{Query, load_packages},
    structs::{
        fieldtype::FieldType, filterquery::FilterQuery, package::PkgInfo, relation::Relation,
        sortoption::SortOption,
    },
    utils::human_size,
};

#[derive(Parser, Debug)]
#[command(name = "pachist", version, about = "Show when pacman packages were installed")]
struct Cli {
    /// Number of packages to show
    #[arg(short = 'n', long = "number", default_value_t = 20)]
    number: usize,

    /// Show all packages (ignores -n)
    #[arg(short, long)]
    all: bool,

    /// Filter as FIELD=QUERY, repeatable. e.g. size=10MB: date=2024-01-01:2024-02-01 name=python
    #[arg(short = 'f', long = "filter", value_name = "FIELD=QUERY")]
    filters: Vec<FilterQuery>,

    /// Sort by FIELD[:asc|desc] (date, size, name, version, license)
    #[arg(short, long, default_value = "date")]
    sort: SortOption,

    /// Comma separated fields to show
    #[arg(short, long, value_delimiter = ',', conflicts_with_all = ["add_columns", "all_columns"])]
    columns: Option<Vec<FieldType>>,

    /// Comma separated fields to show on top of the defaults
    #[arg(long, value_delimiter = ',')]
    add_columns: Vec<FieldType>,

    /// Show every field
    #[arg(long)]
    all_columns: bool,

    /// Local package database
    #[arg(long, default_value = PACMAN_DB_PATH)]
    db: PathBuf,

    /// Cache file
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Always rescan the package database
    #[arg(long)]
    no_cache: bool,

    /// Use UTC instead of the local time zone
    #[arg(long)]
    utc: bool,

    /// Log what is going on to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let fields = match self.columns {
            Some(columns) => columns,
            None if self.all_columns => FieldType::ALL.to_vec(),
            None => {
                let mut fields = FieldType::DEFAULT.to_vec();
                for field in self.add_columns {
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                fields
            }
        };
        let cache_path = if self.no_cache {
            None
        } else {
            self.cache.or_else(default_cache_path)
        };
        Config {
            db_path: self.db,
            cache_path,
            fields,
            filters: self.filters,
            sort: self.sort,
            limit: (!self.all).then_some(self.number),
            time_zone: if self.utc {
                TimeZone::UTC
            } else {
                TimeZone::system()
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config();
    let query = match Query::compile(&config) {
        Ok(query) => query,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let dataset = load_packages(&config);
    let rows = query.apply(&dataset.packages, &|current, total, description| {
        debug!("{description}: {current}/{total}");
    })?;
    if rows.is_empty() {
        println!("No packages to display.");
        return Ok(());
    }

    print_table(&rows, &config.fields, &config.time_zone);
    Ok(())
}

fn print_table(rows: &[&PkgInfo], fields: &[FieldType], tz: &TimeZone) {
    let header: Vec<String> = fields.iter().map(|f| f.name().to_uppercase()).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|pkg| fields.iter().map(|f| field_value(pkg, *f, tz)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for row in std::iter::once(&header).chain(cells.iter()) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line.trim_end());
    }
}

fn field_value(pkg: &PkgInfo, field: FieldType, tz: &TimeZone) -> String {
    let value = match field {
        FieldType::Date => Timestamp::from_second(pkg.timestamp)
            .map(|ts| tz.to_datetime(ts).strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        FieldType::Size => human_size(pkg.size),
        FieldType::Name => pkg.name.clone(),
        FieldType::Reason => pkg.reason.to_string(),
        FieldType::Version => pkg.version.clone(),
        FieldType::Arch => pkg.arch.clone(),
        FieldType::License => pkg.license.clone(),
        FieldType::Url => pkg.url.clone(),
        FieldType::Description => pkg.description.clone(),
        FieldType::Depends => join_relations(&pkg.depends),
        FieldType::RequiredBy => join_relations(&pkg.required_by),
        FieldType::Provides => join_relations(&pkg.provides),
        FieldType::Conflicts => join_relations(&pkg.conflicts),
    };
    if value.is_empty() { "-".to_string() } else { value }
}

fn join_relations(relations: &[Relation]) -> String {
    relations
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
