use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

use crossbeam::channel::bounded;
use tracing::debug;

use crate::{
    error::{AppError, Result},
    structs::{package::PkgInfo, reason::Reason, relation::Relation},
};

const DESC_FILE: &str = "desc";
const MAX_WORKERS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Name,
    Version,
    Desc,
    Url,
    Arch,
    License,
    InstallDate,
    Size,
    Reason,
    Depends,
    Provides,
    Conflicts,
    Unknown,
}

impl Section {
    fn from_header(line: &str) -> Option<Section> {
        if line.len() < 3 || !line.starts_with('%') || !line.ends_with('%') {
            return None;
        }
        let section = match &line[1..line.len() - 1] {
            "NAME" => Section::Name,
            "VERSION" => Section::Version,
            "DESC" => Section::Desc,
            "URL" => Section::Url,
            "ARCH" => Section::Arch,
            "LICENSE" => Section::License,
            "INSTALLDATE" => Section::InstallDate,
            "SIZE" => Section::Size,
            "REASON" => Section::Reason,
            "DEPENDS" => Section::Depends,
            "PROVIDES" => Section::Provides,
            "CONFLICTS" => Section::Conflicts,
            _ => Section::Unknown,
        };
        Some(section)
    }

    //multi valued sections run until the next blank line
    fn is_multi(self) -> bool {
        matches!(
            self,
            Section::Depends | Section::Provides | Section::Conflicts | Section::Unknown
        )
    }
}

/// Number of parse workers for `jobs` descriptors on a machine with `cpus` cores
pub fn worker_count(cpus: usize, jobs: usize) -> usize {
    let workers = if cpus <= 2 { cpus } else { cpus * 2 };
    workers.min(MAX_WORKERS).min(jobs).max(1)
}

pub fn fetch_packages(db_path: &Path) -> Result<Vec<PkgInfo>> {
    fetch_packages_with(db_path, num_cpus::get())
}

/// Parse every descriptor under `db_path`.
/// Fails as a whole if any single descriptor fails.
pub fn fetch_packages_with(db_path: &Path, cpus: usize) -> Result<Vec<PkgInfo>> {
    let start = Instant::now();
    let desc_paths = desc_paths(db_path)?;
    let jobs = desc_paths.len();
    if jobs == 0 {
        return Ok(vec![]);
    }
    let workers = worker_count(cpus, jobs);

    let (path_tx, path_rx) = bounded::<PathBuf>(jobs);
    let (pkg_tx, pkg_rx) = bounded::<PkgInfo>(jobs);
    let (err_tx, err_rx) = bounded::<AppError>(jobs);

    //scope end is the join barrier for all workers
    thread::scope(|s| {
        for _ in 0..workers {
            let path_rx = path_rx.clone();
            let pkg_tx = pkg_tx.clone();
            let err_tx = err_tx.clone();
            s.spawn(move || {
                for path in path_rx {
                    match parse_desc_file(&path) {
                        Ok(pkg) => {
                            let _ = pkg_tx.send(pkg);
                        }
                        Err(e) => {
                            let _ = err_tx.send(e);
                        }
                    }
                }
            });
        }
        for path in desc_paths {
            let _ = path_tx.send(path);
        }
        drop(path_tx);
    });
    drop(pkg_tx);
    drop(err_tx);

    let errors: Vec<AppError> = err_rx.iter().collect();
    if !errors.is_empty() {
        return Err(AppError::Scan(errors));
    }

    let mut packages: Vec<PkgInfo> = pkg_rx.iter().collect();
    //workers finish in any order
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(
        packages = packages.len(),
        workers,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "scanned package database"
    );
    Ok(packages)
}

fn desc_paths(db_path: &Path) -> Result<Vec<PathBuf>> {
    let to_err = |source| AppError::Database {
        path: db_path.to_path_buf(),
        source,
    };
    let mut paths = vec![];
    for entry in fs::read_dir(db_path).map_err(to_err)? {
        let entry = entry.map_err(to_err)?;
        //skip ALPM_DB_VERSION and friends
        if entry.file_type().map_err(to_err)?.is_dir() {
            paths.push(entry.path().join(DESC_FILE));
        }
    }
    Ok(paths)
}

pub fn parse_desc_file(path: &Path) -> Result<PkgInfo> {
    let bytes = fs::read(path).map_err(|source| AppError::Descriptor {
        path: path.to_path_buf(),
        source,
    })?;
    //free text fields are not always UTF-8
    parse_desc(&String::from_utf8_lossy(&bytes), path)
}

pub fn parse_desc(text: &str, path: &Path) -> Result<PkgInfo> {
    let mut pkg = PkgInfo::default();
    let mut section: Option<Section> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if section.is_some_and(Section::is_multi) {
                section = None;
            }
            continue;
        }
        //a single valued section takes the next line as is, even one that looks like a header
        if let Some(current) = section.filter(|s| !s.is_multi()) {
            apply_field(&mut pkg, current, line, path)?;
            section = None;
            continue;
        }
        if let Some(header) = Section::from_header(line) {
            section = Some(header);
            continue;
        }
        if let Some(current) = section {
            apply_field(&mut pkg, current, line, path)?;
        }
    }

    if pkg.name.is_empty() {
        return Err(AppError::MissingName(path.to_path_buf()));
    }
    Ok(pkg)
}

fn apply_field(pkg: &mut PkgInfo, section: Section, value: &str, path: &Path) -> Result<()> {
    let invalid = |field| AppError::InvalidNumber {
        path: path.to_path_buf(),
        field,
        value: value.to_string(),
    };
    match section {
        Section::Name => pkg.name = value.to_string(),
        Section::Version => pkg.version = value.to_string(),
        Section::Desc => pkg.description = value.to_string(),
        Section::Url => pkg.url = value.to_string(),
        Section::Arch => pkg.arch = value.to_string(),
        Section::License => pkg.license = value.to_string(),
        Section::InstallDate => {
            pkg.timestamp = value.parse().map_err(|_| invalid("install date"))?
        }
        Section::Size => pkg.size = value.parse().map_err(|_| invalid("size"))?,
        Section::Reason => {
            pkg.reason = if value == "1" {
                Reason::Dependency
            } else {
                Reason::Explicit
            }
        }
        Section::Depends => pkg.depends.push(Relation::from(value)),
        Section::Provides => pkg.provides.push(Relation::from(value)),
        Section::Conflicts => pkg.conflicts.push(Relation::from(value)),
        Section::Unknown => {}
    }
    Ok(())
}
