//! Persistent snapshot of the parsed package database.
//!
//! The snapshot records the database directory's mtime when it was taken. Any
//! install or removal touches that directory, so a newer mtime means the
//! snapshot is stale. A format version guards against layout changes.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{AppError, Result},
    structs::package::PkgInfo,
};

/// Bump whenever `PkgInfo` or the layout below changes
pub const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CachedPackages<P> {
    version: u32,
    last_modified: i64,
    packages: P,
}

#[derive(Debug, Clone)]
pub struct PackageCache {
    cache_path: PathBuf,
    db_path: PathBuf,
}

impl PackageCache {
    pub fn new(cache_path: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    pub fn save(&self, packages: &[PkgInfo]) -> Result<()> {
        if packages.is_empty() {
            debug!("nothing to cache");
            return Ok(());
        }
        let write_err = |reason: String| AppError::CacheWrite {
            path: self.cache_path.clone(),
            reason,
        };

        let last_modified = db_mod_time(&self.db_path).map_err(|e| write_err(e.to_string()))?;
        let cached = CachedPackages {
            version: CACHE_VERSION,
            last_modified,
            packages,
        };

        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let file = File::create(&self.cache_path).map_err(|e| write_err(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &cached).map_err(|e| write_err(e.to_string()))?;
        writer.flush().map_err(|e| write_err(e.to_string()))?;

        debug!(path = %self.cache_path.display(), packages = packages.len(), "saved cache");
        Ok(())
    }

    /// Any failure here is a cache miss, never fatal
    pub fn load(&self) -> Result<Vec<PkgInfo>> {
        let bytes = fs::read(&self.cache_path)
            .map_err(|e| AppError::CacheMiss(format!("unreadable cache file: {e}")))?;
        let cached: CachedPackages<Vec<PkgInfo>> = bincode::deserialize(&bytes)
            .map_err(|e| AppError::CacheMiss(format!("corrupt cache file: {e}")))?;

        if cached.version != CACHE_VERSION {
            return Err(AppError::CacheMiss(format!(
                "cache version {} does not match {CACHE_VERSION}",
                cached.version
            )));
        }

        let db_modified = db_mod_time(&self.db_path)
            .map_err(|e| AppError::CacheMiss(format!("cannot stat package database: {e}")))?;
        if db_modified > cached.last_modified {
            return Err(AppError::CacheMiss("cache is stale".to_string()));
        }

        debug!(path = %self.cache_path.display(), packages = cached.packages.len(), "loaded cache");
        Ok(cached.packages)
    }
}

fn db_mod_time(db_path: &Path) -> std::io::Result<i64> {
    let modified = fs::metadata(db_path)?.modified()?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{reason::Reason, relation::Relation};
    use filetime::FileTime;
    use proptest::prelude::*;

    fn sample() -> Vec<PkgInfo> {
        vec![
            PkgInfo {
                timestamp: 1_700_000_000,
                size: 1000,
                name: "glibc".to_string(),
                version: "2.40-1".to_string(),
                arch: "x86_64".to_string(),
                license: "GPL-2.0-or-later".to_string(),
                required_by: vec![Relation::new("bash")],
                provides: vec![Relation::from("libc.so=6-64")],
                ..Default::default()
            },
            PkgInfo {
                timestamp: 1_700_000_100,
                size: 2000,
                name: "bash".to_string(),
                reason: Reason::Dependency,
                depends: vec![Relation::from("glibc>=2.40"), Relation::new("readline")],
                conflicts: vec![Relation::from("sh<1")],
                ..Default::default()
            },
        ]
    }

    fn setup() -> (tempfile::TempDir, PackageCache) {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("local");
        fs::create_dir(&db).unwrap();
        filetime::set_file_mtime(&db, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
        let cache = PackageCache::new(dir.path().join("cache").join("packages.cache"), db);
        (dir, cache)
    }

    #[test]
    fn test_round_trip() {
        let (_dir, cache) = setup();
        let packages = sample();
        cache.save(&packages).unwrap();
        assert!(cache.path().exists());
        assert_eq!(cache.load().unwrap(), packages);
    }

    #[test]
    fn test_stale_cache_is_a_miss() {
        let (dir, cache) = setup();
        cache.save(&sample()).unwrap();
        filetime::set_file_mtime(
            dir.path().join("local"),
            FileTime::from_unix_time(1_700_000_001, 0),
        )
        .unwrap();
        assert!(matches!(cache.load(), Err(AppError::CacheMiss(_))));
    }

    #[test]
    fn test_older_db_mtime_is_still_fresh() {
        let (dir, cache) = setup();
        cache.save(&sample()).unwrap();
        filetime::set_file_mtime(
            dir.path().join("local"),
            FileTime::from_unix_time(1_600_000_000, 0),
        )
        .unwrap();
        assert_eq!(cache.load().unwrap().len(), 2);
    }

    #[test]
    fn test_version_mismatch_is_a_miss() {
        let (_dir, cache) = setup();
        let cached = CachedPackages {
            version: CACHE_VERSION + 1,
            last_modified: i64::MAX,
            packages: sample(),
        };
        fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        fs::write(cache.path(), bincode::serialize(&cached).unwrap()).unwrap();
        match cache.load() {
            Err(AppError::CacheMiss(reason)) => assert!(reason.contains("version")),
            other => panic!("expected miss, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_corrupt_files_are_misses() {
        let (_dir, cache) = setup();
        assert!(matches!(cache.load(), Err(AppError::CacheMiss(_))));

        fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        fs::write(cache.path(), b"\x01\x00not a cache").unwrap();
        assert!(matches!(cache.load(), Err(AppError::CacheMiss(_))));
    }

    #[test]
    fn test_empty_set_is_not_written() {
        let (_dir, cache) = setup();
        cache.save(&[]).unwrap();
        assert!(!cache.path().exists());
    }

    fn relations() -> impl Strategy<Value = Vec<Relation>> {
        prop::collection::vec("[a-z][a-z0-9.-]{0,8}([<>]?=?[0-9][0-9.-]{0,4})?", 0..4)
            .prop_map(|names| names.iter().map(|n| Relation::from(n.as_str())).collect())
    }

    fn package() -> impl Strategy<Value = PkgInfo> {
        (
            (any::<i64>(), any::<u64>(), "[a-z][a-z0-9-]{0,12}", any::<bool>()),
            (".{0,10}", "\\PC{0,20}"),
            (relations(), relations(), relations(), relations()),
        )
            .prop_map(
                |((timestamp, size, name, dependency), (version, description), rels)| PkgInfo {
                    timestamp,
                    size,
                    name,
                    reason: if dependency {
                        Reason::Dependency
                    } else {
                        Reason::Explicit
                    },
                    version,
                    description,
                    depends: rels.0,
                    required_by: rels.1,
                    provides: rels.2,
                    conflicts: rels.3,
                    ..Default::default()
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_round_trip_any_package_set(packages in prop::collection::vec(package(), 1..20)) {
            let (_dir, cache) = setup();
            cache.save(&packages).unwrap();
            prop_assert_eq!(cache.load().unwrap(), packages);
        }
    }
}
