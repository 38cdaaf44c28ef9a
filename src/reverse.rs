use std::{collections::HashMap, time::Instant};

use tracing::debug;

use crate::structs::{package::PkgInfo, relation::Relation};

/// Fill in `required_by` for every package from everybody else's `depends`.
/// Dependencies on virtual names are resolved through `provides`; when several
/// packages provide the same name the last one wins.
pub fn calculate_reverse_dependencies(packages: &mut [PkgInfo]) {
    let start = Instant::now();

    let mut required_by = {
        //provided name -> providing package
        let mut provides: HashMap<&str, &str> = HashMap::new();
        for pkg in packages.iter() {
            for provided in &pkg.provides {
                provides.insert(&provided.name, &pkg.name);
            }
        }

        let mut required_by: HashMap<String, Vec<Relation>> = HashMap::new();
        for pkg in packages.iter() {
            for dep in &pkg.depends {
                let target = provides
                    .get(dep.name.as_str())
                    .copied()
                    .unwrap_or(dep.name.as_str());
                if target == pkg.name {
                    continue;
                }
                let list = required_by.entry(target.to_string()).or_default();
                //one package can reach the same target through several names
                if list.last().is_some_and(|r| r.name == pkg.name) {
                    continue;
                }
                list.push(Relation::new(&pkg.name));
            }
        }
        required_by
    };

    for pkg in packages.iter_mut() {
        pkg.required_by = required_by.remove(&pkg.name).unwrap_or_default();
    }

    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "calculated reverse dependencies"
    );
}
