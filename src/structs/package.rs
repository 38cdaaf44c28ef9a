use serde::{Deserialize, Serialize};

use crate::structs::{reason::Reason, relation::Relation};

/// One installed package, as read from its `desc` file
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PkgInfo {
    //seconds since epoch
    pub timestamp: i64,
    //bytes
    pub size: u64,
    pub name: String,
    pub reason: Reason,
    pub version: String,
    pub arch: String,
    pub license: String,
    pub url: String,
    pub description: String,

    pub depends: Vec<Relation>,
    pub required_by: Vec<Relation>,
    pub provides: Vec<Relation>,
    pub conflicts: Vec<Relation>,
}
