use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationOp {
    #[default]
    None,
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl RelationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationOp::None => "",
            RelationOp::Equal => "=",
            RelationOp::Less => "<",
            RelationOp::LessEqual => "<=",
            RelationOp::Greater => ">",
            RelationOp::GreaterEqual => ">=",
        }
    }
}

/// A named reference to another package, e.g. `glibc>=2.40`
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub operator: RelationOp,
    pub version: String,
}

impl Relation {
    pub fn new(name: &str) -> Self {
        Relation {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Splits at the first `=`, `<` or `>`.
/// A `=` directly after `<` or `>` belongs to the operator.
impl From<&str> for Relation {
    fn from(s: &str) -> Self {
        let Some(pos) = s.find(['=', '<', '>']) else {
            return Relation::new(s);
        };
        let (name, rest) = s.split_at(pos);
        let bytes = rest.as_bytes();
        let (operator, len) = match (bytes[0], bytes.get(1)) {
            (b'<', Some(b'=')) => (RelationOp::LessEqual, 2),
            (b'>', Some(b'=')) => (RelationOp::GreaterEqual, 2),
            (b'<', _) => (RelationOp::Less, 1),
            (b'>', _) => (RelationOp::Greater, 1),
            _ => (RelationOp::Equal, 1),
        };

        Relation {
            name: name.to_string(),
            operator,
            version: rest[len..].to_string(),
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.name, self.operator.as_str(), self.version)
    }
}
