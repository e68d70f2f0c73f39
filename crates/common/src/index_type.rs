use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The closed set of index types a document can have, per `spec.md` §3.
///
/// A closed enum rather than a string: the original (`aperag`) represents
/// this as a Python string enum and passes per-type context as a
/// stringly-typed `{type}_version` dict key. We keep the closed vocabulary
/// but drop the stringly-typed context (see `model::TargetVersions`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexType {
    Vector,
    FullText,
    Graph,
    Summary,
    Vision,
}

impl IndexType {
    pub const ALL: [IndexType; 5] = [
        IndexType::Vector,
        IndexType::FullText,
        IndexType::Graph,
        IndexType::Summary,
        IndexType::Vision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Vector => "VECTOR",
            IndexType::FullText => "FULLTEXT",
            IndexType::Graph => "GRAPH",
            IndexType::Summary => "SUMMARY",
            IndexType::Vision => "VISION",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized index type {0:?}")]
pub struct ParseIndexTypeError(String);

impl FromStr for IndexType {
    type Err = ParseIndexTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VECTOR" => Ok(IndexType::Vector),
            "FULLTEXT" => Ok(IndexType::FullText),
            "GRAPH" => Ok(IndexType::Graph),
            "SUMMARY" => Ok(IndexType::Summary),
            "VISION" => Ok(IndexType::Vision),
            other => Err(ParseIndexTypeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        for ty in IndexType::ALL {
            assert_eq!(ty, ty.as_str().parse().unwrap());
        }
    }
}
