use std::fmt;


/// Everything that can abort an optimization run.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOptError {
    /// A table source could not be opened or a cell was not a number.
    TableRead {
        path: String,
        reason: String,
    },
    /// A matrix or table did not have the shape the caller asked for.
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    MissingNodeProbabilities {
        node: usize,
    },
    /// A probability or fitness vector that cannot be normalized.
    DegenerateDistribution {
        what: String,
    },
    NoViableContinuation {
        walk_len: usize,
        destination: usize,
    },
    StalledWalk {
        node: usize,
        attempts: usize,
    },
    InvalidParameter {
        name: String,
        reason: String,
    },
    Config {
        key: String,
        reason: String,
    },
}

impl RouteOptError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> RouteOptError {
        RouteOptError::InvalidParameter {
            name: String::from(name),
            reason: reason.into(),
        }
    }

    pub fn degenerate(what: impl Into<String>) -> RouteOptError {
        RouteOptError::DegenerateDistribution { what: what.into() }
    }

    pub fn config(key: &str, reason: impl Into<String>) -> RouteOptError {
        RouteOptError::Config {
            key: String::from(key),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RouteOptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteOptError::TableRead { path, reason } => {
                write!(f, "Failed to read table '{}': {}", path, reason)
            }
            RouteOptError::ShapeMismatch { expected, found } => write!(
                f,
                "Incorrect shape: expected ({}, {}) but got ({}, {}) instead",
                expected.0, expected.1, found.0, found.1
            ),
            RouteOptError::MissingNodeProbabilities { node } => {
                write!(f, "Node {} has no boarding/alighting probabilities", node)
            }
            RouteOptError::DegenerateDistribution { what } => {
                write!(f, "Cannot normalize {} into a probability distribution", what)
            }
            RouteOptError::NoViableContinuation {
                walk_len,
                destination,
            } => write!(
                f,
                "No candidate connected to destination {} after {} stops",
                destination, walk_len
            ),
            RouteOptError::StalledWalk { node, attempts } => write!(
                f,
                "Walk stalled at node {} after {} rejected draws",
                node, attempts
            ),
            RouteOptError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            RouteOptError::Config { key, reason } => {
                write!(f, "Bad config value for '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for RouteOptError {}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = RouteOptError::ShapeMismatch {
            expected: (3, 3),
            found: (2, 3),
        };
        assert_eq!(
            format!("{}", err),
            "Incorrect shape: expected (3, 3) but got (2, 3) instead"
        );
    }

    #[test]
    fn test_boxes_into_dyn_error() {
        fn fails() -> Result<(), Box<dyn std::error::Error>> {
            Err(RouteOptError::invalid("max_trips", "must be positive"))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(err.to_string().contains("max_trips"));
    }
}
