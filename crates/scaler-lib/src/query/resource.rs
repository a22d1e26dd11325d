//! Resource identifier decomposition
//!
//! A resource identifier is the `<namespace>/<type>/<name>` triple
//! addressing one monitored resource, e.g.
//! `Microsoft.Storage/queueServices/q1`.

use crate::error::{Result, ScalerError};

/// The three segments of a resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub namespace: String,
    pub resource_type: String,
    pub name: String,
}

impl ResourceId {
    /// Split a resource identifier into namespace, type and name.
    ///
    /// Exactly three non-empty segments are accepted.
    pub fn parse(resource_uri: &str) -> Result<Self> {
        let segments: Vec<&str> = resource_uri.split('/').collect();

        match segments.as_slice() {
            [namespace, resource_type, name]
                if !namespace.is_empty() && !resource_type.is_empty() && !name.is_empty() =>
            {
                Ok(Self {
                    namespace: namespace.to_string(),
                    resource_type: resource_type.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ScalerError::MalformedResourceIdentifier {
                resource_uri: resource_uri.to_string(),
                segments: segments.iter().filter(|s| !s.is_empty()).count(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_segments() {
        let id = ResourceId::parse("Microsoft.Storage/queueServices/q1").unwrap();
        assert_eq!(id.namespace, "Microsoft.Storage");
        assert_eq!(id.resource_type, "queueServices");
        assert_eq!(id.name, "q1");
    }

    #[test]
    fn test_parse_too_few_segments() {
        for input in ["", "Microsoft.Storage", "Microsoft.Storage/queueServices"] {
            let err = ResourceId::parse(input).unwrap_err();
            assert!(
                matches!(err, ScalerError::MalformedResourceIdentifier { .. }),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_extra_and_empty_segments() {
        assert!(ResourceId::parse("a/b/c/d").is_err());
        assert!(ResourceId::parse("a//c").is_err());
        assert!(ResourceId::parse("/b/c").is_err());
        assert!(ResourceId::parse("a/b/").is_err());
    }

    #[test]
    fn test_malformed_error_counts_segments() {
        match ResourceId::parse("Microsoft.Storage/queueServices") {
            Err(ScalerError::MalformedResourceIdentifier { segments, .. }) => {
                assert_eq!(segments, 2)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
