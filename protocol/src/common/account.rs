//! Account-related common types
//!
//! Organization and space resources as returned by the Cloud Foundry
//! account API. Responses are lists of `{metadata, entity}` pairs; only
//! the entity fields the client scans on are modeled, everything else is
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Resource metadata common to orgs and spaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A `{metadata, entity}` resource pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<E> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResourceMetadata>,
    pub entity: E,
}

/// Collection envelope for account resources
///
/// A missing `resources` field deserializes as an empty list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceList<E> {
    #[serde(default)]
    pub resources: Vec<Resource<E>>,
}

/// Organization entity fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgEntity {
    pub name: String,
    pub spaces_url: String,
}

/// Space entity fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpaceEntity {
    pub name: String,
}

pub type Org = Resource<OrgEntity>;
pub type Space = Resource<SpaceEntity>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_org_list_deserialize() {
        let list: ResourceList<OrgEntity> = serde_json::from_value(json!({
            "total_results": 1,
            "resources": [{
                "metadata": {"guid": "abc-123", "url": "/v2/organizations/abc-123"},
                "entity": {
                    "name": "myorg",
                    "spaces_url": "/v2/organizations/abc-123/spaces",
                    "status": "active"
                }
            }]
        }))
        .unwrap();

        assert_eq!(list.resources.len(), 1);
        assert_eq!(list.resources[0].entity.name, "myorg");
    }

    #[test]
    fn test_missing_resources_is_empty() {
        let list: ResourceList<SpaceEntity> = serde_json::from_value(json!({})).unwrap();
        assert!(list.resources.is_empty());
    }
}
