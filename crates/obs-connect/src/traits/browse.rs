//! Browse types for interactive exploration of a connection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A request to list the children of a path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseRequest {
    /// Path to browse; empty or `/` means the root
    pub path: String,
    /// Maximum number of entities; missing or non-positive means unlimited
    #[serde(default)]
    pub limit: Option<i32>,
}

impl BrowseRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The limit as a count, with non-positive and missing limits mapped to `usize::MAX`
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit as usize,
            _ => usize::MAX,
        }
    }
}

/// Type of a browse entity property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    String,
    TimestampMillis,
    SizeBytes,
    Number,
    Boolean,
}

/// A typed property value shown next to a browse entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseEntityPropertyValue {
    pub value: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
}

impl BrowseEntityPropertyValue {
    pub fn new(value: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            value: value.into(),
            property_type,
        }
    }
}

/// One node of the browse tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEntity {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub can_browse: bool,
    pub can_sample: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, BrowseEntityPropertyValue>,
}

impl BrowseEntity {
    /// Start building an entity that can be neither browsed nor sampled
    pub fn builder(
        name: impl Into<String>,
        path: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> BrowseEntityBuilder {
        BrowseEntityBuilder {
            entity: BrowseEntity {
                name: name.into(),
                path: path.into(),
                entity_type: entity_type.into(),
                can_browse: false,
                can_sample: false,
                properties: BTreeMap::new(),
            },
        }
    }

    pub fn property(&self, key: &str) -> Option<&BrowseEntityPropertyValue> {
        self.properties.get(key)
    }
}

/// Builder for [`BrowseEntity`]
#[derive(Debug)]
pub struct BrowseEntityBuilder {
    entity: BrowseEntity,
}

impl BrowseEntityBuilder {
    pub fn can_browse(mut self, can_browse: bool) -> Self {
        self.entity.can_browse = can_browse;
        self
    }

    pub fn can_sample(mut self, can_sample: bool) -> Self {
        self.entity.can_sample = can_sample;
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: BrowseEntityPropertyValue) -> Self {
        self.entity.properties.insert(key.into(), value);
        self
    }

    pub fn build(self) -> BrowseEntity {
        self.entity
    }
}

/// Result of a browse call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseDetail {
    /// Total number of entities known at this level, which may exceed `entities.len()`
    pub total_count: usize,
    pub entities: Vec<BrowseEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_properties: Vec<String>,
}

impl BrowseDetail {
    pub fn builder() -> BrowseDetailBuilder {
        BrowseDetailBuilder::default()
    }

    /// An empty result with a zero total
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Builder for [`BrowseDetail`]
#[derive(Debug, Default)]
pub struct BrowseDetailBuilder {
    detail: BrowseDetail,
}

impl BrowseDetailBuilder {
    pub fn total_count(mut self, total_count: usize) -> Self {
        self.detail.total_count = total_count;
        self
    }

    pub fn entity(mut self, entity: BrowseEntity) -> Self {
        self.detail.entities.push(entity);
        self
    }

    pub fn entities(mut self, entities: Vec<BrowseEntity>) -> Self {
        self.detail.entities = entities;
        self
    }

    pub fn sample_property(mut self, name: impl Into<String>) -> Self {
        self.detail.sample_properties.push(name.into());
        self
    }

    pub fn build(self) -> BrowseDetail {
        self.detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        assert_eq!(BrowseRequest::new("/").effective_limit(), usize::MAX);
        assert_eq!(
            BrowseRequest::new("/").with_limit(0).effective_limit(),
            usize::MAX
        );
        assert_eq!(
            BrowseRequest::new("/").with_limit(-5).effective_limit(),
            usize::MAX
        );
        assert_eq!(BrowseRequest::new("/").with_limit(7).effective_limit(), 7);
    }

    #[test]
    fn test_entity_builder() {
        let entity = BrowseEntity::builder("a.csv", "bucket/dir/a.csv", "file")
            .can_sample(true)
            .property(
                "File Type",
                BrowseEntityPropertyValue::new("text/csv", PropertyType::String),
            )
            .build();

        assert!(!entity.can_browse);
        assert!(entity.can_sample);
        assert_eq!(entity.property("File Type").unwrap().value, "text/csv");
        assert!(entity.property("Size").is_none());
    }

    #[test]
    fn test_detail_serializes_for_host() {
        let detail = BrowseDetail::builder()
            .total_count(3)
            .entity(
                BrowseEntity::builder("logs", "logs", "bucket")
                    .can_browse(true)
                    .build(),
            )
            .build();

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["totalCount"], 3);
        assert_eq!(json["entities"][0]["type"], "bucket");
        assert_eq!(json["entities"][0]["canBrowse"], true);
        assert!(json.get("sampleProperties").is_none());
    }

    #[test]
    fn test_property_type_wire_names() {
        let value = BrowseEntityPropertyValue::new("1024", PropertyType::SizeBytes);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "SIZE_BYTES");
    }
}
