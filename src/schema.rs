//! Parsed schema as handed over by the schema-parsing collaborator.
//!
//! These types mirror the JSON document produced upstream and are only
//! checked for structural well-formedness by [`crate::model`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSchema {
    #[serde(default)]
    pub entities: Vec<ParsedEntity>,
    #[serde(default)]
    pub relationships: Vec<ParsedRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEntity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<ParsedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    #[serde(default)]
    pub is_nullable: bool,
}

/// A foreign-key reference. `source*` names the referenced (key-holding) side,
/// `target*` the referencing side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRelationship {
    pub id: String,
    pub source_entity: String,
    pub source_field: String,
    pub target_entity: String,
    pub target_field: String,
    #[serde(default)]
    pub cardinality: Option<String>,
}

impl ParsedSchema {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

impl ParsedEntity {
    pub fn new(id: impl Into<String>, fields: Vec<ParsedField>) -> Self {
        Self {
            id: id.into(),
            name: None,
            fields,
        }
    }
}

impl ParsedField {
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            is_primary_key: false,
            is_foreign_key: false,
            is_nullable: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn foreign_key(mut self) -> Self {
        self.is_foreign_key = true;
        self
    }
}

impl ParsedRelationship {
    /// `source` is `(entity, field)` of the referenced key, `target` the
    /// referencing column.
    pub fn new(id: impl Into<String>, source: (&str, &str), target: (&str, &str)) -> Self {
        Self {
            id: id.into(),
            source_entity: source.0.to_string(),
            source_field: source.1.to_string(),
            target_entity: target.0.to_string(),
            target_field: target.1.to_string(),
            cardinality: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_camel_case() {
        let input = r#"{
            "entities": [
                {"id": "users", "name": "Users", "fields": [
                    {"name": "id", "type": "serial", "isPrimaryKey": true, "isForeignKey": false}
                ]},
                {"id": "orders", "fields": [
                    {"name": "user_id", "type": "int", "isForeignKey": true, "isNullable": true}
                ]}
            ],
            "relationships": [
                {"id": "r1", "sourceEntity": "users", "sourceField": "id",
                 "targetEntity": "orders", "targetField": "user_id", "cardinality": "1:N"}
            ]
        }"#;
        let schema = ParsedSchema::from_json(input).unwrap();

        assert_eq!(schema.entities.len(), 2);
        assert_eq!(schema.entities[0].name.as_deref(), Some("Users"));
        assert!(schema.entities[0].fields[0].is_primary_key);
        assert_eq!(schema.entities[1].name, None);
        assert!(schema.entities[1].fields[0].is_nullable);
        assert_eq!(schema.relationships[0].cardinality.as_deref(), Some("1:N"));
    }

    #[test]
    fn test_from_json_empty_document() {
        let schema = ParsedSchema::from_json("{}").unwrap();
        assert!(schema.entities.is_empty());
        assert!(schema.relationships.is_empty());
    }
}
