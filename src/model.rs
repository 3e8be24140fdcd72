//! Entity/relationship model built from a parsed schema.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::error::SchemaError;
use crate::schema::ParsedSchema;

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    /// Column order as declared; drives row order and port placement.
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub typ: String,
    pub is_pk: bool,
    pub is_fk: bool,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub entity: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub source: Endpoint,
    pub target: Endpoint,
    /// Informational only.
    pub cardinality: Option<String>,
}

impl Entity {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl SchemaModel {
    /// Validate a parsed schema.
    ///
    /// Duplicate entity ids are rejected. Relationships whose endpoints do not
    /// resolve, or whose id was already used, are dropped: half-typed schemas
    /// are a normal editing state.
    pub fn build(parsed: &ParsedSchema) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        let mut entities = Vec::with_capacity(parsed.entities.len());

        for e in &parsed.entities {
            if !seen.insert(e.id.as_str()) {
                return Err(SchemaError::DuplicateEntity { id: e.id.clone() });
            }

            let fields = e
                .fields
                .iter()
                .map(|f| Field {
                    name: f.name.clone(),
                    typ: f.typ.clone(),
                    is_pk: f.is_primary_key,
                    is_fk: f.is_foreign_key,
                    is_nullable: f.is_nullable,
                })
                .collect();

            entities.push(Entity {
                id: e.id.clone(),
                name: e.name.clone().unwrap_or_else(|| e.id.clone()),
                fields,
            });
        }

        let by_id: HashMap<&str, &Entity> = entities.iter().map(|e| (e.id.as_str(), e)).collect();
        let resolves = |entity: &str, field: &str| {
            by_id
                .get(entity)
                .is_some_and(|e| e.field_index(field).is_some())
        };

        let mut relationship_ids = HashSet::new();
        let mut relationships = Vec::with_capacity(parsed.relationships.len());

        for r in &parsed.relationships {
            if !resolves(&r.source_entity, &r.source_field)
                || !resolves(&r.target_entity, &r.target_field)
            {
                debug!(
                    relationship = r.id,
                    source = r.source_entity,
                    target = r.target_entity;
                    "Dropping relationship with unresolved endpoint"
                );
                continue;
            }
            if !relationship_ids.insert(r.id.as_str()) {
                warn!(relationship = r.id; "Dropping relationship with duplicate id");
                continue;
            }

            relationships.push(Relationship {
                id: r.id.clone(),
                source: Endpoint {
                    entity: r.source_entity.clone(),
                    field: r.source_field.clone(),
                },
                target: Endpoint {
                    entity: r.target_entity.clone(),
                    field: r.target_field.clone(),
                },
                cardinality: r.cardinality.clone(),
            });
        }

        debug!(
            entities = entities.len(),
            relationships = relationships.len();
            "Schema model built"
        );

        Ok(Self {
            entities,
            relationships,
        })
    }
}
