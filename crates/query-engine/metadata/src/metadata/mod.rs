//! The contract: the static whitelist of resources, fields and relations
//! that queries may touch.

pub mod describe;
pub mod resources;

// re-export without modules
pub use describe::describe;
pub use resources::*;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The alias given to the base resource of every generated query.
pub const BASE_ALIAS: &str = "t";

/// Every resource that may be queried, and how.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct Contract {
    pub resources: Resources,
}

impl Contract {
    pub fn empty() -> Self {
        Contract {
            resources: Resources::empty(),
        }
    }

    /// Lookup a resource by its canonical name.
    pub fn resource_by_name(&self, name: &str) -> Option<&ResourceInfo> {
        self.resources.0.get(name)
    }

    /// The field names of a resource. Unknown resources have no fields.
    pub fn fields_of(&self, resource: &str) -> BTreeSet<&str> {
        self.resource_by_name(resource)
            .map(ResourceInfo::field_names)
            .unwrap_or_default()
    }

    /// The relations declared on a resource. Unknown resources have no relations.
    pub fn relations_of(&self, resource: &str) -> Option<&IndexMap<String, RelationInfo>> {
        self.resource_by_name(resource).map(|info| &info.relations)
    }

    /// Lookup a relation declared on `owner`.
    pub fn relation(&self, owner: &str, relation: &str) -> Option<&RelationInfo> {
        self.relations_of(owner)
            .and_then(|relations| relations.get(relation))
    }

    /// Canonical resource names, in declaration order.
    pub fn resource_names(&self) -> Vec<String> {
        self.resources.0.keys().cloned().collect()
    }

    /// Check that every name the contract refers to is declared.
    pub fn check(&self) -> Result<(), ContractErrors> {
        let mut errors = vec![];

        for (name, resource) in &self.resources.0 {
            if resource.view.trim().is_empty() {
                errors.push(ContractError::EmptyView(name.clone()));
            }

            for field in &resource.default_select {
                if !resource.has_field(field) {
                    errors.push(ContractError::UnknownDefaultField {
                        resource: name.clone(),
                        field: field.clone(),
                    });
                }
            }

            let mut aliases = BTreeSet::from([BASE_ALIAS]);
            for (relation_name, relation) in &resource.relations {
                if !resource.has_field(&relation.local_field) {
                    errors.push(ContractError::UnknownLocalField {
                        resource: name.clone(),
                        relation: relation_name.clone(),
                        field: relation.local_field.clone(),
                    });
                }
                match self.resource_by_name(&relation.target_resource) {
                    None => errors.push(ContractError::UnknownTarget {
                        resource: name.clone(),
                        relation: relation_name.clone(),
                        target: relation.target_resource.clone(),
                    }),
                    Some(target) => {
                        if !target.has_field(&relation.target_field) {
                            errors.push(ContractError::UnknownTargetField {
                                relation: relation_name.clone(),
                                target: relation.target_resource.clone(),
                                field: relation.target_field.clone(),
                            });
                        }
                    }
                }
                if !aliases.insert(relation.alias.as_str()) {
                    errors.push(ContractError::DuplicateAlias {
                        resource: name.clone(),
                        alias: relation.alias.clone(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ContractErrors(errors))
        }
    }
}

/// A single broken reference inside a contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("resource '{0}' has an empty view name")]
    EmptyView(String),
    #[error("default select of '{resource}' names unknown field '{field}'")]
    UnknownDefaultField { resource: String, field: String },
    #[error("relation '{relation}' on '{resource}' uses unknown local field '{field}'")]
    UnknownLocalField {
        resource: String,
        relation: String,
        field: String,
    },
    #[error("relation '{relation}' on '{resource}' targets unknown resource '{target}'")]
    UnknownTarget {
        resource: String,
        relation: String,
        target: String,
    },
    #[error("relation '{relation}' targets unknown field '{field}' on '{target}'")]
    UnknownTargetField {
        relation: String,
        target: String,
        field: String,
    },
    #[error("alias '{alias}' is used more than once in the relations of '{resource}'")]
    DuplicateAlias { resource: String, alias: String },
}

/// Every problem found by [`Contract::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid contract: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ContractErrors(pub Vec<ContractError>);

#[cfg(test)]
mod tests {
    use super::*;

    fn product_and_category() -> Contract {
        let category = ResourceInfo {
            view: "categories".to_string(),
            description: None,
            synonyms: vec![],
            fields: IndexMap::from([
                ("id".to_string(), FieldInfo::new(FieldType::Identifier, "id")),
                ("name".to_string(), FieldInfo::new(FieldType::Text, "name")),
            ]),
            default_select: vec!["id".to_string(), "name".to_string()],
            filterable: true,
            sortable: true,
            relations: IndexMap::new(),
        };
        let product = ResourceInfo {
            view: "products".to_string(),
            description: None,
            synonyms: vec!["products".to_string()],
            fields: IndexMap::from([
                ("id".to_string(), FieldInfo::new(FieldType::Text, "id")),
                (
                    "category_id".to_string(),
                    FieldInfo::new(FieldType::Identifier, "category"),
                ),
            ]),
            default_select: vec!["id".to_string()],
            filterable: true,
            sortable: true,
            relations: IndexMap::from([(
                "Category".to_string(),
                RelationInfo {
                    kind: JoinKind::Inner,
                    local_field: "category_id".to_string(),
                    target_resource: "Category".to_string(),
                    target_field: "id".to_string(),
                    alias: "c".to_string(),
                },
            )]),
        };
        Contract {
            resources: Resources(IndexMap::from([
                ("Product".to_string(), product),
                ("Category".to_string(), category),
            ])),
        }
    }

    #[test]
    fn lookups_only_see_declared_names() {
        let contract = product_and_category();

        assert!(contract.resource_by_name("Product").is_some());
        assert!(contract.resource_by_name("product").is_none());
        assert_eq!(
            contract.fields_of("Category"),
            BTreeSet::from(["id", "name"])
        );
        assert!(contract.fields_of("Unknown").is_empty());
        assert!(contract.relation("Product", "Category").is_some());
        // relations are one-directional
        assert!(contract.relation("Category", "Product").is_none());
        assert_eq!(contract.resource_names(), vec!["Product", "Category"]);
    }

    #[test]
    fn a_consistent_contract_passes_the_check() {
        assert_eq!(product_and_category().check(), Ok(()));
    }

    #[test]
    fn broken_references_are_all_reported() {
        let mut contract = product_and_category();
        let product = contract.resources.0.get_mut("Product").unwrap();
        product.default_select.push("price".to_string());
        product.relations.insert(
            "Brand".to_string(),
            RelationInfo {
                kind: JoinKind::Left,
                local_field: "brand_id".to_string(),
                target_resource: "Brand".to_string(),
                target_field: "id".to_string(),
                alias: "t".to_string(),
            },
        );

        let ContractErrors(errors) = contract.check().unwrap_err();
        similar_asserts::assert_eq!(
            errors,
            vec![
                ContractError::UnknownDefaultField {
                    resource: "Product".to_string(),
                    field: "price".to_string(),
                },
                ContractError::UnknownLocalField {
                    resource: "Product".to_string(),
                    relation: "Brand".to_string(),
                    field: "brand_id".to_string(),
                },
                ContractError::UnknownTarget {
                    resource: "Product".to_string(),
                    relation: "Brand".to_string(),
                    target: "Brand".to_string(),
                },
                ContractError::DuplicateAlias {
                    resource: "Product".to_string(),
                    alias: "t".to_string(),
                },
            ]
        );
    }

    #[test]
    fn contracts_deserialize_with_defaults() {
        let contract: Contract = serde_json::from_value(serde_json::json!({
            "resources": {
                "Coupon": {
                    "view": "coupons",
                    "fields": { "code": { "type": "text" } }
                }
            }
        }))
        .unwrap();

        let coupon = contract.resource_by_name("Coupon").unwrap();
        assert!(!coupon.filterable);
        assert!(!coupon.sortable);
        assert!(coupon.relations.is_empty());
        assert!(coupon.default_select.is_empty());
        assert_eq!(coupon.fields["code"].r#type, FieldType::Text);
    }
}
