//! Helpers for validating plans and building SQL.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::{Contract, FieldInfo, ResourceInfo, BASE_ALIAS};
use query_engine_sql::sql;

use super::error::Error;
use super::resolver::ResourceIndex;
use super::validation::{FieldRef, ValidatedPlan};

/// The contract and its resource name index, built once and shared by every request.
#[derive(Debug, Clone)]
pub struct Catalog {
    contract: Contract,
    index: ResourceIndex,
}

impl Catalog {
    pub fn new(contract: Contract) -> Catalog {
        let index = ResourceIndex::build(&contract);
        Catalog { contract, index }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn index(&self) -> &ResourceIndex {
        &self.index
    }

    /// Canonical names of every resource, in declaration order.
    pub fn allowed_resources(&self) -> Vec<String> {
        self.contract.resource_names()
    }

    /// Resolve a free-text resource name to a resource of the contract.
    pub fn resolve_resource(&self, name: &str) -> Result<(&str, &ResourceInfo), Error> {
        self.index
            .resolve(name)
            .and_then(|canonical| {
                self.contract
                    .resources
                    .0
                    .get_key_value(canonical)
                    .map(|(canonical, info)| (canonical.as_str(), info))
            })
            .ok_or_else(|| self.not_allowed(name))
    }

    /// Lookup a resource by canonical name.
    pub fn lookup_resource(&self, name: &str) -> Result<&ResourceInfo, Error> {
        self.contract
            .resource_by_name(name)
            .ok_or_else(|| self.not_allowed(name))
    }

    fn not_allowed(&self, name: &str) -> Error {
        Error::ResourceNotAllowed {
            got: name.to_string(),
            allowed: self.allowed_resources(),
        }
    }
}

/// Resource or relation name -> the alias it has in the generated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasMap {
    base: String,
    aliases: BTreeMap<String, String>,
}

impl AliasMap {
    /// The base resource gets the fixed base alias.
    pub fn new(base: &str) -> AliasMap {
        AliasMap {
            base: base.to_string(),
            aliases: BTreeMap::from([(base.to_string(), BASE_ALIAS.to_string())]),
        }
    }

    pub fn insert(&mut self, relation: &str, alias: &str) {
        self.aliases.insert(relation.to_string(), alias.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn base_alias(&self) -> sql::ast::TableAlias {
        sql::helpers::make_table_alias(BASE_ALIAS.to_string())
    }

    /// The alias a field reference is read from. Unknown relations fall back to the base alias.
    pub fn alias_for(&self, field: &FieldRef) -> sql::ast::TableAlias {
        match field.relation() {
            None => self.base_alias(),
            Some(relation) => match self.get(relation) {
                Some(alias) => sql::helpers::make_table_alias(alias.to_string()),
                None => {
                    tracing::warn!(
                        relation = relation,
                        base = %self.base,
                        "no alias for relation, reading from the base resource"
                    );
                    self.base_alias()
                }
            },
        }
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.aliases.values().any(|known| known == alias)
    }
}

/// Static information for translating one validated plan.
pub struct Env<'a> {
    pub catalog: &'a Catalog,
    pub plan: &'a ValidatedPlan,
    pub base: &'a ResourceInfo,
    pub aliases: AliasMap,
}

impl<'a> Env<'a> {
    /// The information about the field a reference points to, on the base resource or on the
    /// target of a joined relation.
    pub fn lookup_field(&self, field: &FieldRef) -> Option<&'a FieldInfo> {
        let resource = match field.relation() {
            None => self.base,
            Some(relation) => {
                let join = self
                    .plan
                    .joins()
                    .iter()
                    .find(|join| join.relation == relation)?;
                self.catalog
                    .contract()
                    .resource_by_name(&join.target_resource)?
            }
        };
        resource.fields.get(field.field())
    }

    /// `"<alias>"."<field>"` for a field reference.
    pub fn column(&self, field: &FieldRef) -> sql::ast::Expression {
        sql::helpers::make_column(self.aliases.alias_for(field), field.field().to_string())
    }
}
