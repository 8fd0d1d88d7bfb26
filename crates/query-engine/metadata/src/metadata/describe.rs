//! Render the contract as the schema text handed to the upstream planner.

use std::fmt::Write;

use super::{Contract, JoinKind};

/// Describe every resource, field and relation the planner is allowed to use.
pub fn describe(contract: &Contract) -> String {
    let mut out = String::from("SCHEMA (only these resources and fields may be used):\n\n");

    for (name, resource) in &contract.resources.0 {
        // writing into a String cannot fail
        let _ = writeln!(out, "RESOURCE {name} -> {}", resource.view);
        if let Some(description) = &resource.description {
            let _ = writeln!(out, "Description: {description}");
        }
        out.push_str("FIELDS:\n");
        for (field, info) in &resource.fields {
            match &info.description {
                Some(description) => {
                    let _ = writeln!(out, "  - {field} ({}): {description}", info.r#type);
                }
                None => {
                    let _ = writeln!(out, "  - {field} ({})", info.r#type);
                }
            }
        }
        let default_select = if resource.default_select.is_empty() {
            "(none)".to_string()
        } else {
            resource.default_select.join(", ")
        };
        let _ = writeln!(out, "Default Select: {default_select}");
        let _ = writeln!(
            out,
            "Filterable: {} | Sortable: {}",
            yes_no(resource.filterable),
            yes_no(resource.sortable)
        );
        if !resource.relations.is_empty() {
            out.push_str("JOINS:\n");
            for (relation_name, relation) in &resource.relations {
                let kind = match relation.kind {
                    JoinKind::Inner => "inner",
                    JoinKind::Left => "left",
                };
                let _ = writeln!(
                    out,
                    "  - {relation_name} ({kind}): {name}.{} = {}.{}",
                    relation.local_field, relation.target_resource, relation.target_field
                );
            }
        }
        out.push('\n');
    }

    out.push_str("Answer with a JSON query plan. Never write SQL.\n");
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
