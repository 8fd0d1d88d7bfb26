//! Describe the SQL execution plan.

use super::ast;
use super::convert;
use super::string;

/// Definition of an execution plan to be run against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    /// The canonical name of the resource the query is rooted at.
    pub root_resource: String,
    /// The query.
    pub query: ast::Select,
}

impl ExecutionPlan {
    /// Extract the query component as SQL.
    pub fn query_sql(&self) -> string::SQL {
        convert::select_to_sql(&self.query)
    }

    /// Extract an EXPLAIN of the query as SQL.
    pub fn explain_query_sql(&self) -> string::SQL {
        convert::explain_to_sql(&ast::Explain::Select(&self.query))
    }
}

/// A simple execution plan with only a root resource and a query.
pub fn simple_exec_plan(root_resource: String, query: ast::Select) -> ExecutionPlan {
    ExecutionPlan {
        root_resource,
        query,
    }
}
