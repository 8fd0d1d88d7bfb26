//! Turn an untrusted plan into a validated plan, and a validated plan into SQL.

pub mod error;
pub mod helpers;
pub mod plan;
pub mod query;
pub mod resolver;
pub mod validation;
