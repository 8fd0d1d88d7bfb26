//! The storefront query planner: turns planner output into answers, running validated plans
//! against the storefront database.

pub mod connector;
pub mod explain;
pub mod health;
pub mod query;
pub mod schema;
pub mod state;

pub use connector::{Planner, PlannerSetup, SetupError};
pub use query::Answer;
