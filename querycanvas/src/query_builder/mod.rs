//! Query definition builder: canvas fields in, abstract SELECT description out.

mod builders;
mod definition;
mod filters;

pub use builders::build_definition;
pub use definition::{
    GroupByItem, OrderByClause, QueryDefinition, SelectField, WhereClause,
};
pub use filters::clamp_group_count;
