pub mod identity;
pub mod json;
pub mod query;
