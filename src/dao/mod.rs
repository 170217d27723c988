pub mod query;
pub mod theater;
