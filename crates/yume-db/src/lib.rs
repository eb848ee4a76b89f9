pub use sea_orm;

pub mod dream;
pub mod schema;
