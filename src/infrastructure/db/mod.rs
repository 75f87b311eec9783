pub mod client;
pub mod dialect;
pub mod introspect;
pub mod row_mapper;
pub mod sql_utils;
