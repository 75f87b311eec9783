pub mod ddl;
pub mod diff_result;
pub mod error;
pub mod live;
pub mod ports;
pub mod spec;
pub mod sync_report;
pub mod value_objects;
