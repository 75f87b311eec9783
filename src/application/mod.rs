pub mod differ;
pub mod executor;
pub mod monitoring;
pub mod normalizer;
pub mod planner;
