pub mod agent;
pub mod catalog;
pub mod definition;
pub mod estimator;
pub mod schema;
