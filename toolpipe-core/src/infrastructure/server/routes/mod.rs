pub mod execute;
pub mod health;
pub mod packages;
pub mod tools;
