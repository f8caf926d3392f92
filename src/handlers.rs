pub mod agents;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod income;
pub mod payments;
pub mod performance;
pub mod projects;
pub mod targets;
