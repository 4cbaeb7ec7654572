pub mod auth;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod graphql;
pub mod models;
pub mod queries;
pub mod report;
pub mod session;
pub mod stats;
