pub mod catalog;
pub mod clients;
pub mod config;
pub mod datetime;
pub mod db;
pub mod dj;
pub mod environment;
pub mod errors;
pub mod performance;
pub mod review;
pub mod reviews;
pub mod routes;
pub mod seed;
pub mod server;
pub mod subject;
pub mod urls;
pub mod validation;
