pub mod classification;
pub mod config;
pub mod db;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod nace;
pub mod notify;
pub mod policy;
pub mod public;
pub mod routes;
pub mod state;
pub mod telemetry;
