pub mod config;
pub mod confirm;
pub mod error;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod request;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;
