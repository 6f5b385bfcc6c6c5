#[macro_use]
extern crate rocket;

pub mod authentication;
pub mod billing;
pub mod catchers;
pub mod configuration;
pub mod domain;
pub mod email;
pub mod guards;
pub mod models;
pub mod port_saver;
pub mod reports;
pub mod routes;
pub mod schema;
pub mod startup;
pub mod store;
pub mod telemetry;
