pub mod config;
pub mod db;
pub mod errors;
pub mod model;
pub mod provision;
pub mod schema;
pub mod seed;
pub mod validate;
pub mod verify;
