//! API module - request/response models, handlers, and routes

pub mod handlers;
pub mod models;
pub mod routes;
