//! A small web application for sharing text snippets.

pub mod config;
pub mod decode;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod session;
pub mod templates;
pub mod validator;
