pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod guards;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod schema;
pub mod session;
pub mod store;

pub mod testing;
