pub(crate) mod bootstrap;
pub(crate) mod loop_runner;

mod config;
mod context;
mod locations;
mod resolver;
mod scenes;
mod session;
mod triggers;
