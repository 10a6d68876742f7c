// Library interface for tamandua-web
// Exposes the client modules to the binary and to integration tooling

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod expression;
pub mod highlight;
pub mod logging;
pub mod render;
pub mod signal;
pub mod web;

#[cfg(test)]
mod test_utils;
