#![allow(missing_docs)]

pub mod api;
pub mod auth;
pub mod db;
pub mod metrics;
pub mod state;
