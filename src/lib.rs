// Library for tests to access modules

pub mod config;
pub mod engine;
pub mod event_repo;
pub mod models;
pub mod routes;
pub mod service;
