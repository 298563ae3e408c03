pub mod cleanup;
pub mod config;
pub mod controller;
pub mod cors;
pub mod data;
pub mod logic;
pub mod presentation;
pub mod routes;
pub mod timer;
