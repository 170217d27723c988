pub mod endpoints;
pub mod export;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod views;
