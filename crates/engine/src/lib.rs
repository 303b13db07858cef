pub mod anomaly;
pub mod cache;
pub mod cooldown;
pub mod service;
pub mod social;
pub mod tracker;
