// services/mod.rs - Domain services shared by the handlers

pub mod ai;
pub mod billing;
pub mod documents;
pub mod notifications;
pub mod reports;
