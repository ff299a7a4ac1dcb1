//! HTTP handlers for the report service.

pub mod generate;
pub mod home;
pub mod upload;
