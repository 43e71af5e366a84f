pub mod admin;
pub mod appointments;
pub mod auth;
pub mod barbers;
pub mod payments;
pub mod services;
