//! Application services: the business operations behind the HTTP API.

pub mod services;
