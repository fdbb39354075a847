//! Data models shared between the API, service and repository layers

pub mod book;
pub mod borrow;
pub mod event;
pub mod user;
