pub mod auth;
pub mod messages;
pub mod users;
pub mod webhook;
