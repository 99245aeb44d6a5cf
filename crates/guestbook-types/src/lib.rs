//! Shared data types for the guestbook service: the entry model, the
//! request/response bodies of the HTTP API, and thread assembly.

pub mod api;
pub mod models;
pub mod thread;
