//! Core types and the tag lifecycle engine for Taplink.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::TagStore`]; transports drive
//! [`service::TagService`].

pub mod context;
pub mod error;
pub mod ident;
pub mod notify;
pub mod profile;
pub mod project;
pub mod resolve;
pub mod service;
pub mod store;
pub mod tag;
pub mod verify;

pub use error::{Error, ErrorClass, Result};
