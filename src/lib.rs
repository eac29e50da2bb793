//! Pulsar Publisher - publish Pulsar messages through an external producer executable.

pub mod auth;
pub mod command;
pub mod config;
pub mod display;
pub mod error;
pub mod executable;
pub mod observer;
pub mod protocol;
pub mod publisher;
pub mod session;

pub use error::PublishError;
pub use publisher::Publisher;
