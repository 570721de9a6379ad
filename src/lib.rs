//! TCP front end of the gradient descent tutor: one shared training session served to
//! any number of clients over `comms` frames.

pub mod config;
pub mod server;
pub mod service;

pub use config::ServerConfig;
pub use server::Server;
pub use service::Service;
