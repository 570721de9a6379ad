use std::{env, io};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    host: String,
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the `HOST` and `PORT` environment variables, falling
    /// back to the defaults for the missing ones.
    ///
    /// # Errors
    /// `InvalidInput` if `PORT` isn't a valid port number.
    pub fn from_env() -> io::Result<Self> {
        Self::from_vars(env::var("HOST").ok(), env::var("PORT").ok())
    }

    /// Builds the configuration from optional raw values.
    ///
    /// # Arguments
    /// * `host` - The host to bind to.
    /// * `port` - The port to bind to, as text.
    ///
    /// # Errors
    /// `InvalidInput` if `port` isn't a valid port number.
    pub fn from_vars(host: Option<String>, port: Option<String>) -> io::Result<Self> {
        let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match port {
            Some(port) => port.trim().parse().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid PORT '{port}': {e}"),
                )
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self { host, port })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
