//! Relay through a Datadog agent TCP listener
//!
//! Sends logs to the agent over a fresh TCP connection per entry. Each record
//! is written with a single `write_all` and the connection is shut down right
//! after, so a failed entry can never corrupt the framing of another one.

use super::options::{AgentFormat, DatadogConfig};
use crate::core::{LogLevel, LoggerError, Result};
use crate::destinations::Shipper;
use serde::Serialize;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// JSON record understood by the agent's TCP log source
#[derive(Debug, Serialize)]
struct AgentEnvelope<'a> {
    env: Option<&'a str>,
    source: Option<&'a str>,
    service: Option<&'a str>,
    status: &'a str,
    message: &'a str,
}

pub struct AgentShipper {
    address: String,
    format: AgentFormat,
    timeout: Option<Duration>,
    env: Option<String>,
    source: Option<String>,
    service: Option<String>,
}

impl AgentShipper {
    pub fn new(config: DatadogConfig, address: String) -> Self {
        Self {
            address,
            format: config.agent_format,
            // A zero duration is rejected by the socket API.
            timeout: config.agent_timeout.filter(|t| !t.is_zero()),
            env: config.env_label().map(str::to_string),
            source: config.source,
            service: config.service,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn record(&self, level: LogLevel, encoded: &[u8]) -> Result<Vec<u8>> {
        let mut record = match self.format {
            AgentFormat::Raw => encoded.to_vec(),
            AgentFormat::Envelope => {
                let message = String::from_utf8_lossy(encoded);
                serde_json::to_vec(&AgentEnvelope {
                    env: self.env.as_deref(),
                    source: self.source.as_deref(),
                    service: self.service.as_deref(),
                    status: level.as_lowercase(),
                    message: message.trim_end(),
                })?
            }
        };
        if record.last() != Some(&b'\n') {
            record.push(b'\n');
        }
        Ok(record)
    }

    fn connect(&self) -> Result<TcpStream> {
        let connected = match self.timeout {
            None => TcpStream::connect(&self.address),
            Some(timeout) => connect_timeout(&self.address, timeout),
        };
        let stream = connected.map_err(|e| LoggerError::connection(&self.address, e))?;
        stream
            .set_write_timeout(self.timeout)
            .map_err(|e| LoggerError::connection(&self.address, e))?;
        Ok(stream)
    }
}

impl Shipper for AgentShipper {
    fn ship(&self, level: LogLevel, encoded: &[u8]) -> Result<()> {
        let record = self.record(level, encoded)?;
        let mut stream = self.connect()?;

        let written = stream.write_all(&record);
        // Closing errors do not override the outcome of the write.
        let _ = stream.shutdown(Shutdown::Both);

        written.map_err(|e| LoggerError::io_operation("writing to log agent", self.address.clone(), e))
    }
}

fn connect_timeout(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address resolved to no socket addresses")
    }))
}
