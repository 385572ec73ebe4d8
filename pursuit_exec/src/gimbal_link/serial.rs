//! [`SerialTransport`] implementation for a physical serial port

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use log::debug;
use serialport::SerialPort;

use super::SerialTransport;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Serial port opened on demand.
pub struct SerialPortTransport {
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SerialPortTransport {
    pub fn new(port_name: &str, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.to_string(),
            baud_rate,
            port: None,
        }
    }
}

impl SerialTransport for SerialPortTransport {
    fn open(&mut self) -> std::io::Result<()> {
        if self.port.is_some() {
            return Ok(())
        }

        let port = serialport::new(self.port_name.as_str(), self.baud_rate)
            .timeout(Duration::from_millis(10))
            .open()?;

        debug!("Opened serial port {} at {} baud", self.port_name, self.baud_rate);

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed serial port {}", self.port_name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self.port {
            Some(ref mut p) => {
                p.write_all(bytes)?;
                p.flush()
            },
            None => Err(ErrorKind::NotConnected.into())
        }
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize> {
        match self.port {
            Some(ref mut p) => {
                p.set_timeout(timeout)?;
                match p.read(buf) {
                    Ok(n) => Ok(n),
                    Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
                    Err(e) => Err(e)
                }
            },
            None => Err(ErrorKind::NotConnected.into())
        }
    }
}
