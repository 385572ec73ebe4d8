//! # Gimbal Link Module
//!
//! This module abstracts over the serial connection to the gimbal controller board. Commands are
//! written as complete frames, telemetry queries are a write followed by a bounded wait for the
//! response.
//!
//! A link which cannot be opened is not fatal, all operations return
//! [`LinkError::LinkUnavailable`] and the control loop keeps running without actuation.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`SerialTransport`] implementation over a real serial port.
pub mod serial;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::{Duration, Instant};

use gimbal_if::{
    codec::{bytes_to_hex, Checksum, GimbalCmd},
    telemetry::TELEMETRY_FRAME_LEN,
};
use log::trace;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Byte oriented duplex channel to the controller board.
pub trait SerialTransport {
    /// Open the channel. Opening an already open channel succeeds.
    fn open(&mut self) -> std::io::Result<()>;

    /// Close the channel.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Write all bytes to the channel.
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()>;

    /// Read available bytes into `buf`, waiting at most `timeout` for the first byte.
    ///
    /// Returns the number of bytes read, which is zero on timeout.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> std::io::Result<usize>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the gimbal link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Serial port name (like `/dev/ttyUSB0` or `COM3`)
    pub port: String,

    /// Units: bits/second
    pub baud_rate: u32,

    /// Maximum time to wait for a complete telemetry response.
    ///
    /// Units: milliseconds
    pub telemetry_timeout_ms: u64,

    /// Checksum placeholder appended to every frame
    pub checksum: Checksum,
}

/// The link to the gimbal controller.
pub struct GimbalLink<T: SerialTransport> {
    transport: T,
    checksum: Checksum,
    telemetry_timeout: Duration,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur on the [`GimbalLink`]
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("The serial link is not open")]
    LinkUnavailable,

    #[error("No telemetry recieved within {0:?}")]
    LinkTimeout(Duration),

    #[error("Serial I/O error: {0}")]
    Io(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115200,
            telemetry_timeout_ms: 50,
            checksum: Checksum::default(),
        }
    }
}

impl<T: SerialTransport> GimbalLink<T> {
    /// Create a new link over the given transport. The transport is not opened.
    pub fn new(transport: T, params: &Params) -> Self {
        Self {
            transport,
            checksum: params.checksum,
            telemetry_timeout: Duration::from_millis(params.telemetry_timeout_ms),
        }
    }

    pub fn open(&mut self) -> Result<(), LinkError> {
        self.transport.open().map_err(LinkError::Io)
    }

    pub fn close(&mut self) {
        self.transport.close()
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Access the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Encode and send a command.
    pub fn send_command(&mut self, cmd: &GimbalCmd) -> Result<(), LinkError> {
        if !self.transport.is_open() {
            return Err(LinkError::LinkUnavailable)
        }

        let frame = cmd.encode(self.checksum);
        trace!("Sending {:?}: {}", cmd, bytes_to_hex(&frame));

        self.transport.write(&frame).map_err(LinkError::Io)
    }

    /// Send an IMU query and collect the response.
    ///
    /// Bytes are accumulated until a full telemetry frame has been read or the telemetry timeout
    /// expires. A partial response is returned as is, an empty one is a
    /// [`LinkError::LinkTimeout`].
    pub fn query_telemetry(&mut self) -> Result<Vec<u8>, LinkError> {
        self.send_command(&GimbalCmd::GetImu)?;

        let mut buf = vec![0u8; TELEMETRY_FRAME_LEN];
        let mut num_read = 0;
        let deadline = Instant::now() + self.telemetry_timeout;

        while num_read < buf.len() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let n = self.transport
                .read(&mut buf[num_read..], deadline - now)
                .map_err(LinkError::Io)?;
            if n == 0 {
                break;
            }
            num_read += n;
        }

        if num_read == 0 {
            return Err(LinkError::LinkTimeout(self.telemetry_timeout))
        }

        buf.truncate(num_read);
        trace!("Telemetry: {}", bytes_to_hex(&buf));

        Ok(buf)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
