//! # Ground truth client
//!
//! TCP client of the pose helper which drives a robot arm holding a hand replica. It is only used
//! while recording, to store the true hand position next to the estimated one. Any failure here
//! is reported to the caller and must never stop the control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use gimbal_if::truth::{decode_floats, TruthPose, TruthRequest};
use log::{debug, info};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of the buffer a get pose response is read into.
const RESPONSE_BUF_LEN: usize = 1024;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Connect to the pose helper at start-up
    pub enabled: bool,

    /// Address of the pose helper, `host:port`
    pub endpoint: String,

    /// Pose the arm returns to when commanded to the zero pose
    pub initial_pose: TruthPose,

    /// Units: milliseconds
    pub timeout_ms: u64,
}

pub struct TruthClient {
    stream: TcpStream,
    initial_pose: TruthPose,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TruthError {
    #[error("Could not resolve the pose helper endpoint {0}")]
    AddrError(String),

    #[error("Could not connect to the pose helper: {0}")]
    ConnectError(std::io::Error),

    #[error("Could not send a request to the pose helper: {0}")]
    SendError(std::io::Error),

    #[error("Could not recieve a response from the pose helper: {0}")]
    RecvError(std::io::Error),

    #[error("The pose helper returned {0} bytes, expected at least 12")]
    ShortResponse(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::from("localhost:8888"),
            initial_pose: TruthPose([550.0, 0.0, 380.0, -180.0, 90.0, -180.0]),
            timeout_ms: 200,
        }
    }
}

impl TruthClient {
    /// Connect to the pose helper and switch the arm on.
    pub fn connect(params: &Params) -> Result<Self, TruthError> {
        let timeout = Duration::from_millis(params.timeout_ms);

        let addr = params.endpoint
            .to_socket_addrs()
            .map_err(|_| TruthError::AddrError(params.endpoint.clone()))?
            .next()
            .ok_or_else(|| TruthError::AddrError(params.endpoint.clone()))?;

        let stream = TcpStream::connect_timeout(&addr, timeout)
            .map_err(TruthError::ConnectError)?;
        stream.set_read_timeout(Some(timeout)).map_err(TruthError::ConnectError)?;
        stream.set_write_timeout(Some(timeout)).map_err(TruthError::ConnectError)?;
        stream.set_nodelay(true).map_err(TruthError::ConnectError)?;

        info!("Connected to the pose helper at {}", addr);

        let mut client = Self {
            stream,
            initial_pose: params.initial_pose,
        };
        client.enable(true)?;

        Ok(client)
    }

    /// Switch the arm on or off.
    pub fn enable(&mut self, on: bool) -> Result<(), TruthError> {
        self.send(&TruthRequest::Enable(on))
    }

    /// Move the arm to a pose given relative to the initial pose.
    pub fn set_pose(&mut self, pose: &TruthPose) -> Result<(), TruthError> {
        self.send(&TruthRequest::SetPose(pose.offset_by(&self.initial_pose)))
    }

    /// Return the arm to its initial pose.
    pub fn home(&mut self) -> Result<(), TruthError> {
        self.enable(true)?;
        self.set_pose(&TruthPose::default())
    }

    /// Request the current position of the arm, `[x, y, z]` in millimeters.
    ///
    /// Any further floats in the response (the orientation) are ignored.
    pub fn get_position(&mut self) -> Result<[f32; 3], TruthError> {
        self.send(&TruthRequest::GetPose)?;

        let mut buf = [0u8; RESPONSE_BUF_LEN];
        let n = self.stream.read(&mut buf).map_err(TruthError::RecvError)?;

        let floats = decode_floats(&buf[..n]);
        if floats.len() < 3 {
            return Err(TruthError::ShortResponse(n))
        }

        debug!("Ground truth position: {:?}", &floats[..3]);

        Ok([floats[0], floats[1], floats[2]])
    }

    fn send(&mut self, req: &TruthRequest) -> Result<(), TruthError> {
        self.stream
            .write_all(&req.encode())
            .map_err(TruthError::SendError)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
