// src/oracle/serial.rs - Serial transport for the robot driver protocol
use std::time::Duration;

use armopt_shared::protocol::expected_frame_len;
use armopt_shared::OracleError;
use async_trait::async_trait;
use serial2_tokio::SerialPort;
use tokio::time::timeout;

use super::driver::{new_runtime, RobotDriverOracle, RobotLink};

const READ_CHUNK: usize = 256;

/// Framed request/response exchange over a serial port.
pub struct SerialLink {
    port: SerialPort,
    read_timeout: Duration,
    retransmits: u64,
}

impl SerialLink {
    /// Open `path` at `baud`. Must be called from within a tokio runtime.
    pub fn open(path: &str, baud: u32, read_timeout: Duration) -> Result<Self, OracleError> {
        let port = SerialPort::open(path, baud)
            .map_err(|e| OracleError::Link(format!("Failed to open {}: {}", path, e)))?;
        tracing::info!("Opened serial link {} @ {} baud", path, baud);
        Ok(Self {
            port,
            read_timeout,
            retransmits: 0,
        })
    }

    /// Number of frames that had to be sent twice.
    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    async fn write_frame(&self, frame: &[u8]) -> Result<(), OracleError> {
        let mut written = 0;
        while written < frame.len() {
            match self.port.write(&frame[written..]).await {
                Ok(0) => return Err(OracleError::Link("Serial port closed during write".to_string())),
                Ok(n) => written += n,
                Err(e) => return Err(OracleError::Link(format!("Serial write error: {}", e))),
            }
        }
        Ok(())
    }

    /// Read until one complete frame has arrived.
    async fn read_frame(&self) -> Result<Vec<u8>, OracleError> {
        let mut frame = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(len) = expected_frame_len(&frame) {
                if frame.len() >= len {
                    frame.truncate(len);
                    return Ok(frame);
                }
            }
            match self.port.read(&mut chunk).await {
                Ok(0) => return Err(OracleError::Link("Serial port closed during read".to_string())),
                Ok(n) => frame.extend_from_slice(&chunk[..n]),
                Err(e) => return Err(OracleError::Link(format!("Serial read error: {}", e))),
            }
        }
    }
}

#[async_trait]
impl RobotLink for SerialLink {
    async fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>, OracleError> {
        self.write_frame(frame).await?;
        match timeout(self.read_timeout, self.read_frame()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Serial response timeout, retransmitting");
                self.retransmits += 1;
                self.write_frame(frame).await?;
                timeout(self.read_timeout, self.read_frame())
                    .await
                    .map_err(|_| OracleError::Link(format!("No response within {:?}", self.read_timeout)))?
            }
        }
    }
}

impl RobotDriverOracle<SerialLink> {
    /// Open a serial port and connect to the controller behind it.
    pub fn open_serial(path: &str, baud: u32, read_timeout: Duration) -> Result<Self, OracleError> {
        let runtime = new_runtime()?;
        let link = {
            let _guard = runtime.enter();
            SerialLink::open(path, baud, read_timeout)?
        };
        Self::connect_on(runtime, link)
    }
}
