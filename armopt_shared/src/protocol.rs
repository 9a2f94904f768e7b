//! Framed request/response protocol spoken between the host and a robot driver.
//!
//! Frame layout (little endian):
//!
//! ```text
//! | seq: u32 | len: u16 | payload: [u8; len] | crc16: u16 |
//! ```
//!
//! The CRC is CRC-16/XMODEM over everything before it. Payloads are JSON
//! encoded [`DriverRequest`] / [`DriverResponse`] values.

use serde::{Deserialize, Serialize};

use crate::{OracleError, Pose};

pub const FRAME_HEADER_LEN: usize = 6;
pub const FRAME_TRAILER_LEN: usize = 2;
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// CRC-16-CCITT calculation (XMODEM variant)
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &b in data {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Wrap a payload with sequence number, length and CRC.
pub fn encode_frame(seq: u32, payload: &[u8]) -> Result<Vec<u8>, OracleError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(OracleError::Protocol(format!(
            "payload of {} bytes exceeds frame limit",
            payload.len()
        )));
    }
    let mut packet = Vec::with_capacity(FRAME_HEADER_LEN + payload.len() + FRAME_TRAILER_LEN);
    packet.extend_from_slice(&seq.to_le_bytes());
    packet.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    packet.extend_from_slice(payload);
    let crc = crc16(&packet);
    packet.extend_from_slice(&crc.to_le_bytes());
    Ok(packet)
}

/// Total frame length announced by a buffer's header, if the header is complete.
pub fn expected_frame_len(buf: &[u8]) -> Option<usize> {
    if buf.len() < FRAME_HEADER_LEN {
        return None;
    }
    let len = u16::from_le_bytes([buf[4], buf[5]]) as usize;
    Some(FRAME_HEADER_LEN + len + FRAME_TRAILER_LEN)
}

/// Validate a complete frame and return its sequence number and payload.
pub fn decode_frame(buf: &[u8]) -> Result<(u32, &[u8]), OracleError> {
    let total = expected_frame_len(buf)
        .ok_or_else(|| OracleError::Protocol(format!("short frame: {} bytes", buf.len())))?;
    if buf.len() != total {
        return Err(OracleError::Protocol(format!(
            "frame length mismatch: header announces {} bytes, got {}",
            total,
            buf.len()
        )));
    }
    let seq = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let crc_recv = u16::from_le_bytes([buf[total - 2], buf[total - 1]]);
    let crc_calc = crc16(&buf[..total - 2]);
    if crc_calc != crc_recv {
        return Err(OracleError::Protocol("CRC mismatch".to_string()));
    }
    Ok((seq, &buf[FRAME_HEADER_LEN..total - FRAME_TRAILER_LEN]))
}

/// A single oracle query sent to the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverRequest {
    Describe,
    ForwardKinematics {
        angles: Vec<f64>,
    },
    InverseDynamics {
        angles: Vec<f64>,
        velocities: Vec<f64>,
        accelerations: Vec<f64>,
    },
    QueryContacts {
        position: [f64; 3],
    },
    Reset,
}

/// The robot's answer to a [`DriverRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverResponse {
    Description { num_joints: usize },
    Pose { position: [f64; 3], orientation: [f64; 4] },
    Torques { values: Vec<f64> },
    Contacts { in_contact: bool },
    Ack,
    Error { message: String },
}

impl DriverRequest {
    pub fn to_payload(&self) -> Result<Vec<u8>, OracleError> {
        serde_json::to_vec(self).map_err(|e| OracleError::Protocol(format!("encode request: {}", e)))
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, OracleError> {
        serde_json::from_slice(payload).map_err(|e| OracleError::Protocol(format!("decode request: {}", e)))
    }
}

impl DriverResponse {
    pub fn to_payload(&self) -> Result<Vec<u8>, OracleError> {
        serde_json::to_vec(self).map_err(|e| OracleError::Protocol(format!("encode response: {}", e)))
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, OracleError> {
        serde_json::from_slice(payload).map_err(|e| OracleError::Protocol(format!("decode response: {}", e)))
    }

    pub fn from_pose(pose: &Pose) -> Self {
        DriverResponse::Pose {
            position: pose.position_array(),
            orientation: pose.orientation_wxyz(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc16_xmodem_check_value() {
        // Standard check value for "123456789"
        assert_eq!(crc16(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_frame_roundtrip_and_corruption() {
        let payload = DriverRequest::QueryContacts { position: [0.1, 0.2, 0.3] }
            .to_payload()
            .unwrap();
        let mut frame = encode_frame(7, &payload).unwrap();
        assert_eq!(expected_frame_len(&frame), Some(frame.len()));
        let (seq, body) = decode_frame(&frame).unwrap();
        assert_eq!(seq, 7);
        assert_eq!(
            DriverRequest::from_payload(body).unwrap(),
            DriverRequest::QueryContacts { position: [0.1, 0.2, 0.3] }
        );

        frame[FRAME_HEADER_LEN] ^= 0xFF;
        assert!(matches!(decode_frame(&frame), Err(OracleError::Protocol(_))));
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let frame = encode_frame(1, b"{}").unwrap();
        assert!(decode_frame(&frame[..frame.len() - 1]).is_err());
        assert!(decode_frame(&frame[..3]).is_err());
    }

    #[test]
    fn test_request_json_shape() {
        let json = String::from_utf8(DriverRequest::Reset.to_payload().unwrap()).unwrap();
        assert_eq!(json, r#"{"type":"reset"}"#);
    }
}
