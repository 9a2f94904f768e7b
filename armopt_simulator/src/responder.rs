// armopt_simulator/src/responder.rs
//! Robot-side endpoint of the driver protocol.
//!
//! Wraps any oracle and answers framed [`DriverRequest`]s the way firmware on
//! a real controller would. Used as a loopback target for driver tests and
//! bench setups without hardware.

use armopt_shared::protocol::{decode_frame, encode_frame, DriverRequest, DriverResponse};
use armopt_shared::{KinematicsOracle, OracleError};
use nalgebra::Vector3;

pub struct ProtocolResponder<O: KinematicsOracle> {
    oracle: O,
    frames_handled: u64,
}

impl<O: KinematicsOracle> ProtocolResponder<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            frames_handled: 0,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn frames_handled(&self) -> u64 {
        self.frames_handled
    }

    /// Answer one request frame with one response frame carrying the same
    /// sequence number. Malformed frames are answered with sequence 0.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<Vec<u8>, OracleError> {
        self.frames_handled += 1;
        let (seq, response) = match decode_frame(frame) {
            Ok((seq, payload)) => {
                let response = match DriverRequest::from_payload(payload) {
                    Ok(request) => self.dispatch(request),
                    Err(e) => DriverResponse::Error { message: e.to_string() },
                };
                (seq, response)
            }
            Err(e) => (0, DriverResponse::Error { message: e.to_string() }),
        };
        encode_frame(seq, &response.to_payload()?)
    }

    fn dispatch(&mut self, request: DriverRequest) -> DriverResponse {
        let result = match request {
            DriverRequest::Describe => Ok(DriverResponse::Description {
                num_joints: self.oracle.num_joints(),
            }),
            DriverRequest::ForwardKinematics { angles } => self
                .oracle
                .forward_kinematics(&angles)
                .map(|pose| DriverResponse::from_pose(&pose)),
            DriverRequest::InverseDynamics {
                angles,
                velocities,
                accelerations,
            } => self
                .oracle
                .inverse_dynamics(&angles, &velocities, &accelerations)
                .map(|values| DriverResponse::Torques { values }),
            DriverRequest::QueryContacts { position } => self
                .oracle
                .set_pose_and_query_contacts(&Vector3::new(position[0], position[1], position[2]))
                .map(|in_contact| DriverResponse::Contacts { in_contact }),
            DriverRequest::Reset => self.oracle.reset_session().map(|_| DriverResponse::Ack),
        };
        result.unwrap_or_else(|e| DriverResponse::Error { message: e.to_string() })
    }
}
