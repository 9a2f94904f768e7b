// src/oracle/driver.rs - Kinematics oracle backed by a real robot controller
use armopt_shared::protocol::{decode_frame, encode_frame, DriverRequest, DriverResponse};
use armopt_shared::{check_joint_count, KinematicsOracle, OracleError, Pose};
use async_trait::async_trait;
use nalgebra::Vector3;
use tokio::runtime::{Builder, Runtime};

/// Byte transport to the robot controller.
///
/// One call sends one request frame and returns one complete response frame.
#[async_trait]
pub trait RobotLink: Send {
    async fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>, OracleError>;
}

#[async_trait]
impl<L: RobotLink + ?Sized> RobotLink for Box<L> {
    async fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>, OracleError> {
        (**self).exchange(frame).await
    }
}

/// Synchronous oracle that forwards every query to the robot over a [`RobotLink`].
///
/// The link is async; calls are driven to completion on a private
/// current-thread runtime, so this type must not be used from inside another
/// tokio runtime.
pub struct RobotDriverOracle<L: RobotLink> {
    link: L,
    runtime: Runtime,
    next_seq: u32,
    num_joints: usize,
}

impl<L: RobotLink> RobotDriverOracle<L> {
    /// Connect over `link` and ask the controller how many joints it drives.
    pub fn connect(link: L) -> Result<Self, OracleError> {
        Self::connect_on(new_runtime()?, link)
    }

    /// Like [`RobotDriverOracle::connect`], reusing a runtime the link was created in.
    pub(crate) fn connect_on(runtime: Runtime, link: L) -> Result<Self, OracleError> {
        let mut oracle = Self {
            link,
            runtime,
            next_seq: 1,
            num_joints: 0,
        };
        match oracle.request(&DriverRequest::Describe)? {
            DriverResponse::Description { num_joints } if num_joints > 0 => {
                oracle.num_joints = num_joints;
                tracing::info!("Robot controller reports {} joints", num_joints);
                Ok(oracle)
            }
            other => Err(unexpected("describe", &other)),
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    fn request(&mut self, request: &DriverRequest) -> Result<DriverResponse, OracleError> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let frame = encode_frame(seq, &request.to_payload()?)?;
        let reply = self.runtime.block_on(self.link.exchange(&frame))?;
        let (reply_seq, payload) = decode_frame(&reply)?;
        if reply_seq != seq {
            return Err(OracleError::Protocol(format!(
                "Sequence mismatch: sent {}, received {}",
                seq, reply_seq
            )));
        }

        match DriverResponse::from_payload(payload)? {
            DriverResponse::Error { message } => Err(OracleError::Robot(message)),
            response => Ok(response),
        }
    }
}

pub(crate) fn new_runtime() -> Result<Runtime, OracleError> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

fn unexpected(query: &str, response: &DriverResponse) -> OracleError {
    OracleError::Protocol(format!("Unexpected response to {}: {:?}", query, response))
}

impl<L: RobotLink> KinematicsOracle for RobotDriverOracle<L> {
    fn num_joints(&self) -> usize {
        self.num_joints
    }

    fn forward_kinematics(&mut self, joint_angles: &[f64]) -> Result<Pose, OracleError> {
        check_joint_count(self.num_joints, joint_angles)?;
        let request = DriverRequest::ForwardKinematics {
            angles: joint_angles.to_vec(),
        };
        match self.request(&request)? {
            DriverResponse::Pose { position, orientation } => Ok(Pose::from_arrays(position, orientation)),
            other => Err(unexpected("forward kinematics", &other)),
        }
    }

    fn inverse_dynamics(
        &mut self,
        angles: &[f64],
        velocities: &[f64],
        accelerations: &[f64],
    ) -> Result<Vec<f64>, OracleError> {
        check_joint_count(self.num_joints, angles)?;
        check_joint_count(self.num_joints, velocities)?;
        check_joint_count(self.num_joints, accelerations)?;
        let request = DriverRequest::InverseDynamics {
            angles: angles.to_vec(),
            velocities: velocities.to_vec(),
            accelerations: accelerations.to_vec(),
        };
        match self.request(&request)? {
            DriverResponse::Torques { values } => {
                check_joint_count(self.num_joints, &values)?;
                Ok(values)
            }
            other => Err(unexpected("inverse dynamics", &other)),
        }
    }

    fn set_pose_and_query_contacts(&mut self, position: &Vector3<f64>) -> Result<bool, OracleError> {
        let request = DriverRequest::QueryContacts {
            position: [position.x, position.y, position.z],
        };
        match self.request(&request)? {
            DriverResponse::Contacts { in_contact } => Ok(in_contact),
            other => Err(unexpected("contact query", &other)),
        }
    }

    fn reset_session(&mut self) -> Result<(), OracleError> {
        match self.request(&DriverRequest::Reset)? {
            DriverResponse::Ack => Ok(()),
            other => Err(unexpected("reset", &other)),
        }
    }
}
