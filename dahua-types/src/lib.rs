//! Type definitions for dahua

pub mod device_info;
pub mod error;
pub mod operation;
pub mod schema;

pub use device_info::DeviceInfo;
pub use error::{Error, Result};
pub use operation::{
    CoaxialTarget, FieldValue, InfraredMode, LightingProfile, Operation, OperationKind, ProfileMode,
    RecordMode,
};
