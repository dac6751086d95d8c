//! digit — Client library for the DIGIT tactile sensor.
//!
//! Enumerates attached DIGIT devices from sysfs, opens a V4L2 capture
//! session against the matched device node, and exposes stream
//! configuration, LED illumination control, and frame acquisition.

pub mod capture;
pub mod directory;
pub mod frame;
pub mod lighting;
pub mod sensor;
pub mod stream;

pub use directory::{DeviceDescriptor, DeviceDirectory};
pub use frame::Frame;
pub use sensor::{Digit, DigitError};
pub use stream::StreamPreset;
