//! The DIGIT sensor handle — connection lifecycle, stream and LED
//! configuration, frame acquisition.

use crate::capture::{CaptureSession, V4lCapture, CID_LED_INTENSITY};
use crate::directory::{DeviceDescriptor, DeviceDirectory};
use crate::frame::Frame;
use crate::lighting::{self, LIGHTING_MAX};
use crate::stream::StreamPreset;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigitError {
    #[error("no DIGIT with serial {0} attached")]
    DeviceNotFound(String),
    #[error("failed to open video device {path}")]
    DeviceOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read frame from {device}")]
    FrameRead {
        device: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("device is not connected")]
    NotConnected,
    #[error("handle is not bound to a device; populate a serial first")]
    NotResolved,
    #[error("failed to write frame image")]
    FrameWrite(#[from] image::ImageError),
}

/// Handle for a single DIGIT sensor.
///
/// A handle is bound to a descriptor at construction (failing fast when
/// the serial is not attached), opens its capture session on [`connect`],
/// and releases it on [`disconnect`] or drop. `connect` may be called
/// again after `disconnect`; it reopens the device with the stored
/// descriptor.
///
/// [`connect`]: Digit::connect
/// [`disconnect`]: Digit::disconnect
pub struct Digit {
    serial: Option<String>,
    name: Option<String>,
    descriptor: Option<DeviceDescriptor>,
    session: Option<Box<dyn CaptureSession>>,
    resolution: (u32, u32),
    fps: u32,
    intensity: u16,
}

impl Digit {
    /// Resolve `serial` against the attached devices and bind a handle.
    pub fn new(serial: &str, name: Option<&str>) -> Result<Self, DigitError> {
        Self::with_directory(&DeviceDirectory::new(), serial, name)
    }

    /// Same as [`Digit::new`], against an explicit directory.
    pub fn with_directory(
        directory: &DeviceDirectory,
        serial: &str,
        name: Option<&str>,
    ) -> Result<Self, DigitError> {
        let mut digit = Self::detached(name);
        digit.populate_from(directory, serial)?;
        Ok(digit)
    }

    /// A handle not yet bound to a device. Call [`Digit::populate`]
    /// before [`Digit::connect`]. Secondary path for callers that
    /// enumerate late.
    pub fn detached(name: Option<&str>) -> Self {
        Self {
            serial: None,
            name: name.map(str::to_string),
            descriptor: None,
            session: None,
            resolution: (0, 0),
            fps: 0,
            intensity: 0,
        }
    }

    /// Resolve `serial` and store its descriptor on this handle.
    pub fn populate(&mut self, serial: &str) -> Result<(), DigitError> {
        self.populate_from(&DeviceDirectory::new(), serial)
    }

    fn populate_from(
        &mut self,
        directory: &DeviceDirectory,
        serial: &str,
    ) -> Result<(), DigitError> {
        let descriptor = directory
            .find_device(serial)
            .ok_or_else(|| DigitError::DeviceNotFound(serial.to_string()))?;
        tracing::debug!(serial, path = %descriptor.device_path, "resolved DIGIT");
        self.serial = Some(descriptor.serial.clone());
        self.descriptor = Some(descriptor);
        Ok(())
    }

    /// Open the capture session and apply the stream defaults: QVGA at
    /// its higher frame rate, LEDs at full intensity. A no-op when
    /// already connected.
    pub fn connect(&mut self) -> Result<(), DigitError> {
        if self.session.is_some() {
            return Ok(());
        }
        let descriptor = self.descriptor.clone().ok_or(DigitError::NotResolved)?;
        tracing::info!(
            serial = %descriptor.serial,
            path = %descriptor.device_path,
            "connecting to DIGIT"
        );
        let session =
            V4lCapture::open(&descriptor.device_path).map_err(|source| DigitError::DeviceOpen {
                path: descriptor.device_path.clone(),
                source,
            })?;
        self.attach(Box::new(session))
    }

    /// Bind an opened session and apply the stream defaults.
    fn attach(&mut self, session: Box<dyn CaptureSession>) -> Result<(), DigitError> {
        self.session = Some(session);
        let preset = StreamPreset::Qvga;
        self.set_resolution(preset)?;
        self.set_fps(preset.default_fps())?;
        self.set_intensity(LIGHTING_MAX as i32)?;
        Ok(())
    }

    /// Apply a stream preset's resolution to the device.
    ///
    /// The device ignores widths and heights outside its preset table, so
    /// a refused negotiation is logged, not surfaced.
    pub fn set_resolution(&mut self, preset: StreamPreset) -> Result<(), DigitError> {
        let (width, height) = preset.resolution();
        let session = self.session.as_mut().ok_or(DigitError::NotConnected)?;
        if let Err(e) = session.set_resolution(width, height) {
            tracing::warn!(error = %e, width, height, "resolution not accepted by device");
        }
        self.resolution = (width, height);
        tracing::debug!(width, height, "stream resolution set");
        Ok(())
    }

    /// Set the stream frame rate.
    ///
    /// Call after [`Digit::set_resolution`]: each preset carries its own
    /// legal rates and no cross-validation is performed here.
    pub fn set_fps(&mut self, fps: u32) -> Result<(), DigitError> {
        let session = self.session.as_mut().ok_or(DigitError::NotConnected)?;
        if let Err(e) = session.set_frame_rate(fps) {
            tracing::warn!(error = %e, fps, "frame rate not accepted by device");
        }
        self.fps = fps;
        tracing::debug!(fps, "stream frame rate set");
        Ok(())
    }

    /// Set all three LED channels to `level`, clamping to [0, 15].
    /// Returns the per-channel level actually applied.
    ///
    /// Firmware revisions below 200 have no independent RGB control and
    /// use a coarser scale; the level is divided down before applying.
    pub fn set_intensity(&mut self, level: i32) -> Result<u8, DigitError> {
        if self.session.is_none() {
            return Err(DigitError::NotConnected);
        }
        let mut level = lighting::clamp_level(level);
        if let Some(descriptor) = &self.descriptor {
            if descriptor.revision < lighting::LEGACY_REVISION {
                level /= lighting::LEGACY_SCALER;
                tracing::warn!(
                    revision = descriptor.revision,
                    "legacy firmware without independent RGB control; update the DIGIT firmware"
                );
            }
        }
        self.set_intensity_rgb(level, level, level)?;
        Ok(level)
    }

    /// Per-channel LED control; channels outside [0, 15] are rejected.
    /// Returns the composite control value written to the device, red in
    /// the most significant nibble.
    pub fn set_intensity_rgb(&mut self, r: u8, g: u8, b: u8) -> Result<u16, DigitError> {
        let composite = lighting::pack_rgb(r, g, b)?;
        let session = self.session.as_mut().ok_or(DigitError::NotConnected)?;
        if let Err(e) = session.set_control(CID_LED_INTENSITY, composite as i64) {
            tracing::warn!(error = %e, composite, "LED control write failed");
        }
        self.intensity = composite;
        tracing::debug!(composite, r, g, b, "LED intensity set");
        Ok(composite)
    }

    /// Read one frame. The image sensor is mounted rotated; unless
    /// `transpose` is set, the raw frame is corrected to a right-side-up
    /// (W, H) image.
    pub fn get_frame(&mut self, transpose: bool) -> Result<Frame, DigitError> {
        let device = self.device_label();
        let session = self.session.as_mut().ok_or(DigitError::NotConnected)?;
        let frame = session
            .read_frame()
            .map_err(|source| DigitError::FrameRead { device, source })?;
        if transpose {
            Ok(frame)
        } else {
            Ok(frame.upright())
        }
    }

    /// Capture one corrected frame, write it to `path` (format chosen by
    /// extension), and return it.
    pub fn save_frame(&mut self, path: impl AsRef<Path>) -> Result<Frame, DigitError> {
        let frame = self.get_frame(false)?;
        tracing::debug!(path = %path.as_ref().display(), "saving frame");
        frame.save(path)?;
        Ok(frame)
    }

    /// Capture a fresh corrected frame and return its wrapping difference
    /// against `reference`.
    pub fn get_diff(&mut self, reference: &Frame) -> Result<Frame, DigitError> {
        Ok(self.get_frame(false)?.diff(reference))
    }

    /// Release the capture session if one is open; a no-op otherwise.
    /// The handle stays resolved and [`Digit::connect`] may be called
    /// again.
    pub fn disconnect(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!(device = %self.device_label(), "closed DIGIT device");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.descriptor.as_ref()
    }

    /// Last-applied (width, height); (0, 0) before the first connect.
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Last-applied LED composite value.
    pub fn intensity(&self) -> u16 {
        self.intensity
    }

    /// Human-readable snapshot of identity, connection state, and (when
    /// connected) the mirrored stream configuration. No side effects.
    pub fn info(&self) -> String {
        let name = self.name.as_deref().unwrap_or("-");
        let (path, model, revision) = match &self.descriptor {
            Some(d) => (d.device_path.as_str(), d.model.as_str(), d.revision),
            None => ("-", "-", 0),
        };
        let connected = self.is_connected();
        let mut info = format!(
            "Name: {name} {path}\
             \n\t- Model: {model}\
             \n\t- Revision: {revision}\
             \n\t- Connected?: {connected}"
        );
        if connected {
            let (width, height) = self.resolution;
            info.push_str(&format!(
                "\nStream Info:\
                 \n\t- Resolution: {width} x {height}\
                 \n\t- FPS: {}\
                 \n\t- LED Intensity: {}",
                self.fps, self.intensity
            ));
        }
        info
    }

    fn device_label(&self) -> String {
        self.descriptor
            .as_ref()
            .map(|d| d.device_path.clone())
            .unwrap_or_else(|| "<unresolved>".to_string())
    }
}

impl fmt::Debug for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Digit")
            .field("serial", &self.serial)
            .field("name", &self.name)
            .field("connected", &self.session.is_some())
            .finish()
    }
}
