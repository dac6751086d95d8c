//! Capture session seam over V4L2.
//!
//! [`CaptureSession`] is the narrow surface the sensor handle drives;
//! [`V4lCapture`] is the production implementation over the `v4l` crate.

use crate::frame::{self, Frame};
use std::io;
use v4l::buffer::Type as BufType;
use v4l::control::{Control, Value};
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// V4L2 control id the DIGIT firmware repurposes for LED intensity
/// (`V4L2_CID_ZOOM_ABSOLUTE`).
pub const CID_LED_INTENSITY: u32 = 0x009a_090d;

/// One opened video-capture session. Exclusively owned, synchronous,
/// blocking throughout; dropping the session releases the device handle.
pub trait CaptureSession: Send {
    fn set_resolution(&mut self, width: u32, height: u32) -> io::Result<()>;
    fn set_frame_rate(&mut self, fps: u32) -> io::Result<()>;
    fn set_control(&mut self, id: u32, value: i64) -> io::Result<()>;
    /// Read one frame in raw sensor orientation.
    fn read_frame(&mut self) -> io::Result<Frame>;
}

/// Production capture session over [`v4l::Device`].
pub struct V4lCapture {
    device: Device,
    width: u32,
    height: u32,
}

impl V4lCapture {
    /// Open the device node and verify it supports video capture.
    pub fn open(device_path: &str) -> io::Result<Self> {
        let device = Device::with_path(device_path)?;

        let caps = device.query_caps()?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{device_path} does not support video capture"),
            ));
        }
        tracing::debug!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened capture session"
        );

        let fmt = device.format()?;
        Ok(Self {
            device,
            width: fmt.width,
            height: fmt.height,
        })
    }
}

impl CaptureSession for V4lCapture {
    fn set_resolution(&mut self, width: u32, height: u32) -> io::Result<()> {
        let requested = Format::new(width, height, FourCC::new(b"YUYV"));
        let negotiated = self.device.set_format(&requested)?;
        if negotiated.fourcc != FourCC::new(b"YUYV") {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("device negotiated {} instead of YUYV", negotiated.fourcc),
            ));
        }
        self.width = negotiated.width;
        self.height = negotiated.height;
        Ok(())
    }

    fn set_frame_rate(&mut self, fps: u32) -> io::Result<()> {
        let params = v4l::video::capture::Parameters::with_fps(fps);
        self.device.set_params(&params)?;
        Ok(())
    }

    fn set_control(&mut self, id: u32, value: i64) -> io::Result<()> {
        self.device.set_control(Control {
            id,
            value: Value::Integer(value),
        })
    }

    fn read_frame(&mut self) -> io::Result<Frame> {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)?;
        let (buf, _meta) = stream.next()?;
        frame::yuyv_to_rgb(buf, self.width, self.height)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
    }
}
