//! Value types shared by the camera resource and parameter controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Denominator used for fixed-point analog gain values.
pub const GAIN_DENOMINATOR: i32 = 65536;

/// Upper bound of the normalized region-of-interest coordinate space.
pub const ROI_FULL: i32 = 0x1000;

/// Exact fraction, used where the hardware exposes non-integer rates and
/// gains without floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Convert a floating-point analog gain multiplier into the fixed-point
    /// rational the sensor expects: `round(gain * 65536) / 65536`.
    pub fn from_analog_gain(gain: f64) -> Self {
        Self {
            num: (gain * f64::from(GAIN_DENOMINATOR)).round() as i32,
            den: GAIN_DENOMINATOR,
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Pixel encoding tag for the capture port.
///
/// `Opaque` is the vendor-internal format handed straight to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelEncoding {
    Opaque,
    Rgb24,
    Bgr24,
    I420,
}

impl PixelEncoding {
    /// Exchange Rgb24 and Bgr24; identity for everything else. Applied when
    /// the sensor does not report a fixed RGB channel order.
    pub fn swapped(self) -> Self {
        match self {
            PixelEncoding::Rgb24 => PixelEncoding::Bgr24,
            PixelEncoding::Bgr24 => PixelEncoding::Rgb24,
            other => other,
        }
    }
}

/// Crop rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Full-frame crop for the given dimensions.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Full sensor area in the normalized 0..4096 region-of-interest space.
    pub const fn full_roi() -> Self {
        Self::new(0, 0, ROI_FULL, ROI_FULL)
    }
}

/// Frame-rate envelope as a low/high pair of rationals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FpsRange {
    pub low: Rational,
    pub high: Rational,
}

impl FpsRange {
    pub const fn new(low: Rational, high: Rational) -> Self {
        Self { low, high }
    }
}

impl fmt::Display for FpsRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.low, self.high)
    }
}

/// Sensor identity discovered once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorInfo {
    pub name: String,
    pub max_width: u32,
    pub max_height: u32,
}

impl SensorInfo {
    pub fn new(name: impl Into<String>, max_width: u32, max_height: u32) -> Self {
        Self {
            name: name.into(),
            max_width,
            max_height,
        }
    }
}

/// Committed capture-port format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFormat {
    pub encoding: PixelEncoding,
    pub width: u32,
    pub height: u32,
    pub crop: CropRect,
    /// Numerator forced to 0: the encoder governs still timing, not the
    /// sensor frame-rate field.
    pub frame_rate: Rational,
    pub pixel_aspect: Rational,
}

impl CaptureFormat {
    /// Still format at the given dimensions: opaque encoding, full-frame
    /// crop, unconstrained frame rate, square pixels.
    pub fn still(width: u32, height: u32) -> Self {
        Self {
            encoding: PixelEncoding::Opaque,
            width,
            height,
            crop: CropRect::full_frame(width, height),
            frame_rate: Rational::new(0, 1),
            pixel_aspect: Rational::new(1, 1),
        }
    }

    pub fn with_encoding(mut self, encoding: PixelEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Exposure request supplied by the calling driver layer, read-only to the
/// core. Applied once per capture cycle without recreating the resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureSettings {
    /// Requested exposure duration in microseconds.
    pub shutter_speed_us: u32,
    /// Analog gain multiplier, converted to fixed point at apply time.
    pub gain: f64,
    /// ISO sensitivity, used only in ISO-based control mode.
    pub iso: u32,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            shutter_speed_us: 100_000,
            gain: 1.0,
            iso: 100,
        }
    }
}

impl ExposureSettings {
    pub fn new(shutter_speed_us: u32, gain: f64) -> Self {
        Self {
            shutter_speed_us,
            gain,
            ..Self::default()
        }
    }

    pub fn with_iso(mut self, iso: u32) -> Self {
        self.iso = iso;
        self
    }
}

/// Lifecycle of a camera resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Constructed,
    Configured,
    Enabled,
    Capturing,
    Disabled,
    Destroyed,
}

/// How the controller programs exposure: raw shutter/gain, or ISO-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureControlMode {
    ShutterGain,
    Iso,
}

/// Default exposure-control mode, selected at build time by the `iso`
/// feature. Both modes remain available at runtime.
pub fn default_mode() -> ExposureControlMode {
    #[cfg(feature = "iso")]
    {
        ExposureControlMode::Iso
    }
    #[cfg(not(feature = "iso"))]
    {
        ExposureControlMode::ShutterGain
    }
}
