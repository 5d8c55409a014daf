//! Vendor component seam.
//!
//! The MMAL layer exposes a camera as a component with one control channel
//! and three output ports, each carrying mutable parameter and format
//! state. This module wraps that handle graph behind the
//! [`CameraComponent`] trait with capability-scoped, strongly-typed methods
//! so the layers above never touch raw port arrays.

pub mod mock;

use crate::types::{CaptureFormat, CropRect, FpsRange, Rational, SensorInfo};
use serde::Serialize;
use std::fmt;

/// Output ports of the camera component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputPort {
    Preview,
    Video,
    Capture,
}

/// Camera-wide tunables reached through the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ControlParam {
    SensorMode,
    AwbMode,
    Saturation,
    DigitalGain,
    Iso,
    Brightness,
    ExposureMode,
    InputCrop,
    ShutterSpeed,
    AnalogGain,
    CaptureStatsPass,
}

/// Per-port tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PortParam {
    /// Boolean capture flag; setting it to true arms the exposure.
    Capture,
    ZeroCopy,
    RawCapture,
    FpsRange,
}

/// Automatic white balance modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AwbMode {
    Off,
    Auto,
    Sunlight,
    Cloudy,
    Tungsten,
    Fluorescent,
}

/// Exposure modes; `Off` means fully manual, no auto-exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExposureMode {
    Off,
    Auto,
}

/// Typed parameter value union.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ParamValue {
    U32(u32),
    Bool(bool),
    Rational(Rational),
    Crop(CropRect),
    Awb(AwbMode),
    Exposure(ExposureMode),
    Fps(FpsRange),
}

/// One-shot still camera configuration block committed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StillConfig {
    pub max_stills_width: u32,
    pub max_stills_height: u32,
    pub one_shot_stills: bool,
    /// The vendor layer requires a preview allocation even though no
    /// preview is consumed.
    pub max_preview_width: u32,
    pub max_preview_height: u32,
    pub num_preview_frames: u32,
    pub restart_stc_timestamp: bool,
}

impl StillConfig {
    /// Maximum-resolution one-shot configuration with the fixed small
    /// preview allocation the firmware insists on.
    pub fn one_shot(width: u32, height: u32) -> Self {
        Self {
            max_stills_width: width,
            max_stills_height: height,
            one_shot_stills: true,
            max_preview_width: 1024,
            max_preview_height: 768,
            num_preview_frames: 1,
            restart_stc_timestamp: true,
        }
    }
}

/// Asynchronous notification from the vendor callback thread.
///
/// Delivery is fire-and-forget: the vendor side drops events nobody is
/// listening for, and this core never blocks on the channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ControlEvent {
    /// Hardware-reported error on the control channel.
    Error(String),
    /// A camera-wide parameter changed out of band.
    ParameterChanged(ControlParam),
}

/// Sink end of the control-event channel handed to the component.
pub type EventSink = crossbeam_channel::Sender<ControlEvent>;

/// Vendor-status failure from the component layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalError(pub String);

impl HalError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HalError {}

/// Strongly-typed surface over the vendor camera component.
///
/// One instance corresponds to one hardware component handle. Callers are
/// expected to issue lifecycle and parameter calls from a single owning
/// thread; the only cross-thread surface is the event sink passed to
/// [`CameraComponent::enable_control`].
pub trait CameraComponent {
    /// Bind the component to the hardware sensor at `index`.
    fn select_camera(&mut self, index: u32) -> Result<(), HalError>;

    /// Number of output ports the component exposes.
    fn output_port_count(&self) -> u32;

    /// Enable the control channel, routing asynchronous notifications to
    /// `events` from the vendor-managed callback thread.
    fn enable_control(&mut self, events: EventSink) -> Result<(), HalError>;

    fn disable_control(&mut self) -> Result<(), HalError>;

    fn is_control_enabled(&self) -> bool;

    /// Query the transient camera-info probe component for the detected
    /// sensors. An `Err` here means the firmware predates the probe call,
    /// not that construction must fail; the probe component is destroyed
    /// before returning either way.
    fn probe_sensors(&mut self) -> Result<Vec<SensorInfo>, HalError>;

    /// Commit the one-shot still configuration on the control channel.
    fn commit_camera_config(&mut self, config: &StillConfig) -> Result<(), HalError>;

    /// Whether the sensor reports a fixed RGB channel order on `port`.
    fn rgb_order_fixed(&self, port: OutputPort) -> bool;

    /// Commit an elementary-stream format on an output port.
    fn commit_output_format(
        &mut self,
        port: OutputPort,
        format: &CaptureFormat,
    ) -> Result<(), HalError>;

    fn set_control_parameter(
        &mut self,
        param: ControlParam,
        value: ParamValue,
    ) -> Result<(), HalError>;

    fn get_control_parameter(&self, param: ControlParam) -> Result<ParamValue, HalError>;

    fn set_output_parameter(
        &mut self,
        port: OutputPort,
        param: PortParam,
        value: ParamValue,
    ) -> Result<(), HalError>;

    fn get_output_parameter(
        &self,
        port: OutputPort,
        param: PortParam,
    ) -> Result<ParamValue, HalError>;

    /// Hardware-recommended buffer size for `port`, in bytes.
    fn recommended_buffer_size(&self, port: OutputPort) -> u32;

    /// Resize the port's buffers to the hardware-recommended value.
    fn apply_recommended_buffer_size(&mut self, port: OutputPort) -> Result<(), HalError>;

    /// Enable the component as a whole.
    fn enable(&mut self) -> Result<(), HalError>;

    /// Disable the component as a whole. Disabling an already-disabled
    /// component must succeed.
    fn disable(&mut self) -> Result<(), HalError>;

    fn is_port_enabled(&self, port: OutputPort) -> bool;

    fn disable_port(&mut self, port: OutputPort) -> Result<(), HalError>;
}
