//! Parameter controller: applies a validated batch of exposure parameters
//! to a constructed camera resource in a fixed order.
//!
//! The order matters because several parameters are interdependent: the
//! frame-rate bounds derive from the shutter speed, and the output format
//! must be committed (at construction) before buffer-size tuning. Partial
//! application is an acceptable end state; every parameter is idempotent
//! and re-appliable, so nothing is rolled back on failure.

use crate::camera::CameraResource;
use crate::errors::CameraError;
use crate::mmal::{
    AwbMode, CameraComponent, ControlParam, ExposureMode, OutputPort, ParamValue, PortParam,
};
use crate::types::{
    default_mode, CropRect, ExposureControlMode, ExposureSettings, FpsRange, Rational,
};
use log::{info, warn};
use std::fmt;

/// Maximum accepted divergence between requested and read-back shutter
/// speed, in microseconds. The hardware quantizes shutter speed, so exact
/// matches are structurally impossible.
pub const SHUTTER_TOLERANCE_US: u32 = 100_000;

const LONG_EXPOSURE_US: u32 = 6_000_000;
const MEDIUM_EXPOSURE_US: u32 = 1_000_000;

// The firmware accepts this as neutral saturation; the denominator is not
// interpreted for this parameter.
const SATURATION_NEUTRAL: Rational = Rational::new(10, 0);
const DIGITAL_GAIN_UNITY: Rational = Rational::new(1, 1);
const BRIGHTNESS_DEFAULT: Rational = Rational::new(50, 100);

/// Frame-rate bounds for a shutter speed, across three disjoint regimes.
/// Exposures at or below one second rely on the sensor's default envelope.
pub fn frame_rate_bounds(shutter_speed_us: u32, default: FpsRange) -> FpsRange {
    if shutter_speed_us > LONG_EXPOSURE_US {
        FpsRange::new(Rational::new(5, 1000), Rational::new(166, 1000))
    } else if shutter_speed_us > MEDIUM_EXPOSURE_US {
        FpsRange::new(Rational::new(167, 1000), Rational::new(999, 1000))
    } else {
        default
    }
}

/// Advisory read-back mismatch. Never aborts the apply sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToleranceWarning {
    pub parameter: &'static str,
    pub requested: String,
    pub actual: String,
}

impl fmt::Display for ToleranceWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: requested {} but hardware reports {}",
            self.parameter, self.requested, self.actual
        )
    }
}

/// Outcome of a completed apply sequence.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub warnings: Vec<ToleranceWarning>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Applies exposure parameters to a camera resource, once per capture
/// cycle, without recreating the resource.
#[derive(Debug, Clone, Copy)]
pub struct ParameterController {
    mode: ExposureControlMode,
}

impl Default for ParameterController {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterController {
    /// Controller using the build-time default exposure-control mode.
    pub fn new() -> Self {
        Self {
            mode: default_mode(),
        }
    }

    pub fn with_mode(mode: ExposureControlMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ExposureControlMode {
        self.mode
    }

    /// Apply the full parameter sequence for the next exposure.
    ///
    /// Any failed set/get is a [`CameraError::ParameterError`] naming the
    /// parameter; read-back divergence within hardware quantization limits
    /// is collected into the report instead.
    pub fn apply<C: CameraComponent>(
        &self,
        resource: &mut CameraResource<C>,
        settings: &ExposureSettings,
    ) -> Result<ApplyReport, CameraError> {
        let mut report = ApplyReport::default();

        set_control(
            resource,
            "AWB mode",
            ControlParam::AwbMode,
            ParamValue::Awb(AwbMode::Auto),
        )?;
        set_control(
            resource,
            "saturation",
            ControlParam::Saturation,
            ParamValue::Rational(SATURATION_NEUTRAL),
        )?;
        set_control(
            resource,
            "digital gain",
            ControlParam::DigitalGain,
            ParamValue::Rational(DIGITAL_GAIN_UNITY),
        )?;

        if self.mode == ExposureControlMode::Iso {
            set_control(resource, "ISO", ControlParam::Iso, ParamValue::U32(settings.iso))?;
            info!("ISO set to {}", settings.iso);
        }

        set_control(
            resource,
            "brightness",
            ControlParam::Brightness,
            ParamValue::Rational(BRIGHTNESS_DEFAULT),
        )?;
        set_control(
            resource,
            "exposure mode",
            ControlParam::ExposureMode,
            ParamValue::Exposure(ExposureMode::Off),
        )?;
        set_control(
            resource,
            "ROI",
            ControlParam::InputCrop,
            ParamValue::Crop(CropRect::full_roi()),
        )?;

        resource
            .component_mut()
            .apply_recommended_buffer_size(OutputPort::Capture)
            .map_err(|e| {
                CameraError::ParameterError(format!(
                    "failed to set capture port buffer size: {}",
                    e
                ))
            })?;

        set_port(
            resource,
            "zero-copy",
            OutputPort::Video,
            PortParam::ZeroCopy,
            ParamValue::Bool(true),
        )?;
        set_port(
            resource,
            "raw capture",
            OutputPort::Capture,
            PortParam::RawCapture,
            ParamValue::Bool(true),
        )?;
        set_control(
            resource,
            "capture stats pass",
            ControlParam::CaptureStatsPass,
            ParamValue::Bool(true),
        )?;

        self.apply_shutter_speed(resource, settings.shutter_speed_us, &mut report)?;
        self.apply_fps_range(resource, settings.shutter_speed_us, &mut report)?;

        if self.mode == ExposureControlMode::ShutterGain {
            let gain = Rational::from_analog_gain(settings.gain);
            set_control(
                resource,
                "analog gain",
                ControlParam::AnalogGain,
                ParamValue::Rational(gain),
            )?;
            info!("gain set to {}", gain);
        }

        Ok(report)
    }

    fn apply_shutter_speed<C: CameraComponent>(
        &self,
        resource: &mut CameraResource<C>,
        shutter_speed_us: u32,
        report: &mut ApplyReport,
    ) -> Result<(), CameraError> {
        set_control(
            resource,
            "shutter speed",
            ControlParam::ShutterSpeed,
            ParamValue::U32(shutter_speed_us),
        )?;

        let actual = match resource
            .component()
            .get_control_parameter(ControlParam::ShutterSpeed)
        {
            Ok(ParamValue::U32(actual)) => actual,
            Ok(other) => {
                return Err(CameraError::ParameterError(format!(
                    "shutter speed read-back had unexpected value: {:?}",
                    other
                )))
            }
            Err(e) => {
                return Err(CameraError::ParameterError(format!(
                    "failed to get shutter speed: {}",
                    e
                )))
            }
        };

        if actual.abs_diff(shutter_speed_us) > SHUTTER_TOLERANCE_US {
            let warning = ToleranceWarning {
                parameter: "shutter speed",
                requested: shutter_speed_us.to_string(),
                actual: actual.to_string(),
            };
            warn!("{}", warning);
            report.warnings.push(warning);
        }
        Ok(())
    }

    fn apply_fps_range<C: CameraComponent>(
        &self,
        resource: &mut CameraResource<C>,
        shutter_speed_us: u32,
        report: &mut ApplyReport,
    ) -> Result<(), CameraError> {
        let bounds = frame_rate_bounds(shutter_speed_us, resource.default_fps_range());
        info!("setting fps range {}", bounds);

        set_port(
            resource,
            "FPS range",
            OutputPort::Capture,
            PortParam::FpsRange,
            ParamValue::Fps(bounds),
        )?;

        let actual = match resource
            .component()
            .get_output_parameter(OutputPort::Capture, PortParam::FpsRange)
        {
            Ok(ParamValue::Fps(actual)) => actual,
            Ok(other) => {
                return Err(CameraError::ParameterError(format!(
                    "FPS range read-back had unexpected value: {:?}",
                    other
                )))
            }
            Err(e) => {
                return Err(CameraError::ParameterError(format!(
                    "failed to get FPS range: {}",
                    e
                )))
            }
        };

        if actual != bounds {
            let warning = ToleranceWarning {
                parameter: "FPS range",
                requested: bounds.to_string(),
                actual: actual.to_string(),
            };
            warn!("{}", warning);
            report.warnings.push(warning);
        }

        resource.set_fps_range(bounds);
        Ok(())
    }
}

fn set_control<C: CameraComponent>(
    resource: &mut CameraResource<C>,
    name: &str,
    param: ControlParam,
    value: ParamValue,
) -> Result<(), CameraError> {
    resource
        .component_mut()
        .set_control_parameter(param, value)
        .map_err(|e| CameraError::ParameterError(format!("failed to set {}: {}", name, e)))
}

fn set_port<C: CameraComponent>(
    resource: &mut CameraResource<C>,
    name: &str,
    port: OutputPort,
    param: PortParam,
    value: ParamValue,
) -> Result<(), CameraError> {
    resource
        .component_mut()
        .set_output_parameter(port, param, value)
        .map_err(|e| CameraError::ParameterError(format!("failed to set {}: {}", name, e)))
}
