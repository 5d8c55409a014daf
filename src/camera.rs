//! Camera resource: owns the vendor component handle, its lifecycle, and
//! the committed configuration state.
//!
//! Construction either fully succeeds or the resource is unusable and must
//! be discarded. Exactly one thread is expected to issue lifecycle and
//! parameter calls; the control-event channel is the only cross-thread
//! surface and is fire-and-forget.

use crate::errors::CameraError;
use crate::mmal::{
    CameraComponent, ControlParam, EventSink, OutputPort, ParamValue, PortParam, StillConfig,
};
use crate::types::{CaptureFormat, FpsRange, LifecycleState, PixelEncoding, Rational, SensorInfo};
use log::{info, warn};

/// Sensor identity assumed when the camera-info probe is unavailable
/// (older firmware). Degraded but functional, not an error path.
fn fallback_sensor() -> SensorInfo {
    SensorInfo::new("OV5647", 2592, 1944)
}

/// One physical camera sensor configured for one-shot still capture.
pub struct CameraResource<C: CameraComponent> {
    component: C,
    camera_num: u32,
    sensor: SensorInfo,
    format: CaptureFormat,
    default_fps: FpsRange,
    fps: FpsRange,
    state: LifecycleState,
}

impl<C: CameraComponent> CameraResource<C> {
    /// Construct against the sensor at `camera_num` with the default opaque
    /// capture encoding.
    pub fn new(component: C, camera_num: u32, events: EventSink) -> Result<Self, CameraError> {
        Self::with_encoding(component, camera_num, PixelEncoding::Opaque, events)
    }

    /// Construct with an explicit capture-port encoding request.
    ///
    /// Runs the full order-sensitive configuration sequence: camera
    /// selection, sensor mode, control channel, sensor probe, still
    /// configuration, capture-port format, and the default frame-rate
    /// envelope read-back.
    pub fn with_encoding(
        mut component: C,
        camera_num: u32,
        encoding: PixelEncoding,
        events: EventSink,
    ) -> Result<Self, CameraError> {
        component.select_camera(camera_num).map_err(|e| {
            CameraError::SelectionError(format!("could not select camera {}: {}", camera_num, e))
        })?;

        if component.output_port_count() == 0 {
            return Err(CameraError::SelectionError(
                "camera doesn't have output ports".to_string(),
            ));
        }

        component
            .set_control_parameter(ControlParam::SensorMode, ParamValue::U32(0))
            .map_err(|e| {
                CameraError::ConfigurationError(format!("could not set sensor mode: {}", e))
            })?;

        component.enable_control(events).map_err(|e| {
            CameraError::ControlChannelError(format!("could not enable control channel: {}", e))
        })?;

        let sensor = query_sensor_info(&mut component, camera_num)?;

        // The resource exists from here on; a failed commit below drops it
        // through the best-effort teardown path.
        let unknown_fps = FpsRange::new(Rational::new(0, 1), Rational::new(0, 1));
        let mut resource = Self {
            format: CaptureFormat::still(sensor.max_width, sensor.max_height),
            component,
            camera_num,
            sensor,
            default_fps: unknown_fps,
            fps: unknown_fps,
            state: LifecycleState::Constructed,
        };
        resource.configure(encoding)?;
        Ok(resource)
    }

    /// Commit the base configuration: still-camera config, capture-port
    /// format, and the default frame-rate envelope read-back.
    fn configure(&mut self, encoding: PixelEncoding) -> Result<(), CameraError> {
        let config = StillConfig::one_shot(self.sensor.max_width, self.sensor.max_height);
        self.component.commit_camera_config(&config).map_err(|e| {
            CameraError::ConfigurationError(format!("failed to set camera config: {}", e))
        })?;

        self.format = commit_capture_format(&mut self.component, &self.sensor, encoding)?;

        self.default_fps = match self
            .component
            .get_output_parameter(OutputPort::Capture, PortParam::FpsRange)
        {
            Ok(ParamValue::Fps(range)) => range,
            Ok(other) => {
                return Err(CameraError::ConfigurationError(format!(
                    "unexpected FPS range value: {:?}",
                    other
                )))
            }
            Err(e) => {
                return Err(CameraError::ConfigurationError(format!(
                    "failed to get FPS range: {}",
                    e
                )))
            }
        };
        self.fps = self.default_fps;
        info!(
            "camera {} ({}): fps_low={}, fps_high={}",
            self.camera_num, self.sensor.name, self.default_fps.low, self.default_fps.high
        );

        self.state = LifecycleState::Configured;
        Ok(())
    }

    /// Arm an exposure: enable the component, then raise the capture flag.
    ///
    /// Returns as soon as the hardware starts exposing; frame delivery
    /// happens out of band through the buffer callback collaborator. On
    /// failure nothing is rolled back; the caller must abort or discard.
    pub fn capture(&mut self) -> Result<(), CameraError> {
        self.component.enable().map_err(|e| {
            CameraError::CaptureStartError(format!("camera component couldn't be enabled: {}", e))
        })?;
        self.state = LifecycleState::Enabled;

        self.component
            .set_output_parameter(OutputPort::Capture, PortParam::Capture, ParamValue::Bool(true))
            .map_err(|e| CameraError::CaptureStartError(format!("failed to start capture: {}", e)))?;
        self.state = LifecycleState::Capturing;
        info!("camera {}: capture armed", self.camera_num);
        Ok(())
    }

    /// Clear the capture flag and disable the component.
    ///
    /// Both steps are always attempted; the first failure is reported after
    /// both ran. Used for user cancellation and for cleanup after a
    /// completed exposure, so calling it twice, or after natural
    /// completion, must be safe.
    pub fn abort(&mut self) -> Result<(), CameraError> {
        let cleared = self
            .component
            .set_output_parameter(
                OutputPort::Capture,
                PortParam::Capture,
                ParamValue::Bool(false),
            )
            .map_err(|e| CameraError::AbortError(format!("failed to abort capture: {}", e)));

        let disabled = self.component.disable().map_err(|e| {
            CameraError::AbortError(format!("camera component couldn't be disabled: {}", e))
        });

        cleared?;
        disabled?;
        self.state = LifecycleState::Disabled;
        info!("camera {}: capture aborted", self.camera_num);
        Ok(())
    }

    /// Best-effort teardown: disable the capture port, then the control
    /// channel, skipping whatever was never enabled. A failed disable is
    /// reported but does not stop the remaining steps.
    pub fn shutdown(&mut self) -> Result<(), CameraError> {
        let mut first_error = None;

        if self.component.is_port_enabled(OutputPort::Capture) {
            if let Err(e) = self.component.disable_port(OutputPort::Capture) {
                let err =
                    CameraError::TeardownError(format!("failed to disable capture port: {}", e));
                warn!("{}", err);
                first_error = Some(err);
            }
        }

        if self.component.is_control_enabled() {
            if let Err(e) = self.component.disable_control() {
                let err =
                    CameraError::TeardownError(format!("failed to disable control channel: {}", e));
                warn!("{}", err);
                first_error.get_or_insert(err);
            }
        }

        self.state = LifecycleState::Destroyed;
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn camera_num(&self) -> u32 {
        self.camera_num
    }

    pub fn sensor(&self) -> &SensorInfo {
        &self.sensor
    }

    pub fn format(&self) -> &CaptureFormat {
        &self.format
    }

    /// Frame-rate envelope discovered from hardware defaults at
    /// construction. The fast-exposure regime falls back to these bounds.
    pub fn default_fps_range(&self) -> FpsRange {
        self.default_fps
    }

    /// Currently committed frame-rate envelope.
    pub fn fps_range(&self) -> FpsRange {
        self.fps
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Access to the underlying component, for the buffer/encoder
    /// collaborator that wires its frame callback to the capture port.
    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    pub(crate) fn set_fps_range(&mut self, range: FpsRange) {
        self.fps = range;
    }
}

impl<C: CameraComponent> Drop for CameraResource<C> {
    fn drop(&mut self) {
        if self.state != LifecycleState::Destroyed {
            if let Err(e) = self.shutdown() {
                warn!("camera {}: teardown during drop: {}", self.camera_num, e);
            }
        }
    }
}

fn query_sensor_info<C: CameraComponent>(
    component: &mut C,
    camera_num: u32,
) -> Result<SensorInfo, CameraError> {
    match component.probe_sensors() {
        Ok(sensors) => sensors.get(camera_num as usize).cloned().ok_or_else(|| {
            CameraError::SelectionError(format!(
                "camera {} not found ({} sensors detected)",
                camera_num,
                sensors.len()
            ))
        }),
        Err(e) => {
            let sensor = fallback_sensor();
            warn!(
                "camera-info probe unavailable ({}); assuming {} at {}x{}",
                e, sensor.name, sensor.max_width, sensor.max_height
            );
            Ok(sensor)
        }
    }
}

fn commit_capture_format<C: CameraComponent>(
    component: &mut C,
    sensor: &SensorInfo,
    encoding: PixelEncoding,
) -> Result<CaptureFormat, CameraError> {
    let mut format =
        CaptureFormat::still(sensor.max_width, sensor.max_height).with_encoding(encoding);

    // Sensors without a fixed RGB channel order deliver the opposite byte
    // order from what was asked for; compensate before committing.
    if !component.rgb_order_fixed(OutputPort::Capture) {
        format.encoding = format.encoding.swapped();
    }

    component
        .commit_output_format(OutputPort::Capture, &format)
        .map_err(|e| {
            CameraError::ConfigurationError(format!(
                "camera capture port format couldn't be set: {}",
                e
            ))
        })?;
    Ok(format)
}
