//! In-memory camera component for testing without hardware.
//!
//! Scriptable stand-in for the vendor layer: failure injection per
//! operation, shutter-speed quantization, frame-rate read-back overrides,
//! and an ordered call log for sequence assertions.

use crate::mmal::{
    CameraComponent, ControlEvent, ControlParam, EventSink, HalError, OutputPort, ParamValue,
    PortParam, StillConfig,
};
use crate::types::{CaptureFormat, FpsRange, Rational, SensorInfo};
use std::collections::{HashMap, HashSet};

/// Mock camera component with builder-style configuration.
pub struct MockComponent {
    sensors: Vec<SensorInfo>,
    probe_fails: bool,
    output_ports: u32,
    rgb_order_fixed: bool,
    default_fps: FpsRange,
    fps_readback_override: Option<FpsRange>,
    shutter_readback_offset: i64,
    recommended_buffer: u32,

    fail_select: bool,
    fail_enable_control: bool,
    fail_disable_control: bool,
    fail_camera_config: bool,
    fail_format_commit: bool,
    fail_enable: bool,
    fail_disable: bool,
    fail_control_set: HashSet<ControlParam>,
    fail_control_get: HashSet<ControlParam>,
    fail_port_set: HashSet<(OutputPort, PortParam)>,
    fail_disable_port: HashSet<OutputPort>,

    selected: Option<u32>,
    control_enabled: bool,
    component_enabled: bool,
    port_enabled: HashMap<OutputPort, bool>,
    control_params: HashMap<ControlParam, ParamValue>,
    port_params: HashMap<(OutputPort, PortParam), ParamValue>,
    committed_formats: HashMap<OutputPort, CaptureFormat>,
    committed_config: Option<StillConfig>,
    buffer_size: HashMap<OutputPort, u32>,
    events: Option<EventSink>,
    calls: Vec<String>,
}

impl Default for MockComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockComponent {
    /// Mock component imitating a single HQ camera sensor.
    pub fn new() -> Self {
        Self {
            sensors: vec![SensorInfo::new("imx477", 4056, 3040)],
            probe_fails: false,
            output_ports: 3,
            rgb_order_fixed: true,
            default_fps: FpsRange::new(Rational::new(1, 1), Rational::new(30, 1)),
            fps_readback_override: None,
            shutter_readback_offset: 0,
            recommended_buffer: 786_432,
            fail_select: false,
            fail_enable_control: false,
            fail_disable_control: false,
            fail_camera_config: false,
            fail_format_commit: false,
            fail_enable: false,
            fail_disable: false,
            fail_control_set: HashSet::new(),
            fail_control_get: HashSet::new(),
            fail_port_set: HashSet::new(),
            fail_disable_port: HashSet::new(),
            selected: None,
            control_enabled: false,
            component_enabled: false,
            port_enabled: HashMap::new(),
            control_params: HashMap::new(),
            port_params: HashMap::new(),
            committed_formats: HashMap::new(),
            committed_config: None,
            buffer_size: HashMap::new(),
            events: None,
            calls: Vec::new(),
        }
    }

    pub fn with_sensors(mut self, sensors: Vec<SensorInfo>) -> Self {
        self.sensors = sensors;
        self
    }

    /// Make the camera-info probe fail, simulating older firmware.
    pub fn with_probe_failure(mut self) -> Self {
        self.probe_fails = true;
        self
    }

    pub fn with_output_ports(mut self, count: u32) -> Self {
        self.output_ports = count;
        self
    }

    pub fn with_rgb_order_fixed(mut self, fixed: bool) -> Self {
        self.rgb_order_fixed = fixed;
        self
    }

    pub fn with_default_fps(mut self, range: FpsRange) -> Self {
        self.default_fps = range;
        self
    }

    /// Force frame-rate read-backs to report `range` regardless of what was
    /// committed.
    pub fn with_fps_readback(mut self, range: FpsRange) -> Self {
        self.fps_readback_override = Some(range);
        self
    }

    /// Offset applied to shutter-speed read-backs, simulating hardware
    /// quantization of the requested duration.
    pub fn with_shutter_quantization(mut self, offset_us: i64) -> Self {
        self.shutter_readback_offset = offset_us;
        self
    }

    pub fn failing_select(mut self) -> Self {
        self.fail_select = true;
        self
    }

    pub fn failing_control_channel(mut self) -> Self {
        self.fail_enable_control = true;
        self
    }

    pub fn failing_disable_control(mut self) -> Self {
        self.fail_disable_control = true;
        self
    }

    pub fn failing_camera_config(mut self) -> Self {
        self.fail_camera_config = true;
        self
    }

    pub fn failing_format_commit(mut self) -> Self {
        self.fail_format_commit = true;
        self
    }

    pub fn failing_enable(mut self) -> Self {
        self.fail_enable = true;
        self
    }

    pub fn failing_control_set(mut self, param: ControlParam) -> Self {
        self.fail_control_set.insert(param);
        self
    }

    pub fn failing_control_get(mut self, param: ControlParam) -> Self {
        self.fail_control_get.insert(param);
        self
    }

    pub fn failing_port_set(mut self, port: OutputPort, param: PortParam) -> Self {
        self.fail_port_set.insert((port, param));
        self
    }

    pub fn failing_disable_port(mut self, port: OutputPort) -> Self {
        self.fail_disable_port.insert(port);
        self
    }

    /// Mark a port enabled, as the external buffer collaborator would after
    /// wiring its callback.
    pub fn force_port_enabled(&mut self, port: OutputPort) {
        self.port_enabled.insert(port, true);
    }

    /// Ordered log of every vendor call made against this component.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn selected_camera(&self) -> Option<u32> {
        self.selected
    }

    pub fn committed_config(&self) -> Option<&StillConfig> {
        self.committed_config.as_ref()
    }

    pub fn committed_format(&self, port: OutputPort) -> Option<&CaptureFormat> {
        self.committed_formats.get(&port)
    }

    pub fn control_parameter(&self, param: ControlParam) -> Option<&ParamValue> {
        self.control_params.get(&param)
    }

    pub fn output_parameter(&self, port: OutputPort, param: PortParam) -> Option<&ParamValue> {
        self.port_params.get(&(port, param))
    }

    pub fn buffer_size(&self, port: OutputPort) -> Option<u32> {
        self.buffer_size.get(&port).copied()
    }

    pub fn is_enabled(&self) -> bool {
        self.component_enabled
    }

    /// Emit an event on the sink registered by `enable_control`, as the
    /// vendor callback thread would. Send failures are ignored.
    pub fn emit_event(&self, event: ControlEvent) {
        if let Some(events) = &self.events {
            let _ = events.try_send(event);
        }
    }

    fn log(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }
}

impl CameraComponent for MockComponent {
    fn select_camera(&mut self, index: u32) -> Result<(), HalError> {
        self.log(format!("select_camera({})", index));
        if self.fail_select {
            return Err(HalError::new("EINVAL on camera-num parameter"));
        }
        self.selected = Some(index);
        Ok(())
    }

    fn output_port_count(&self) -> u32 {
        self.output_ports
    }

    fn enable_control(&mut self, events: EventSink) -> Result<(), HalError> {
        self.log("enable_control");
        if self.fail_enable_control {
            return Err(HalError::new("control port enable rejected"));
        }
        self.events = Some(events);
        self.control_enabled = true;
        Ok(())
    }

    fn disable_control(&mut self) -> Result<(), HalError> {
        self.log("disable_control");
        if self.fail_disable_control {
            return Err(HalError::new("control port disable rejected"));
        }
        self.control_enabled = false;
        self.events = None;
        Ok(())
    }

    fn is_control_enabled(&self) -> bool {
        self.control_enabled
    }

    fn probe_sensors(&mut self) -> Result<Vec<SensorInfo>, HalError> {
        self.log("probe_sensors");
        if self.probe_fails {
            return Err(HalError::new("camera-info component unavailable"));
        }
        Ok(self.sensors.clone())
    }

    fn commit_camera_config(&mut self, config: &StillConfig) -> Result<(), HalError> {
        self.log("commit_camera_config");
        if self.fail_camera_config {
            return Err(HalError::new("camera config rejected"));
        }
        self.committed_config = Some(config.clone());
        Ok(())
    }

    fn rgb_order_fixed(&self, _port: OutputPort) -> bool {
        self.rgb_order_fixed
    }

    fn commit_output_format(
        &mut self,
        port: OutputPort,
        format: &CaptureFormat,
    ) -> Result<(), HalError> {
        self.log(format!("commit_output_format({:?})", port));
        if self.fail_format_commit {
            return Err(HalError::new("format commit rejected"));
        }
        self.committed_formats.insert(port, format.clone());
        // The committed format seeds the port's frame-rate parameter until
        // a controller overwrites it.
        self.port_params
            .entry((port, PortParam::FpsRange))
            .or_insert(ParamValue::Fps(self.default_fps));
        Ok(())
    }

    fn set_control_parameter(
        &mut self,
        param: ControlParam,
        value: ParamValue,
    ) -> Result<(), HalError> {
        self.log(format!("set_control({:?})", param));
        if self.fail_control_set.contains(&param) {
            return Err(HalError::new(format!("set {:?} rejected", param)));
        }
        self.control_params.insert(param, value);
        Ok(())
    }

    fn get_control_parameter(&self, param: ControlParam) -> Result<ParamValue, HalError> {
        if self.fail_control_get.contains(&param) {
            return Err(HalError::new(format!("get {:?} rejected", param)));
        }
        let value = self
            .control_params
            .get(&param)
            .copied()
            .ok_or_else(|| HalError::new(format!("{:?} never set", param)))?;

        if param == ControlParam::ShutterSpeed {
            if let ParamValue::U32(requested) = value {
                let actual = (i64::from(requested) + self.shutter_readback_offset).max(0) as u32;
                return Ok(ParamValue::U32(actual));
            }
        }
        Ok(value)
    }

    fn set_output_parameter(
        &mut self,
        port: OutputPort,
        param: PortParam,
        value: ParamValue,
    ) -> Result<(), HalError> {
        self.log(format!("set_port({:?}, {:?})", port, param));
        if self.fail_port_set.contains(&(port, param)) {
            return Err(HalError::new(format!("set {:?} on {:?} rejected", param, port)));
        }
        self.port_params.insert((port, param), value);
        Ok(())
    }

    fn get_output_parameter(
        &self,
        port: OutputPort,
        param: PortParam,
    ) -> Result<ParamValue, HalError> {
        if param == PortParam::FpsRange {
            if let Some(range) = self.fps_readback_override {
                return Ok(ParamValue::Fps(range));
            }
        }
        self.port_params
            .get(&(port, param))
            .copied()
            .ok_or_else(|| HalError::new(format!("{:?} on {:?} never set", param, port)))
    }

    fn recommended_buffer_size(&self, _port: OutputPort) -> u32 {
        self.recommended_buffer
    }

    fn apply_recommended_buffer_size(&mut self, port: OutputPort) -> Result<(), HalError> {
        self.log(format!("apply_recommended_buffer_size({:?})", port));
        self.buffer_size.insert(port, self.recommended_buffer);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), HalError> {
        self.log("enable");
        if self.fail_enable {
            return Err(HalError::new("component enable rejected"));
        }
        self.component_enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), HalError> {
        self.log("disable");
        if self.fail_disable {
            return Err(HalError::new("component disable rejected"));
        }
        // Disabling an already-disabled component is a no-op, matching the
        // firmware's tolerance for redundant disables.
        self.component_enabled = false;
        Ok(())
    }

    fn is_port_enabled(&self, port: OutputPort) -> bool {
        self.port_enabled.get(&port).copied().unwrap_or(false)
    }

    fn disable_port(&mut self, port: OutputPort) -> Result<(), HalError> {
        self.log(format!("disable_port({:?})", port));
        if self.fail_disable_port.contains(&port) {
            return Err(HalError::new(format!("{:?} port disable rejected", port)));
        }
        self.port_enabled.insert(port, false);
        Ok(())
    }
}
