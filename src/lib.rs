//! rpicam-still: still-capture control core for the Raspberry Pi camera.
//!
//! Drives one connected image sensor through the vendor MMAL component
//! layer for one-shot still capture: exposure, gain, white balance, and
//! frame-rate control, plus the order-sensitive configure/arm/abort state
//! machine around it.
//!
//! # Features
//! - Full construction sequence with sensor probing and firmware fallback
//! - Ordered exposure-parameter application with read-back verification
//! - Frame-rate bounds derived from the shutter-speed regime
//! - Best-effort teardown that never short-circuits
//! - Hardware-free testing through a scriptable mock component
//!
//! # Usage
//! ```rust
//! use rpicam_still::mmal::mock::MockComponent;
//! use rpicam_still::{CameraResource, ExposureSettings, ParameterController};
//!
//! fn main() -> Result<(), rpicam_still::CameraError> {
//!     let (events, _notifications) = rpicam_still::control_channel();
//!     let mut camera = CameraResource::new(MockComponent::new(), 0, events)?;
//!
//!     let controller = ParameterController::new();
//!     let report = controller.apply(&mut camera, &ExposureSettings::new(2_000_000, 2.0))?;
//!     for warning in &report.warnings {
//!         eprintln!("{}", warning);
//!     }
//!
//!     camera.capture()?;
//!     // ... frame arrives through the external buffer callback ...
//!     camera.abort()?;
//!     Ok(())
//! }
//! ```
pub mod camera;
pub mod errors;
pub mod mmal;
pub mod params;
pub mod types;

// Re-exports for convenience
pub use camera::CameraResource;
pub use errors::CameraError;
pub use params::{ApplyReport, ParameterController, ToleranceWarning};
pub use types::{
    CaptureFormat, CropRect, ExposureControlMode, ExposureSettings, FpsRange, LifecycleState,
    PixelEncoding, Rational, SensorInfo,
};

use mmal::ControlEvent;

/// Default capacity of the control-event channel. Events beyond this are
/// dropped by the vendor side rather than blocking its callback thread.
pub const CONTROL_EVENT_CAPACITY: usize = 16;

/// Create the bounded channel bridging the vendor callback thread to the
/// owning thread. The sender goes into [`CameraResource::new`]; the
/// receiver belongs to whichever collaborator reports hardware events.
pub fn control_channel() -> (
    crossbeam_channel::Sender<ControlEvent>,
    crossbeam_channel::Receiver<ControlEvent>,
) {
    crossbeam_channel::bounded(CONTROL_EVENT_CAPACITY)
}

/// Initialize logging for the camera core
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "rpicam_still=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
