use std::fmt;

/// Errors raised by the camera resource and parameter controller.
///
/// Every variant carries a human-readable description of the failing
/// operation. Nothing is silently swallowed except read-back tolerance
/// mismatches, which are reported as warnings instead (see
/// [`crate::params::ToleranceWarning`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Invalid camera index, or the component exposes no output ports.
    SelectionError(String),
    /// A camera-config or port-format commit failed during construction.
    ConfigurationError(String),
    /// Enabling the asynchronous control callback channel failed.
    ControlChannelError(String),
    /// A single parameter set/get call failed; names the parameter.
    ParameterError(String),
    /// Component enable or capture-flag set failed while arming an exposure.
    CaptureStartError(String),
    /// Capture-flag clear or component disable failed during abort.
    AbortError(String),
    /// A best-effort disable failed during teardown.
    TeardownError(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::SelectionError(msg) => write!(f, "Camera selection error: {}", msg),
            CameraError::ConfigurationError(msg) => {
                write!(f, "Camera configuration error: {}", msg)
            }
            CameraError::ControlChannelError(msg) => write!(f, "Control channel error: {}", msg),
            CameraError::ParameterError(msg) => write!(f, "Parameter error: {}", msg),
            CameraError::CaptureStartError(msg) => write!(f, "Capture start error: {}", msg),
            CameraError::AbortError(msg) => write!(f, "Abort error: {}", msg),
            CameraError::TeardownError(msg) => write!(f, "Teardown error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}
