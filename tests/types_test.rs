//! Serialization tests for the types that cross the driver-layer boundary.

mod types_tests {
    use rpicam_still::mmal::{ControlEvent, ControlParam};
    use rpicam_still::{
        CaptureFormat, CropRect, ExposureSettings, FpsRange, PixelEncoding, Rational, SensorInfo,
    };

    #[test]
    fn test_exposure_settings_round_trip() {
        let settings = ExposureSettings::new(2_000_000, 2.5).with_iso(800);

        let json = serde_json::to_string(&settings).expect("settings should serialize");
        let back: ExposureSettings =
            serde_json::from_str(&json).expect("settings should deserialize");

        assert_eq!(back, settings);
    }

    #[test]
    fn test_capture_format_round_trip() {
        let format = CaptureFormat::still(4056, 3040).with_encoding(PixelEncoding::Bgr24);

        let json = serde_json::to_string(&format).expect("format should serialize");
        let back: CaptureFormat = serde_json::from_str(&json).expect("format should deserialize");

        assert_eq!(back, format);
        assert_eq!(back.encoding, PixelEncoding::Bgr24);
        assert_eq!(back.crop, CropRect::new(0, 0, 4056, 3040));
    }

    #[test]
    fn test_sensor_info_round_trip() {
        let sensor = SensorInfo::new("imx477", 4056, 3040);

        let json = serde_json::to_string(&sensor).expect("sensor info should serialize");
        let back: SensorInfo = serde_json::from_str(&json).expect("sensor info should deserialize");

        assert_eq!(back, sensor);
    }

    #[test]
    fn test_fps_range_json_shape() {
        let range = FpsRange::new(Rational::new(167, 1000), Rational::new(999, 1000));

        let value = serde_json::to_value(range).expect("fps range should serialize");
        assert_eq!(value["low"]["num"], 167);
        assert_eq!(value["low"]["den"], 1000);
        assert_eq!(value["high"]["num"], 999);
    }

    #[test]
    fn test_control_event_serializes_for_reporting() {
        let event = ControlEvent::ParameterChanged(ControlParam::ShutterSpeed);

        let json = serde_json::to_string(&event).expect("event should serialize");
        assert!(json.contains("ParameterChanged"));
        assert!(json.contains("ShutterSpeed"));
    }
}
