//! Tests for the camera resource lifecycle against the mock component.

mod camera_tests {
    use rpicam_still::mmal::mock::MockComponent;
    use rpicam_still::mmal::{CameraComponent, ControlEvent, OutputPort, ParamValue, PortParam};
    use rpicam_still::{
        control_channel, CameraError, CameraResource, LifecycleState, PixelEncoding, Rational,
        SensorInfo,
    };

    fn construct(mock: MockComponent) -> Result<CameraResource<MockComponent>, CameraError> {
        let (events, _rx) = control_channel();
        CameraResource::new(mock, 0, events)
    }

    #[test]
    fn test_construct_succeeds_with_valid_index() {
        let camera = construct(MockComponent::new()).expect("construction should succeed");

        assert_eq!(camera.state(), LifecycleState::Configured);
        assert!(camera.sensor().max_width > 0);
        assert!(camera.sensor().max_height > 0);
        assert_eq!(camera.component().selected_camera(), Some(0));
    }

    #[test]
    fn test_construct_commits_one_shot_config() {
        let camera = construct(MockComponent::new()).unwrap();
        let config = camera
            .component()
            .committed_config()
            .expect("camera config should be committed");

        assert!(config.one_shot_stills);
        assert_eq!(config.max_stills_width, camera.sensor().max_width);
        assert_eq!(config.max_stills_height, camera.sensor().max_height);
        // The firmware requires a preview allocation even though no
        // preview is consumed.
        assert_eq!(config.max_preview_width, 1024);
        assert_eq!(config.max_preview_height, 768);
        assert_eq!(config.num_preview_frames, 1);
    }

    #[test]
    fn test_construct_commits_capture_port_format() {
        let camera = construct(MockComponent::new()).unwrap();
        let format = camera
            .component()
            .committed_format(OutputPort::Capture)
            .expect("capture format should be committed");

        assert_eq!(format.encoding, PixelEncoding::Opaque);
        assert_eq!(format.width, camera.sensor().max_width);
        assert_eq!(format.height, camera.sensor().max_height);
        assert_eq!(format.frame_rate, Rational::new(0, 1));
        assert_eq!(format.pixel_aspect, Rational::new(1, 1));
    }

    #[test]
    fn test_construct_stores_default_fps_envelope() {
        use rpicam_still::FpsRange;
        let range = FpsRange::new(Rational::new(2, 1), Rational::new(25, 1));
        let camera = construct(MockComponent::new().with_default_fps(range)).unwrap();

        assert_eq!(camera.default_fps_range(), range);
        assert_eq!(camera.fps_range(), range);
    }

    #[test]
    fn test_construct_index_beyond_probe_count_fails() {
        let (events, _rx) = control_channel();
        let result = CameraResource::new(MockComponent::new(), 3, events);

        match result {
            Err(CameraError::SelectionError(msg)) => assert!(msg.contains("3")),
            other => panic!("expected SelectionError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_construct_rejected_index_fails() {
        let result = construct(MockComponent::new().failing_select());
        assert!(matches!(result, Err(CameraError::SelectionError(_))));
    }

    #[test]
    fn test_construct_without_output_ports_fails() {
        let result = construct(MockComponent::new().with_output_ports(0));
        match result {
            Err(CameraError::SelectionError(msg)) => assert!(msg.contains("output ports")),
            other => panic!("expected SelectionError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_probe_failure_falls_back_to_default_sensor() {
        let camera = construct(MockComponent::new().with_probe_failure())
            .expect("probe failure must not abort construction");

        assert_eq!(camera.sensor().name, "OV5647");
        assert_eq!(camera.sensor().max_width, 2592);
        assert_eq!(camera.sensor().max_height, 1944);
    }

    #[test]
    fn test_control_channel_failure_is_fatal() {
        let result = construct(MockComponent::new().failing_control_channel());
        assert!(matches!(result, Err(CameraError::ControlChannelError(_))));
    }

    #[test]
    fn test_camera_config_failure_is_fatal() {
        let result = construct(MockComponent::new().failing_camera_config());
        assert!(matches!(result, Err(CameraError::ConfigurationError(_))));
    }

    #[test]
    fn test_format_commit_failure_is_fatal() {
        let result = construct(MockComponent::new().failing_format_commit());
        assert!(matches!(result, Err(CameraError::ConfigurationError(_))));
    }

    #[test]
    fn test_rgb_request_swaps_on_unfixed_channel_order() {
        let (events, _rx) = control_channel();
        let camera = CameraResource::with_encoding(
            MockComponent::new().with_rgb_order_fixed(false),
            0,
            PixelEncoding::Rgb24,
            events,
        )
        .unwrap();

        assert_eq!(camera.format().encoding, PixelEncoding::Bgr24);
    }

    #[test]
    fn test_bgr_request_swaps_on_unfixed_channel_order() {
        let (events, _rx) = control_channel();
        let camera = CameraResource::with_encoding(
            MockComponent::new().with_rgb_order_fixed(false),
            0,
            PixelEncoding::Bgr24,
            events,
        )
        .unwrap();

        assert_eq!(camera.format().encoding, PixelEncoding::Rgb24);
    }

    #[test]
    fn test_fixed_channel_order_keeps_requested_encoding() {
        let (events, _rx) = control_channel();
        let camera = CameraResource::with_encoding(
            MockComponent::new().with_rgb_order_fixed(true),
            0,
            PixelEncoding::Rgb24,
            events,
        )
        .unwrap();

        assert_eq!(camera.format().encoding, PixelEncoding::Rgb24);
    }

    #[test]
    fn test_capture_enables_component_and_raises_flag() {
        let mut camera = construct(MockComponent::new()).unwrap();
        camera.capture().expect("capture should arm");

        assert_eq!(camera.state(), LifecycleState::Capturing);
        assert!(camera.component().is_enabled());
        assert_eq!(
            camera
                .component()
                .output_parameter(OutputPort::Capture, PortParam::Capture),
            Some(&ParamValue::Bool(true))
        );
    }

    #[test]
    fn test_capture_enable_failure_is_capture_start_error() {
        let mut camera = construct(MockComponent::new().failing_enable()).unwrap();
        let result = camera.capture();
        assert!(matches!(result, Err(CameraError::CaptureStartError(_))));
        // No rollback: the resource stays where it stopped.
        assert_eq!(camera.state(), LifecycleState::Configured);
    }

    #[test]
    fn test_abort_clears_flag_and_disables_component() {
        let mut camera = construct(MockComponent::new()).unwrap();
        camera.capture().unwrap();
        camera.abort().expect("abort should succeed");

        assert_eq!(camera.state(), LifecycleState::Disabled);
        assert!(!camera.component().is_enabled());
        assert_eq!(
            camera
                .component()
                .output_parameter(OutputPort::Capture, PortParam::Capture),
            Some(&ParamValue::Bool(false))
        );
    }

    #[test]
    fn test_abort_twice_is_safe() {
        let mut camera = construct(MockComponent::new()).unwrap();
        camera.capture().unwrap();

        camera.abort().expect("first abort should succeed");
        camera
            .abort()
            .expect("second abort must be a tolerated repeat");
    }

    #[test]
    fn test_abort_after_natural_completion_is_safe() {
        let mut camera = construct(MockComponent::new()).unwrap();
        camera.capture().unwrap();
        // The buffer collaborator observed a completed exposure; the flag
        // cleanup still has to go through abort.
        camera.abort().expect("post-completion abort should succeed");
    }

    #[test]
    fn test_abort_attempts_disable_even_when_flag_clear_fails() {
        let mock =
            MockComponent::new().failing_port_set(OutputPort::Capture, PortParam::Capture);
        let mut camera = construct(mock).unwrap();

        let result = camera.abort();
        assert!(matches!(result, Err(CameraError::AbortError(_))));
        let calls = camera.component().calls();
        assert!(calls.iter().any(|c| c == "disable"));
    }

    #[test]
    fn test_shutdown_without_enabled_ports_makes_no_disable_calls() {
        let mut camera = construct(MockComponent::new()).unwrap();
        camera.component_mut().disable_control().unwrap();
        let calls_before = camera.component().calls().len();

        camera.shutdown().expect("nothing to tear down");

        assert_eq!(camera.component().calls().len(), calls_before);
        assert_eq!(camera.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_shutdown_disables_enabled_capture_port_and_control() {
        let mut camera = construct(MockComponent::new()).unwrap();
        camera.component_mut().force_port_enabled(OutputPort::Capture);

        camera.shutdown().expect("teardown should succeed");

        let calls = camera.component().calls();
        assert!(calls.iter().any(|c| c == "disable_port(Capture)"));
        assert!(calls.iter().any(|c| c == "disable_control"));
        assert!(!camera.component().is_control_enabled());
    }

    #[test]
    fn test_shutdown_continues_past_failed_port_disable() {
        let mock = MockComponent::new().failing_disable_port(OutputPort::Capture);
        let mut camera = construct(mock).unwrap();
        camera.component_mut().force_port_enabled(OutputPort::Capture);

        let result = camera.shutdown();
        assert!(matches!(result, Err(CameraError::TeardownError(_))));
        // Best-effort: the control channel still went down.
        assert!(!camera.component().is_control_enabled());
    }

    #[test]
    fn test_shutdown_reports_failed_control_disable_after_port_disable_ran() {
        let mock = MockComponent::new().failing_disable_control();
        let mut camera = construct(mock).unwrap();
        camera.component_mut().force_port_enabled(OutputPort::Capture);

        let result = camera.shutdown();
        match result {
            Err(CameraError::TeardownError(msg)) => assert!(msg.contains("control channel")),
            other => panic!("expected TeardownError, got {:?}", other),
        }
        // The capture port went down before the control disable failed.
        let calls = camera.component().calls();
        let port = calls.iter().position(|c| c == "disable_port(Capture)");
        let control = calls.iter().position(|c| c == "disable_control");
        assert!(port.unwrap() < control.unwrap());
        assert!(!camera.component().is_port_enabled(OutputPort::Capture));
    }

    #[test]
    fn test_shutdown_reports_first_error_when_both_disables_fail() {
        let mock = MockComponent::new()
            .failing_disable_port(OutputPort::Capture)
            .failing_disable_control();
        let mut camera = construct(mock).unwrap();
        camera.component_mut().force_port_enabled(OutputPort::Capture);

        let result = camera.shutdown();
        match result {
            Err(CameraError::TeardownError(msg)) => assert!(msg.contains("capture port")),
            other => panic!("expected TeardownError, got {:?}", other),
        }
        // Both disables were still attempted.
        let calls = camera.component().calls();
        assert!(calls.iter().any(|c| c == "disable_port(Capture)"));
        assert!(calls.iter().any(|c| c == "disable_control"));
    }

    #[test]
    fn test_lifecycle_progression() {
        let mut camera = construct(MockComponent::new()).unwrap();
        assert_eq!(camera.state(), LifecycleState::Configured);

        camera.capture().unwrap();
        assert_eq!(camera.state(), LifecycleState::Capturing);

        camera.abort().unwrap();
        assert_eq!(camera.state(), LifecycleState::Disabled);

        camera.shutdown().unwrap();
        assert_eq!(camera.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_control_events_reach_the_receiver() {
        let (events, rx) = control_channel();
        let camera = CameraResource::new(MockComponent::new(), 0, events).unwrap();

        camera
            .component()
            .emit_event(ControlEvent::Error("ENOSPC on buffer header".to_string()));

        match rx.try_recv() {
            Ok(ControlEvent::Error(msg)) => assert!(msg.contains("ENOSPC")),
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_probed_sensors_select_by_index() {
        let mock = MockComponent::new().with_sensors(vec![
            SensorInfo::new("imx219", 3280, 2464),
            SensorInfo::new("imx477", 4056, 3040),
        ]);
        let (events, _rx) = control_channel();
        let camera = CameraResource::new(mock, 1, events).unwrap();

        assert_eq!(camera.sensor().name, "imx477");
        assert_eq!(camera.sensor().max_width, 4056);
    }
}
