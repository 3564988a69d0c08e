#[cfg(test)]
mod tests {
    use clap::Parser;
    use midibridge::midi::MockBackend;
    use midibridge::*;
    use std::sync::Arc;

    #[test]
    fn test_args_with_port() {
        let args = Args::parse_from(["test", "--port", "1", "--channel", "42", "--duration", "5"]);
        assert_eq!(args.port, Some(1));
        assert_eq!(args.channel, 42);
        assert_eq!(args.duration, Some(5));
        assert!(!args.device_list);
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["test"]);
        assert_eq!(args.port, None);
        assert_eq!(args.channel, 1);
        assert_eq!(args.capabilities, None);
        assert_eq!(args.config, None);
        assert!(!args.device_list);
    }

    #[test]
    fn test_args_device_list_and_capabilities() {
        let args = Args::parse_from(["test", "--device-list", "--capabilities", "0"]);
        assert!(args.device_list);
        assert_eq!(args.capabilities, Some(0));
    }

    #[test]
    fn test_valid_port() {
        let devices = device_names(&MockBackend::default());
        assert!(validate_port(1, &devices).is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let devices = device_names(&MockBackend::default());
        let error_msg = validate_port(2, &devices).unwrap_err();
        assert!(error_msg.contains("Port 2 not found"));
        assert!(error_msg.contains("0: Mock Device 1"));
        assert!(error_msg.contains("1: Mock Device 2"));
    }

    #[test]
    fn test_finish_session_closes_port() {
        let backend = MockBackend::default();
        let manager = SessionManager::new(backend.clone(), Arc::new(ChannelHub::new()));
        assert_eq!(manager.open(1, ChannelId(1)), MmResult::NOERROR);
        assert_eq!(manager.start(1), MmResult::NOERROR);

        assert!(finish_session(&manager, 1).is_ok());
        assert!(!manager.is_open(1));
        assert!(backend.open_handles().is_empty());
    }

    #[test]
    fn test_finish_session_reports_failed_close() {
        let manager = SessionManager::new(MockBackend::default(), Arc::new(ChannelHub::new()));

        match finish_session(&manager, 0) {
            Err(BridgeError::Session(msg)) => {
                assert!(msg.contains("close port 0"));
                assert!(msg.contains("(5)"));
            }
            other => panic!("Expected Session error, got {:?}", other),
        }
    }
}
