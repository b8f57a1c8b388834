//! Tests for the run module.

use super::*;
use webhook_relay::config::Cli;

fn config(args: &[&str]) -> ValidatedConfig {
    let mut full_args = vec!["webhook-relay"];
    full_args.extend(args);
    ValidatedConfig::from_raw(&Cli::parse_from_iter(full_args), None).unwrap()
}

mod run_error {
    use super::*;

    #[test]
    fn bind_error_displays_address() {
        let error = RunError::Bind {
            addr: "127.0.0.1:3080".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };

        let message = error.to_string();
        assert!(message.contains("Failed to bind 127.0.0.1:3080"));
        assert!(message.contains("address in use"));
    }

    #[test]
    fn serve_error_displays_source() {
        let error = RunError::Serve(io::Error::other("accept failed"));

        assert_eq!(error.to_string(), "Server error: accept failed");
    }

    #[test]
    fn debug_format_works() {
        let error = RunError::Serve(io::Error::other("x"));
        let debug_str = format!("{error:?}");
        assert!(debug_str.contains("Serve"));
    }
}

mod strategy {
    use super::*;

    #[test]
    fn fan_out_seeds_registry_in_order() {
        let config = config(&[
            "--secondary",
            "http://b.example.com/hooks",
            "--secondary",
            "http://a.example.com/hooks",
        ]);

        let strategy = build_strategy(&config);

        assert_eq!(strategy.mode(), RelayMode::FanOut);
        let endpoints = strategy.registry().unwrap().endpoints();
        assert_eq!(endpoints[0].as_str(), "http://b.example.com/hooks");
        assert_eq!(endpoints[1].as_str(), "http://a.example.com/hooks");
    }

    #[test]
    fn retention_starts_with_empty_queue() {
        let config = config(&["--mode", "retention", "--poll-secret", "s3cret"]);

        let strategy = build_strategy(&config);

        assert_eq!(strategy.mode(), RelayMode::Retention);
        let queue = strategy.queue().unwrap();
        assert_eq!(queue.size(), 0);
        assert_eq!(queue.capacity(), 100);
    }
}
