use gale::config::Config;

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.request_timeout, 60);
    assert_eq!(cfg.request_max_size, 100_000_000);
    assert!(!cfg.debug);
}

#[test]
fn test_config_listen_addr() {
    let cfg = Config {
        host: "0.0.0.0".to_string(),
        port: 3000,
        ..Config::default()
    };

    assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
}

#[test]
fn test_config_env_overrides() {
    unsafe {
        std::env::set_var("GALE_HOST", "0.0.0.0");
        std::env::set_var("GALE_PORT", "9000");
        std::env::set_var("GALE_REQUEST_TIMEOUT", "5");
        std::env::set_var("GALE_REQUEST_MAX_SIZE", "1024");
        std::env::set_var("GALE_DEBUG", "1");
    }

    let cfg = Config::load().unwrap();
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.request_timeout, 5);
    assert_eq!(cfg.request_max_size, 1024);
    assert!(cfg.debug);

    unsafe {
        std::env::remove_var("GALE_HOST");
        std::env::remove_var("GALE_PORT");
        std::env::remove_var("GALE_REQUEST_TIMEOUT");
        std::env::remove_var("GALE_REQUEST_MAX_SIZE");
        std::env::remove_var("GALE_DEBUG");
    }
}

#[test]
fn test_config_from_yaml_file() {
    let path = std::env::temp_dir().join("gale_test_config.yaml");
    std::fs::write(&path, "host: 10.0.0.1\nport: 8080\nrequest_timeout: 30\n").unwrap();

    let cfg = Config::from_yaml_file(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.host, "10.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.request_timeout, 30);
    // Keys absent from the file keep their defaults
    assert_eq!(cfg.request_max_size, 100_000_000);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_config_from_missing_file_fails() {
    let result = Config::from_yaml_file("/nonexistent/gale.yaml");
    assert!(result.is_err());
}

#[test]
fn test_config_from_invalid_yaml_fails() {
    let path = std::env::temp_dir().join("gale_test_config_bad.yaml");
    std::fs::write(&path, "port: not-a-number\n").unwrap();

    let result = Config::from_yaml_file(path.to_str().unwrap());
    assert!(result.is_err());

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.port, cfg2.port);
    assert_eq!(cfg1.host, cfg2.host);
}
