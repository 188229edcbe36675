use std::env;

use serial_test::serial;

use rustdis_client::{Charset, Config, Error, ErrorMode};

const VARS: [&str; 7] = [
    "REDIS_HOST",
    "REDIS_PORT",
    "REDIS_PASSWORD",
    "REDIS_ENCODING",
    "REDIS_ENCODING_ERRORS",
    "REDIS_DECODE_RESPONSES",
    "MAX_FRAME_SIZE",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.addr(), ("127.0.0.1", 6379));
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var("REDIS_HOST", "cache.internal");
    env::set_var("REDIS_PORT", "6380");
    env::set_var("REDIS_PASSWORD", "hunter2");
    env::set_var("REDIS_ENCODING", "ISO-8859-1");
    env::set_var("REDIS_ENCODING_ERRORS", "ignore");
    env::set_var("REDIS_DECODE_RESPONSES", "true");

    let config = Config::from_env();
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.addr(), ("cache.internal", 6380));
    assert_eq!(config.password.as_deref(), Some("hunter2"));
    assert_eq!(config.encoding, Charset::Latin1);
    assert_eq!(config.encoding_errors, ErrorMode::Ignore);
    assert!(config.decode_responses);

    let policy = config.text_policy();
    assert_eq!(policy.charset, Charset::Latin1);
    assert!(policy.decode_responses);
}

#[test]
#[serial]
fn test_invalid_environment() {
    clear_env();
    env::set_var("REDIS_PORT", "not-a-port");

    let err = Config::from_env();
    clear_env();

    assert!(matches!(err, Err(Error::Config(_))));

    env::set_var("REDIS_ENCODING", "ebcdic");
    let err = Config::from_env();
    clear_env();

    assert!(matches!(err, Err(Error::Config(_))));
}
