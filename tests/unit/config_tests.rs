//! Configuration loading: required credentials, port parsing, defaults.
//!
//! Most cases go through `Config::from_lookup` with an injected map so
//! they can run in parallel; the `from_env` cases mutate process-global
//! env vars and must run serially.

use std::time::Duration;

use gitvitae::config::{Config, DEFAULT_HTTP_PORT, ENV_GITHUB_TOKEN};

fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| (*value).to_owned())
    }
}

fn complete() -> Vec<(&'static str, &'static str)> {
    vec![
        ("GITHUB_TOKEN", "ghp_test"),
        ("OPENAI_API_KEY", "sk-test"),
        ("GITHUB_USERNAME", "octocat"),
    ]
}

#[test]
fn loads_all_required_fields() {
    let config = Config::from_lookup(lookup_from(&complete())).unwrap();
    assert_eq!(config.github_token, "ghp_test");
    assert_eq!(config.openai_api_key, "sk-test");
    assert_eq!(config.github_username, "octocat");
    assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
    assert_eq!(config.keep_alive, Duration::from_secs(15));
}

#[test]
fn missing_github_token_names_the_variable() {
    let pairs = [
        ("OPENAI_API_KEY", "sk-test"),
        ("GITHUB_USERNAME", "octocat"),
    ];
    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "config: required environment variable GITHUB_TOKEN is not set"
    );
}

#[test]
fn missing_openai_key_names_the_variable() {
    let pairs = [("GITHUB_TOKEN", "ghp_test"), ("GITHUB_USERNAME", "octocat")];
    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
fn missing_username_names_the_variable() {
    let pairs = [("GITHUB_TOKEN", "ghp_test"), ("OPENAI_API_KEY", "sk-test")];
    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
    assert!(err.to_string().contains("GITHUB_USERNAME"));
}

#[test]
fn whitespace_only_values_count_as_absent() {
    let mut pairs = complete();
    pairs[0] = ("GITHUB_TOKEN", "   ");
    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
    assert!(err.to_string().contains("GITHUB_TOKEN"));
}

#[test]
fn port_overrides_the_default() {
    let mut pairs = complete();
    pairs.push(("PORT", "8080"));
    let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(config.http_port, 8080);
}

#[test]
fn port_value_is_trimmed_before_parsing() {
    let mut pairs = complete();
    pairs.push(("PORT", " 4100 "));
    let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(config.http_port, 4100);
}

#[test]
fn blank_port_falls_back_to_the_default() {
    let mut pairs = complete();
    pairs.push(("PORT", "  "));
    let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
    assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
}

#[test]
fn unparseable_port_is_a_config_error_naming_the_value() {
    let mut pairs = complete();
    pairs.push(("PORT", "eighty"));
    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("config: invalid PORT value 'eighty'"));
}

#[test]
fn out_of_range_port_is_a_config_error() {
    let mut pairs = complete();
    pairs.push(("PORT", "70000"));
    assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
}

#[test]
#[serial_test::serial]
#[allow(unsafe_code)]
fn from_env_reads_the_process_environment() {
    unsafe {
        std::env::set_var("GITHUB_TOKEN", "ghp_env");
        std::env::set_var("OPENAI_API_KEY", "sk-env");
        std::env::set_var("GITHUB_USERNAME", "envuser");
        std::env::set_var("PORT", "4321");
    }

    let config = Config::from_env().expect("config loads from env");
    assert_eq!(config.github_token, "ghp_env");
    assert_eq!(config.openai_api_key, "sk-env");
    assert_eq!(config.github_username, "envuser");
    assert_eq!(config.http_port, 4321);

    unsafe {
        std::env::remove_var("GITHUB_TOKEN");
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("GITHUB_USERNAME");
        std::env::remove_var("PORT");
    }
}

#[test]
#[serial_test::serial]
#[allow(unsafe_code)]
fn from_env_fails_fast_when_the_token_is_missing() {
    unsafe {
        std::env::remove_var("GITHUB_TOKEN");
        std::env::set_var("OPENAI_API_KEY", "sk-env");
        std::env::set_var("GITHUB_USERNAME", "envuser");
    }

    let err = Config::from_env().expect_err("missing token must fail");
    assert!(err.to_string().contains(ENV_GITHUB_TOKEN));

    unsafe {
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("GITHUB_USERNAME");
    }
}
