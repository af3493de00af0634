use clap::CommandFactory;
use portal::provider::{Profile, User};
use serde_json::json;

use super::*;

fn user() -> User {
    User { id: Uuid::from_u128(7), email: Some("ada@example.com".into()), user_metadata: serde_json::Map::new() }
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn parses_sign_in_with_flags() {
    let cli = Cli::try_parse_from([
        "portal-cli",
        "--url",
        "https://abc.supabase.co",
        "--anon-key",
        "anon",
        "sign-in",
        "--email",
        "ada@example.com",
        "--password",
        "Engine#1843",
    ])
    .unwrap();
    assert_eq!(cli.state_file, PathBuf::from(".portal-state.json"));
    let Command::SignIn(args) = cli.command else { panic!("expected sign-in") };
    assert_eq!(args.email, "ada@example.com");
}

#[test]
fn parses_tenant_id() {
    let cli = Cli::try_parse_from([
        "portal-cli",
        "--url",
        "https://abc.supabase.co",
        "--anon-key",
        "anon",
        "--state-file",
        "/tmp/s.json",
        "tenant",
        "00000000-0000-0000-0000-000000000384",
    ])
    .unwrap();
    assert_eq!(cli.state_file, PathBuf::from("/tmp/s.json"));
    assert!(matches!(cli.command, Command::Tenant { tenant_id } if tenant_id == Uuid::from_u128(900)));
}

#[test]
fn rejects_malformed_tenant_id() {
    let result =
        Cli::try_parse_from(["portal-cli", "--url", "https://abc.supabase.co", "--anon-key", "anon", "tenant", "acme"]);
    assert!(result.is_err());
}

#[test]
fn url_flag_requires_anon_key() {
    let result = Cli::try_parse_from(["portal-cli", "--url", "https://abc.supabase.co", "whoami"]);
    assert!(result.is_err());
}

#[test]
fn parses_without_connection_flags() {
    let cli = Cli::try_parse_from(["portal-cli", "whoami"]).unwrap();
    assert!(cli.url.is_none() && cli.anon_key.is_none());
}

#[test]
fn resolve_config_prefers_flags_and_applies_timeout_overrides() {
    let cli = Cli::try_parse_from([
        "portal-cli",
        "--url",
        "https://abc.supabase.co/",
        "--anon-key",
        "anon",
        "--request-timeout-secs",
        "5",
        "whoami",
    ])
    .unwrap();

    let config = resolve_config(&cli).unwrap();

    assert_eq!(config.url, "https://abc.supabase.co");
    assert_eq!(config.anon_key, "anon");
    assert_eq!(config.timeouts.request_secs, 5);
    assert_eq!(config.timeouts.connect_secs, portal::config::DEFAULT_CONNECT_TIMEOUT_SECS);
}

#[test]
fn resolve_config_rejects_invalid_flag_url() {
    let cli = Cli::try_parse_from(["portal-cli", "--url", "not a url", "--anon-key", "anon", "whoami"]).unwrap();
    assert!(resolve_config(&cli).is_err());
}

#[test]
fn whoami_json_when_signed_out() {
    let state = SessionState { loading: false, ..SessionState::default() };
    assert_eq!(whoami_json(&state), json!({ "signed_in": false }));
}

#[test]
fn whoami_json_includes_profile() {
    let profile = Profile {
        id: Uuid::from_u128(7),
        email: Some("ada@example.com".into()),
        first_name: Some("Ada".into()),
        last_name: None,
        tenant_id: None,
    };
    let state = SessionState { loading: false, user: Some(user()), profile: Some(profile), ..SessionState::default() };

    let value = whoami_json(&state);

    assert_eq!(value["signed_in"], true);
    assert_eq!(value["email"], "ada@example.com");
    assert_eq!(value["profile"]["first_name"], "Ada");
}

#[test]
fn app_errors_display_friendly_message() {
    let err = CliError::from(AppError::not_found("missing"));
    assert_eq!(err.to_string(), "Not found: The requested resource could not be found.");
}
