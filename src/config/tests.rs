use super::*;

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.cache.list_ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.article_ttl, Duration::from_secs(300));
    assert!(settings.cache.redis_url.is_none());
    assert!(settings.database.url.is_none());
    assert!(settings.ai.provider.is_none());
    assert_eq!(
        settings.ssr.template_path,
        PathBuf::from("build").join("index.html")
    );
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_redis_url_means_no_shared_cache() {
    let mut raw = RawSettings::default();
    raw.cache.redis_url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.cache.redis_url.is_none());
}

#[test]
fn non_redis_scheme_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.redis_url = Some("http://localhost:6379".to_string());

    let err = Settings::from_raw(raw).expect_err("scheme must be redis");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.redis_url",
            ..
        }
    ));
}

#[test]
fn partial_ai_credentials_are_rejected() {
    let mut raw = RawSettings::default();
    raw.ai.api_key = Some("key".to_string());

    let err = Settings::from_raw(raw).expect_err("incomplete provider config");
    assert!(matches!(err, LoadError::Invalid { key: "ai", .. }));
}

#[test]
fn complete_ai_credentials_build_provider() {
    let mut raw = RawSettings::default();
    raw.ai.endpoint = Some("https://llm.example.com/chat".to_string());
    raw.ai.token_url = Some("https://llm.example.com/oauth/token".to_string());
    raw.ai.api_key = Some("key".to_string());
    raw.ai.secret_key = Some("secret".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let provider = settings.ai.provider.expect("provider configured");
    assert_eq!(provider.token_lifetime, Duration::from_secs(29 * 24 * 60 * 60));
    assert_eq!(provider.endpoint.host_str(), Some("llm.example.com"));
}

#[test]
fn oversized_lifetimes_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.list_ttl_seconds = Some(u64::MAX);
    let err = Settings::from_raw(raw).expect_err("list ttl out of range");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.list_ttl_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.cache.article_ttl_seconds = Some(400 * 24 * 60 * 60);
    let err = Settings::from_raw(raw).expect_err("article ttl out of range");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.article_ttl_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.ai.endpoint = Some("https://llm.example.com/chat".to_string());
    raw.ai.token_url = Some("https://llm.example.com/oauth/token".to_string());
    raw.ai.api_key = Some("key".to_string());
    raw.ai.secret_key = Some("secret".to_string());
    raw.ai.token_lifetime_seconds = Some(u64::MAX);
    let err = Settings::from_raw(raw).expect_err("token lifetime out of range");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "ai.token_lifetime_seconds",
            ..
        }
    ));
}

#[test]
fn one_year_ttl_is_accepted() {
    let mut raw = RawSettings::default();
    raw.cache.list_ttl_seconds = Some(365 * 24 * 60 * 60);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.list_ttl, Duration::from_secs(365 * 24 * 60 * 60));
}

#[test]
fn zero_article_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.article_capacity = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn absolute_template_file_is_kept() {
    let mut raw = RawSettings::default();
    raw.ssr.template_file = Some(PathBuf::from("/srv/shell.html"));

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.ssr.template_path, PathBuf::from("/srv/shell.html"));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["inkblog"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_verify_hydration_arguments() {
    let args = CliArgs::parse_from([
        "inkblog",
        "verify-hydration",
        "--site",
        "http://127.0.0.1:3000",
        "/article/7",
    ]);

    match args.command.expect("verify-hydration command") {
        Command::VerifyHydration(verify) => {
            assert_eq!(verify.site, "http://127.0.0.1:3000");
            assert_eq!(verify.path, "/article/7");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
