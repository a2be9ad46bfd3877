use super::*;

#[test]
fn test_defaults_when_sections_missing() {
    let cfg: Config = toml::from_str("").unwrap();
    assert_eq!(cfg.bot.name, "trigger-bot");
    assert!(cfg.auth.enabled);
    assert!(cfg.auth.admins.is_empty());
    assert_eq!(cfg.store.backend, StoreBackend::Sqlite);
    assert_eq!(cfg.store.timeout_secs, 5);
    assert_eq!(cfg.store.refresh_interval_secs, 0);
    assert_eq!(cfg.matching.mode, MatchMode::Substring);
    assert_eq!(cfg.admin.delimiter, "|");
    assert!(cfg.admin.private_only);
    assert!(!cfg.admin.allow_empty_reply);
    assert!(cfg.channel.telegram.is_none());
}

#[test]
fn test_full_config_from_toml() {
    let toml_str = r#"
        [bot]
        name = "helper"
        data_dir = "/tmp/helper"

        [auth]
        admins = [42, 7]
        deny_message = "nope"

        [channel.telegram]
        enabled = true
        bot_token = "123:abc"
        allowed_chats = [-100]

        [store]
        backend = "file"
        path = "/tmp/helper/triggers.json"
        timeout_secs = 2
        refresh_interval_secs = 60

        [matching]
        mode = "exact"

        [admin]
        delimiter = "=>"
        allow_empty_reply = true
        private_only = false
    "#;
    let cfg: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(cfg.bot.name, "helper");
    assert_eq!(cfg.auth.admins, vec![42, 7]);
    assert_eq!(cfg.auth.deny_message, "nope");
    let tg = cfg.channel.telegram.as_ref().unwrap();
    assert!(tg.enabled);
    assert_eq!(tg.allowed_chats, vec![-100]);
    assert_eq!(cfg.store.backend, StoreBackend::File);
    assert_eq!(cfg.store.timeout(), Duration::from_secs(2));
    assert_eq!(cfg.matching.mode, MatchMode::Exact);
    assert_eq!(cfg.admin.delimiter, "=>");
    assert!(cfg.admin.allow_empty_reply);
    assert!(!cfg.admin.private_only);
    assert_eq!(cfg.bot.log_dir(), PathBuf::from("/tmp/helper/logs"));
}

#[test]
fn test_unknown_backend_is_rejected() {
    let result: Result<Config, _> = toml::from_str("[store]\nbackend = \"redis\"");
    assert!(result.is_err());
}

#[test]
fn test_timeout_never_zero() {
    let store = StoreConfig {
        timeout_secs: 0,
        ..Default::default()
    };
    assert_eq!(store.timeout(), Duration::from_secs(1));
}

#[test]
fn test_is_admin() {
    let auth = AuthConfig {
        admins: vec![42],
        ..Default::default()
    };
    assert!(auth.is_admin("42"));
    assert!(!auth.is_admin("43"));
    assert!(!auth.is_admin("not-a-number"));

    let nobody = AuthConfig::default();
    assert!(!nobody.is_admin("42"), "empty admin list allows nobody");

    let open = AuthConfig {
        enabled: false,
        ..Default::default()
    };
    assert!(open.is_admin("anyone"));
}

#[test]
fn test_allows_chat() {
    let mut tg = TelegramConfig::default();
    assert!(tg.allows_chat(-1), "empty list allows every chat");
    tg.allowed_chats = vec![-2550160088];
    assert!(tg.allows_chat(-2550160088));
    assert!(!tg.allows_chat(-1));
}

#[test]
fn test_env_fills_empty_token_only() {
    let mut cfg = Config::default();
    cfg.apply_env(|k| (k == ENV_BOT_TOKEN).then(|| "from-env".to_string()));
    let tg = cfg.channel.telegram.as_ref().unwrap();
    assert!(tg.enabled);
    assert_eq!(tg.bot_token, "from-env");

    let mut cfg = Config::default();
    cfg.channel.telegram = Some(TelegramConfig {
        enabled: true,
        bot_token: "from-file".to_string(),
        allowed_chats: Vec::new(),
    });
    cfg.apply_env(|k| (k == ENV_BOT_TOKEN).then(|| "from-env".to_string()));
    assert_eq!(cfg.channel.telegram.unwrap().bot_token, "from-file");
}

#[test]
fn test_env_overrides_db_path() {
    let mut cfg = Config::default();
    cfg.apply_env(|k| (k == ENV_DB_PATH).then(|| "/data/t.db".to_string()));
    assert_eq!(cfg.store.db_path, "/data/t.db");
    assert!(cfg.channel.telegram.is_none());
}

#[test]
fn test_validate_rejects_blank_delimiter() {
    let mut cfg = Config::default();
    cfg.admin.delimiter = "  ".to_string();
    assert!(matches!(cfg.validate(), Err(TriggerError::Config(_))));
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load_file(Path::new("/nonexistent/__trigger_bot__/config.toml")).unwrap();
    assert_eq!(cfg.store.backend, StoreBackend::Sqlite);
    assert!(cfg.source.is_none());
}

#[test]
fn test_load_records_source_file() {
    let tmp = std::env::temp_dir().join(format!("__trigger_bot_src_{}__", std::process::id()));
    let _ = std::fs::create_dir_all(&tmp);
    let path = tmp.join("config.toml");
    std::fs::write(&path, "[matching]\nmode = \"token\"\n").unwrap();

    let cfg = load_file(&path).unwrap();
    assert_eq!(cfg.source.as_deref(), Some(path.as_path()));
    assert_eq!(cfg.matching.mode, MatchMode::Token);
    let _ = std::fs::remove_dir_all(&tmp);
}

#[test]
fn test_load_rejects_malformed_file() {
    let tmp = std::env::temp_dir().join(format!("__trigger_bot_cfg_{}__", std::process::id()));
    let _ = std::fs::create_dir_all(&tmp);
    let path = tmp.join("config.toml");
    std::fs::write(&path, "[store\nbackend = ").unwrap();
    assert!(matches!(load_file(&path), Err(TriggerError::Config(_))));
    let _ = std::fs::remove_dir_all(&tmp);
}

#[test]
fn test_shellexpand_leaves_absolute_paths() {
    assert_eq!(shellexpand("/var/lib/x"), "/var/lib/x");
}
