// tests/profile_config.rs
use std::{env, fs};

use tech_trend_notifier::config::profile::{ENV_PROFILE_PATH, DEFAULT_PROFILE_TOML};
use tech_trend_notifier::config::{Language, Profile, Settings};

#[test]
fn toml_and_json_files_load() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("profile.toml");
    fs::write(
        &p_toml,
        r#"
[user_profile]
name = "Platform"
interests = ["Rust", "ai ", "Kubernetes"]

[user_profile.sources.web_search]
enabled = false
"#,
    )
    .unwrap();
    let p = Profile::load_from(&p_toml).unwrap();
    assert_eq!(p.name, "Platform");
    assert_eq!(p.interests, vec!["Rust".to_string(), "ai ".to_string(), "Kubernetes".to_string()]);
    assert!(!p.sources.web_search.enabled);
    assert!(p.notification.slack.include_summary);

    let p_json = dir.path().join("profile.json");
    fs::write(&p_json, r#"{"user_profile": {"keywords": {"exclude": [" crypto "]}}}"#).unwrap();
    let pj = Profile::load_from(&p_json).unwrap();
    assert_eq!(pj.keywords.exclude, vec![" crypto ".to_string()]);
}

#[serial_test::serial]
#[test]
fn default_lookup_uses_env_then_fallbacks() {
    // Isolate CWD so the test never reads the repo's own config/.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_PROFILE_PATH);

    // 1) Nothing present → default profile written to config/profile.toml
    let p = Profile::load_default().unwrap();
    assert_eq!(p, Profile::default());
    assert!(tmp.path().join(DEFAULT_PROFILE_TOML).exists());

    // 2) The written file is picked up next time
    fs::write(
        tmp.path().join(DEFAULT_PROFILE_TOML),
        "[user_profile]\nname = \"From Disk\"\n",
    )
    .unwrap();
    assert_eq!(Profile::load_default().unwrap().name, "From Disk");

    // 3) PROFILE_PATH wins
    let custom = tmp.path().join("custom.json");
    fs::write(&custom, r#"{"user_profile": {"name": "From Env"}}"#).unwrap();
    env::set_var(ENV_PROFILE_PATH, &custom);
    assert_eq!(Profile::load_default().unwrap().name, "From Env");

    // 4) A broken file falls back to the default profile and is left as is
    let broken = tmp.path().join("broken.toml");
    fs::write(&broken, "[user_profile\nname = ").unwrap();
    env::set_var(ENV_PROFILE_PATH, &broken);
    assert_eq!(Profile::load_default().unwrap(), Profile::default());
    assert_eq!(fs::read_to_string(&broken).unwrap(), "[user_profile\nname = ");

    // 5) PROFILE_PATH pointing nowhere is an error
    env::set_var(ENV_PROFILE_PATH, tmp.path().join("missing.toml"));
    assert!(Profile::load_default().is_err());

    env::remove_var(ENV_PROFILE_PATH);
    env::set_current_dir(old).unwrap();
}

#[test]
fn settings_from_lookup_apply_defaults_and_hygiene() {
    let vars = std::collections::HashMap::from([
        ("SIMILARITY_THRESHOLD", "2.5"),
        ("API_RATE_LIMIT", "0"),
        ("MAX_ARTICLES_PER_SOURCE", "abc"),
        ("LANGUAGE", "ja"),
        ("SLACK_BOT_TOKEN", "   "),
    ]);
    let s = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(s.similarity_threshold, 1.0);
    assert_eq!(s.api_rate_limit, 1);
    assert_eq!(s.max_articles_per_source, 10);
    assert_eq!(s.language, Language::Ja);
    assert!(s.slack_bot_token.is_none());
    assert_eq!(s.openai_model, "gpt-4o-mini");
}
