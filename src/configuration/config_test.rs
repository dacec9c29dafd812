use std::time::Duration;

use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default(cli::build());
    res.parse::<toml_edit::Document>()?;

    assert!(res.contains("reply-delay = 1500"));
    assert!(res.contains("# reply-seed = \"\""));
    assert!(res.contains("user-label = \"你\""));
    assert!(!res.contains("config-file"));

    let values = Config::parse_toml(&res)?;
    assert!(values.contains(&(ConfigKey::ReplyDelay, "1500".to_string())));
    assert!(values.contains(&(ConfigKey::NewChatTitle, "新对话".to_string())));

    return Ok(());
}

#[test]
fn it_parses_known_keys() -> Result<()> {
    let values = Config::parse_toml(
        r#"
reply-delay = 250
reply-seed = "42"
assistant-label = "DeepSeek"
something-else = true
"#,
    )?;

    assert_eq!(
        values,
        vec![
            (ConfigKey::AssistantLabel, "DeepSeek".to_string()),
            (ConfigKey::ReplyDelay, "250".to_string()),
            (ConfigKey::ReplySeed, "42".to_string()),
        ]
    );

    return Ok(());
}

#[test]
fn it_rejects_non_numeric_delays() {
    assert!(Config::parse_toml("reply-delay = \"soon\"").is_err());
    assert!(Config::parse_toml("reply-delay = -5").is_err());
    assert!(Config::parse_toml("reply-seed = \"abc\"").is_err());
    assert!(Config::parse_toml("user-label = \"abc\"").is_ok());
}

#[test]
fn it_marks_numeric_keys() {
    assert!(ConfigKey::ReplyDelay.is_numeric());
    assert!(ConfigKey::ReplySeed.is_numeric());
    assert!(!ConfigKey::Greeting.is_numeric());
    assert_eq!(ConfigKey::NewChatTitle.to_string(), "new-chat-title");
}

#[test]
fn it_provides_defaults() {
    assert_eq!(Config::default(ConfigKey::ReplyDelay), "1500");
    assert_eq!(Config::default(ConfigKey::UserLabel), "你");
    assert_eq!(Config::default(ConfigKey::AssistantLabel), "AI");
    assert!(Config::default(ConfigKey::ConfigFile).ends_with("config.toml"));
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec![
        "parley",
        "chat",
        "-c",
        "./config.example.toml",
    ])?;
    let (_, chat_matches) = matches.subcommand().unwrap();
    Config::load(vec![&matches, chat_matches]).await?;

    let options = Config::chat_options()?;
    assert!(options.reply_delay > Duration::ZERO);

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["parley", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}

#[tokio::test]
async fn it_rejects_invalid_arguments() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["parley", "--reply-delay", "later"])?;
    let res = Config::load(vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
