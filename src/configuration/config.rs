#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::DEFAULT_TITLE;
use crate::domain::services::ChatOptions;
use crate::domain::services::DEFAULT_REPLY_DELAY;
use crate::domain::services::NEW_CHAT_GREETING;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    AssistantLabel,
    ConfigFile,
    Greeting,
    NewChatTitle,
    ReplyDelay,
    ReplySeed,
    UserLabel,
}

impl ConfigKey {
    /// Keys whose values must parse as unsigned integers.
    pub fn is_numeric(&self) -> bool {
        return matches!(self, ConfigKey::ReplyDelay | ConfigKey::ReplySeed);
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(env::temp_dir)
            .join("parley/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = path::PathBuf::from(env::var("HOME").unwrap_or_default())
            .join(".config/parley/config.toml");

        let default_delay = DEFAULT_REPLY_DELAY.as_millis().to_string();

        let res = match key {
            ConfigKey::AssistantLabel => "AI",
            ConfigKey::Greeting => NEW_CHAT_GREETING,
            ConfigKey::NewChatTitle => DEFAULT_TITLE,
            ConfigKey::ReplyDelay => &default_delay,
            ConfigKey::ReplySeed => "",
            ConfigKey::UserLabel => "你",

            // Special
            ConfigKey::ConfigFile => return config_path.to_string_lossy().to_string(),
        };

        return res.to_string();
    }

    fn validate(key: ConfigKey, val: &str) -> Result<()> {
        if key.is_numeric() && !val.is_empty() && val.parse::<u64>().is_err() {
            bail!(format!(
                "Invalid value for key '{key}': {val}\nExpected a positive whole number."
            ));
        }

        return Ok(());
    }

    /// Reads known keys out of a config file. Unknown keys are ignored.
    pub fn parse_toml(toml_str: &str) -> Result<Vec<(ConfigKey, String)>> {
        let doc = toml_str.parse::<toml_edit::Document>()?;
        let mut values = vec![];

        for key in ConfigKey::iter() {
            if let Some(val) = doc.get(&key.to_string()) {
                if let Some(val_int) = val.as_integer() {
                    if key.is_numeric() && val_int < 0 {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}': {val_int}"
                        ));
                    }
                    values.push((key, val_int.to_string()));
                } else if let Some(val_str) = val.as_str() {
                    if Config::validate(key, val_str).is_err() {
                        bail!(format!(
                            "config.toml has an invalid value for key '{key}': {val_str}"
                        ));
                    }
                    values.push((key, val_str.to_string()));
                }
            }
        }

        return Ok(values);
    }

    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            for (key, val) in Config::parse_toml(&toml_str)? {
                Config::set(key, &val);
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::validate(key, val)?;
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            reply_delay = Config::get(ConfigKey::ReplyDelay),
            reply_seed = Config::get(ConfigKey::ReplySeed),
            user_label = Config::get(ConfigKey::UserLabel),
            assistant_label = Config::get(ConfigKey::AssistantLabel),
            new_chat_title = Config::get(ConfigKey::NewChatTitle),
            "config"
        );

        return Ok(());
    }

    /// Seed for the fallback reply picker, when one is configured.
    pub fn reply_seed() -> Result<Option<u64>> {
        let seed = Config::get(ConfigKey::ReplySeed);
        if seed.is_empty() {
            return Ok(None);
        }

        return Ok(Some(seed.parse::<u64>()?));
    }

    pub fn chat_options() -> Result<ChatOptions> {
        let mut delay = Config::get(ConfigKey::ReplyDelay);
        if delay.is_empty() {
            delay = Config::default(ConfigKey::ReplyDelay);
        }

        return Ok(ChatOptions {
            reply_delay: Duration::from_millis(delay.parse::<u64>()?),
            user_label: Config::get(ConfigKey::UserLabel),
            assistant_label: Config::get(ConfigKey::AssistantLabel),
            new_chat_title: Config::get(ConfigKey::NewChatTitle),
            greeting: Config::get(ConfigKey::Greeting),
        });
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let description = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if key.is_numeric() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
