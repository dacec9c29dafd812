#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) [TITLE?] - Starts a new conversation and makes it current.
- /switch (/s) [ID] - Switches to the conversation with the given ID. Any reply still pending for the conversation you leave is dropped.
- /list (/l) - Lists all conversations, newest first.
- /clear - Clears every message of the current conversation. This can't be undone.
- /regen (/r) - Asks for a fresh reply to your last message.
- /copy (/c) - Prints the current conversation as plain text.
- /rename [TITLE] - Renames the current conversation.
- /quit /exit (/q) - Exit Parley.
- /help (/h) - Provides this help menu.

Anything else is sent as a message. While the assistant is thinking, sending is disabled.
        "#;

    return text.trim().to_string();
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

pub fn log_path() -> path::PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_LOG_DIR") {
        return path::PathBuf::from(dir).join("debug.log");
    }

    return dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("parley/debug.log");
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Parley")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Parley with environment variable RUST_LOG=parley")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_reply_delay() -> Arg {
    return Arg::new(ConfigKey::ReplyDelay.to_string())
        .long(ConfigKey::ReplyDelay.to_string())
        .env("PARLEY_REPLY_DELAY")
        .num_args(1)
        .help(format!(
            "Milliseconds to wait before the simulated assistant replies. [default: {}]",
            Config::default(ConfigKey::ReplyDelay)
        ));
}

fn arg_reply_seed() -> Arg {
    return Arg::new(ConfigKey::ReplySeed.to_string())
        .long(ConfigKey::ReplySeed.to_string())
        .env("PARLEY_REPLY_SEED")
        .num_args(1)
        .help("Seed for picking fallback replies, making them repeatable between runs.");
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Start chatting. This is the default when no command is given.")
        .arg(arg_reply_delay())
        .arg(arg_reply_seed());
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("parley")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(arg_reply_delay())
        .arg(arg_reply_seed())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("PARLEY_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::UserLabel.to_string())
                .long(ConfigKey::UserLabel.to_string())
                .env("PARLEY_USER_LABEL")
                .num_args(1)
                .help(format!("Label shown before your messages. [default: {}]", Config::default(ConfigKey::UserLabel)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::AssistantLabel.to_string())
                .long(ConfigKey::AssistantLabel.to_string())
                .env("PARLEY_ASSISTANT_LABEL")
                .num_args(1)
                .help(format!("Label shown before assistant messages. [default: {}]", Config::default(ConfigKey::AssistantLabel)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::NewChatTitle.to_string())
                .long(ConfigKey::NewChatTitle.to_string())
                .env("PARLEY_NEW_CHAT_TITLE")
                .num_args(1)
                .help(format!("Title given to new conversations. [default: {}]", Config::default(ConfigKey::NewChatTitle)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Greeting.to_string())
                .long(ConfigKey::Greeting.to_string())
                .env("PARLEY_GREETING")
                .num_args(1)
                .help("First assistant message of a new conversation. Set it to an empty string in the config file to disable it.")
                .global(true),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_path().to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(vec![&matches]).await?;
        }
    }

    return Ok(true);
}
