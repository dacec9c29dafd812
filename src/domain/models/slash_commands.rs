#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_new_chat()
            || cmd.is_switch_chat()
            || cmd.is_list_chats()
            || cmd.is_clear_chat()
            || cmd.is_regenerate()
            || cmd.is_copy_chat()
            || cmd.is_rename_chat()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    /// Arguments joined back into a single string, used for titles.
    pub fn rest(&self) -> String {
        return self.args.join(" ");
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_new_chat(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_switch_chat(&self) -> bool {
        return ["/s", "/switch"].contains(&self.command.as_str());
    }

    pub fn is_list_chats(&self) -> bool {
        return ["/l", "/list"].contains(&self.command.as_str());
    }

    pub fn is_clear_chat(&self) -> bool {
        return self.command == "/clear";
    }

    pub fn is_regenerate(&self) -> bool {
        return ["/r", "/regen", "/regenerate"].contains(&self.command.as_str());
    }

    pub fn is_copy_chat(&self) -> bool {
        return ["/c", "/copy"].contains(&self.command.as_str());
    }

    pub fn is_rename_chat(&self) -> bool {
        return self.command == "/rename";
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }
}
