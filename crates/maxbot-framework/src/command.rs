//! Slash-command extraction.

/// A parsed `/command@mention args...` message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased command name without the leading `/`.
    pub name: String,
    /// Bot username after `@`, as written.
    pub mention: Option<String>,
    /// Everything after the command token, trimmed.
    pub args_text: String,
    /// `args_text` split on whitespace.
    pub args: Vec<String>,
}

/// Returns the lower-cased command name of `text`, or an empty string when
/// the text is not a command.
///
/// ```
/// use maxbot_framework::extract_command;
///
/// assert_eq!(extract_command("/start"), "start");
/// assert_eq!(extract_command(" /START@MyBot arg"), "start");
/// assert_eq!(extract_command("hello"), "");
/// assert_eq!(extract_command("/"), "");
/// ```
pub fn extract_command(text: &str) -> String {
    let Some(rest) = text.trim().strip_prefix('/') else {
        return String::new();
    };
    let Some(token) = rest.split_whitespace().next() else {
        return String::new();
    };
    let name = token.split_once('@').map_or(token, |(name, _)| name);
    name.to_lowercase()
}

/// Parses `text` into its command name, mention and arguments.
///
/// Returns `None` when the text is not a command or the name is empty
/// (`"/"`, `"/@bot"`).
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let rest = text.trim().strip_prefix('/')?.trim_start();
    let (token, args_text) = match rest.split_once(char::is_whitespace) {
        Some((token, args)) => (token, args.trim()),
        None => (rest, ""),
    };

    let (name, mention) = match token.split_once('@') {
        Some((name, mention)) => (name, Some(mention.trim()).filter(|m| !m.is_empty())),
        None => (token, None),
    };
    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        name: name.to_lowercase(),
        mention: mention.map(str::to_string),
        args_text: args_text.to_string(),
        args: args_text.split_whitespace().map(str::to_string).collect(),
    })
}

/// Normalizes a command name for registration and comparison: trims,
/// lower-cases and strips one leading `/`.
pub fn normalize_command(name: &str) -> String {
    let name = name.trim().to_lowercase();
    name.strip_prefix('/').map(str::to_string).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        assert_eq!(extract_command("/start"), "start");
        assert_eq!(extract_command(" /START@MyBot arg"), "start");
        assert_eq!(extract_command("/help\tme"), "help");
        assert_eq!(extract_command("hello"), "");
        assert_eq!(extract_command("/"), "");
        assert_eq!(extract_command("/   "), "");
        assert_eq!(extract_command("say /start"), "");
        assert_eq!(extract_command(""), "");
    }

    #[test]
    fn test_parse_command_with_mention_and_args() {
        let parsed = parse_command("/Echo@MaxBot  hello   world ").unwrap();
        assert_eq!(parsed.name, "echo");
        assert_eq!(parsed.mention.as_deref(), Some("MaxBot"));
        assert_eq!(parsed.args_text, "hello   world");
        assert_eq!(parsed.args, vec!["hello", "world"]);
    }

    #[test]
    fn test_parse_command_without_args() {
        let parsed = parse_command("/start").unwrap();
        assert_eq!(parsed.name, "start");
        assert!(parsed.mention.is_none());
        assert!(parsed.args_text.is_empty());
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn test_parse_command_rejects_non_commands() {
        assert!(parse_command("hello").is_none());
        assert!(parse_command("/").is_none());
        assert!(parse_command("/@bot").is_none());
        assert_eq!(parse_command("/start@").unwrap().mention, None);
    }

    #[test]
    fn test_normalize_command() {
        assert_eq!(normalize_command(" /Start "), "start");
        assert_eq!(normalize_command("help"), "help");
        assert_eq!(normalize_command("//x"), "/x");
        assert_eq!(normalize_command("  "), "");
    }
}
