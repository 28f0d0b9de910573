use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use unified_cache::{cache, Cache, Value};

const HELP: &str = "\
get <key>
set <key> <value> [<seconds>]
keys
values
dump
clear
clear-all
mode
help
quit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Value),
    Set {
        key: Value,
        value: Value,
        delete_after: Option<Duration>,
    },
    Keys,
    Values,
    Dump,
    Clear,
    ClearAll,
    Mode,
    Help,
    Quit,
}

#[derive(Debug, PartialEq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reads a token as an int, a float, a boolean, `0x` prefixed bytes, or
/// falls back to a string.
pub fn parse_value(token: &str) -> Value {
    if let Ok(number) = token.parse::<i64>() {
        return Value::Int(number);
    }
    if let Ok(number) = token.parse::<f64>() {
        return Value::Float(number);
    }
    if let Ok(flag) = token.parse::<bool>() {
        return Value::Bool(flag);
    }
    if let Some(bytes) = token.strip_prefix("0x").and_then(|hex| hex::decode(hex).ok()) {
        return Value::Bytes(bytes);
    }
    Value::Str(token.to_string())
}

fn parse_seconds(token: &str) -> Result<Duration, ParseError> {
    token
        .parse::<f64>()
        .ok()
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .ok_or_else(|| ParseError(format!("Invalid duration: {token}")))
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let command = match tokens.as_slice() {
            ["get", key] => Command::Get(parse_value(key)),
            ["set", key, value] => Command::Set {
                key: parse_value(key),
                value: parse_value(value),
                delete_after: None,
            },
            ["set", key, value, seconds] => Command::Set {
                key: parse_value(key),
                value: parse_value(value),
                delete_after: Some(parse_seconds(seconds)?),
            },
            ["keys"] => Command::Keys,
            ["values"] => Command::Values,
            ["dump"] => Command::Dump,
            ["clear"] => Command::Clear,
            ["clear-all"] => Command::ClearAll,
            ["mode"] => Command::Mode,
            ["help"] => Command::Help,
            ["quit" | "exit"] => Command::Quit,
            _ => return Err(ParseError(format!("Unknown command: {line}"))),
        };
        Ok(command)
    }
}

fn sorted_lines<T: ToString>(items: impl IntoIterator<Item = T>) -> Vec<String> {
    let mut lines: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    lines.sort();
    lines
}

fn pairs(snapshot: cache::Snapshot) -> Vec<String> {
    sorted_lines(
        snapshot
            .into_iter()
            .map(|(key, value)| format!("{key}\t{value}")),
    )
}

/// Runs one command and returns the lines to print.
pub async fn execute(cache: &Cache, command: Command) -> Result<Vec<String>, cache::Error> {
    debug!("Executing {command:?} on {} cache", cache.cache_type());
    let output = match command {
        Command::Get(key) => match cache.get(key).await? {
            Some(value) => vec![value.to_string()],
            None => vec!["(nil)".to_string()],
        },
        Command::Set {
            key,
            value,
            delete_after,
        } => {
            cache.set(key, value, delete_after).await?;
            vec!["OK".to_string()]
        }
        Command::Keys => sorted_lines(cache.keys().await?),
        Command::Values => sorted_lines(cache.values().await?),
        Command::Dump => pairs(cache.cache().await?),
        Command::Clear => pairs(cache.clear().await?),
        Command::ClearAll => {
            cache.clear_all().await?;
            vec!["OK".to_string()]
        }
        Command::Mode => vec![cache.cache_type().to_string()],
        Command::Help => HELP.lines().map(str::to_string).collect(),
        Command::Quit => Vec::new(),
    };
    Ok(output)
}

/// Reads commands line by line from `input` until `quit` or end of input.
///
/// Failed commands are reported on `output` and do not stop the shell.
pub async fn run<R, W>(cache: &Cache, input: R, output: &mut W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let printed = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => match execute(cache, command).await {
                Ok(lines) => lines,
                Err(err) => {
                    warn!("Command failed: {err}");
                    vec![format!("error: {err}")]
                }
            },
            Err(err) => vec![format!("error: {err}")],
        };

        for printed_line in printed {
            output.write_all(printed_line.as_bytes()).await?;
            output.write_all(b"\n").await?;
        }
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use unified_cache::Scheduler;

    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), Value::Int(42));
        assert_eq!(parse_value("2.5"), Value::Float(2.5));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("0xcafe"), Value::Bytes(vec![0xca, 0xfe]));
        assert_eq!(parse_value("0xzz"), Value::from("0xzz"));
        assert_eq!(parse_value("hello"), Value::from("hello"));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "get name".parse::<Command>(),
            Ok(Command::Get(Value::from("name")))
        );
        assert_eq!(
            "set name ferris 1.5".parse::<Command>(),
            Ok(Command::Set {
                key: Value::from("name"),
                value: Value::from("ferris"),
                delete_after: Some(Duration::from_millis(1500)),
            })
        );
        assert_eq!("clear-all".parse::<Command>(), Ok(Command::ClearAll));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "set a b -1".parse::<Command>(),
            Err(ParseError("Invalid duration: -1".to_string()))
        );
        assert_eq!(
            "frobnicate".parse::<Command>(),
            Err(ParseError("Unknown command: frobnicate".to_string()))
        );
    }

    #[tokio::test]
    async fn test_run_session() {
        let cache = Cache::local(Scheduler::current().unwrap());
        let input: &[u8] = b"set b 2\nset a one\n\nget a\nget missing\ndump\nbogus\nclear\nkeys\nmode\nquit\nget a\n";
        let mut output = Vec::new();

        run(&cache, input, &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "OK\nOK\none\n(nil)\na\tone\nb\t2\nerror: Unknown command: bogus\na\tone\nb\t2\nDict\n"
        );
    }
}
