//! CLI argument definitions using clap

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::Action;

/// Post, update or delete source annotations on Fritz/SkyPortal
#[derive(Parser, Debug)]
#[command(name = "fritz-annotate")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Config file (default: global config location)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    /// post, update, or delete annotation (case-insensitive)
    #[arg(long, value_parser = parse_action)]
    pub action: Option<Action>,

    /// Fritz object id or csv file of sources
    #[arg(long, value_hint = ValueHint::AnyPath)]
    pub source: Option<String>,

    /// List of group ids the posted annotation is visible to
    #[arg(long = "group_ids", visible_alias = "group-ids", num_args = 1..)]
    pub group_ids: Option<Vec<i64>>,

    /// Fritz API token (from your Fritz profile page)
    #[arg(long, env = "FRITZ_ANNOTATE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Name of annotation origin
    #[arg(long)]
    pub origin: Option<String>,

    /// Annotation key
    #[arg(long)]
    pub key: Option<String>,

    /// Annotation value (numeric when it parses as a number)
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<String>,

    /// Fritz/SkyPortal base URL
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config (token redacted)
    Show,

    /// Create global config template
    Init,

    /// Show config path
    Path,
}

fn parse_action(s: &str) -> Result<Action, String> {
    s.parse::<Action>().map_err(|e| e.to_string())
}

/// Long options that may be spelled with a single dash, e.g. `-action post`.
const LEGACY_LONG_FLAGS: &[&str] = &[
    "action",
    "source",
    "group_ids",
    "token",
    "origin",
    "key",
    "value",
];

/// Rewrite single-dash long options (`-action`) to `--action`.
///
/// Applies to option names only; everything after a bare `--` and option
/// values such as a negative `-value` argument are left alone.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    let mut expect_value = false;

    for arg in args.into_iter().map(Into::into) {
        if passthrough || expect_value {
            expect_value = false;
            out.push(arg);
            continue;
        }
        let rewritten = match arg.to_str() {
            Some("--") => {
                passthrough = true;
                None
            }
            Some(s) => s.strip_prefix('-').and_then(|rest| {
                let (name, inline_value) = match rest.split_once('=') {
                    Some((name, value)) => (name, Some(value)),
                    None => (rest, None),
                };
                if !rest.starts_with('-') && LEGACY_LONG_FLAGS.contains(&name) {
                    expect_value = inline_value.is_none() && name == "value";
                    Some(OsString::from(format!("-{}", s)))
                } else {
                    None
                }
            }),
            None => None,
        };
        out.push(rewritten.unwrap_or(arg));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(args: &[&str]) -> Vec<String> {
        normalize_legacy_flags(args.iter().copied())
            .into_iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn given_single_dash_long_flags_when_normalizing_then_doubles_dash() {
        assert_eq!(
            normalized(&["fritz-annotate", "-action", "post", "-group_ids", "1", "2"]),
            vec!["fritz-annotate", "--action", "post", "--group_ids", "1", "2"]
        );
    }

    #[test]
    fn given_negative_value_when_normalizing_then_keeps_it() {
        assert_eq!(
            normalized(&["x", "-value", "-1.5", "-key", "score"]),
            vec!["x", "--value", "-1.5", "--key", "score"]
        );
    }

    #[test]
    fn given_short_and_double_dash_flags_when_normalizing_then_unchanged() {
        assert_eq!(
            normalized(&["x", "-vv", "--origin", "tool", "-origin=tool"]),
            vec!["x", "-vv", "--origin", "tool", "--origin=tool"]
        );
    }
}
