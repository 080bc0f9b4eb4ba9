//! Command-line handling for the daemon binary.
//!
//! Helper flags (`--version`, `--list-devices`) are answered before any
//! configuration is loaded. Every other argument is handed to the layered
//! configuration loader, so the two sets are separated here first.

use std::ffi::{OsStr, OsString};

use clap::Parser;

/// Configuration flags that consume the following argument as their value.
///
/// Keep in sync with the fields of `wgapi_config::Config`.
const CONFIG_VALUE_FLAGS: &[&str] = &[
    "--config-path",
    "--device",
    "--listen",
    "--tls-key",
    "--tls-cert",
    "--tls-client-ca",
    "--tokens",
    "--log-filter",
    "--log-format",
];

/// Singular spelling accepted for `--tokens`.
const TOKEN_ALIAS: &str = "--token";
const TOKENS_FLAG: &str = "--tokens";

const HELPER_FLAGS: &[&str] = &["--version", "--list-devices"];

/// Flags that short-circuit the daemon.
#[derive(Parser, Debug)]
#[command(name = "wgapid", disable_version_flag = true, disable_help_flag = true)]
struct HelperCli {
    /// Prints the daemon version and exits.
    #[arg(long)]
    version: bool,
    /// Prints the WireGuard interfaces on this host and exits.
    #[arg(long)]
    list_devices: bool,
}

/// One-shot action requested instead of running the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    /// Print the version.
    Version,
    /// List WireGuard interfaces.
    ListDevices,
}

/// Command line split into helper flags and configuration arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Helper requested on the command line, if any.
    pub helper: Option<Helper>,
    /// Program name followed by the arguments destined for the config loader.
    pub config_arguments: Vec<OsString>,
}

/// Splits `args` (program name first) into helper flags and configuration
/// arguments.
///
/// Values of configuration flags are never mistaken for helper flags, so
/// `--tokens --version` sets a token rather than printing the version.
/// `--token` is rewritten to `--tokens`.
///
/// # Errors
///
/// Returns the `clap` error when the helper flags fail to parse, for example
/// when one carries a value.
pub fn parse_invocation<I>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let program = args.next().unwrap_or_else(|| OsString::from("wgapid"));
    let mut helper_arguments = vec![program.clone()];
    let mut config_arguments = vec![program];

    let mut expecting_value = false;
    for argument in args {
        if expecting_value {
            expecting_value = false;
            config_arguments.push(argument);
            continue;
        }
        let (is_helper, takes_value) = {
            let text = argument.to_string_lossy();
            match text.split_once('=') {
                Some((flag, _)) => (HELPER_FLAGS.contains(&flag), false),
                None => (
                    HELPER_FLAGS.contains(&text.as_ref()),
                    CONFIG_VALUE_FLAGS.contains(&canonical_flag(&text)),
                ),
            }
        };
        if is_helper {
            helper_arguments.push(argument);
            continue;
        }
        expecting_value = takes_value;
        config_arguments.push(rewrite_alias(&argument));
    }

    let cli = HelperCli::try_parse_from(helper_arguments)?;
    let helper = if cli.version {
        Some(Helper::Version)
    } else if cli.list_devices {
        Some(Helper::ListDevices)
    } else {
        None
    };
    Ok(Invocation {
        helper,
        config_arguments,
    })
}

fn canonical_flag(flag: &str) -> &str {
    if flag == TOKEN_ALIAS {
        TOKENS_FLAG
    } else {
        flag
    }
}

fn rewrite_alias(argument: &OsStr) -> OsString {
    let Some(text) = argument.to_str() else {
        return argument.to_owned();
    };
    match text.strip_prefix(TOKEN_ALIAS) {
        Some("") => OsString::from(TOKENS_FLAG),
        Some(value) if value.starts_with('=') => OsString::from(format!("{TOKENS_FLAG}{value}")),
        _ => argument.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn invocation(args: &[&str]) -> Invocation {
        let args = std::iter::once("wgapid")
            .chain(args.iter().copied())
            .map(OsString::from);
        parse_invocation(args).expect("arguments parse")
    }

    fn config_arguments(invocation: &Invocation) -> Vec<&str> {
        invocation
            .config_arguments
            .iter()
            .skip(1)
            .map(|argument| argument.to_str().expect("utf8"))
            .collect()
    }

    #[rstest]
    #[case(&["--version"], Some(Helper::Version))]
    #[case(&["--device", "wg0", "--list-devices"], Some(Helper::ListDevices))]
    #[case(&["--list-devices", "--version"], Some(Helper::Version))]
    #[case(&["--device", "wg0"], None)]
    fn recognises_helper_flags(#[case] args: &[&str], #[case] expected: Option<Helper>) {
        assert_eq!(invocation(args).helper, expected);
    }

    #[rstest]
    #[case(&["--tokens", "--version"])]
    #[case(&["--device", "--list-devices"])]
    fn flag_values_are_not_helpers(#[case] args: &[&str]) {
        let parsed = invocation(args);
        assert_eq!(parsed.helper, None);
        assert_eq!(config_arguments(&parsed), args.to_vec());
    }

    #[test]
    fn helper_flags_are_not_forwarded_to_configuration() {
        let parsed = invocation(&["--device", "wg0", "--version", "--tls"]);
        assert_eq!(config_arguments(&parsed), vec!["--device", "wg0", "--tls"]);
    }

    #[rstest]
    #[case(&["--token", "a", "--token", "b"], &["--tokens", "a", "--tokens", "b"])]
    #[case(&["--token=a"], &["--tokens=a"])]
    #[case(&["--tokens", "a"], &["--tokens", "a"])]
    fn token_alias_is_rewritten(#[case] args: &[&str], #[case] expected: &[&str]) {
        assert_eq!(config_arguments(&invocation(args)), expected.to_vec());
    }

    #[test]
    fn token_value_named_like_the_alias_is_kept() {
        let parsed = invocation(&["--tokens", "--token"]);
        assert_eq!(config_arguments(&parsed), vec!["--tokens", "--token"]);
    }

    #[test]
    fn helper_flag_with_a_value_is_rejected() {
        let args = ["wgapid", "--version=yes"].map(OsString::from);
        assert!(parse_invocation(args).is_err());
    }
}
