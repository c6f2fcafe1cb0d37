//! The tools historically take their long options with a single dash (`-org`, `-log-file`).
//!
//! clap only knows `--org` so we rewrite the command line before parsing: every argument of
//! the form `-name` or `-name=value` where `name` is a long option of the command becomes
//! `--name` (resp. `--name=value`).  Everything after `--` is left alone.
//!

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Command};
use tracing::trace;

use crate::LogOpts;

/// Options shared by every tool: credentials, portal, logging & configuration.
///
#[derive(Args, Clone, Debug)]
pub struct PortalArgs {
    /// The username to authenticate with
    #[clap(short = 'u', allow_hyphen_values = true)]
    pub username: String,
    /// The password to authenticate with
    #[clap(short = 'p', allow_hyphen_values = true)]
    pub password: String,
    /// The url of the org/portal to use
    #[clap(long = "org")]
    pub org_url: String,
    /// Do not verify the SSL certificate of the server
    #[clap(long)]
    pub skip_ssl_verification: bool,
    /// The log file to write to (capped at 10 MiB)
    #[clap(long)]
    pub log_file: Option<PathBuf>,
    /// configuration file.
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Verbose mode.
    #[clap(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl PortalArgs {
    pub fn log_opts(&self) -> LogOpts {
        LogOpts {
            verbose: self.verbose,
            log_file: self.log_file.clone(),
        }
    }
}

/// Rewrite single-dash long options into what clap expects.
///
/// The argument following an option which takes a value is that value and is never rewritten,
/// even when it looks like `-org`.
///
pub fn fix_args<I, S>(args: I, cmd: &Command) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let longs: Vec<&str> = cmd
        .get_arguments()
        .filter_map(|a| a.get_long())
        .filter(|l| l.len() > 1)
        .collect();
    let long_values: Vec<&str> = cmd
        .get_arguments()
        .filter(|a| a.get_action().takes_values())
        .filter_map(|a| a.get_long())
        .collect();
    let short_values: Vec<char> = cmd
        .get_arguments()
        .filter(|a| a.get_action().takes_values())
        .filter_map(|a| a.get_short())
        .collect();

    let mut res = vec![];
    let mut iter = args.into_iter().map(Into::<OsString>::into);
    while let Some(arg) = iter.next() {
        let Some(s) = arg.to_str() else {
            res.push(arg);
            continue;
        };
        if s == "--" {
            res.push(arg);
            res.extend(iter);
            break;
        }

        let rewrite = is_single_dash_long(s, &longs);
        let name = s.trim_start_matches('-');

        // `-u john`, `--org URL` and `-org URL` carry their value in the next argument
        //
        let has_value = if s.contains('=') {
            false
        } else if rewrite || s.starts_with("--") {
            long_values.contains(&name)
        } else if s.len() == 2 && s.starts_with('-') {
            name.chars().next().is_some_and(|c| short_values.contains(&c))
        } else {
            false
        };

        let arg = if rewrite {
            trace!("rewriting {s}");
            OsString::from(format!("-{s}"))
        } else {
            arg
        };

        res.push(arg);
        if has_value {
            if let Some(value) = iter.next() {
                res.push(value);
            }
        }
    }
    res
}

fn is_single_dash_long(arg: &str, longs: &[&str]) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') {
        return false;
    }
    let name = rest.split_once('=').map_or(rest, |(n, _)| n);
    longs.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::{Arg, Parser};
    use rstest::rstest;

    fn cmd() -> Command {
        Command::new("test")
            .arg(Arg::new("user").short('u'))
            .arg(Arg::new("password").short('p'))
            .arg(Arg::new("org").long("org"))
            .arg(
                Arg::new("skip")
                    .long("skip-ssl")
                    .action(ArgAction::SetTrue),
            )
            .arg(Arg::new("log_file").long("log-file"))
            .arg(Arg::new("x").long("x").short('x'))
    }

    fn fix(args: &[&str]) -> Vec<String> {
        fix_args(args.iter().copied(), &cmd())
            .into_iter()
            .map(|s| s.to_string_lossy().to_string())
            .collect()
    }

    #[rstest]
    #[case(&["prog", "-org", "https://x"], &["prog", "--org", "https://x"])]
    #[case(&["prog", "--org", "https://x"], &["prog", "--org", "https://x"])]
    #[case(&["prog", "-log-file=a.log"], &["prog", "--log-file=a.log"])]
    #[case(&["prog", "-u", "me"], &["prog", "-u", "me"])]
    #[case(&["prog", "-x"], &["prog", "-x"])]
    #[case(&["prog", "-unknown"], &["prog", "-unknown"])]
    #[case(&["prog", "--", "-org"], &["prog", "--", "-org"])]
    #[case(&["prog", "-p", "-org", "-org", "https://x"], &["prog", "-p", "-org", "--org", "https://x"])]
    #[case(&["prog", "-u", "-log-file", "-org", "https://x"], &["prog", "-u", "-log-file", "--org", "https://x"])]
    #[case(&["prog", "-org", "-log-file", "-log-file", "a.log"], &["prog", "--org", "-log-file", "--log-file", "a.log"])]
    #[case(&["prog", "--org", "-log-file"], &["prog", "--org", "-log-file"])]
    #[case(&["prog", "-log-file=a.log", "-org", "https://x"], &["prog", "--log-file=a.log", "--org", "https://x"])]
    #[case(&["prog", "-skip-ssl", "-org", "https://x"], &["prog", "--skip-ssl", "--org", "https://x"])]
    fn test_fix_args(#[case] input: &[&str], #[case] out: &[&str]) {
        assert_eq!(out, fix(input).as_slice());
    }

    #[derive(Debug, Parser)]
    struct Opts {
        #[clap(flatten)]
        portal: PortalArgs,
    }

    #[test]
    fn test_portal_args_single_dash() {
        use clap::CommandFactory;

        let args = [
            "prog",
            "-u",
            "john",
            "-p",
            "secret",
            "-org",
            "https://myorg.example.net",
            "-log-file",
            "run.log",
            "--skip-ssl-verification",
            "-vv",
        ];
        let opts = Opts::try_parse_from(fix_args(args, &Opts::command())).unwrap();

        assert_eq!("john", opts.portal.username);
        assert_eq!("secret", opts.portal.password);
        assert_eq!("https://myorg.example.net", opts.portal.org_url);
        assert!(opts.portal.skip_ssl_verification);
        assert_eq!(2, opts.portal.log_opts().verbose);
        assert_eq!(Some(PathBuf::from("run.log")), opts.portal.log_opts().log_file);
        assert_eq!(None, opts.portal.config);
    }

    #[test]
    fn test_portal_args_password_like_option() {
        use clap::CommandFactory;

        let args = [
            "prog",
            "-u",
            "-log-file",
            "-p",
            "-org",
            "-org",
            "https://myorg.example.net",
        ];
        let opts = Opts::try_parse_from(fix_args(args, &Opts::command())).unwrap();

        assert_eq!("-log-file", opts.portal.username);
        assert_eq!("-org", opts.portal.password);
        assert_eq!("https://myorg.example.net", opts.portal.org_url);
        assert_eq!(None, opts.portal.log_file);
    }

    #[test]
    fn test_portal_args_missing_org() {
        use clap::CommandFactory;

        let args = ["prog", "-u", "john", "-p", "secret"];
        let opts = Opts::try_parse_from(fix_args(args, &Opts::command()));

        assert!(opts.is_err());
    }
}
