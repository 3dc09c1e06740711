//! toastline: show one line of text as a fading overlay label.
//!
//! Usage: `toastline [TEXT]`. Extra arguments are ignored and the process
//! always exits with status 0.

mod app;
mod config;
mod logging;

use std::ffi::OsString;

use clap::Parser;
use config::{AppConfig, AppConfigExt};
use toastline_overlay::platform;

#[derive(Parser, Debug)]
#[command(
    name = "toastline",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// Text to display
    #[arg(allow_hyphen_values = true)]
    text: Option<String>,

    #[arg(allow_hyphen_values = true, trailing_var_arg = true, hide = true)]
    rest: Vec<String>,
}

/// Pick the label text out of the command line
fn parse_text<I, T>(args: I) -> Option<String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    match Args::try_parse_from(&args) {
        Ok(parsed) => {
            if !parsed.rest.is_empty() {
                tracing::debug!(ignored = parsed.rest.len(), "extra arguments ignored");
            }
            parsed.text
        }
        Err(e) => {
            tracing::warn!(error = %e, "unparsed command line, using first argument");
            args.get(1).map(|arg| arg.to_string_lossy().into_owned())
        }
    }
}

fn main() {
    logging::init();

    let text = parse_text(std::env::args_os());
    let config = AppConfig::load();

    if let Err(e) = app::run(&config, text) {
        tracing::error!(error = %e, "overlay failed");
        platform::notify_fatal("toastline", &e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        assert_eq!(parse_text(["toastline"]), None);
    }

    #[test]
    fn test_single_argument() {
        assert_eq!(
            parse_text(["toastline", "build finished"]),
            Some("build finished".to_string())
        );
    }

    #[test]
    fn test_hyphen_text_is_not_a_flag() {
        assert_eq!(
            parse_text(["toastline", "-42 dB"]),
            Some("-42 dB".to_string())
        );
        assert_eq!(parse_text(["toastline", "--help"]), Some("--help".to_string()));
    }

    #[test]
    fn test_extra_arguments_ignored() {
        assert_eq!(
            parse_text(["toastline", "first", "second", "-x"]),
            Some("first".to_string())
        );
    }
}
