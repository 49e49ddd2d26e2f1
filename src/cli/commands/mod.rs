pub mod deploy;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};
use url::Url;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TIMEOUT: &str = "timeout";

fn parse_api_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value.trim()).map_err(|e| format!("invalid URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!("unsupported scheme {scheme}, expected http or https")),
    }
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("userboard")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .short('u')
                .long(ARG_API_URL)
                .help("Base URL of the users API")
                .default_value(crate::DEFAULT_API_URL)
                .env("USERBOARD_API_URL")
                .global(true)
                .value_parser(parse_api_url),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds (default: none)")
                .env("USERBOARD_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .subcommand(Command::new("list").about("Fetch and show all users"))
        .subcommand(
            Command::new("create")
                .about("Create a user, then show the refreshed list")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Name of the new user")
                        .required(true),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Email of the new user")
                        .required(true),
                ),
        )
        .subcommand(Command::new("form").about("Interactive form: list users and add them one by one"))
        .subcommand(deploy::subcommand());

    logging::with_args(command)
}
