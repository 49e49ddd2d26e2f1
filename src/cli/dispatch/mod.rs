//! Maps validated CLI matches to the action to execute.

use crate::cli::actions::{create, deploy, form, list, Action};
use crate::cli::{commands, globals::GlobalArgs};
use crate::users::Draft;
use anyhow::{anyhow, Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or no subcommand was given.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("list", _)) => Ok(Action::List(list::Args {
            globals: GlobalArgs::parse(matches)?,
        })),
        Some(("create", sub_m)) => {
            let field = |id: &str| -> Result<String> {
                sub_m
                    .get_one::<String>(id)
                    .cloned()
                    .with_context(|| format!("missing required argument: --{id}"))
            };
            Ok(Action::Create(create::Args {
                globals: GlobalArgs::parse(matches)?,
                draft: Draft::new(field("name")?, field("email")?),
            }))
        }
        Some(("form", _)) => Ok(Action::Form(form::Args {
            globals: GlobalArgs::parse(matches)?,
        })),
        Some((commands::deploy::NAME, sub_m)) => Ok(Action::Deploy(deploy::Args {
            config: commands::deploy::parse(sub_m)?,
        })),
        Some((other, _)) => Err(anyhow!("unknown subcommand: {other}")),
        None => Err(anyhow!("missing subcommand")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn create_maps_to_draft() {
        temp_env::with_vars([("USERBOARD_API_URL", None::<&str>)], || {
            let matches = commands::new().get_matches_from(vec![
                "userboard",
                "create",
                "--name",
                "Bob",
                "--email",
                "bob@x.com",
            ]);

            match handler(&matches).unwrap() {
                Action::Create(args) => {
                    assert_eq!(args.draft, Draft::new("Bob", "bob@x.com"));
                    assert_eq!(args.globals.api_url.as_str(), crate::DEFAULT_API_URL);
                }
                other => panic!("unexpected action: {other:?}"),
            }
        });
    }

    #[test]
    fn deploy_maps_to_config() {
        temp_env::with_vars([("USERBOARD_TAG", None::<&str>)], || {
            let matches = commands::new().get_matches_from(vec![
                "userboard",
                "deploy",
                "--registry",
                "r.example.com",
                "--tag",
                "v2",
            ]);

            match handler(&matches).unwrap() {
                Action::Deploy(args) => {
                    assert_eq!(args.config.image("backend"), "r.example.com/userboard-backend:v2");
                }
                other => panic!("unexpected action: {other:?}"),
            }
        });
    }
}
