use crate::cli::actions::{create, deploy, form, list, Action};
use anyhow::Result;
use tokio::io::{stdin, BufReader};

/// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::List(args) => list::execute(args).await,
        Action::Create(args) => create::execute(args).await,
        Action::Form(args) => {
            form::execute(args, BufReader::new(stdin()), std::io::stdout()).await
        }
        Action::Deploy(args) => deploy::execute(args).await,
    }
}
