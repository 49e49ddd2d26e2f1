use crate::cli::globals::GlobalArgs;
use crate::users::{view, CollectionStore, Draft, SubmitOutcome};
use anyhow::{bail, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub draft: Draft,
}

/// Mount, submit the draft, and print the refreshed collection.
/// # Errors
/// Returns an error if the HTTP client cannot be built or the draft is
/// missing a required field.
pub async fn execute(args: Args) -> Result<()> {
    let store = CollectionStore::new(args.globals.gateway()?);

    store.load_all().await;
    store.set_draft(args.draft);

    match store.submit_draft().await {
        SubmitOutcome::Created => println!("User created."),
        SubmitOutcome::Invalid(err) => bail!("{err}"),
        SubmitOutcome::Failed(_) => {}
    }

    print!("{}", view::render(&store.snapshot()));

    Ok(())
}
