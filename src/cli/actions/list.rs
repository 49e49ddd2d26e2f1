use crate::cli::globals::GlobalArgs;
use crate::users::{view, CollectionStore};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Mount the store and print the collection. A failed listing is rendered,
/// not returned as an error.
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub async fn execute(args: Args) -> Result<()> {
    let store = CollectionStore::new(args.globals.gateway()?);

    store.load_all().await;

    print!("{}", view::render(&store.snapshot()));

    Ok(())
}
