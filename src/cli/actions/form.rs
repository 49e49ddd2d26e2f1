use crate::cli::globals::GlobalArgs;
use crate::users::{view, CollectionStore, Gateway, SubmitOutcome};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Interactive form over `input`, with prompts and renders written to `out`.
/// # Errors
/// Returns an error if the HTTP client cannot be built or I/O fails.
pub async fn execute<R, W>(args: Args, input: R, out: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let store = CollectionStore::new(args.globals.gateway()?);
    session(&store, input, out).await
}

/// Mount, then read name/email pairs until end of input or an empty name.
/// A rejected draft is reported and the loop continues.
async fn session<G, R, W>(store: &CollectionStore<G>, input: R, mut out: W) -> Result<()>
where
    G: Gateway,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    store.load_all().await;
    write!(out, "{}", view::render(&store.snapshot()))?;

    loop {
        let Some(name) = prompt(&mut lines, &mut out, "Name (empty to quit): ").await? else {
            break;
        };
        if name.is_empty() {
            break;
        }
        let Some(email) = prompt(&mut lines, &mut out, "Email: ").await? else {
            break;
        };

        store.edit_draft(|draft| {
            draft.name = name;
            draft.email = email;
        });

        match store.submit_draft().await {
            SubmitOutcome::Created => writeln!(out, "User created.")?,
            SubmitOutcome::Invalid(err) => writeln!(out, "Not submitted: {err}")?,
            SubmitOutcome::Failed(kind) => writeln!(out, "Could not create user: {kind}")?,
        }

        write!(out, "{}", view::render(&store.snapshot()))?;
    }

    Ok(())
}

async fn prompt<R, W>(lines: &mut Lines<R>, out: &mut W, label: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{label}")?;
    out.flush()?;

    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}
