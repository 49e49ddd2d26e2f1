//! Plain-text rendering of the store state for the terminal form.

use crate::users::store::StoreState;
use std::fmt::Write as _;

const ID_HEADER: &str = "ID";
const NAME_HEADER: &str = "NAME";
const EMAIL_HEADER: &str = "EMAIL";

/// Render the user list, a loading marker, and the last error if any.
#[must_use]
pub fn render(state: &StoreState) -> String {
    let mut out = String::new();

    if state.loading {
        out.push_str("Loading...\n");
    }

    if let Some(kind) = state.last_error {
        let _ = writeln!(out, "Last request failed: {kind}");
    }

    if state.users.is_empty() {
        if !state.loading {
            out.push_str("No users yet.\n");
        }
        return out;
    }

    let ids: Vec<String> = state.users.iter().map(|user| user.id.to_string()).collect();

    let id_width = column_width(ID_HEADER, ids.iter().map(String::as_str));
    let name_width = column_width(NAME_HEADER, state.users.iter().map(|u| u.name.as_str()));

    let _ = writeln!(
        out,
        "{ID_HEADER:<id_width$}  {NAME_HEADER:<name_width$}  {EMAIL_HEADER}"
    );
    for (id, user) in ids.iter().zip(&state.users) {
        let _ = writeln!(
            out,
            "{id:<id_width$}  {:<name_width$}  {}",
            user.name, user.email
        );
    }

    out
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|value| value.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(header.len())
}
