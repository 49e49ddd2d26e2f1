//! # Userboard
//!
//! `userboard` lists and creates user records through a REST collection
//! endpoint and ships the tooling that containerizes and deploys the app to a
//! managed Kubernetes cluster.
//!
//! ## Data synchronization
//!
//! The [`users::CollectionStore`] owns the displayed collection, the form
//! draft and the loading flag. It talks to the backend only through the
//! [`users::Gateway`] trait:
//!
//! - **Mount:** the store lists the collection and replaces its copy wholesale.
//! - **Submit:** the store creates one record, then re-lists. There is no
//!   optimistic insertion; the collection is always a server response.
//! - **Overlap:** each list captures a generation number; only the newest
//!   issued list may update the view.
//! - **Failures** never crash the view. Stale data stays on screen and the
//!   error is logged and kept in `last_error`.
//!
//! ## Deployment
//!
//! [`deploy`] models the rollout as an ordered pipeline of steps (check tool,
//! build image, push image, apply manifest, wait for ingress) that halts on
//! the first failure.

pub mod cli;
pub mod deploy;
pub mod users;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Default collection API base used when `USERBOARD_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
