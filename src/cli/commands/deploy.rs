//! `deploy` subcommand: image registry, manifests, and readiness polling.

use crate::deploy::DeployConfig;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::{path::PathBuf, time::Duration};

pub const NAME: &str = "deploy";

const ARG_REGISTRY: &str = "registry";
const ARG_TAG: &str = "tag";
const ARG_MANIFESTS: &str = "manifests";
const ARG_NAMESPACE: &str = "namespace";
const ARG_INGRESS: &str = "ingress";
const ARG_CLOUD_CLI: &str = "cloud-cli";
const ARG_BACKEND_CONTEXT: &str = "backend-context";
const ARG_FRONTEND_CONTEXT: &str = "frontend-context";
const ARG_ATTEMPTS: &str = "attempts";
const ARG_INTERVAL: &str = "interval";

#[must_use]
pub fn subcommand() -> Command {
    Command::new(NAME)
        .about("Build and push the images, apply the manifests, and wait for the ingress")
        .arg(
            Arg::new(ARG_REGISTRY)
                .short('r')
                .long(ARG_REGISTRY)
                .help("Container registry, example: myregistry.azurecr.io")
                .env("USERBOARD_REGISTRY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_TAG)
                .short('t')
                .long(ARG_TAG)
                .help("Image tag")
                .default_value("latest")
                .env("USERBOARD_TAG"),
        )
        .arg(
            Arg::new(ARG_MANIFESTS)
                .short('m')
                .long(ARG_MANIFESTS)
                .help("Directory holding the Kubernetes manifests")
                .default_value("k8s")
                .env("USERBOARD_MANIFESTS")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_NAMESPACE)
                .short('n')
                .long(ARG_NAMESPACE)
                .help("Kubernetes namespace")
                .default_value("userboard")
                .env("USERBOARD_NAMESPACE"),
        )
        .arg(
            Arg::new(ARG_INGRESS)
                .long(ARG_INGRESS)
                .help("Ingress to wait for")
                .default_value("userboard-ingress")
                .env("USERBOARD_INGRESS"),
        )
        .arg(
            Arg::new(ARG_CLOUD_CLI)
                .long(ARG_CLOUD_CLI)
                .help("Cloud provider CLI that must be installed")
                .default_value("az")
                .env("USERBOARD_CLOUD_CLI"),
        )
        .arg(
            Arg::new(ARG_BACKEND_CONTEXT)
                .long(ARG_BACKEND_CONTEXT)
                .help("Docker build context for the backend image")
                .default_value("backend")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_CONTEXT)
                .long(ARG_FRONTEND_CONTEXT)
                .help("Docker build context for the frontend image")
                .default_value("frontend")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_ATTEMPTS)
                .long(ARG_ATTEMPTS)
                .help("Ingress readiness polls before giving up")
                .default_value("30")
                .env("USERBOARD_WAIT_ATTEMPTS")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_INTERVAL)
                .long(ARG_INTERVAL)
                .help("Seconds between ingress readiness polls")
                .default_value("10")
                .env("USERBOARD_WAIT_INTERVAL")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn value<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T> {
    matches
        .get_one::<T>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

/// # Errors
/// Returns an error if a required argument is missing.
pub fn parse(matches: &ArgMatches) -> Result<DeployConfig> {
    Ok(DeployConfig {
        registry: value(matches, ARG_REGISTRY)?,
        tag: value(matches, ARG_TAG)?,
        manifests_dir: value(matches, ARG_MANIFESTS)?,
        namespace: value(matches, ARG_NAMESPACE)?,
        ingress: value(matches, ARG_INGRESS)?,
        cloud_cli: value(matches, ARG_CLOUD_CLI)?,
        backend_context: value(matches, ARG_BACKEND_CONTEXT)?,
        frontend_context: value(matches, ARG_FRONTEND_CONTEXT)?,
        attempts: value(matches, ARG_ATTEMPTS)?,
        interval: Duration::from_secs(value(matches, ARG_INTERVAL)?),
    })
}
