use crate::deploy::{DeployConfig, Pipeline, ProcessRunner, Report};
use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Args {
    pub config: DeployConfig,
}

/// Run the deployment pipeline and print operator hints.
/// # Errors
/// Returns the first failing step.
pub async fn execute(args: Args) -> Result<()> {
    let pipeline = Pipeline::plan(&args.config);

    println!("Deploying userboard to namespace {}", args.config.namespace);

    let report = pipeline
        .run(&ProcessRunner, |index, total, step| {
            println!("[{index}/{total}] {step}");
        })
        .await
        .context("deployment failed")?;

    print!("{}", summary(&args.config, &report));

    Ok(())
}

fn summary(config: &DeployConfig, report: &Report) -> String {
    let namespace = &config.namespace;
    let mut out = format!("Deployment complete ({} steps).\n", report.completed);

    if let Some(address) = &report.ingress_address {
        out.push_str(&format!("Application available at http://{address}\n"));
    }

    out.push_str("\nNext steps:\n");
    out.push_str(&format!("  kubectl get pods -n {namespace}\n"));
    out.push_str(&format!(
        "  kubectl logs -n {namespace} deployment/userboard-backend\n"
    ));
    out.push_str(&format!("  kubectl describe ingress {} -n {namespace}\n", config.ingress));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, time::Duration};

    #[test]
    fn summary_includes_address_and_hints() {
        let config = DeployConfig {
            registry: "r.example.com".to_string(),
            tag: "latest".to_string(),
            manifests_dir: PathBuf::from("k8s"),
            namespace: "userboard".to_string(),
            ingress: "userboard-ingress".to_string(),
            cloud_cli: "az".to_string(),
            backend_context: PathBuf::from("backend"),
            frontend_context: PathBuf::from("frontend"),
            attempts: 30,
            interval: Duration::from_secs(10),
        };
        let report = Report {
            completed: 14,
            ingress_address: Some("20.1.2.3".to_string()),
        };

        let text = summary(&config, &report);

        assert!(text.starts_with("Deployment complete (14 steps).\n"));
        assert!(text.contains("http://20.1.2.3"));
        assert!(text.contains("kubectl get pods -n userboard"));
        assert!(text.contains("kubectl describe ingress userboard-ingress -n userboard"));
    }
}
