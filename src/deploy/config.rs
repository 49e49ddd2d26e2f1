use std::{path::PathBuf, time::Duration};

/// Manifests applied in this order, relative to the manifests directory.
pub const MANIFESTS: [&str; 6] = [
    "namespace.yaml",
    "backend-deployment.yaml",
    "backend-service.yaml",
    "frontend-deployment.yaml",
    "frontend-service.yaml",
    "ingress.yaml",
];

/// Image components, built and pushed in this order.
pub const COMPONENTS: [&str; 2] = ["backend", "frontend"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub registry: String,
    pub tag: String,
    pub manifests_dir: PathBuf,
    pub namespace: String,
    pub ingress: String,
    pub cloud_cli: String,
    pub backend_context: PathBuf,
    pub frontend_context: PathBuf,
    pub attempts: u32,
    pub interval: Duration,
}

impl DeployConfig {
    /// Fully qualified image reference for a component, e.g.
    /// `registry.example.com/userboard-backend:latest`.
    #[must_use]
    pub fn image(&self, component: &str) -> String {
        format!(
            "{}/userboard-{component}:{}",
            self.registry.trim().trim_end_matches('/'),
            self.tag
        )
    }

    #[must_use]
    pub fn context(&self, component: &str) -> PathBuf {
        if component == "frontend" {
            self.frontend_context.clone()
        } else {
            self.backend_context.clone()
        }
    }

    #[must_use]
    pub fn manifest_paths(&self) -> Vec<PathBuf> {
        MANIFESTS
            .iter()
            .map(|name| self.manifests_dir.join(name))
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn sample() -> DeployConfig {
    DeployConfig {
        registry: "registry.example.com/".to_string(),
        tag: "v1".to_string(),
        manifests_dir: PathBuf::from("k8s"),
        namespace: "userboard".to_string(),
        ingress: "userboard-ingress".to_string(),
        cloud_cli: "az".to_string(),
        backend_context: PathBuf::from("backend"),
        frontend_context: PathBuf::from("frontend"),
        attempts: 3,
        interval: Duration::ZERO,
    }
}
