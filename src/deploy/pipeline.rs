use crate::deploy::{
    config::{DeployConfig, COMPONENTS},
    runner::{CommandRunner, Invocation},
};
use std::{fmt, io, path::PathBuf, time::Duration};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

const INGRESS_ADDRESS_JSONPATH: &str =
    "jsonpath={.status.loadBalancer.ingress[0].ip}{.status.loadBalancer.ingress[0].hostname}";

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("required tool `{tool}` was not found in PATH")]
    MissingTool { tool: String },
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("ingress {name} in namespace {namespace} has no address after {attempts} attempts")]
    NotReady {
        name: String,
        namespace: String,
        attempts: u32,
    },
}

/// One idempotent deployment action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CheckPrerequisite {
        tool: String,
    },
    BuildImage {
        image: String,
        context: PathBuf,
    },
    PushImage {
        image: String,
    },
    ApplyManifest {
        path: PathBuf,
    },
    WaitForIngress {
        name: String,
        namespace: String,
        attempts: u32,
        interval: Duration,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckPrerequisite { tool } => write!(f, "check {tool} is installed"),
            Self::BuildImage { image, context } => {
                write!(f, "build {image} from {}", context.display())
            }
            Self::PushImage { image } => write!(f, "push {image}"),
            Self::ApplyManifest { path } => write!(f, "apply {}", path.display()),
            Self::WaitForIngress {
                name, namespace, ..
            } => write!(f, "wait for ingress {namespace}/{name}"),
        }
    }
}

impl Step {
    /// The command line this step runs. Readiness polling repeats it.
    #[must_use]
    pub fn invocation(&self) -> Invocation {
        match self {
            Self::CheckPrerequisite { tool } => probe(tool),
            Self::BuildImage { image, context } => Invocation::new(
                "docker",
                [
                    "build".to_string(),
                    "-t".to_string(),
                    image.clone(),
                    context.display().to_string(),
                ],
            ),
            Self::PushImage { image } => Invocation::new("docker", ["push", image.as_str()]),
            Self::ApplyManifest { path } => Invocation::new(
                "kubectl",
                ["apply".to_string(), "-f".to_string(), path.display().to_string()],
            ),
            Self::WaitForIngress {
                name, namespace, ..
            } => Invocation::new(
                "kubectl",
                [
                    "get",
                    "ingress",
                    name.as_str(),
                    "-n",
                    namespace.as_str(),
                    "-o",
                    INGRESS_ADDRESS_JSONPATH,
                ],
            )
            .captured(),
        }
    }

    /// Run the step. Readiness polling yields the ingress address.
    ///
    /// # Errors
    /// Returns a [`StepError`] describing the first failed command.
    pub async fn execute<R: CommandRunner + ?Sized>(
        &self,
        runner: &R,
    ) -> Result<Option<String>, StepError> {
        let invocation = self.invocation();

        match self {
            Self::CheckPrerequisite { tool } => {
                // presence only, the probe's exit status is ignored
                runner
                    .run(&invocation)
                    .await
                    .map_err(|source| spawn_error(&invocation, source))?;
                debug!("{tool} found");
                Ok(None)
            }
            Self::BuildImage { .. } | Self::PushImage { .. } | Self::ApplyManifest { .. } => {
                let output = runner
                    .run(&invocation)
                    .await
                    .map_err(|source| spawn_error(&invocation, source))?;
                if output.success {
                    Ok(None)
                } else {
                    Err(StepError::CommandFailed {
                        command: invocation.to_string(),
                        status: describe_exit(output.code),
                        stderr: output.stderr,
                    })
                }
            }
            Self::WaitForIngress {
                name,
                namespace,
                attempts,
                interval,
            } => {
                for attempt in 1..=*attempts {
                    let output = runner
                        .run(&invocation)
                        .await
                        .map_err(|source| spawn_error(&invocation, source))?;

                    let address = output.stdout.trim();
                    if output.success && !address.is_empty() {
                        return Ok(Some(address.to_string()));
                    }

                    debug!(attempt, "ingress {namespace}/{name} not ready yet");

                    if attempt < *attempts {
                        sleep(*interval).await;
                    }
                }

                Err(StepError::NotReady {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    attempts: *attempts,
                })
            }
        }
    }
}

fn probe(tool: &str) -> Invocation {
    let invocation = if tool == "kubectl" {
        Invocation::new(tool, ["version", "--client"])
    } else {
        Invocation::new(tool, ["--version"])
    };
    invocation.captured()
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn spawn_error(invocation: &Invocation, source: io::Error) -> StepError {
    if source.kind() == io::ErrorKind::NotFound {
        StepError::MissingTool {
            tool: invocation.program.clone(),
        }
    } else {
        StepError::Spawn {
            command: invocation.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub completed: usize,
    pub ingress_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Tool checks, then build and push for each image, then the manifests in
    /// their fixed order, then the ingress readiness wait.
    #[must_use]
    pub fn plan(config: &DeployConfig) -> Self {
        let mut steps: Vec<Step> = ["docker", "kubectl", config.cloud_cli.as_str()]
            .into_iter()
            .map(|tool| Step::CheckPrerequisite {
                tool: tool.to_string(),
            })
            .collect();

        for component in COMPONENTS {
            let image = config.image(component);
            steps.push(Step::BuildImage {
                image: image.clone(),
                context: config.context(component),
            });
            steps.push(Step::PushImage { image });
        }

        steps.extend(
            config
                .manifest_paths()
                .into_iter()
                .map(|path| Step::ApplyManifest { path }),
        );

        steps.push(Step::WaitForIngress {
            name: config.ingress.clone(),
            namespace: config.namespace.clone(),
            attempts: config.attempts,
            interval: config.interval,
        });

        Self::new(steps)
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Execute every step in order, halting on the first failure.
    ///
    /// `progress` is called before each step with its 1-based position.
    ///
    /// # Errors
    /// Returns the error of the first step that fails.
    #[instrument(skip_all, fields(steps = self.steps.len()))]
    pub async fn run<R: CommandRunner + ?Sized>(
        &self,
        runner: &R,
        mut progress: impl FnMut(usize, usize, &Step),
    ) -> Result<Report, StepError> {
        let total = self.steps.len();
        let mut report = Report::default();

        for (index, step) in self.steps.iter().enumerate() {
            progress(index + 1, total, step);
            info!("step {}/{total}: {step}", index + 1);

            if let Some(address) = step.execute(runner).await? {
                report.ingress_address = Some(address);
            }
            report.completed += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::deploy::{config::sample, runner::CommandOutput};
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Respond = dyn Fn(&Invocation, usize) -> io::Result<CommandOutput> + Send + Sync;

    /// Records every invocation and answers through `respond`, which also
    /// receives how many times the same command line was seen before.
    struct RecordingRunner {
        calls: Mutex<Vec<Invocation>>,
        respond: Box<Respond>,
    }

    impl RecordingRunner {
        fn new(
            respond: impl Fn(&Invocation, usize) -> io::Result<CommandOutput> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        fn commands(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(ToString::to_string)
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
            let seen = {
                let mut calls = self.calls.lock().unwrap();
                let seen = calls.iter().filter(|call| *call == invocation).count();
                calls.push(invocation.clone());
                seen
            };
            (self.respond)(invocation, seen)
        }
    }

    /// Every command succeeds; the ingress reports an address on poll `polls`.
    fn ingress_ready_after(
        polls: usize,
    ) -> impl Fn(&Invocation, usize) -> io::Result<CommandOutput> {
        move |invocation, seen| {
            let is_poll = invocation.args.first().map(String::as_str) == Some("get");
            if is_poll && seen + 1 >= polls {
                Ok(CommandOutput::ok("20.1.2.3"))
            } else {
                Ok(CommandOutput::ok(""))
            }
        }
    }

    #[test]
    fn plan_orders_steps() {
        let pipeline = Pipeline::plan(&sample());
        let described: Vec<String> = pipeline.steps().iter().map(ToString::to_string).collect();

        assert_eq!(
            described,
            vec![
                "check docker is installed",
                "check kubectl is installed",
                "check az is installed",
                "build registry.example.com/userboard-backend:v1 from backend",
                "push registry.example.com/userboard-backend:v1",
                "build registry.example.com/userboard-frontend:v1 from frontend",
                "push registry.example.com/userboard-frontend:v1",
                "apply k8s/namespace.yaml",
                "apply k8s/backend-deployment.yaml",
                "apply k8s/backend-service.yaml",
                "apply k8s/frontend-deployment.yaml",
                "apply k8s/frontend-service.yaml",
                "apply k8s/ingress.yaml",
                "wait for ingress userboard/userboard-ingress",
            ]
        );
    }

    #[tokio::test]
    async fn run_issues_commands_in_order() {
        let poll = format!(
            "kubectl get ingress userboard-ingress -n userboard -o {INGRESS_ADDRESS_JSONPATH}"
        );
        let runner = RecordingRunner::new(ingress_ready_after(1));
        let mut seen_progress = Vec::new();

        let report = Pipeline::plan(&sample())
            .run(&runner, |index, total, _| seen_progress.push((index, total)))
            .await
            .unwrap();

        assert_eq!(report.completed, 14);
        assert_eq!(report.ingress_address.as_deref(), Some("20.1.2.3"));
        assert_eq!(seen_progress.first(), Some(&(1, 14)));
        assert_eq!(seen_progress.last(), Some(&(14, 14)));
        assert_eq!(
            runner.commands(),
            vec![
                "docker --version",
                "kubectl version --client",
                "az --version",
                "docker build -t registry.example.com/userboard-backend:v1 backend",
                "docker push registry.example.com/userboard-backend:v1",
                "docker build -t registry.example.com/userboard-frontend:v1 frontend",
                "docker push registry.example.com/userboard-frontend:v1",
                "kubectl apply -f k8s/namespace.yaml",
                "kubectl apply -f k8s/backend-deployment.yaml",
                "kubectl apply -f k8s/backend-service.yaml",
                "kubectl apply -f k8s/frontend-deployment.yaml",
                "kubectl apply -f k8s/frontend-service.yaml",
                "kubectl apply -f k8s/ingress.yaml",
                poll.as_str(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_tool_halts_before_any_build() {
        let runner = RecordingRunner::new(|invocation, _| {
            if invocation.program == "az" {
                Err(io::Error::from(io::ErrorKind::NotFound))
            } else {
                Ok(CommandOutput::ok(""))
            }
        });

        let err = Pipeline::plan(&sample())
            .run(&runner, |_, _, _| {})
            .await
            .unwrap_err();

        assert!(matches!(err, StepError::MissingTool { ref tool } if tool == "az"));
        assert_eq!(runner.commands().len(), 3);
    }

    #[tokio::test]
    async fn probe_exit_status_is_ignored() {
        let step = Step::CheckPrerequisite {
            tool: "docker".to_string(),
        };
        let runner = RecordingRunner::new(|_, _| Ok(CommandOutput::failed(1, "daemon down")));

        assert!(step.execute(&runner).await.is_ok());
    }

    #[tokio::test]
    async fn failed_push_halts_pipeline() {
        let runner = RecordingRunner::new(|invocation, _| {
            if invocation.args.first().map(String::as_str) == Some("push") {
                Ok(CommandOutput::failed(1, "denied: requested access is denied"))
            } else {
                Ok(CommandOutput::ok(""))
            }
        });

        let err = Pipeline::plan(&sample())
            .run(&runner, |_, _, _| {})
            .await
            .unwrap_err();

        match err {
            StepError::CommandFailed {
                command,
                status,
                stderr,
            } => {
                assert_eq!(command, "docker push registry.example.com/userboard-backend:v1");
                assert_eq!(status, "exit code 1");
                assert!(stderr.contains("denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // three checks, one build, one push
        assert_eq!(runner.commands().len(), 5);
    }

    #[tokio::test]
    async fn wait_polls_until_address_reported() {
        let runner = RecordingRunner::new(ingress_ready_after(3));
        let step = Step::WaitForIngress {
            name: "userboard-ingress".to_string(),
            namespace: "userboard".to_string(),
            attempts: 5,
            interval: Duration::ZERO,
        };

        let address = step.execute(&runner).await.unwrap();

        assert_eq!(address.as_deref(), Some("20.1.2.3"));
        assert_eq!(runner.commands().len(), 3);
    }

    #[tokio::test]
    async fn wait_gives_up_after_bounded_attempts() {
        let runner = RecordingRunner::new(|_, _| Ok(CommandOutput::failed(1, "NotFound")));
        let step = Step::WaitForIngress {
            name: "userboard-ingress".to_string(),
            namespace: "userboard".to_string(),
            attempts: 4,
            interval: Duration::ZERO,
        };

        let err = step.execute(&runner).await.unwrap_err();

        assert!(matches!(err, StepError::NotReady { attempts: 4, .. }));
        assert_eq!(runner.commands().len(), 4);
    }
}
