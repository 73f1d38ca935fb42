//! Gradle Invocation
//!
//! Runs the Gradle wrapper for a [`BuildPlan`] and checks the artifact
//! landed where the plan expects it.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::plan::BuildPlan;
use crate::BuildError;

/// Lines of Gradle output kept in a failure report
const OUTPUT_TAIL_LINES: usize = 30;

/// A ready-to-run Gradle wrapper command
#[derive(Debug, Clone)]
pub struct GradleInvocation {
    project_dir: PathBuf,
    task: String,
    properties: Vec<crate::GradleProperty>,
    output_path: PathBuf,
    java_home: Option<PathBuf>,
    android_home: Option<PathBuf>,
}

impl GradleInvocation {
    /// Create an invocation from a build plan
    pub fn from_plan(plan: &BuildPlan) -> Self {
        Self {
            project_dir: plan.project_dir.clone(),
            task: plan.task.clone(),
            properties: plan.properties.clone(),
            output_path: plan.output_path.clone(),
            java_home: None,
            android_home: None,
        }
    }

    /// Set JAVA_HOME
    pub fn with_java_home(mut self, path: PathBuf) -> Self {
        self.java_home = Some(path);
        self
    }

    /// Set ANDROID_HOME
    pub fn with_android_home(mut self, path: PathBuf) -> Self {
        self.android_home = Some(path);
        self
    }

    /// Get gradlew path
    pub fn gradlew_path(&self) -> PathBuf {
        gradlew_in(&self.project_dir)
    }

    /// Check if Gradle wrapper exists
    pub fn has_gradle_wrapper(&self) -> bool {
        self.gradlew_path().exists()
    }

    /// Arguments passed to the wrapper
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.task.clone(), "--console=plain".to_string()];
        args.extend(self.properties.iter().map(|p| p.to_arg()));
        args
    }

    /// Arguments with secret values masked
    pub fn display_args(&self) -> Vec<String> {
        let mut args = vec![self.task.clone(), "--console=plain".to_string()];
        args.extend(self.properties.iter().map(|p| p.to_display_arg()));
        args
    }

    /// Run the build, blocking until Gradle exits
    pub fn run(&self) -> Result<PathBuf, BuildError> {
        if !self.has_gradle_wrapper() {
            return Err(BuildError::ToolchainNotFound(format!(
                "Gradle wrapper not found at {:?}",
                self.gradlew_path()
            )));
        }

        info!("Running Gradle task {}", self.task);
        debug!("gradlew {:?}", self.display_args());

        let mut cmd = Command::new(self.gradlew_path());
        cmd.current_dir(&self.project_dir);
        cmd.args(self.args());

        if let Some(ref java_home) = self.java_home {
            cmd.env("JAVA_HOME", java_home);
        }
        if let Some(ref android_home) = self.android_home {
            cmd.env("ANDROID_HOME", android_home);
            cmd.env("ANDROID_SDK_ROOT", android_home);
        }

        let output = cmd.output()?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::BuildFailed(format!(
                "{} exited with {}\n{}",
                self.task,
                output.status,
                tail(&format!("{}\n{}", stdout, stderr), OUTPUT_TAIL_LINES)
            )));
        }

        if !self.output_path.exists() {
            return Err(BuildError::ArtifactMissing(self.output_path.clone()));
        }

        info!("Gradle build completed: {:?}", self.output_path);
        Ok(self.output_path.clone())
    }
}

fn gradlew_in(project_dir: &Path) -> PathBuf {
    let wrapper_name = if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    };
    project_dir.join(wrapper_name)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
