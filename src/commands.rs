//! CLI commands for droidpack
//!
//! Each command works on an already loaded descriptor and writes its
//! report to the given writer.

use std::io::Write;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use tracing::info;

use droidpack_build_engine::{ArtifactKind, BuildPlan, GradleInvocation, PlanOptions};
use droidpack_core::{Descriptor, DescriptorLoader, DescriptorSource, VariantResolver};

/// Find the descriptor: an explicit path, or discovery from `cwd` upwards
pub fn locate_descriptor(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let loader = DescriptorLoader::new();
    loader.discover(cwd).ok_or_else(|| {
        anyhow::anyhow!(
            "No {} found in {:?} or any parent directory",
            droidpack_core::DESCRIPTOR_FILE_NAME,
            cwd
        )
    })
}

/// Load a descriptor file
pub fn load_descriptor(path: &Path) -> Result<Descriptor> {
    DescriptorLoader::new()
        .load(&DescriptorSource::File(path.to_path_buf()))
        .with_context(|| format!("Failed to load descriptor {:?}", path))
}

/// Print the descriptor summary
pub struct ShowCommand {
    pub json: bool,
}

impl ShowCommand {
    pub fn execute(&self, descriptor: &Descriptor, out: &mut dyn Write) -> Result<()> {
        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(descriptor)?)?;
            return Ok(());
        }

        writeln!(out, "Application: {}", descriptor.application_id)?;
        writeln!(out, "Namespace:   {}", descriptor.namespace)?;
        writeln!(out, "Version:     {} ({})", descriptor.version.name, descriptor.version.code)?;
        writeln!(
            out,
            "SDK:         min {} / target {} / compile {}",
            descriptor.sdk.min, descriptor.sdk.target, descriptor.sdk.compile
        )?;
        if let Some(ndk) = &descriptor.ndk_version {
            writeln!(out, "NDK:         {}", ndk)?;
        }
        writeln!(
            out,
            "Java:        source {} / target {} / jvm {}",
            descriptor.compile_options.source_compatibility,
            descriptor.compile_options.target_compatibility,
            descriptor.compile_options.jvm_target
        )?;
        if !descriptor.plugins.is_empty() {
            writeln!(out, "Plugins:")?;
            for plugin in &descriptor.plugins {
                writeln!(out, "  {}", plugin)?;
            }
        }
        if let Some(source) = &descriptor.flutter_source {
            writeln!(out, "Flutter:     {}", source.display())?;
        }
        Ok(())
    }
}

/// List declared variants and their signing binding
pub struct VariantsCommand;

impl VariantsCommand {
    pub fn execute(&self, descriptor: &Descriptor, out: &mut dyn Write) -> Result<()> {
        for decl in descriptor.variants.values() {
            let signing = decl.signing.as_deref().unwrap_or("<unbound>");
            writeln!(
                out,
                "{:<12} signing={:<10} minify={} shrink={}",
                decl.name, signing, decl.minify, decl.shrink_resources
            )?;
        }
        Ok(())
    }
}

/// Resolve a variant and print it
pub struct ResolveCommand {
    pub variant: String,
    pub json: bool,
}

impl ResolveCommand {
    pub fn execute(&self, descriptor: &Descriptor, out: &mut dyn Write) -> Result<()> {
        let variant = VariantResolver::new(descriptor).resolve(&self.variant)?;

        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&variant)?)?;
            return Ok(());
        }

        writeln!(out, "Variant:    {}", variant.name)?;
        writeln!(out, "Debuggable: {}", variant.debuggable)?;
        writeln!(out, "Minify:     {}", variant.minify)?;
        writeln!(out, "Shrink:     {}", variant.shrink_resources)?;
        writeln!(
            out,
            "Signing:    {} (alias {}, store {})",
            variant.signing.name,
            variant.signing.key_alias,
            variant.signing.store_file.display()
        )?;
        for rule in &variant.rule_files {
            writeln!(out, "Rules:      {}", rule)?;
        }
        Ok(())
    }
}

/// Build-plan options shared by `plan` and `build`
#[derive(Debug, Clone)]
pub struct PlanArgs {
    pub variant: String,
    pub bundle: bool,
    pub module: String,
}

impl PlanArgs {
    fn plan(&self, descriptor: &Descriptor) -> Result<BuildPlan> {
        let variant = descriptor.resolve(&self.variant)?;
        let options = PlanOptions {
            artifact: if self.bundle { ArtifactKind::Bundle } else { ArtifactKind::Apk },
            module: self.module.clone(),
            project_dir: None,
        };
        Ok(BuildPlan::new(descriptor, variant, options)?)
    }
}

/// Print the build plan for a variant
pub struct PlanCommand {
    pub args: PlanArgs,
    pub json: bool,
}

impl PlanCommand {
    pub fn execute(&self, descriptor: &Descriptor, out: &mut dyn Write) -> Result<()> {
        let plan = self.args.plan(descriptor)?;

        if self.json {
            writeln!(out, "{}", plan.to_json()?)?;
            return Ok(());
        }

        let invocation = GradleInvocation::from_plan(&plan);
        writeln!(out, "Application: {} {} ({})", plan.application_id, plan.version_name, plan.version_code)?;
        writeln!(out, "Task:        {}", plan.task)?;
        writeln!(out, "Output:      {}", plan.output_path.display())?;
        writeln!(
            out,
            "Command:     {} {}",
            invocation.gradlew_path().display(),
            invocation.display_args().join(" ")
        )?;
        Ok(())
    }
}

/// Build a variant with Gradle
pub struct BuildCommand {
    pub args: PlanArgs,
    pub java_home: Option<PathBuf>,
    pub android_home: Option<PathBuf>,
}

impl BuildCommand {
    pub fn execute(&self, descriptor: &Descriptor, out: &mut dyn Write) -> Result<PathBuf> {
        let plan = self.args.plan(descriptor)?;
        info!("Building {} ({})", plan.application_id, plan.variant.name);

        let mut invocation = GradleInvocation::from_plan(&plan);
        if let Some(java_home) = &self.java_home {
            invocation = invocation.with_java_home(java_home.clone());
        }
        if let Some(android_home) = &self.android_home {
            invocation = invocation.with_android_home(android_home.clone());
        }

        let artifact = invocation
            .run()
            .with_context(|| format!("Build of variant {} failed", plan.variant.name))?;

        writeln!(out, "{}", artifact.display())?;
        Ok(artifact)
    }
}

/// Compare against the previously published descriptor
pub struct CheckUpgradeCommand {
    pub previous: PathBuf,
}

impl CheckUpgradeCommand {
    pub fn execute(&self, descriptor: &Descriptor, out: &mut dyn Write) -> Result<()> {
        let previous = load_descriptor(&self.previous)?;
        descriptor.check_upgrade(&previous)?;
        writeln!(
            out,
            "{}: {} -> {} ok",
            descriptor.application_id, previous.version.code, descriptor.version.code
        )?;
        Ok(())
    }
}
