use recipe_pipeline::cli::commands::{RefsCommand, RunCommand, TargetArgs, ValidateCommand};
use recipe_pipeline::cli::output::*;
use recipe_pipeline::cli::{Cli, Command};
use recipe_pipeline::core::{
    loader::DirectoryLoader, Arch, BuildContext, Compiler, Configuration, PipelineBuild, Purl,
    Step,
};
use recipe_pipeline::execution::PipelineRunner;
use recipe_pipeline::runner::{LocalRunner, RunnerConfig};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_recipe(cmd).await?,
        Command::Validate(cmd) => validate_recipe(cmd)?,
        Command::Refs(cmd) => print_refs(cmd)?,
    }

    Ok(())
}

/// Load, configure and compile the pipeline selected by `target`
fn load_pipeline(target: &TargetArgs) -> Result<(PipelineBuild, Vec<Step>)> {
    let mut config = Configuration::from_file(&target.file)
        .with_context(|| format!("Failed to load recipe {}", target.file))?;
    config.apply_build_options(&target.option)?;

    let subpackage = match &target.subpackage {
        Some(name) => Some(
            config
                .subpackage(name)
                .cloned()
                .with_context(|| format!("Recipe has no subpackage named {:?}", name))?,
        ),
        None => None,
    };

    let steps = match (&subpackage, target.test) {
        (Some(sp), _) => sp.pipeline.clone(),
        (None, true) => config.test_pipeline().to_vec(),
        (None, false) => config.pipeline.clone(),
    };

    let mut pb = if target.test {
        PipelineBuild::test(config)
    } else {
        let host = || {
            Arch::host()
                .map_err(anyhow::Error::msg)
                .context("Cannot detect the host architecture, pass --arch and --host-arch")
        };
        let arch = match target.arch {
            Some(arch) => arch,
            None => host()?,
        };
        let host_arch = match target.host_arch {
            Some(arch) => arch,
            None => host()?,
        };
        let context = BuildContext::new(config, arch)
            .with_host_arch(host_arch)
            .with_options(target.option.clone());
        PipelineBuild::build(context)
    };
    if let Some(sp) = subpackage {
        pb = pb.for_subpackage(sp);
    }

    let loader = DirectoryLoader::new(&target.pipeline_dir);
    let compiled = Compiler::new(&loader)
        .compile_pipeline(&pb, &steps)
        .context("Failed to compile pipeline")?;

    Ok((pb, compiled))
}

async fn run_recipe(cmd: &RunCommand) -> Result<()> {
    let (pb, steps) = load_pipeline(&cmd.target)?;
    let package = &pb.package;

    println!(
        "{} Loaded recipe: {} {}",
        INFO,
        style(&package.name).bold(),
        style(format!("{}-r{}", package.version, package.epoch)).dim()
    );

    let mut config = RunnerConfig::new();
    if let Some(dir) = &cmd.workspace {
        config = config.with_workspace(dir);
    }
    for (key, value) in &cmd.env {
        config = config.with_env(key, value);
    }

    let backend = LocalRunner::new().with_interactive(cmd.interactive);
    let mut runner = PipelineRunner::new(backend, config)
        .with_debug(cmd.debug)
        .with_interactive(cmd.interactive);
    runner.add_event_handler(|event| println!("{}", format_execution_event(&event)));

    println!();
    let token = CancellationToken::new();
    match runner.run_pipelines(&token, &steps).await {
        Ok(summary) => {
            println!("\n{}", format_run_summary(&summary));
            println!(
                "{} {} completed {}",
                CHECK,
                style(&package.name).bold(),
                style("successfully").green()
            );
            Ok(())
        }
        Err(err) => {
            println!("\n{} {} {}", CROSS, style(&package.name).bold(), style("failed").red());
            error!("{}", err);
            std::process::exit(1);
        }
    }
}

fn validate_recipe(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating recipe...", INFO);

    match load_pipeline(&cmd.target) {
        Ok((pb, steps)) => {
            println!("{} Recipe is valid!", CHECK);
            println!("  Package: {}", style(&pb.package.name).bold());
            println!("  Version: {}", style(&pb.package.version).cyan());
            println!("  Steps: {}", style(count_steps(&steps)).cyan());
            println!("  Subpackages: {}", style(pb.configuration().subpackages.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&steps)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn print_refs(cmd: &RefsCommand) -> Result<()> {
    let (_, steps) = load_pipeline(&cmd.target)?;

    let mut refs = Vec::new();
    collect_refs(&steps, &mut refs);

    if cmd.json {
        let data: Vec<_> = refs
            .iter()
            .map(|(step, purl)| {
                serde_json::json!({
                    "step": step,
                    "purl": purl.to_string(),
                    "components": purl,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if refs.is_empty() {
        println!("{} No external references found", INFO);
        return Ok(());
    }

    println!("{} External references:", INFO);
    for (step, purl) in &refs {
        println!("{}", format_purl(step, purl));
    }
    Ok(())
}

fn count_steps(steps: &[Step]) -> usize {
    steps.iter().map(|s| 1 + count_steps(&s.pipeline)).sum()
}

fn collect_refs(steps: &[Step], out: &mut Vec<(String, Purl)>) {
    for step in steps {
        for purl in &step.external_refs {
            out.push((step.identity().to_string(), purl.clone()));
        }
        collect_refs(&step.pipeline, out);
    }
}
