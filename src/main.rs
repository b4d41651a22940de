mod cli;

use cli::{Cli, Command, RunArgs};
use owo_colors::OwoColorize;
use sbom_pipeline::adapters::outbound::network::DependencyTrackClient;
use sbom_pipeline::adapters::outbound::persistence::{InMemoryStatusStore, JsonFileStatusStore};
use sbom_pipeline::adapters::outbound::process::ProcessSupervisor;
use sbom_pipeline::application::dto::JobRequest;
use sbom_pipeline::application::use_cases::{
    DeleteProjectUseCase, RunPipelineUseCase, SubmitJobUseCase,
};
use sbom_pipeline::application::JobScheduler;
use sbom_pipeline::config::{load_settings, Settings};
use sbom_pipeline::ports::outbound::{PageRequest, StatusRepository, TrackingQueries};
use sbom_pipeline::sbom_generation::domain::{ExternalProjectId, JobId, JobStatus};
use sbom_pipeline::sbom_generation::services::{ArchiveExtractor, CommandRegistry, ToolPath};
use sbom_pipeline::shared::logging::{config_from_env, init_logging, parse_level};
use sbom_pipeline::shared::{ExitCode, Result};
use serde_json::Value;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let mut logging = config_from_env();
    if let Some(level) = cli.log_level.as_deref() {
        logging.level = parse_level(level);
    }
    if cli.log_json {
        logging.use_json = true;
    }
    init_logging(logging);

    match run(cli).await {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n{}\n", "❌ An error occurred:".red().bold());
            eprintln!("{}", e);

            // Display error chain
            for cause in e.chain().skip(1) {
                eprintln!("\nCaused by: {}", cause);
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir()?;
    let settings = load_settings(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Command::Run(args) => {
            if args.ephemeral {
                run_jobs(&settings, args, InMemoryStatusStore::new()).await
            } else {
                let statuses = JsonFileStatusStore::open(settings.status_dir())?;
                run_jobs(&settings, args, statuses).await
            }
        }
        Command::Status { job_id } => show_status(&settings, job_id.as_deref()).await,
        Command::Delete { project, job } => {
            let external_id = ExternalProjectId::new(project)?;
            let job_id = job.map(JobId::new).transpose()?;
            let use_case = DeleteProjectUseCase::new(
                tracking_client(&settings)?,
                JsonFileStatusStore::open(settings.status_dir())?,
                settings.storage_root.clone(),
            );
            use_case.execute(&external_id, job_id.as_ref()).await?;
            eprintln!("{} project {} deleted", "✔".green(), external_id);
            Ok(ExitCode::Success)
        }
        Command::Tools { ecosystem } => {
            let registry = CommandRegistry::new(ToolPath::from_env(&settings.tool_dirs));
            let map = match ecosystem {
                Some(ecosystem) => registry.diagnostics_for(ecosystem),
                None => registry.diagnostics(),
            };
            for (tool, location) in map {
                match location {
                    Some(path) => println!("{:<18} {}", tool, path.display().green()),
                    None => println!("{:<18} {}", tool, "not found".red()),
                }
            }
            Ok(ExitCode::Success)
        }
        Command::Components {
            project,
            search,
            page,
            page_size,
        } => {
            let id = ExternalProjectId::new(project)?;
            let page = PageRequest {
                page_number: page.max(1),
                page_size: page_size.max(1),
            };
            let client = tracking_client(&settings)?;
            print_query(client.components(&id, search.as_deref(), page).await?)
        }
        Command::Findings { project, search } => {
            let id = ExternalProjectId::new(project)?;
            let client = tracking_client(&settings)?;
            print_query(client.findings(&id, search.as_deref()).await?)
        }
        Command::Metrics { project } => {
            let id = ExternalProjectId::new(project)?;
            print_query(tracking_client(&settings)?.metrics(&id).await?)
        }
        Command::Graph { project, component } => {
            let client = tracking_client(&settings)?;
            match component {
                Some(component) => print_query(client.component_graph(&component).await?),
                None => {
                    let id = ExternalProjectId::new(project)?;
                    print_query(client.project_graph(&id).await?)
                }
            }
        }
        Command::Vulnerability { id } => {
            print_query(tracking_client(&settings)?.vulnerability(&id).await?)
        }
    }
}

fn tracking_client(settings: &Settings) -> Result<DependencyTrackClient> {
    DependencyTrackClient::new(
        &settings.api_host,
        &settings.api_key,
        settings.request_timeout,
        settings.retry,
    )
}

async fn run_jobs<S>(settings: &Settings, args: RunArgs, statuses: S) -> Result<ExitCode>
where
    S: StatusRepository + Clone + 'static,
{
    let client = tracking_client(settings)?;
    let tools = ToolPath::from_env(&settings.tool_dirs);
    let supervisor = ProcessSupervisor::new(
        tools.clone(),
        settings.max_concurrent_generations,
        settings.output_limit_chars,
    );

    let pipeline = RunPipelineUseCase::new(
        statuses.clone(),
        client.clone(),
        supervisor,
        ArchiveExtractor::new(settings.extraction),
        CommandRegistry::new(tools),
    )
    .with_generation_timeout(settings.generation_timeout);

    let scheduler = JobScheduler::new(Arc::new(pipeline), statuses);
    let submit = SubmitJobUseCase::new(client, scheduler, settings.storage_root.clone());

    let mut failed = 0usize;
    let mut submitted = Vec::new();
    for archive in args.archives {
        let request = JobRequest::from_path(archive.clone(), args.ecosystem.as_str());
        match submit.execute(request).await {
            Ok(job) => {
                eprintln!(
                    "📦 {} job {} (project {})",
                    archive.display(),
                    job.job_id,
                    job.external_id
                );
                submitted.push(job);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", "✘".red(), archive.display(), e);
            }
        }
    }

    let handles = submitted.into_iter().map(|job| job.handle);
    for result in futures::future::join_all(handles).await {
        let outcome = result?;
        if outcome.is_success() {
            let artifact = outcome
                .artifact
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            eprintln!(
                "{} job {} {} in {:.1}s: {}",
                "✔".green(),
                outcome.job_id,
                outcome.status,
                outcome.duration.as_secs_f64(),
                artifact
            );
        } else {
            failed += 1;
            eprintln!(
                "{} job {} {} ({}): {}",
                "✘".red(),
                outcome.job_id,
                outcome.status,
                outcome.error_kind.unwrap_or("unknown"),
                outcome.error_message.as_deref().unwrap_or_default()
            );
        }
    }

    Ok(if failed == 0 {
        ExitCode::Success
    } else {
        ExitCode::JobFailed
    })
}

async fn show_status(settings: &Settings, job_id: Option<&str>) -> Result<ExitCode> {
    let status_dir = settings.status_dir();
    if !status_dir.exists() {
        anyhow::bail!(
            "No status records found in {}\n\n💡 Hint: run a job first, or check storage.root / SBOM_STORAGE_DIR",
            status_dir.display()
        );
    }
    let statuses = JsonFileStatusStore::open(status_dir)?;

    let records = match job_id {
        Some(id) => {
            let job_id = JobId::new(id)?;
            match statuses.get_status(&job_id).await? {
                Some(record) => vec![record],
                None => anyhow::bail!("No status recorded for job {}", job_id),
            }
        }
        None => statuses.list().await?,
    };

    println!("{}", serde_json::to_string_pretty(&records)?);

    let any_failed = records.iter().any(|r| r.status == JobStatus::Failed);
    Ok(if any_failed {
        ExitCode::JobFailed
    } else {
        ExitCode::Success
    })
}

fn print_query(value: Option<Value>) -> Result<ExitCode> {
    match value {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::Success)
        }
        None => anyhow::bail!(
            "Dependency-Track returned no data\n\n💡 Hint: check the identifier and the API key permissions"
        ),
    }
}
