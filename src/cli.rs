use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use sbom_pipeline::sbom_generation::domain::Ecosystem;

/// Background SBOM generation pipeline for Dependency-Track
#[derive(Parser, Debug)]
#[command(name = "sbom-pipeline")]
#[command(version)]
#[command(
    about = "Extract uploaded source archives, run CycloneDX generators and upload the BOMs to Dependency-Track",
    long_about = None
)]
pub struct Cli {
    /// Config file (defaults to ./sbom-pipeline.config.yml when present)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit archives and wait until every job has finished
    Run(RunArgs),

    /// Show stored job status (all jobs when no id is given)
    Status {
        job_id: Option<String>,
    },

    /// Delete a project remotely, then its local job data
    Delete {
        /// Project UUID in Dependency-Track
        project: String,

        /// Job whose extraction directory and status record are removed
        #[arg(long, value_name = "JOB_ID")]
        job: Option<String>,
    },

    /// List the generator tools and where they resolve
    Tools {
        #[arg(short, long, value_parser = parse_ecosystem)]
        ecosystem: Option<Ecosystem>,
    },

    /// List the components of a project
    Components {
        project: String,

        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },

    /// List the vulnerability findings of a project
    Findings {
        project: String,

        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show the current metrics of a project
    Metrics {
        project: String,
    },

    /// Show the dependency graph of a project or of one component
    Graph {
        project: String,

        /// Component UUID whose dependencies are shown instead
        #[arg(long)]
        component: Option<String>,
    },

    /// Show the details of one vulnerability
    Vulnerability {
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Archives to process (.zip or a plain, gzip, bzip2 or xz compressed tar)
    #[arg(required = true, value_name = "ARCHIVE")]
    pub archives: Vec<PathBuf>,

    /// Project ecosystem
    #[arg(short, long, value_parser = parse_ecosystem)]
    pub ecosystem: Ecosystem,

    /// Keep job status in memory instead of the storage directory
    #[arg(long)]
    pub ephemeral: bool,
}

fn parse_ecosystem(value: &str) -> Result<Ecosystem, String> {
    value.parse().map_err(|_| {
        format!(
            "unsupported ecosystem '{}' (expected one of: {})",
            value,
            Ecosystem::supported_list()
        )
    })
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "sbom-pipeline",
            "run",
            "a.zip",
            "b.tar.gz",
            "--ecosystem",
            "Go",
        ])
        .unwrap();

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.archives.len(), 2);
                assert_eq!(args.ecosystem, Ecosystem::Golang);
                assert!(!args.ephemeral);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_ecosystem_rejected() {
        let err = Cli::try_parse_from(["sbom-pipeline", "run", "a.zip", "-e", "cobol"]).unwrap_err();
        assert!(err.to_string().contains("unsupported ecosystem"));
    }

    #[test]
    fn test_run_requires_archive() {
        assert!(Cli::try_parse_from(["sbom-pipeline", "run", "-e", "python"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sbom-pipeline",
            "tools",
            "--log-level",
            "debug",
            "--config",
            "custom.yml",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
        assert!(matches!(cli.command, Command::Tools { ecosystem: None }));
    }

    #[test]
    fn test_components_paging_defaults() {
        let cli = Cli::try_parse_from(["sbom-pipeline", "components", "p-1"]).unwrap();
        match cli.command {
            Command::Components {
                project,
                search,
                page,
                page_size,
            } => {
                assert_eq!(project, "p-1");
                assert!(search.is_none());
                assert_eq!((page, page_size), (1, 10));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
