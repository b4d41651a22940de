/// Integration tests for the generation pipeline
///
/// The real extractor, root locator, command registry and process
/// supervisor are used; generator tools are small shell scripts placed in a
/// temporary tool directory, and the tracking service and status store are
/// recording mocks.
mod test_utilities;

use sbom_pipeline::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_utilities::mocks::*;

const FAKE_BOM: &str = r#"{"bomFormat":"CycloneDX","specVersion":"1.6"}"#;

/// Writes an executable script named `name` into `dir`.
#[cfg(unix)]
fn install_tool(dir: &Path, name: &str, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// `cyclonedx-py requirements <file> -o <out>`: writes a BOM to `<out>`.
#[cfg(unix)]
fn install_fake_cyclonedx_py(dir: &Path) {
    install_tool(
        dir,
        "cyclonedx-py",
        &format!("echo \"reading $2\"\nprintf '%s' '{}' > \"$4\"", FAKE_BOM),
    );
}

fn write_zip(path: &Path, members: &[(&str, &str)]) {
    let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
    for (name, content) in members {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

struct Harness {
    _tools: TempDir,
    storage: TempDir,
    uploads: TempDir,
    statuses: RecordingStatusRepository,
    tracking: RecordingTrackingService,
    submit: SubmitJobUseCase<
        RecordingTrackingService,
        RunPipelineUseCase<RecordingStatusRepository, RecordingTrackingService, ProcessSupervisor>,
        RecordingStatusRepository,
    >,
}

impl Harness {
    /// Tools from `tools` first, then the inherited `PATH`.
    fn new(tools: TempDir, tracking: RecordingTrackingService, timeout: Duration) -> Self {
        let tool_path = ToolPath::from_env(&[tools.path().to_path_buf()]);
        Self::build(tools, tool_path, tracking, timeout)
    }

    /// Only the tools in `tools` resolve.
    fn isolated(tools: TempDir) -> Self {
        let tool_path = ToolPath::with_dirs(vec![tools.path().to_path_buf()]);
        Self::build(
            tools,
            tool_path,
            RecordingTrackingService::new(),
            Duration::from_secs(30),
        )
    }

    fn build(
        tools: TempDir,
        tool_path: ToolPath,
        tracking: RecordingTrackingService,
        timeout: Duration,
    ) -> Self {
        let storage = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        let statuses = RecordingStatusRepository::new();

        let pipeline = RunPipelineUseCase::new(
            statuses.clone(),
            tracking.clone(),
            ProcessSupervisor::new(tool_path.clone(), 2, 4096),
            ArchiveExtractor::default(),
            CommandRegistry::new(tool_path),
        )
        .with_generation_timeout(timeout);
        let scheduler = JobScheduler::new(Arc::new(pipeline), statuses.clone());
        let submit = SubmitJobUseCase::new(tracking.clone(), scheduler, storage.path().to_path_buf());

        Self {
            _tools: tools,
            storage,
            uploads,
            statuses,
            tracking,
            submit,
        }
    }

    fn upload(&self, name: &str, members: &[(&str, &str)]) -> PathBuf {
        let path = self.uploads.path().join(name);
        write_zip(&path, members);
        path
    }

    async fn run(&self, archive: PathBuf, ecosystem: &str) -> (JobId, JobOutcome) {
        let submitted = self
            .submit
            .execute(JobRequest::from_path(archive, ecosystem))
            .await
            .unwrap();
        let outcome = submitted.handle.await.unwrap();
        (submitted.job_id, outcome)
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_requirements_only_archive_completes() {
    let tools = TempDir::new().unwrap();
    install_fake_cyclonedx_py(tools.path());
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));
    let archive = harness.upload("service.zip", &[("requirements.txt", "requests==2.31.0\n")]);

    let (job_id, outcome) = harness.run(archive, "python").await;

    assert!(outcome.is_success(), "{:?}", outcome.error_message);
    assert_eq!(
        harness.statuses.statuses_for(&job_id),
        vec![
            JobStatus::Pending,
            JobStatus::Extracting,
            JobStatus::Generating,
            JobStatus::Complete
        ]
    );

    let uploaded = harness.tracking.uploaded();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].0, format!("uuid-{}", job_id));
    assert_eq!(uploaded[0].1, FAKE_BOM);
    assert_eq!(harness.tracking.create_count(), 1);
    assert_eq!(harness.tracking.delete_count(), 0);

    // The staged archive is consumed by extraction.
    let leftovers: Vec<_> = fs::read_dir(harness.storage.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec![job_id.to_string()]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_wrapping_directory_is_used_as_root() {
    let tools = TempDir::new().unwrap();
    install_fake_cyclonedx_py(tools.path());
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));
    let archive = harness.upload(
        "billing-2.0.zip",
        &[
            ("billing-2.0/requirements.txt", "flask\n"),
            ("billing-2.0/src/app.py", "print('hi')\n"),
        ],
    );

    let (job_id, outcome) = harness.run(archive, "python").await;

    assert!(outcome.is_success(), "{:?}", outcome.error_message);
    let artifact = outcome.artifact.unwrap();
    assert!(artifact.ends_with(format!("billing-2.0/uuid-{}.json", job_id)));
}

#[tokio::test]
async fn test_traversal_archive_fails_without_escaping() {
    let tools = TempDir::new().unwrap();
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));
    let archive = harness.upload("evil.zip", &[("../../etc/passed", "owned\n")]);

    let (job_id, outcome) = harness.run(archive, "python").await;

    assert_eq!(outcome.status, JobStatus::Failed);
    assert_eq!(outcome.error_kind, Some("PathTraversal"));
    assert_eq!(
        harness.statuses.statuses_for(&job_id),
        vec![JobStatus::Pending, JobStatus::Extracting, JobStatus::Failed]
    );
    assert!(harness
        .statuses
        .last_message(&job_id)
        .unwrap()
        .contains("Path traversal"));

    let parent = harness.storage.path().parent().unwrap();
    assert!(!parent.join("etc/passed").exists());
    assert!(!harness.storage.path().join("etc").exists());
    assert!(!harness.storage.path().join(job_id.as_str()).exists());
    assert!(harness.tracking.uploaded().is_empty());
}

#[tokio::test]
async fn test_missing_tool_is_named() {
    let tools = TempDir::new().unwrap();
    let harness = Harness::isolated(tools);
    let archive = harness.upload("api.zip", &[("go.mod", "module example.com/api\n")]);

    let (job_id, outcome) = harness.run(archive, "golang").await;

    assert_eq!(outcome.error_kind, Some("NoCommandAvailable"));
    assert_eq!(
        harness.statuses.statuses_for(&job_id),
        vec![
            JobStatus::Pending,
            JobStatus::Extracting,
            JobStatus::Generating,
            JobStatus::Failed
        ]
    );
    assert!(harness
        .statuses
        .last_message(&job_id)
        .unwrap()
        .contains("cyclonedx-gomod"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_missing_manifest_is_explained() {
    let tools = TempDir::new().unwrap();
    install_fake_cyclonedx_py(tools.path());
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));
    let archive = harness.upload("docs.zip", &[("README.md", "# docs\n")]);

    let (job_id, outcome) = harness.run(archive, "python").await;

    assert_eq!(outcome.error_kind, Some("NoCommandAvailable"));
    assert!(harness
        .statuses
        .last_message(&job_id)
        .unwrap()
        .contains("requirements.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_generator_timeout_is_reported() {
    let tools = TempDir::new().unwrap();
    install_tool(tools.path(), "cyclonedx-gomod", "exec sleep 30");
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_millis(300));
    let archive = harness.upload("slow.zip", &[("go.mod", "module slow\n")]);

    let started = std::time::Instant::now();
    let (job_id, outcome) = harness.run(archive, "go").await;

    assert!(started.elapsed() < Duration::from_secs(15));
    assert_eq!(outcome.error_kind, Some("Timeout"));
    assert_eq!(
        harness.statuses.statuses_for(&job_id).last(),
        Some(&JobStatus::Failed)
    );
    assert!(harness.tracking.uploaded().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_generator_failure_message_is_truncated() {
    let tools = TempDir::new().unwrap();
    install_tool(
        tools.path(),
        "cyclonedx-npm",
        "i=0; while [ $i -lt 300 ]; do echo 'npm ERR! missing peer dependency' >&2; i=$((i+1)); done; exit 1",
    );
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));
    let archive = harness.upload("web.zip", &[("package.json", "{}")]);

    let (job_id, outcome) = harness.run(archive, "javascript").await;

    assert_eq!(outcome.error_kind, Some("NonZeroExit"));
    let message = harness.statuses.last_message(&job_id).unwrap();
    assert!(message.contains("npm ERR!"));
    assert!(message.chars().count() <= 2000);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_pre_command_stops_generation() {
    let tools = TempDir::new().unwrap();
    install_tool(tools.path(), "composer", "[ \"$1\" = update ] && { echo 'lock conflict' >&2; exit 2; }; exit 0");
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));
    let archive = harness.upload("shop.zip", &[("composer.json", "{}")]);

    let (job_id, outcome) = harness.run(archive, "php").await;

    assert_eq!(outcome.error_kind, Some("NonZeroExit"));
    assert!(harness
        .statuses
        .last_message(&job_id)
        .unwrap()
        .contains("lock conflict"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_upload_failure_fails_job() {
    let tools = TempDir::new().unwrap();
    install_fake_cyclonedx_py(tools.path());
    let harness = Harness::new(
        tools,
        RecordingTrackingService::failing_uploads(),
        Duration::from_secs(30),
    );
    let archive = harness.upload("svc.zip", &[("requirements.txt", "")]);

    let (job_id, outcome) = harness.run(archive, "python").await;

    assert_eq!(outcome.error_kind, Some("RemoteCallFailed"));
    assert_eq!(
        harness.statuses.statuses_for(&job_id),
        vec![
            JobStatus::Pending,
            JobStatus::Extracting,
            JobStatus::Generating,
            JobStatus::Failed
        ]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_concurrent_jobs_finish_independently() {
    let tools = TempDir::new().unwrap();
    install_fake_cyclonedx_py(tools.path());
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));

    let mut handles = Vec::new();
    for i in 0..4 {
        let archive = harness.upload(&format!("svc-{i}.zip"), &[("requirements.txt", "")]);
        let submitted = harness
            .submit
            .execute(JobRequest::from_path(archive, "python"))
            .await
            .unwrap();
        handles.push(submitted.handle);
    }
    let bad = harness.upload("bad.zip", &[("/etc/shadow", "")]);
    handles.push(
        harness
            .submit
            .execute(JobRequest::from_path(bad, "python"))
            .await
            .unwrap()
            .handle,
    );

    let outcomes = futures::future::join_all(handles).await;
    let succeeded = outcomes.iter().filter(|o| o.as_ref().unwrap().is_success()).count();
    assert_eq!(succeeded, 4);
    assert_eq!(harness.tracking.uploaded().len(), 4);
}

#[tokio::test]
async fn test_unknown_ecosystem_rejected_before_any_stage() {
    let tools = TempDir::new().unwrap();
    let harness = Harness::new(tools, RecordingTrackingService::new(), Duration::from_secs(30));
    let archive = harness.upload("x.zip", &[("requirements.txt", "")]);

    let err = harness
        .submit
        .execute(JobRequest::from_path(archive, "fortran"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "UnsupportedEcosystem");
    assert_eq!(harness.tracking.create_count(), 0);
    assert!(harness.statuses.writes.lock().unwrap().is_empty());
}
