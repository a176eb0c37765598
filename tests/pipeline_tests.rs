//! End-to-end builds driven by a fake interpreter
#![cfg(unix)]

mod common;

use common::{FakePython, TestWorkspace};
use pyonedir::bundler::{
    BuildEvent, BuildOutcome, BuildRequestBuilder, BuildWorker, Builder, CandidateSource,
    ErrorKind, InterpreterCandidate, InterpreterLocator, Invocation, Reporter,
};
use std::path::Path;
use tokio::sync::mpsc::UnboundedReceiver;

fn builder(source: &Path, python: &Path) -> Builder {
    let request = BuildRequestBuilder::new().source(source).build().unwrap();
    let locator = InterpreterLocator::with_candidates(vec![InterpreterCandidate::new(
        Invocation::new(python),
        CandidateSource::Explicit,
    )]);
    Builder::new(request).with_locator(locator)
}

fn drain(rx: &mut UnboundedReceiver<BuildEvent>) -> Vec<BuildEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn progress_values(events: &[BuildEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            BuildEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_stdlib_only_directory_builds() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python("python3", FakePython::working());
    let project = ws.create_project("hello", &[("app.py", "print('hello')")]);
    let (reporter, mut rx) = Reporter::channel();

    let outcome = builder(&project, &python).run(&reporter).await;

    let artifact = match &outcome {
        BuildOutcome::Success(artifact) => artifact,
        BuildOutcome::Failed(failure) => {
            panic!("build failed: {}\n{:#?}", failure.message, failure.log)
        }
    };
    assert_eq!(artifact.output_dir, project.join("hello_onedir"));
    assert_eq!(artifact.archive, project.join("hello_onedir.zip"));
    assert!(artifact.output_dir.join("app").is_file());
    assert!(artifact.archive_size > 0);
    assert_eq!(
        artifact.archive_size,
        std::fs::metadata(&artifact.archive).unwrap().len()
    );
    assert_eq!(artifact.archive_sha256.len(), 64);

    // Bundler scratch output does not outlive the build.
    assert!(!project.join("dist_out").exists());
    assert!(!project.join("build_out").exists());

    let events = drain(&mut rx);
    let lines: Vec<&String> = events
        .iter()
        .filter_map(|e| match e {
            BuildEvent::Log(l) => Some(l),
            _ => None,
        })
        .collect();
    assert!(lines.iter().any(|l| l.contains("No requirements.txt found")));
    assert!(lines.iter().any(|l| l.contains("Building COLLECT")));
    assert!(lines.iter().any(|l| l.starts_with("$ ") && l.contains("PyInstaller")));
}

#[tokio::test]
async fn test_progress_is_monotonic_and_reaches_100() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python("python3", FakePython::working());
    let project = ws.create_project("hello", &[("app.py", ""), ("requirements.txt", "six\n")]);
    let (reporter, mut rx) = Reporter::channel();

    let outcome = builder(&project, &python).run(&reporter).await;
    assert!(outcome.is_success());

    let progress = progress_values(&drain(&mut rx));
    assert_eq!(progress, vec![5, 20, 40, 70, 90, 100]);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_rebuild_overwrites_outputs() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python("python3", FakePython::working());
    let project = ws.create_project("hello", &[("app.py", "")]);

    let (reporter, _rx) = Reporter::channel();
    let first = builder(&project, &python).run(&reporter).await;
    let first = first.artifact().unwrap().clone();
    let first_tree = TestWorkspace::tree(&first.output_dir);

    let (reporter, _rx) = Reporter::channel();
    let second = builder(&project, &python).run(&reporter).await;
    let second = second.artifact().unwrap().clone();

    assert_eq!(first.output_dir, second.output_dir);
    assert_eq!(first.archive, second.archive);
    assert_eq!(first_tree, TestWorkspace::tree(&second.output_dir));

    let archives: Vec<_> = std::fs::read_dir(&project)
        .unwrap()
        .flatten()
        .filter(|e| e.path().extension().is_some_and(|x| x == "zip"))
        .collect();
    assert_eq!(archives.len(), 1);
}

#[tokio::test]
async fn test_nested_archive_builds_next_to_archive() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python("python3", FakePython::working());
    let archive = ws.write_zip("tool.zip", &[("tool/app.py", ""), ("tool/icon.ico", "ico")]);
    let (reporter, _rx) = Reporter::channel();

    let outcome = builder(&archive, &python).run(&reporter).await;

    let artifact = outcome.artifact().unwrap();
    assert_eq!(artifact.output_dir, ws.path.join("tool_onedir"));
    assert_eq!(artifact.archive, ws.path.join("tool_onedir.zip"));
    assert!(reporter.transcript().iter().any(|l| l.contains("--icon")));
}

#[tokio::test]
async fn test_spec_file_build_logs_advisory() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python("python3", FakePython::working());
    let project = ws.create_project(
        "hello",
        &[("app.py", ""), ("pyinstaller.spec", "# spec"), ("icon.ico", "ico")],
    );
    let (reporter, _rx) = Reporter::channel();

    let outcome = builder(&project, &python).run(&reporter).await;
    assert!(outcome.is_success());

    let transcript = reporter.transcript();
    assert!(transcript.iter().any(|l| l.contains("come from the spec file")));
    assert!(!transcript.iter().any(|l| l.starts_with("$ ") && l.contains("--icon")));
}

#[tokio::test]
async fn test_bundler_failure_is_a_compiler_error() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python(
        "python3",
        FakePython {
            bundler_fails: true,
            ..FakePython::default()
        },
    );
    let project = ws.create_project("hello", &[("app.py", "")]);
    let (reporter, _rx) = Reporter::channel();

    let outcome = builder(&project, &python).run(&reporter).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::CompilerError);
    assert!(failure.log.iter().any(|l| l.contains("script not found")));
    assert!(!project.join("hello_onedir").exists());
    assert!(!project.join("hello_onedir.zip").exists());
}

#[tokio::test]
async fn test_failed_requirements_install_is_fatal() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python(
        "python3",
        FakePython {
            requirements_fail: true,
            ..FakePython::default()
        },
    );
    let project = ws.create_project(
        "hello",
        &[("app.py", ""), ("requirements.txt", "nosuchpkg\n")],
    );
    let (reporter, _rx) = Reporter::channel();

    let outcome = builder(&project, &python).run(&reporter).await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::DependencyInstallFailed);
    assert!(failure.log.iter().any(|l| l.contains("No matching distribution")));
    assert!(!failure.log.iter().any(|l| l.starts_with("$ ") && l.contains("--distpath")));
    assert!(!project.join("hello_onedir").exists());
    assert!(!project.join("hello_onedir.zip").exists());
}

#[tokio::test]
async fn test_worker_delivers_finished_last() {
    let ws = TestWorkspace::new();
    let python = ws.fake_python("python3", FakePython::working());
    let project = ws.create_project("hello", &[("app.py", "")]);

    let handle = BuildWorker::spawn(builder(&project, &python)).unwrap();
    let mut events = Vec::new();
    let outcome = handle.wait_with(|e| events.push(e.clone())).await;

    assert!(outcome.is_success());
    assert!(matches!(events.last(), Some(BuildEvent::Finished(o)) if o.is_success()));
    assert_eq!(progress_values(&events).last(), Some(&100));
}
