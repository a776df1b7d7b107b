mod common;

use std::sync::Arc;

use mql::{
    ExecutionContext, Features, Provider, execute, printer,
    providers::{MockProvider, Recorder, Recording},
    runtime::{ResourceError, ResourceRegistry, Value},
};

use common::{arch, compile_ok, schema};

#[test]
fn recordings_replay_the_same_results() {
    let bundle = compile_ok("users.all(uid < 1000); mondoo.version; sshd.config.file.content");
    let recorder = Arc::new(Recorder::new(arch(), "arch"));
    let context = ExecutionContext::new(recorder.clone() as Arc<dyn Provider>, Features::none());
    let live = execute(&bundle, &context).unwrap();

    let path = std::env::temp_dir().join(format!("mql-recording-{}.json", std::process::id()));
    let mut recording = Recording::default();
    recording.push(recorder.recorded());
    recording.save(&path).unwrap();
    let loaded = Recording::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, recording);

    let replay = MockProvider::from_recording(schema(), &loaded, "arch").unwrap();
    let replayed = execute(
        &bundle,
        &ExecutionContext::new(Arc::new(replay), Features::none()),
    )
    .unwrap();
    assert_eq!(
        serde_json::to_value(&replayed).unwrap(),
        serde_json::to_value(&live).unwrap()
    );
}

#[test]
fn recordings_only_hold_what_was_read() {
    let recorder = Arc::new(Recorder::new(arch(), "arch"));
    let context = ExecutionContext::new(recorder.clone() as Arc<dyn Provider>, Features::none());
    execute(&compile_ok("mondoo.version"), &context).unwrap();

    let recorded = recorder.recorded();
    let mondoo = &recorded.resources["mondoo"]["mondoo"];
    assert_eq!(mondoo.len(), 1);
    assert_eq!(mondoo["version"], serde_json::json!("unstable"));

    // Replaying a query that reads more than was recorded fails loudly.
    let mut recording = Recording::default();
    recording.push(recorded);
    let replay = MockProvider::from_recording(schema(), &recording, "arch").unwrap();
    let bundle = compile_ok("mondoo.build");
    let execution = execute(
        &bundle,
        &ExecutionContext::new(Arc::new(replay), Features::none()),
    )
    .unwrap();
    assert!(matches!(
        execution.errors().as_slice(),
        [ResourceError::MissingField { field, .. }] if field == "build"
    ));
}

#[test]
fn registry_providers_run_queries() {
    let registry = ResourceRegistry::new(schema())
        .constructor("file", |args| match args.get("path") {
            Some(Value::String(path)) if path.starts_with('/') => Ok(path.clone()),
            Some(other) => Err(ResourceError::NotFound {
                resource: "file".into(),
                id: other.to_text(),
            }),
            None => Err(ResourceError::CreateFailed {
                resource: "file".into(),
                reason: "path is required".into(),
            }),
        })
        .and_then(|r| {
            r.field("file", "content", |handle| {
                Ok(Value::String(format!("contents of {}", handle.id)))
            })
        })
        .and_then(|r| r.field("mondoo", "version", |_| Ok(Value::String("8.0.0".into()))))
        .unwrap();
    let context = ExecutionContext::new(Arc::new(registry), Features::none());

    let bundle = compile_ok("mondoo.version; file('/etc/hosts').content; file('relative') { content }");
    let execution = execute(&bundle, &context).unwrap();
    assert_eq!(
        printer::results(&bundle, &execution),
        "error: Query encountered errors:\n1 error occurred:\n\t* file not found: 'relative' does not exist\nmondoo.version: \"8.0.0\"\nfile.content: \"contents of /etc/hosts\"\nfile: {\n  content: error: file not found: 'relative' does not exist\n}"
    );
}

#[test]
fn registration_is_checked_against_the_schema() {
    let err = ResourceRegistry::new(schema())
        .field("mondoo", "uptime", |_| Ok(Value::Nil))
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "resource 'mondoo' has no field 'uptime' in the schema");
    assert!(
        ResourceRegistry::new(schema())
            .constructor("process", |_| Ok("1".into()))
            .is_err()
    );
}
