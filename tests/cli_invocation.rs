//! Integration tests for running tasks from the command line

mod common;

use common::{plugin_tree, yaml};
use serde_yaml::Value;
use std::sync::Arc;
use taskhook::cli::App;
use taskhook::config::{Config, TaskSettings};
use taskhook::error::ConfigError;
use taskhook::runner::{task, ExecutionReport, Namespace};
use taskhook::TaskhookError;

fn run(root: Namespace, args: &[&str]) -> Result<Option<ExecutionReport>, TaskhookError> {
    run_with(root, Config::default(), args)
}

fn run_with(
    root: Namespace,
    config: Config,
    args: &[&str],
) -> Result<Option<ExecutionReport>, TaskhookError> {
    let app = App::with_config(root, config, None)?;
    let mut argv = vec!["taskhook"];
    argv.extend_from_slice(args);
    app.run_from(argv)
}

fn result_of(report: &ExecutionReport, name: &str) -> Value {
    report.outcome(name).unwrap().result.clone()
}

fn deploy_tree() -> Namespace {
    let deploy = task("deploy")
        .doc("Deploy to a host.\n\nArgs:\n    target: Host to deploy to.\n")
        .alias("ship")
        .param("target")
        .param_default("count", 1)
        .param_default("verbose", 0)
        .incrementable("verbose")
        .param_default("color", "auto")
        .optional("color")
        .build(|_, args| {
            let mut map = serde_yaml::Mapping::new();
            map.insert("target".into(), args.get("target").cloned().unwrap_or(Value::Null));
            map.insert("count".into(), args.get("count").cloned().unwrap_or(Value::Null));
            map.insert("verbose".into(), args.get("verbose").cloned().unwrap_or(Value::Null));
            map.insert("color".into(), args.get("color").cloned().unwrap_or(Value::Null));
            Ok(Value::Mapping(map))
        })
        .unwrap();
    Namespace::new("tasks").with_task(deploy).unwrap()
}

#[test]
fn test_cascade_from_command_line() {
    let (root, _) = plugin_tree();
    let report = run(root, &["sync"]).unwrap().unwrap();

    assert_eq!(result_of(&report, "sync"), yaml("{a: 1, b: 2}"));
    assert_eq!(report.warnings().count(), 1);
}

#[test]
fn test_positional_and_defaults() {
    let report = run(deploy_tree(), &["deploy", "web1"]).unwrap().unwrap();
    assert_eq!(
        result_of(&report, "deploy"),
        yaml("{target: web1, count: 1, verbose: 0, color: auto}")
    );
}

#[test]
fn test_typed_counted_and_optional_flags() {
    let report = run(
        deploy_tree(),
        &["deploy", "web1", "--count", "5", "-v", "-v", "--color"],
    )
    .unwrap()
    .unwrap();
    assert_eq!(
        result_of(&report, "deploy"),
        yaml("{target: web1, count: 5, verbose: 2, color: true}")
    );

    let report = run(deploy_tree(), &["deploy", "web1", "--color", "never"])
        .unwrap()
        .unwrap();
    assert_eq!(result_of(&report, "deploy")["color"], Value::from("never"));
}

#[test]
fn test_alias_runs_the_task() {
    let report = run(deploy_tree(), &["ship", "web2"]).unwrap().unwrap();
    assert_eq!(result_of(&report, "deploy")["target"], Value::from("web2"));
}

#[test]
fn test_missing_positional_is_a_usage_error() {
    let err = run(deploy_tree(), &["deploy"]).unwrap_err();
    assert!(matches!(err, TaskhookError::Cli(_)));
}

#[test]
fn test_bad_integer_is_a_usage_error() {
    let err = run(deploy_tree(), &["deploy", "web1", "--count", "many"]).unwrap_err();
    assert!(matches!(err, TaskhookError::Cli(_)));
}

#[test]
fn test_collection_default_task() {
    let migrate = task("migrate")
        .default(true)
        .build(|_, _| Ok(yaml("{migrated: true}")))
        .unwrap();
    let root = || {
        Namespace::new("tasks")
            .with_collection(Namespace::new("db").with_task(Arc::clone(&migrate)).unwrap())
            .unwrap()
    };

    let report = run(root(), &["db"]).unwrap().unwrap();
    assert_eq!(result_of(&report, "migrate"), yaml("{migrated: true}"));

    let report = run(root(), &["db.migrate"]).unwrap().unwrap();
    assert_eq!(result_of(&report, "migrate"), yaml("{migrated: true}"));
}

#[test]
fn test_root_default_task_runs_without_arguments() {
    let root = Namespace::new("tasks")
        .with_task(
            task("build")
                .default(true)
                .build(|_, _| Ok(yaml("{built: true}")))
                .unwrap(),
        )
        .unwrap();

    let report = run(root, &[]).unwrap().unwrap();
    assert_eq!(result_of(&report, "build"), yaml("{built: true}"));
}

#[test]
fn test_no_task_and_no_default_runs_nothing() {
    assert!(run(deploy_tree(), &[]).unwrap().is_none());
}

#[test]
fn test_task_names_are_dashed_unless_disabled() {
    let tree = || {
        Namespace::new("tasks")
            .with_task(task("clean_all").build(|_, _| Ok(yaml("{clean: true}"))).unwrap())
            .unwrap()
    };

    assert!(run(tree(), &["clean-all"]).unwrap().is_some());

    let config = Config {
        tasks: TaskSettings {
            auto_dash_names: false,
            dedupe: true,
        },
        ..Config::default()
    };
    assert!(run_with(tree(), config.clone(), &["clean_all"]).unwrap().is_some());
    assert!(run_with(tree(), config, &["clean-all"]).is_err());
}

#[test]
fn test_pre_tasks_run_first() {
    let clean = task("clean").build(|_, _| Ok(Value::Null)).unwrap();
    let build = task("build")
        .pre(clean)
        .build(|_, _| Ok(yaml("{built: true}")))
        .unwrap();
    let root = Namespace::new("tasks").with_task(build).unwrap();

    let report = run(root, &["-s", "build"]).unwrap().unwrap();
    let order: Vec<&str> = report.outcomes.iter().map(|o| o.task.as_str()).collect();
    assert_eq!(order, vec!["clean", "build"]);
}

#[test]
fn test_flag_collision_is_rejected_at_startup() {
    let bad = task("sync")
        .param_default("a", "")
        .param_default("b", "")
        .flags("a", ["-x"])
        .flags("b", ["-x"])
        .build(|_, _| Ok(Value::Null))
        .unwrap();
    let root = Namespace::new("tasks").with_task(bad).unwrap();

    let result = App::with_config(root, Config::default(), None);
    assert!(matches!(result, Err(TaskhookError::Config(_))));
}

#[test]
fn test_collection_default_cannot_shadow_a_root_task() {
    let migrate = task("migrate")
        .default(true)
        .build(|_, _| Ok(Value::Null))
        .unwrap();
    let root = Namespace::new("tasks")
        .with_task(task("db").build(|_, _| Ok(Value::Null)).unwrap())
        .unwrap()
        .with_collection(Namespace::new("db").with_task(migrate).unwrap())
        .unwrap();

    let result = App::with_config(root, Config::default(), None);
    assert!(matches!(
        result,
        Err(TaskhookError::Config(ConfigError::CommandCollision { .. }))
    ));
}

#[test]
fn test_one_character_param_keeps_its_flag() {
    let sync = task("sync")
        .param_default("xtra", "")
        .param_default("x", "")
        .build(|_, args| {
            let mut map = serde_yaml::Mapping::new();
            map.insert("xtra".into(), args.get("xtra").cloned().unwrap_or(Value::Null));
            map.insert("x".into(), args.get("x").cloned().unwrap_or(Value::Null));
            Ok(Value::Mapping(map))
        })
        .unwrap();
    let root = Namespace::new("tasks").with_task(sync).unwrap();

    let report = run(root, &["sync", "-t", "a", "-x", "b"]).unwrap().unwrap();
    assert_eq!(result_of(&report, "sync"), yaml("{xtra: a, x: b}"));
}
