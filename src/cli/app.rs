//! Main CLI application

use crate::config::{load_config, parse_config_file, task_commands, validate_namespace, Config};
use crate::error::{ConfigError, TaskhookError};
use crate::runner::{
    AppState, Call, CallArgs, Context, ExecutionReport, Executor, FlagKind, FlagResolver, FlagSpec,
    Namespace, Task, Verbosity,
};
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use colored::*;
use serde_yaml::Value;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Value clap hands back for a value-optional flag given without a value
const BARE_FLAG: &str = "true";

/// A task reachable from the command line
struct Entry {
    /// Subcommand name
    command: String,
    task: Arc<Task>,
    specs: Vec<FlagSpec>,
    /// Help text keyed by final flag name
    help: HashMap<String, String>,
}

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Parsed configuration
    config: Arc<Config>,
    /// Config file path, when one was found
    config_path: Option<PathBuf>,
    /// Namespace tree and hook registry
    state: AppState,
    entries: Vec<Entry>,
}

impl App {
    /// Create a new app, discovering the configuration file
    pub fn new(namespace: Namespace) -> Result<Self, TaskhookError> {
        let (config, config_path) = load_config()?;
        Self::with_config(namespace, config, config_path)
    }

    /// Create app with a specific config file
    pub fn with_config_file(namespace: Namespace, path: PathBuf) -> Result<Self, TaskhookError> {
        let config = parse_config_file(&path)?;
        Self::with_config(namespace, config, Some(path))
    }

    /// Create app from an already loaded configuration
    pub fn with_config(
        namespace: Namespace,
        config: Config,
        config_path: Option<PathBuf>,
    ) -> Result<Self, TaskhookError> {
        validate_namespace(&namespace, &config.tasks)?;

        let (command, entries) = build_command(&config, &namespace);

        Ok(App {
            command,
            config: Arc::new(config),
            config_path,
            state: AppState::new(namespace),
            entries,
        })
    }

    /// The clap command built from the namespace tree
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    /// Help text shown for `flag` of the task behind `command`
    pub fn flag_help(&self, command: &str, flag: &str) -> Option<&str> {
        self.entry(command)
            .and_then(|e| e.help.get(flag))
            .map(String::as_str)
    }

    fn entry(&self, command: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.command == command)
    }

    /// Run the application with the process arguments
    pub fn run(self) -> Result<(), TaskhookError> {
        self.run_from(std::env::args_os()).map(|_| ())
    }

    /// Run the application with explicit arguments (the first one is the
    /// program name). Returns `None` when no task ran.
    pub fn run_from<I, T>(self, args: I) -> Result<Option<ExecutionReport>, TaskhookError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().try_get_matches_from(args)?;

        // Handle global flags first
        let verbosity = get_verbosity(&matches, self.config.verbosity);
        init_logging(verbosity);

        if let Some(shell) = matches.get_one::<Shell>("completions").copied() {
            let mut command = self.command.clone();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            return Ok(None);
        }

        let (task, args) = match matches.subcommand() {
            Some((name, sub_matches)) => {
                let entry = self
                    .entry(name)
                    .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))?;
                (Arc::clone(&entry.task), parse_call_args(&entry.specs, sub_matches))
            }
            None => match self.state.namespace.default_task() {
                Some(task) => (Arc::clone(task), CallArgs::new()),
                None => {
                    // No task specified, show help
                    self.command.clone().print_help()?;
                    println!();
                    return Ok(None);
                }
            },
        };

        // Create execution context
        let ctx = Context::new(self.state.clone())
            .with_settings(Arc::clone(&self.config))
            .with_verbosity(verbosity);

        let report = Executor::new(ctx).execute(&[Call::new(Arc::clone(&task), args)])?;

        if task.autoprint && verbosity > Verbosity::Silent {
            if let Some(outcome) = report.outcome(&task.name) {
                print_result(&outcome.result)?;
            }
        }

        let failed = report.warnings().count();
        if failed > 0 && verbosity >= Verbosity::Normal {
            eprintln!(
                "{} {} hook(s) failed, results from the others were kept",
                "warning:".yellow().bold(),
                failed
            );
        }

        Ok(Some(report))
    }
}

/// Build the clap command from the namespace tree
fn build_command(config: &Config, namespace: &Namespace) -> (Command, Vec<Entry>) {
    let dash = config.tasks.auto_dash_names;

    let mut cmd = Command::new(config.name.clone().unwrap_or_else(|| "taskhook".to_string()))
        .version(env!("CARGO_PKG_VERSION"))
        .about(
            config
                .usage
                .clone()
                .unwrap_or_else(|| "Run project tasks".to_string()),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to taskhook.yml config file"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print task output and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .help("Print a shell completion script")
                .value_parser(value_parser!(Shell)),
        );

    let mut entries = Vec::new();

    // Add subcommands for each task
    for command in task_commands(namespace, &config.tasks) {
        let task = command.task;
        let mut task_cmd = Command::new(command.name.clone());

        if let Some(summary) = task.summary() {
            task_cmd = task_cmd.about(summary.to_string());
        }

        for alias in &command.aliases {
            task_cmd = task_cmd.visible_alias(alias.clone());
        }

        let mut resolver = FlagResolver::new(task).dash_names(dash);
        let specs = resolver.arguments();
        for spec in &specs {
            task_cmd = task_cmd.arg(build_arg(spec));
        }

        entries.push(Entry {
            command: command.name,
            task: Arc::clone(task),
            specs,
            help: resolver.into_help(),
        });
        cmd = cmd.subcommand(task_cmd);
    }

    (cmd, entries)
}

/// Turn a resolved flag spec into a clap argument
fn build_arg(spec: &FlagSpec) -> Arg {
    let mut arg = Arg::new(spec.param.clone());

    if let Some(help) = &spec.help {
        arg = arg.help(help.clone());
    }

    if spec.positional {
        arg = arg
            .value_name(spec.param.to_uppercase())
            .required(spec.default.is_none());

        return match spec.kind {
            FlagKind::Bool => arg.value_parser(value_parser!(bool)),
            FlagKind::Int | FlagKind::Counter => arg.value_parser(value_parser!(i64)),
            FlagKind::Float => arg.value_parser(value_parser!(f64)),
            FlagKind::List => arg.num_args(1..).action(ArgAction::Append),
            FlagKind::Str => arg,
        };
    }

    let mut longs = spec.longs();
    if let Some(long) = longs.next() {
        arg = arg.long(long.to_string());
    }
    for long in longs {
        arg = arg.visible_alias(long.to_string());
    }

    let mut shorts = spec.shorts();
    if let Some(short) = shorts.next() {
        arg = arg.short(short);
    }
    for short in shorts {
        arg = arg.visible_short_alias(short);
    }

    match spec.kind {
        FlagKind::Bool => {
            if spec.default == Some(Value::Bool(true)) {
                arg.action(ArgAction::SetFalse)
            } else {
                arg.action(ArgAction::SetTrue)
            }
        }
        FlagKind::Counter => arg.action(ArgAction::Count),
        FlagKind::List => arg
            .value_name(spec.param.to_uppercase())
            .action(ArgAction::Append),
        _ if spec.optional => arg
            .value_name(spec.param.to_uppercase())
            .num_args(0..=1)
            .default_missing_value(BARE_FLAG),
        FlagKind::Int => arg
            .value_name(spec.param.to_uppercase())
            .value_parser(value_parser!(i64)),
        FlagKind::Float => arg
            .value_name(spec.param.to_uppercase())
            .value_parser(value_parser!(f64)),
        FlagKind::Str => arg.value_name(spec.param.to_uppercase()),
    }
}

/// Collect the values given on the command line as keyword arguments.
///
/// Values clap filled in by itself are left out so task defaults apply.
fn parse_call_args(specs: &[FlagSpec], matches: &ArgMatches) -> CallArgs {
    let mut args = CallArgs::new();

    for spec in specs {
        let id = spec.param.as_str();
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            continue;
        }

        let value = match spec.kind {
            FlagKind::Bool => Some(Value::Bool(matches.get_flag(id))),
            FlagKind::List => Some(Value::Sequence(
                matches
                    .get_many::<String>(id)
                    .into_iter()
                    .flatten()
                    .map(|s| Value::from(s.as_str()))
                    .collect(),
            )),
            FlagKind::Counter if !spec.positional => Some(Value::from(matches.get_count(id))),
            _ if spec.optional && !spec.positional => {
                matches.get_one::<String>(id).map(|raw| optional_value(spec.kind, raw))
            }
            FlagKind::Int | FlagKind::Counter => matches.get_one::<i64>(id).map(|v| Value::from(*v)),
            FlagKind::Float => matches.get_one::<f64>(id).map(|v| Value::from(*v)),
            FlagKind::Str => matches.get_one::<String>(id).map(|s| Value::from(s.as_str())),
        };

        if let Some(value) = value {
            args = args.kwarg(spec.param.clone(), value);
        }
    }

    args
}

/// Value of a value-optional flag: bare means `true`, otherwise the given
/// text, read as a number when the parameter is numeric
fn optional_value(kind: FlagKind, raw: &str) -> Value {
    if raw == BARE_FLAG {
        return Value::Bool(true);
    }
    match kind {
        FlagKind::Int => raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(raw)),
        FlagKind::Float => raw.parse::<f64>().map(Value::from).unwrap_or_else(|_| Value::from(raw)),
        _ => Value::from(raw),
    }
}

/// Print a task result: strings as they are, anything else as YAML
fn print_result(value: &Value) -> Result<(), TaskhookError> {
    match value {
        Value::Null => {}
        Value::String(s) => println!("{}", s),
        other => print!("{}", serde_yaml::to_string(other)?),
    }
    Ok(())
}

/// Get verbosity level from matches, falling back to the configured level
fn get_verbosity(matches: &ArgMatches, configured: Option<Verbosity>) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        configured.unwrap_or(Verbosity::Normal)
    }
}

/// Route `log` output to stderr; `TASKHOOK_LOG` overrides the level
fn init_logging(verbosity: Verbosity) {
    let installed = env_logger::Builder::new()
        .filter_level(verbosity.level_filter())
        .parse_env("TASKHOOK_LOG")
        .format_timestamp(None)
        .try_init()
        .is_ok();
    if !installed {
        log::debug!("A logger is already installed, keeping it");
    }
}

/// Run the CLI application for a namespace tree with the process arguments
pub fn run(namespace: Namespace) -> Result<(), TaskhookError> {
    // Check if --file flag is provided first
    let args: Vec<String> = std::env::args().collect();
    let file_path = extract_file_arg(&args);

    let app = if let Some(path) = file_path {
        App::with_config_file(namespace, path)?
    } else {
        App::new(namespace)?
    };

    app.run()
}

/// Entry point for a task runner binary: run and exit with a status code
pub fn main(namespace: Namespace) {
    match run(namespace) {
        Ok(()) => {}
        Err(TaskhookError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

/// Extract --file argument before clap parsing.
///
/// Only the arguments ahead of the task name are looked at, so a task's own
/// `-f` is left alone.
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--file" | "-f" => return iter.next().map(PathBuf::from),
            "--completions" => {
                iter.next();
            }
            other => {
                if let Some(path) = other.strip_prefix("--file=") {
                    return Some(PathBuf::from(path));
                }
                if !other.starts_with('-') {
                    // the task name
                    return None;
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::task;

    fn namespace() -> Namespace {
        let sync = task("sync")
            .doc("Synchronise.\n\nArgs:\n    as_json: Print JSON.\n")
            .param_default("as_json", false)
            .param_default("exclude", Value::Sequence(vec![]))
            .iterable("exclude")
            .flags("as_json", ["--json"])
            .flags("exclude", ["--exclude", "-x"])
            .build(|_, args| {
                let mut map = serde_yaml::Mapping::new();
                map.insert("json".into(), Value::from(args.get_bool("as_json").unwrap_or(false)));
                map.insert(
                    "excluded".into(),
                    Value::from(args.get_list("exclude").map(|l| l.len()).unwrap_or(0)),
                );
                Ok(Value::Mapping(map))
            })
            .unwrap();
        Namespace::new("tasks").with_task(sync).unwrap()
    }

    fn app() -> App {
        App::with_config(namespace(), Config::default(), None).unwrap()
    }

    #[test]
    fn test_get_verbosity_normal() {
        let cmd = Command::new("test")
            .arg(Arg::new("quiet").long("quiet").action(ArgAction::SetTrue))
            .arg(Arg::new("silent").long("silent").action(ArgAction::SetTrue))
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue));
        let matches = cmd.get_matches_from(vec!["test"]);
        assert_eq!(get_verbosity(&matches, None), Verbosity::Normal);
        assert_eq!(get_verbosity(&matches, Some(Verbosity::Quiet)), Verbosity::Quiet);
    }

    #[test]
    fn test_extract_file_arg() {
        let args = vec![
            "taskhook".to_string(),
            "--file".to_string(),
            "test.yml".to_string(),
        ];
        assert_eq!(extract_file_arg(&args), Some(PathBuf::from("test.yml")));
    }

    #[test]
    fn test_extract_file_arg_short() {
        let args = vec!["taskhook".to_string(), "-f".to_string(), "test.yml".to_string()];
        assert_eq!(extract_file_arg(&args), Some(PathBuf::from("test.yml")));
    }

    #[test]
    fn test_extract_file_arg_ignores_task_flags() {
        let args: Vec<String> = ["taskhook", "deploy", "-f", "web1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(extract_file_arg(&args), None);

        let args: Vec<String> = ["taskhook", "-q", "--file=ci.yml", "deploy", "-f", "web1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(extract_file_arg(&args), Some(PathBuf::from("ci.yml")));
    }

    #[test]
    fn test_task_level_short_f_reaches_the_task() {
        let deploy = task("deploy")
            .param("target")
            .param_default("force", false)
            .build(|_, args| Ok(Value::from(args.get_bool("force").unwrap_or(false))))
            .unwrap();
        let root = Namespace::new("tasks").with_task(deploy).unwrap();
        let app = App::with_config(root, Config::default(), None).unwrap();

        let report = app
            .run_from(["taskhook", "deploy", "-f", "web1"])
            .unwrap()
            .unwrap();
        assert_eq!(report.outcome("deploy").unwrap().result, Value::Bool(true));
    }

    #[test]
    fn test_renamed_flag_is_accepted() {
        let report = app()
            .run_from(["taskhook", "sync", "--json", "-x", "a", "--exclude", "b"])
            .unwrap()
            .unwrap();
        let result = &report.outcome("sync").unwrap().result;
        assert_eq!(result["json"], Value::Bool(true));
        assert_eq!(result["excluded"], Value::from(2));
    }

    #[test]
    fn test_default_flag_name_is_gone() {
        let err = app().run_from(["taskhook", "sync", "--as-json"]);
        assert!(matches!(err, Err(TaskhookError::Cli(_))));
    }

    #[test]
    fn test_defaults_apply_when_flags_are_absent() {
        let report = app().run_from(["taskhook", "sync"]).unwrap().unwrap();
        let result = &report.outcome("sync").unwrap().result;
        assert_eq!(result["json"], Value::Bool(false));
    }

    #[test]
    fn test_flag_help_is_available_under_aliases() {
        let app = app();
        assert_eq!(app.flag_help("sync", "--json"), Some("Print JSON."));

        let mut command = app.command().clone();
        let help = command
            .find_subcommand_mut("sync")
            .unwrap()
            .render_help()
            .to_string();
        assert!(help.contains("--json"));
        assert!(help.contains("Print JSON."));
    }

    #[test]
    fn test_init_logging_twice_keeps_first_logger() {
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Verbose);
        assert_ne!(log::max_level(), log::LevelFilter::Off);
    }

    #[test]
    fn test_optional_value() {
        assert_eq!(optional_value(FlagKind::Str, BARE_FLAG), Value::Bool(true));
        assert_eq!(optional_value(FlagKind::Int, "3"), Value::from(3));
        assert_eq!(optional_value(FlagKind::Str, "x"), Value::from("x"));
    }
}
