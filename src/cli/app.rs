//! YAML-driven command-line application
//!
//! Builds a command tree from a `cmdtree.yml` file and dispatches the process
//! arguments through it. Commands with `run` lines get a handler that executes
//! them; commands without only route to their subcommands.

use crate::cli::flags::remainder_arg;
use crate::cli::{handler, ClapFlags, Cmd, Context, Handler, Values};
use crate::config::{
    parse_config_auto, parse_config_file, validate_config, CommandConfig, Config, OptionConfig,
};
use crate::error::{CmdTreeError, DispatchError, ExecutionError, ExecutionResult};
use crate::runner::Shell;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction};
use colored::Colorize;
use log::debug;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the root command when the config does not give one
const DEFAULT_NAME: &str = "cmdtree";

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    #[default]
    Normal = 2,
    Verbose = 3,
}

impl Verbosity {
    /// Default log filter for this verbosity; `RUST_LOG` takes precedence
    pub fn filter(self) -> &'static str {
        match self {
            Verbosity::Silent => "error",
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Global flags, needed before the tree exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Explicit config file
    pub file: Option<PathBuf>,

    /// Output verbosity
    pub verbosity: Verbosity,
}

/// CLI application
pub struct App {
    /// The command tree
    root: Cmd<ClapFlags>,
    /// Parsed configuration
    config: Config,
    /// Config file path
    config_path: PathBuf,
}

impl App {
    /// Create a new app from the nearest configuration file
    pub fn new() -> Result<Self, CmdTreeError> {
        let (config, config_path) = parse_config_auto()?;
        Self::from_config(config, config_path)
    }

    /// Create app with a specific config file
    pub fn with_config_file(path: PathBuf) -> Result<Self, CmdTreeError> {
        let config = parse_config_file(&path)?;
        Self::from_config(config, path)
    }

    /// Create app from an already parsed configuration
    pub fn from_config(config: Config, config_path: PathBuf) -> Result<Self, CmdTreeError> {
        validate_config(&config)?;

        let base_dir = config_dir(&config_path);
        let root = build_tree(&config, &base_dir);

        Ok(App {
            root,
            config,
            config_path,
        })
    }

    /// The command tree
    pub fn root(&self) -> &Cmd<ClapFlags> {
        &self.root
    }

    /// Path of the loaded config file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Dispatch `args` (program name excluded) through the tree
    pub fn run(mut self, args: &[String]) -> Result<(), CmdTreeError> {
        let ctx = match self.config.timeout {
            Some(secs) => Context::new().with_timeout(Duration::from_secs(secs)),
            None => Context::new(),
        };

        match self.root.run(&ctx, args) {
            Err(DispatchError::NoSuchCommand { path }) => {
                self.print_commands(&path);
                Err(DispatchError::NoSuchCommand { path }.into())
            }
            other => Ok(other?),
        }
    }

    /// List the subcommands of the deepest command named by `path`
    fn print_commands(&self, path: &str) {
        let mut node = &self.root;
        for name in path.split_whitespace().skip(1) {
            match node.cmd(name) {
                Some(sub) => node = sub,
                None => break,
            }
        }

        let mut commands = node.commands();
        if commands.is_empty() {
            return;
        }
        commands.sort_by(|a, b| a.name().cmp(b.name()));

        let width = commands.iter().map(|c| c.name().len()).max().unwrap_or(0);
        eprintln!("Available commands for '{}':", node.name());
        for cmd in commands {
            let name = format!("{:width$}", cmd.name(), width = width);
            let about = cmd.flags().description().unwrap_or_default();
            eprintln!("  {}  {}", name.as_str().bold(), about);
        }
    }
}

/// Directory that relative paths in the config resolve against
fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Build the command tree from configuration
pub fn build_tree(config: &Config, base_dir: &Path) -> Cmd<ClapFlags> {
    let mut shell = Shell::new()
        .with_working_dir(base_dir.to_path_buf())
        .with_strict(config.strict);
    if let Some(interpreter) = &config.interpreter {
        shell = shell.with_interpreter(interpreter.clone());
    }

    let name = config
        .name
        .clone()
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let mut root = Cmd::new(name, None);
    add_global_args(root.flags_mut());
    configure(&mut root, &config.root_command(), &shell);
    root
}

/// Flags the root command accepts on top of its configured options
fn global_args() -> [Arg; 4] {
    [
        Arg::new("file")
            .short('f')
            .long("file")
            .value_name("FILE")
            .help("Path to cmdtree.yml config file"),
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .help("Only print command output and errors")
            .action(ArgAction::SetTrue),
        Arg::new("silent")
            .short('s')
            .long("silent")
            .help("Print no output")
            .action(ArgAction::SetTrue),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Print verbose output")
            .action(ArgAction::SetTrue),
    ]
}

/// Register the global flags on the root parser so it accepts them
fn add_global_args(flags: &mut ClapFlags) {
    for arg in global_args() {
        flags.add_arg(arg);
    }
}

/// Wire options, handler and subcommands of one configured command
fn configure(cmd: &mut Cmd<ClapFlags>, spec: &CommandConfig, shell: &Shell) {
    if let Some(usage) = &spec.usage {
        cmd.flags_mut().about(usage.clone());
    }
    if let Some(description) = &spec.description {
        cmd.flags_mut().long_about(description.clone());
    }
    for (name, option) in &spec.options {
        cmd.flags_mut().add_arg(build_arg(name, option));
    }

    if !spec.run.is_empty() {
        let mut shell = shell.clone();
        if let Some(dir) = &spec.dir {
            let dir = shell.working_dir.join(dir);
            shell = shell.with_working_dir(dir);
        }
        let values = cmd.flags().values();
        cmd.set_handler(run_handler(spec, values, shell));
    }

    for (name, sub) in &spec.commands {
        let child = cmd.new_cmd(name.clone(), None);
        configure(child, sub, shell);
    }
}

/// Build a clap argument for a configured option
fn build_arg(name: &str, option: &OptionConfig) -> Arg {
    let mut arg = Arg::new(name.to_string())
        .long(name.to_string())
        .help(option.usage.clone().unwrap_or_default());

    if let Some(c) = option.short.as_deref().and_then(|s| s.chars().next()) {
        arg = arg.short(c);
    }

    if option.is_bool() {
        return arg.action(ArgAction::SetTrue);
    }

    arg = arg.value_name(name.to_uppercase()).action(ArgAction::Set);
    if let Some(default) = &option.default {
        arg = arg.default_value(default.clone());
    }
    // An environment fallback can still satisfy it after parsing
    if option.required && option.default.is_none() && option.environment.is_none() {
        arg = arg.required(true);
    }
    arg
}

/// Handler that runs a command's lines with its option values bound
fn run_handler(spec: &CommandConfig, values: Values, shell: Shell) -> Option<Handler> {
    let options = spec.options.clone();
    let lines = spec.run.clone();
    let timeout = spec.timeout.map(Duration::from_secs);

    handler(move |ctx| {
        let vars = resolve_vars(&options, &values)?;
        debug!("resolved vars: {:?}", vars);

        let ctx = match timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.child(),
        };
        shell.clone().with_vars(vars).execute_all(&ctx, &lines)?;
        Ok(())
    })
}

/// Resolve option values: command line, then default, then environment
fn resolve_vars(
    options: &HashMap<String, OptionConfig>,
    values: &Values,
) -> ExecutionResult<HashMap<String, String>> {
    let mut vars = HashMap::new();

    for (name, option) in options {
        let fallback = || {
            option
                .default
                .clone()
                .or_else(|| option.environment.as_ref().and_then(|e| env::var(e).ok()))
        };

        let value = if option.is_bool() {
            if values.get_flag(name) {
                "true".to_string()
            } else {
                fallback().unwrap_or_else(|| "false".to_string())
            }
        } else {
            match values.get_one(name).or_else(fallback) {
                Some(value) => value,
                None if option.required => {
                    return Err(ExecutionError::MissingOption(name.clone()))
                }
                None => String::new(),
            }
        };

        if !value.is_empty() {
            vars.insert(name.clone(), value);
        }
    }

    Ok(vars)
}

/// Read the global flags the way the root parser will see them
///
/// `root_options` are the root command's configured options. Parsing stops
/// at the first positional or unknown token, like the root parser does.
pub fn extract_global_args(
    args: &[String],
    root_options: &HashMap<String, OptionConfig>,
) -> GlobalArgs {
    let command = clap::Command::new(DEFAULT_NAME)
        .no_binary_name(true)
        .ignore_errors(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .args(global_args())
        .args(
            root_options
                .iter()
                .map(|(name, option)| build_arg(name, option).required(false)),
        )
        .arg(remainder_arg());

    let matches = match command.try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => {
            debug!("global flag scan failed: {}", e);
            return GlobalArgs::default();
        }
    };

    let file = matches
        .try_get_one::<String>("file")
        .ok()
        .flatten()
        .map(PathBuf::from);

    // Last one given wins
    let verbosity = [
        ("silent", Verbosity::Silent),
        ("quiet", Verbosity::Quiet),
        ("verbose", Verbosity::Verbose),
    ]
    .into_iter()
    .filter(|(id, _)| matches.value_source(id) == Some(ValueSource::CommandLine))
    .max_by_key(|(id, _)| matches.index_of(id))
    .map(|(_, level)| level)
    .unwrap_or_default();

    GlobalArgs { file, verbosity }
}

/// Load the config named by `file`, or the nearest one
fn load_config(file: Option<&Path>) -> Result<(Config, PathBuf), CmdTreeError> {
    match file {
        Some(path) => Ok((parse_config_file(path)?, path.to_path_buf())),
        None => parse_config_auto(),
    }
}

/// Initialize logging for the given verbosity
pub fn init_logging(verbosity: Verbosity) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.filter()),
    )
    .format_timestamp(None)
    .format_target(false)
    .try_init();
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), CmdTreeError> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut globals = extract_global_args(&args, &HashMap::new());
    let (mut config, mut config_path) = load_config(globals.file.as_deref())?;

    // Root options taking a value can hide a global flag from the first scan
    if !config.options.is_empty() {
        validate_config(&config)?;
        let rescanned = extract_global_args(&args, &config.options);
        if rescanned.file != globals.file {
            (config, config_path) = load_config(rescanned.file.as_deref())?;
        }
        globals = rescanned;
    }

    init_logging(globals.verbosity);
    App::from_config(config, config_path)?.run(&args)
}
