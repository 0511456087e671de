//! Argument parsing capability
//!
//! A command node only needs four things from its parser: parse the raw tokens,
//! then report the positional remainder. Any parser providing those can back a
//! node; `ClapFlags` is the default.

use clap::{Arg, ArgAction, ArgMatches};
use std::sync::{Arc, PoisonError, RwLock};

/// Parser contract a command node dispatches through
pub trait FlagSet {
    /// Error produced when the tokens are rejected
    type Error: std::error::Error + Send + Sync + 'static;

    /// Consume this node's tokens, extracting any options it knows about
    fn parse(&mut self, args: &[String]) -> Result<(), Self::Error>;

    /// Number of positional arguments left after parsing
    fn narg(&self) -> usize;

    /// Positional arguments left after parsing, in original order
    fn args(&self) -> &[String];

    /// The `i`-th positional argument, if there is one
    fn arg(&self, i: usize) -> Option<&str> {
        self.args().get(i).map(String::as_str)
    }
}

/// Builds a fresh parser for a command of the given name
pub type FlagSetCreator<F> = Arc<dyn Fn(&str) -> F + Send + Sync>;

/// Id of the hidden positional that collects the remainder
pub(crate) const REMAINDER: &str = "__cmdtree_remainder";

/// Trailing positional that takes the first non-option token and all after it
pub(crate) fn remainder_arg() -> Arg {
    Arg::new(REMAINDER)
        .num_args(0..)
        .action(ArgAction::Append)
        .trailing_var_arg(true)
        .hide(true)
}

/// Default parser flavor, backed by a `clap::Command`
///
/// Option parsing stops at the first positional token; that token and
/// everything after it form the remainder, so a subcommand's own flags are
/// left for the subcommand's parser.
#[derive(Debug, Clone)]
pub struct ClapFlags {
    /// Options registered for this node
    command: clap::Command,

    /// Shared view of the most recent parse
    values: Values,

    /// Positional remainder of the most recent parse
    remaining: Vec<String>,
}

impl ClapFlags {
    /// Create an empty parser for the command `name`
    pub fn new(name: &str) -> Self {
        ClapFlags {
            command: clap::Command::new(name.to_string())
                .no_binary_name(true)
                .disable_version_flag(true),
            values: Values::default(),
            remaining: Vec::new(),
        }
    }

    /// Register an option on this node
    pub fn add_arg(&mut self, arg: Arg) -> &mut Self {
        self.command = std::mem::take(&mut self.command).arg(arg);
        self
    }

    /// Set the one-line description clap shows in `--help`
    pub fn about(&mut self, about: impl Into<String>) -> &mut Self {
        self.command = std::mem::take(&mut self.command).about(about.into());
        self
    }

    /// Set the longer description clap shows in `--help`
    pub fn long_about(&mut self, about: impl Into<String>) -> &mut Self {
        self.command = std::mem::take(&mut self.command).long_about(about.into());
        self
    }

    /// The description set with [`ClapFlags::about`]
    pub fn description(&self) -> Option<String> {
        self.command.get_about().map(|s| s.to_string())
    }

    /// Handle to the values of the most recent parse
    ///
    /// The handle stays valid across parses; handlers capture it and read
    /// option values when they run.
    pub fn values(&self) -> Values {
        self.values.clone()
    }

    /// The underlying clap command
    pub fn command(&self) -> &clap::Command {
        &self.command
    }
}

impl FlagSet for ClapFlags {
    type Error = clap::Error;

    fn parse(&mut self, args: &[String]) -> Result<(), clap::Error> {
        self.remaining.clear();
        self.values.replace(ArgMatches::default());

        // The remainder has to be the last positional, so it is attached per
        // parse rather than at construction.
        let mut command = self.command.clone().arg(remainder_arg());
        let matches = command.try_get_matches_from_mut(args.iter())?;

        self.remaining = matches
            .get_many::<String>(REMAINDER)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        self.values.replace(matches);
        Ok(())
    }

    fn narg(&self) -> usize {
        self.remaining.len()
    }

    fn args(&self) -> &[String] {
        &self.remaining
    }
}

/// Cloneable handle to parsed option values
///
/// Unknown ids and type mismatches read as absent rather than panicking.
#[derive(Debug, Clone, Default)]
pub struct Values(Arc<RwLock<ArgMatches>>);

impl Values {
    fn replace(&self, matches: ArgMatches) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = matches;
    }

    fn with<T>(&self, f: impl FnOnce(&ArgMatches) -> T) -> T {
        f(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Value of a `SetTrue`/`SetFalse` flag
    pub fn get_flag(&self, id: &str) -> bool {
        self.with(|m| m.try_get_one::<bool>(id).ok().flatten().copied())
            .unwrap_or(false)
    }

    /// Single string value of an option
    pub fn get_one(&self, id: &str) -> Option<String> {
        self.with(|m| m.try_get_one::<String>(id).ok().flatten().cloned())
    }

    /// All string values of an option
    pub fn get_many(&self, id: &str) -> Vec<String> {
        self.with(|m| {
            m.try_get_many::<String>(id)
                .ok()
                .flatten()
                .map(|vals| vals.cloned().collect())
                .unwrap_or_default()
        })
    }

    /// Whether the option has a value, from the command line or a default
    pub fn contains(&self, id: &str) -> bool {
        self.with(|m| m.ids().any(|i| i.as_str() == id))
    }
}

/// Creator for the default parser flavor
pub fn clap_flags() -> FlagSetCreator<ClapFlags> {
    Arc::new(ClapFlags::new)
}
