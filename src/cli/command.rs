//! Command tree and dispatch

use crate::cli::context::Context;
use crate::cli::flags::{clap_flags, ClapFlags, FlagSet, FlagSetCreator};
use crate::error::{DispatchError, DispatchResult};
use log::{debug, trace};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Terminal action of a command
pub type Handler = Box<dyn Fn(&Context) -> anyhow::Result<()> + Send + Sync>;

/// Box a closure as a command handler
pub fn handler<H>(h: H) -> Option<Handler>
where
    H: Fn(&Context) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Some(Box::new(h))
}

/// A named command with its own parser, optional handler and subcommands
pub struct Cmd<F: FlagSet = ClapFlags> {
    flags: F,
    subs: HashMap<String, Cmd<F>>,
    handler: Option<Handler>,
    new_flags: FlagSetCreator<F>,
    name: String,
}

impl Cmd<ClapFlags> {
    /// Create a command parsed by [`ClapFlags`]
    pub fn new(name: impl Into<String>, handler: Option<Handler>) -> Self {
        Self::with_flag_set(name, handler, clap_flags())
    }
}

impl<F: FlagSet> Cmd<F> {
    /// Create a command whose parsers come from `new_flags`
    ///
    /// Subcommands made with [`Cmd::new_cmd`] reuse the same creator.
    pub fn with_flag_set(
        name: impl Into<String>,
        handler: Option<Handler>,
        new_flags: FlagSetCreator<F>,
    ) -> Self {
        let name = name.into();
        Cmd {
            flags: new_flags(&name),
            subs: HashMap::new(),
            handler,
            new_flags,
            name,
        }
    }

    /// Name of the command
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parser of the command
    pub fn flags(&self) -> &F {
        &self.flags
    }

    /// Parser of the command, for registering options before dispatch
    pub fn flags_mut(&mut self) -> &mut F {
        &mut self.flags
    }

    /// Whether dispatch can end at this command
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Replace the handler
    pub fn set_handler(&mut self, handler: Option<Handler>) {
        self.handler = handler;
    }

    /// Run the command with the given args (program name excluded)
    ///
    /// Parses `args`; with no positional remainder the handler runs, otherwise
    /// the first positional names a subcommand that receives the rest.
    pub fn run(&mut self, ctx: &Context, args: &[String]) -> DispatchResult<()> {
        let path = self.name.clone();
        self.dispatch(ctx, args, &path)
    }

    fn dispatch(&mut self, ctx: &Context, args: &[String], path: &str) -> DispatchResult<()> {
        trace!("{}: parsing {:?}", path, args);
        self.flags
            .parse(args)
            .map_err(|e| DispatchError::Parse(e.into()))?;

        let Some(sub_name) = self.flags.arg(0) else {
            return match &self.handler {
                Some(h) => {
                    debug!("running command '{}'", path);
                    h(ctx).map_err(DispatchError::Handler)
                }
                None => Err(DispatchError::NoSuchCommand {
                    path: path.to_string(),
                }),
            };
        };

        let sub_path = format!("{} {}", path, sub_name);
        let Some(sub) = self.subs.get_mut(sub_name) else {
            debug!("no subcommand '{}' under '{}'", sub_name, path);
            return Err(DispatchError::NoSuchCommand { path: sub_path });
        };

        sub.dispatch(ctx, &self.flags.args()[1..], &sub_path)
    }

    /// Create a subcommand sharing this command's parser flavor
    ///
    /// An existing subcommand with the same name is replaced.
    pub fn new_cmd(&mut self, name: impl Into<String>, handler: Option<Handler>) -> &mut Cmd<F> {
        let sub = Cmd::with_flag_set(name, handler, self.new_flags.clone());
        self.insert(sub)
    }

    /// Add a prebuilt subcommand under its own name, replacing any existing one
    pub fn add_cmd(&mut self, cmd: Cmd<F>) {
        self.insert(cmd);
    }

    fn insert(&mut self, cmd: Cmd<F>) -> &mut Cmd<F> {
        match self.subs.entry(cmd.name.clone()) {
            Entry::Occupied(mut e) => {
                trace!("replacing subcommand '{}' of '{}'", cmd.name, self.name);
                e.insert(cmd);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(cmd),
        }
    }

    /// Direct subcommands, in no particular order
    pub fn commands(&self) -> Vec<&Cmd<F>> {
        self.subs.values().collect()
    }

    /// Direct subcommand by name
    pub fn cmd(&self, name: &str) -> Option<&Cmd<F>> {
        self.subs.get(name)
    }

    /// Direct subcommand by name, for further wiring
    pub fn cmd_mut(&mut self, name: &str) -> Option<&mut Cmd<F>> {
        self.subs.get_mut(name)
    }
}

impl<F: FlagSet> fmt::Debug for Cmd<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("name", &self.name)
            .field("handler", &self.handler.is_some())
            .field("subs", &self.subs.keys().collect::<Vec<_>>())
            .finish()
    }
}
