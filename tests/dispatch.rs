//! Integration tests for command tree dispatch

mod common;

use cmdtree::cli::FlagSetCreator;
use cmdtree::{handler, Cmd, Context, DispatchError, FlagSet, Handler};
use common::args;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

fn counting(counter: &Arc<AtomicUsize>) -> Option<Handler> {
    let counter = counter.clone();
    handler(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

fn is_no_such_command(result: Result<(), DispatchError>) -> bool {
    matches!(result, Err(DispatchError::NoSuchCommand { .. }))
}

#[test]
fn test_command() {
    let ctx = Context::new();
    let ran = Arc::new(AtomicUsize::new(0));

    let mut cmd = Cmd::new("foo", counting(&ran));
    assert_eq!(cmd.name(), "foo");

    cmd.run(&ctx, &[]).unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    assert!(is_no_such_command(cmd.run(&ctx, &args(&["bar"]))));

    cmd.new_cmd("bar", None);
    assert!(is_no_such_command(cmd.run(&ctx, &args(&["bar"]))));

    let bar_ran = Arc::new(AtomicUsize::new(0));
    cmd.new_cmd("bar", counting(&bar_ran));
    cmd.run(&ctx, &args(&["bar"])).unwrap();
    assert_eq!(bar_ran.load(Ordering::SeqCst), 1);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[test]
fn test_inert_root_rejects_anything() {
    let mut cmd = Cmd::new("foo", None);
    let err = cmd.run(&Context::new(), &args(&["anything"])).unwrap_err();
    assert_eq!(err.to_string(), "no such command: foo anything");
}

#[test]
fn test_unknown_name_among_many_children() {
    let mut root = Cmd::new("foo", handler(|_| Ok(())));
    for name in ["a", "b", "c", "d"] {
        root.new_cmd(name, handler(|_| Ok(())));
    }
    assert!(is_no_such_command(root.run(&Context::new(), &args(&["e"]))));
}

#[test]
fn test_children_unreachable_without_name() {
    let mut root = Cmd::new("foo", None);
    root.new_cmd("bar", handler(|_| Ok(())));
    assert!(is_no_such_command(root.run(&Context::new(), &[])));
}

#[test]
fn test_leftover_args_at_handler_node() {
    // bar has a handler but no children; an extra positional is not for it
    let mut root = Cmd::new("foo", None);
    root.new_cmd("bar", handler(|_| Ok(())));
    let err = root
        .run(&Context::new(), &args(&["bar", "extra"]))
        .unwrap_err();
    assert!(matches!(err, DispatchError::NoSuchCommand { ref path } if path == "foo bar extra"));
}

#[test]
fn test_depth_follows_tokens() {
    let root_ran = Arc::new(AtomicUsize::new(0));
    let bar_ran = Arc::new(AtomicUsize::new(0));
    let baz_ran = Arc::new(AtomicUsize::new(0));

    let mut root = Cmd::new("root", counting(&root_ran));
    root.new_cmd("bar", counting(&bar_ran))
        .new_cmd("baz", counting(&baz_ran));

    root.run(&Context::new(), &args(&["bar", "baz"])).unwrap();
    assert_eq!(baz_ran.load(Ordering::SeqCst), 1);
    assert_eq!(bar_ran.load(Ordering::SeqCst), 0);
    assert_eq!(root_ran.load(Ordering::SeqCst), 0);

    root.run(&Context::new(), &args(&["bar"])).unwrap();
    assert_eq!(bar_ran.load(Ordering::SeqCst), 1);
}

#[test]
fn test_add_cmd_overwrites() {
    let old_ran = Arc::new(AtomicUsize::new(0));
    let new_ran = Arc::new(AtomicUsize::new(0));

    let mut root = Cmd::new("foo", None);
    root.add_cmd(Cmd::new("bar", counting(&old_ran)));
    root.add_cmd(Cmd::new("bar", counting(&new_ran)));

    root.run(&Context::new(), &args(&["bar"])).unwrap();
    assert_eq!(old_ran.load(Ordering::SeqCst), 0);
    assert_eq!(new_ran.load(Ordering::SeqCst), 1);
    assert_eq!(root.commands().len(), 1);
}

#[test]
fn test_handler_error_passes_through() {
    #[derive(Debug, thiserror::Error)]
    #[error("deploy refused")]
    struct Refused;

    let mut root = Cmd::new("foo", None);
    root.new_cmd("deploy", handler(|_| Err(Refused.into())));

    let err = root.run(&Context::new(), &args(&["deploy"])).unwrap_err();
    match err {
        DispatchError::Handler(e) => assert!(e.downcast_ref::<Refused>().is_some()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_handler_sees_cancellation() {
    let ctx = Context::new();
    ctx.cancel();

    let mut root = Cmd::new("foo", handler(|ctx| Ok(ctx.check()?)));
    let err = root.run(&ctx, &[]).unwrap_err();
    assert_eq!(err.to_string(), "context canceled");
}

#[test]
fn test_subcommand_flags_belong_to_subcommand() {
    let mut root = Cmd::new("tool", None);
    root.flags_mut().add_arg(
        clap::Arg::new("verbose")
            .short('v')
            .action(clap::ArgAction::SetTrue),
    );
    let root_values = root.flags().values();

    let build = root.new_cmd("build", None);
    build.flags_mut().add_arg(clap::Arg::new("target").long("target"));
    let build_values = build.flags().values();
    let seen = Arc::new(Mutex::new(None));
    let seen_in = seen.clone();
    build.set_handler(handler(move |_| {
        *seen_in.lock().unwrap() = build_values.get_one("target");
        Ok(())
    }));

    root.run(&Context::new(), &args(&["-v", "build", "--target", "arm"]))
        .unwrap();
    assert!(root_values.get_flag("verbose"));
    assert_eq!(*seen.lock().unwrap(), Some("arm".to_string()));

    // the root parser does not know --target
    let err = root
        .run(&Context::new(), &args(&["--target", "arm", "build"]))
        .unwrap_err();
    assert!(matches!(err, DispatchError::Parse(_)));
}

/// Parser that treats every token as positional and rejects anything dashed
#[derive(Debug, Default)]
struct Positional {
    remaining: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("unexpected option '{0}'")]
struct UnexpectedOption(String);

impl FlagSet for Positional {
    type Error = UnexpectedOption;

    fn parse(&mut self, args: &[String]) -> Result<(), UnexpectedOption> {
        if let Some(dashed) = args.iter().find(|a| a.starts_with('-')) {
            return Err(UnexpectedOption(dashed.clone()));
        }
        self.remaining = args.to_vec();
        Ok(())
    }

    fn narg(&self) -> usize {
        self.remaining.len()
    }

    fn args(&self) -> &[String] {
        &self.remaining
    }
}

#[test]
fn test_custom_parser_is_inherited() {
    let created = Arc::new(Mutex::new(Vec::new()));
    let created_in = created.clone();
    let creator: FlagSetCreator<Positional> = Arc::new(move |name: &str| {
        created_in.lock().unwrap().push(name.to_string());
        Positional::default()
    });

    let ran = Arc::new(AtomicUsize::new(0));
    let mut root = Cmd::with_flag_set("root", None, creator);
    root.new_cmd("a", None).new_cmd("b", counting(&ran));

    assert_eq!(*created.lock().unwrap(), vec!["root", "a", "b"]);

    root.run(&Context::new(), &args(&["a", "b"])).unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(root.cmd("a").unwrap().flags().narg(), 1);
}

#[test]
fn test_custom_parser_error_is_verbatim() {
    let creator: FlagSetCreator<Positional> = Arc::new(|_: &str| Positional::default());
    let ran = Arc::new(AtomicUsize::new(0));
    let mut root = Cmd::with_flag_set("root", None, creator);
    root.new_cmd("a", counting(&ran));

    let err = root.run(&Context::new(), &args(&["a", "-x"])).unwrap_err();
    match err {
        DispatchError::Parse(e) => {
            let inner = e.downcast_ref::<UnexpectedOption>().unwrap();
            assert_eq!(inner.0, "-x");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_built_tree_moves_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Cmd>();

    let ran = Arc::new(AtomicUsize::new(0));
    let mut root = Cmd::new("foo", None);
    root.new_cmd("bar", counting(&ran));

    let handle = thread::spawn(move || root.run(&Context::new(), &args(&["bar"])));
    handle.join().unwrap().unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
