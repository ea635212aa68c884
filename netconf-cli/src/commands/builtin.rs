use crate::commands::*;
use crate::config::Config;
use clap::builder::{IntoResettable, ValueParser};
use clap::{Arg, ArgMatches, Command, ValueHint};
use netconf_session::connection::Connection;
use netconf_session::error::{NetconfClientError, NetconfClientResult};
use netconf_session::message::{Filter, Notification};
use std::path::Path;
use tokio::sync::mpsc::UnboundedReceiver;

pub fn builtin() -> Vec<Command> {
    vec![
        get::cli(),
        get_config::cli(),
        edit::cli(),
        rpc::cli(),
        notification::cli(),
    ]
}

pub async fn builtin_exec(
    cmd: &str,
    conn: &Connection,
    notifications: UnboundedReceiver<Notification>,
    args: &Config,
) -> Option<NetconfClientResult<()>> {
    let f = match cmd {
        "get" => get::exec(args, conn).await,
        "get-config" => get_config::exec(args, conn).await,
        "edit" => edit::exec(args, conn).await,
        "rpc" => rpc::exec(args, conn).await,
        "notification" => notification::exec(args, conn, notifications).await,
        _ => return None,
    };
    Some(f)
}

pub(crate) fn value_of<'a, T: Clone + Send + Sync + 'static>(
    name: &str,
    args: &'a ArgMatches,
) -> NetconfClientResult<&'a T> {
    args.get_one::<T>(name)
        .ok_or_else(|| NetconfClientError::new(format!("missing argument '{}'", name)))
}

pub(crate) fn value_of_if_exists<'a, T: Clone + Send + Sync + 'static>(
    name: &str,
    args: &'a ArgMatches,
) -> Option<&'a T> {
    if args.contains_id(name) {
        args.get_one::<T>(name)
    } else {
        None
    }
}

pub(crate) fn values_of<'a, T: Clone + Send + Sync + 'static>(
    name: &str,
    args: &'a ArgMatches,
) -> Vec<&'a T> {
    args.get_many::<T>(name).unwrap_or_default().collect()
}

pub(crate) fn read_file(path: &str) -> NetconfClientResult<String> {
    std::fs::read_to_string(Path::new(path)).map_err(|err| {
        NetconfClientError::new(format!("could not read file '{}': {}", path, err))
    })
}

/// Subtree filter read from the file named by argument `name`, if given.
pub(crate) fn filter_of(name: &str, args: &ArgMatches) -> NetconfClientResult<Option<Filter>> {
    value_of_if_exists::<String>(name, args)
        .map(|path| Filter::subtree(&read_file(path)?))
        .transpose()
}

pub(super) fn arg(
    name: &'static str,
    help: &'static str,
    required: bool,
    short: Option<char>,
    default: Option<&'static str>,
    hint: Option<ValueHint>,
    parser: impl IntoResettable<ValueParser>,
) -> Arg {
    Arg::new(name)
        .short(short)
        .long(name)
        .help(help)
        .required(required)
        .default_value(default)
        .value_hint(hint)
        .value_parser(parser)
}
