use crate::commands::builtin::{arg, read_file, value_of, value_of_if_exists};
use crate::config::Config;
use clap::{arg, Command, ValueHint};
use log::{error, info, warn};
use netconf_session::connection::Connection;
use netconf_session::error::NetconfClientResult;
use netconf_session::message::{Datastore, DefaultOperation};
use netconf_session::xml;
use std::str::FromStr;

pub fn cli() -> Command {
    Command::new("edit")
        .about("Execute edit-config rpc")
        .help_template(color_print::cstr!(
            "\
{about-with-newline}
<green,bold>Usage:</> {usage}

<green,bold>Options:</>
{options}\n",
        ))
        .args([
            arg(
                "config",
                "File containing the configuration to load",
                true,
                Some('c'),
                None,
                Some(ValueHint::FilePath),
                None,
            ),
            arg(
                "target",
                "Datastore to edit",
                false,
                Some('t'),
                Some("candidate"),
                None,
                ["running", "candidate"],
            ),
            arg(
                "default-operation",
                "Default operation for the edit",
                false,
                None,
                None,
                None,
                ["merge", "replace", "none"],
            ),
            arg!(--commit "Commit the candidate datastore after a successful edit"),
        ])
}

pub async fn exec(cfg: &Config, conn: &Connection) -> NetconfClientResult<()> {
    let args = &cfg.args;
    let target = Datastore::from_str(value_of::<String>("target", args)?)?;
    let config = xml::decode_fragment(&read_file(value_of::<String>("config", args)?)?)?;
    let default_operation = value_of_if_exists::<String>("default-operation", args)
        .map(|value| DefaultOperation::from_str(value))
        .transpose()?;
    let commit = *value_of::<bool>("commit", args)?;

    if let Err(err) = conn
        .edit_config(target.clone(), config, default_operation)
        .await
    {
        error!("Edit-config error: {}", err);
        if target == Datastore::Candidate {
            if let Err(err) = conn.discard_changes().await {
                warn!("Discard-changes error: {}", err);
            }
        }
        return Ok(());
    }
    info!("Edit-config succeeded");

    if commit {
        if target != Datastore::Candidate {
            warn!("Ignoring --commit, target is not the candidate datastore");
            return Ok(());
        }
        match conn.commit().await {
            Ok(_) => info!("Commit succeeded"),
            Err(err) => error!("Commit error: {}", err),
        }
    }
    Ok(())
}
