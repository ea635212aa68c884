use crate::commands::builtin::{arg, read_file, value_of};
use crate::config::Config;
use clap::{arg, Command, ValueHint};
use log::{error, info};
use netconf_session::connection::Connection;
use netconf_session::error::{NetconfClientError, NetconfClientResult};
use netconf_session::xml;

pub fn cli() -> Command {
    Command::new("rpc")
        .about("Execute raw rpc")
        .help_template(color_print::cstr!(
            "\
{about-with-newline}
<green,bold>Usage:</> {usage}

<green,bold>Options:</>
{options}\n",
        ))
        .args([
            arg(
                "file",
                "File containing the rpc body, without the <rpc> envelope",
                true,
                Some('f'),
                None,
                Some(ValueHint::FilePath),
                None,
            ),
            arg!(--action "Send the body inside a YANG 1.1 <action> element"),
        ])
}

pub async fn exec(cfg: &Config, conn: &Connection) -> NetconfClientResult<()> {
    let args = &cfg.args;
    let path = value_of::<String>("file", args)?;
    let mut body = xml::decode_fragment(&read_file(path)?)?;
    if body.len() != 1 {
        return Err(NetconfClientError::new(format!(
            "'{}' must contain exactly one element, found {}",
            path,
            body.len()
        )));
    }
    let content = body.remove(0);

    let reply = if *value_of::<bool>("action", args)? {
        conn.rpc_action(content).await
    } else {
        conn.rpc(content).await
    };
    match reply {
        Ok(resp) => info!("Response:\n{}", resp),
        Err(err) => error!("Rpc error: {}", err),
    }
    Ok(())
}
