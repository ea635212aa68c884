use crate::commands::builtin::{arg, filter_of, value_of};
use crate::config::Config;
use clap::{arg, Command, ValueHint};
use log::{error, info, warn};
use netconf_session::connection::Connection;
use netconf_session::error::NetconfClientResult;
use netconf_session::message::{Filter, Notification};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::{select, signal};

pub fn cli() -> Command {
    Command::new("notification")
        .about("Execute create-subscription rpc")
        .help_template(color_print::cstr!(
            "\
{about-with-newline}
<green,bold>Usage:</> {usage}

<green,bold>Options:</>
{options}\n",
        ))
        .args([
            arg(
                "stream",
                "Stream to subscribe",
                false,
                Some('s'),
                Some("NETCONF"),
                None,
                None,
            ),
            arg(
                "filter",
                "File containing subtree filter",
                false,
                Some('f'),
                None,
                Some(ValueHint::FilePath),
                None,
            ),
            arg!(-g --get "Get available notification streams").global(true),
        ])
}

pub async fn exec(
    cfg: &Config,
    conn: &Connection,
    mut notifications: UnboundedReceiver<Notification>,
) -> NetconfClientResult<()> {
    let args = &cfg.args;
    if *value_of::<bool>("get", args)? {
        let filter = Filter::subtree(
            r#"<netconf xmlns="urn:ietf:params:xml:ns:netmod:notification"><streams/></netconf>"#,
        )?;
        match conn.get(Some(filter), None).await {
            Ok(resp) => {
                info!("Available notification streams:\n{}", resp);
            }
            Err(err) => {
                error!("Get error: {}", err);
            }
        };
        return Ok(());
    }

    let stream = value_of::<String>("stream", args)?;
    let filter = filter_of("filter", args)?;
    conn.create_subscription(Some(stream.as_str()), filter, None, None)
        .await?;
    info!("Subscribed to stream '{}', press Ctrl-C to stop", stream);

    loop {
        select! {
            result = signal::ctrl_c() => {
                result?;
                return Ok(());
            }
            notification = notifications.recv() => match notification {
                Some(notification) => info!("Notification:\n{}", notification),
                None => {
                    warn!("Session closed, no more notifications");
                    return Ok(());
                }
            }
        }
    }
}
