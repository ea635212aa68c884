use crate::commands::builtin::{value_of_if_exists, values_of};
use async_ssh2_lite::{AsyncSession, SessionConfiguration};
use clap::ArgMatches;
use dirs::home_dir;
use log::{debug, error, warn};
use netconf_session::config::{
    split_host, timeout_millis, Authentication, DEFAULT_CONNECT_TIMEOUT,
};
use netconf_session::error::{NetconfClientError, NetconfClientResult};
use netconf_session::transport::ssh::authenticate;
use ssh2::MethodType;
use ssh2_config::{HostParams, ParseRule, SshConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub inner: Arc<Config>,
}

#[derive(Debug)]
pub struct Config {
    pub args: ArgMatches,
    pub ssh_config: Option<SshConfig>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub private_key: Option<PathBuf>,
    pub addresses: Vec<String>,
}

impl CliConfig {
    pub fn new(args: ArgMatches) -> NetconfClientResult<Self> {
        let mut ssh_dir = home_dir().unwrap_or(PathBuf::from("/"));
        ssh_dir.extend(Path::new(".ssh/config"));
        let ssh_config = read_ssh_config(&ssh_dir);
        let hosts = values_of::<String>("host", &args)
            .iter()
            .map(|h| h.to_string())
            .collect();
        let username = value_of_if_exists::<String>("username", &args).cloned();
        let password = value_of_if_exists::<String>("password", &args).cloned();
        let private_key = value_of_if_exists::<String>("private-key", &args).map(PathBuf::from);
        Ok(Self {
            inner: Arc::new(Config {
                username,
                password,
                private_key,
                addresses: hosts,
                args,
                ssh_config,
            }),
        })
    }
}

fn read_ssh_config(dir: &Path) -> Option<SshConfig> {
    debug!("Trying to parse ssh configuration '{}'", dir.display());

    let mut reader = match File::open(dir) {
        Ok(f) => BufReader::new(f),
        Err(err) => {
            warn!(
                "Could not open ssh config file '{}', error: {}",
                dir.display(),
                err
            );
            return None;
        }
    };
    match SshConfig::default().parse(&mut reader, ParseRule::ALLOW_UNKNOWN_FIELDS) {
        Ok(config) => {
            debug!("Successfully parsed configuration");
            Some(config)
        }
        Err(err) => {
            error!("Failed to parse ssh configuration, error '{}'", err);
            None
        }
    }
}

#[derive(Debug)]
pub struct Host {
    pub(crate) address: String,
    port: u16,
    auth_user: String,
    /// `None` authenticates with the identities of the SSH agent.
    authentication: Option<Authentication>,
    params: HostParams,
}

impl Host {
    pub(crate) fn new(addr: &str, config: &Config, params: HostParams) -> NetconfClientResult<Host> {
        let (address, port) = split_host(addr)?;
        let address = params.host_name.clone().unwrap_or(address.to_string());
        let port = params.port.unwrap_or(port);

        let auth_user = match (&config.username, params.user.as_deref()) {
            (Some(user), _) => user.clone(),
            (None, Some(user)) => user.to_string(),
            (None, None) => {
                return Err(NetconfClientError::new("No username provided".to_string()));
            }
        };

        let identity_file = params
            .identity_file
            .as_ref()
            .and_then(|files| files.first().cloned());
        let authentication = if let Some(password) = &config.password {
            Some(Authentication::Password(password.clone()))
        } else if let Some(path) = config.private_key.clone().or(identity_file) {
            Some(Authentication::PrivateKey {
                path,
                passphrase: None,
            })
        } else {
            None
        };

        Ok(Host {
            address,
            port,
            params,
            auth_user,
            authentication,
        })
    }

    pub(crate) async fn connect_ssh(&self) -> NetconfClientResult<AsyncSession<TcpStream>> {
        let stream: TcpStream = self.tcp_connect_timeout().await?;
        let mut configuration = SessionConfiguration::new();
        configuration.set_timeout(timeout_millis(DEFAULT_CONNECT_TIMEOUT));
        if let Some(compress) = &self.params.compression {
            debug!(target: &self.address, "Setting compression: {}", compress);
            configuration.set_compress(*compress);
        }
        if let (Some(true), Some(interval)) = (
            self.params.tcp_keep_alive,
            self.params.server_alive_interval,
        ) {
            let interval = keepalive_interval(interval);
            debug!(target: &self.address, "Setting keepalive interval: {} seconds", interval);
            configuration.set_keepalive(true, interval);
        }
        let mut session = AsyncSession::new(stream, configuration)?;
        configure_session(&mut session, &self.params).await?;
        session.handshake().await?;

        match &self.authentication {
            Some(authentication) => {
                authenticate(&session, &self.auth_user, authentication).await?;
            }
            None => self.agent_auth(&session).await?,
        }
        if !session.authenticated() {
            return Err(NetconfClientError::new(format!(
                "Authentication failed for user '{}'",
                self.auth_user
            )));
        }
        Ok(session)
    }

    async fn agent_auth(&self, session: &AsyncSession<TcpStream>) -> NetconfClientResult<()> {
        let mut agent = session.agent()?;
        agent.connect().await?;
        agent.list_identities().await?;

        for identity in agent.identities()? {
            debug!(
                target: &self.address,
                "Trying authentication with public key '{}'",
                identity.comment()
            );
            match agent.userauth(&self.auth_user, &identity).await {
                Ok(_) => break,
                Err(err) => {
                    warn!(
                        target: &self.address,
                        "Public key '{}' authentication failed: {}",
                        identity.comment(),
                        err
                    );
                    continue;
                }
            }
        }
        Ok(())
    }

    async fn tcp_connect_timeout(&self) -> NetconfClientResult<TcpStream> {
        let stream = timeout(
            DEFAULT_CONNECT_TIMEOUT,
            TcpStream::connect(&(self.address.as_str(), self.port)),
        )
        .await
        .map_err(|e| NetconfClientError::new(e.to_string()))?;
        Ok(stream?)
    }
}

fn keepalive_interval(interval: Duration) -> u32 {
    u32::try_from(interval.as_secs()).unwrap_or(u32::MAX)
}

async fn configure_session(
    session: &mut AsyncSession<TcpStream>,
    params: &HostParams,
) -> NetconfClientResult<()> {
    if let Some(algos) = params.kex_algorithms.as_deref() {
        session
            .method_pref(MethodType::Kex, algos.join(",").as_str())
            .await?;
    }
    if let Some(algos) = params.host_key_algorithms.as_deref() {
        session
            .method_pref(MethodType::HostKey, algos.join(",").as_str())
            .await?;
    }
    if let Some(algos) = params.ciphers.as_deref() {
        session
            .method_pref(MethodType::CryptCs, algos.join(",").as_str())
            .await?;
    }
    if let Some(algos) = params.mac.as_deref() {
        session
            .method_pref(MethodType::MacCs, algos.join(",").as_str())
            .await?;
        session
            .method_pref(MethodType::MacSc, algos.join(",").as_str())
            .await?;
    }
    Ok(())
}
