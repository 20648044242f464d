//! EndpointHost: binds the configured endpoints and serves client sessions.
//!
//! The host speaks a deliberately small line protocol, one command per line:
//!
//! ```text
//! client                                   host
//! ──────                                   ────
//! HELLO <session-name> <chain> <subject>   validate certificate
//!                                          ── rejected ──► ERR <status>, close
//!                                          ── accepted ──► create session
//!                                      ◄── OK <session-id>
//! ACTIVATE [identity]                      activate session
//!                                      ◄── OK
//! PING                                     (touch only)
//!                                      ◄── OK
//! BYE  (or EOF)                            close session
//! ```
//!
//! `<chain>` is `Good` or the name of a chain-validation status such as
//! `BadCertificateTimeInvalid`.  Every line received on an open session
//! records client activity.
//!
//! # Accept loop
//!
//! Each bound endpoint runs its own accept loop task.  Each accepted
//! connection runs in its own task, so one slow client never blocks another.
//! The loops poll the shared `running` flag between accepts.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use chrono::Utc;
use mock_core::{UserIdentity, ValidationStatus};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::certificate_validator::{Certificate, CertificateValidator};
use super::session_manager::SessionManager;
use super::ServerError;
use crate::infrastructure::storage::settings::NodeToCreate;

/// URL scheme accepted for endpoints.
pub const ENDPOINT_SCHEME: &str = "opc.tcp://";

const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Longest accepted command line in bytes, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 4096;

/// A parsed `opc.tcp://host:port/path` endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUrl {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl EndpointUrl {
    /// Parses an endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidEndpoint`] for a wrong scheme, a missing
    /// host or a port that is not a `u16`.
    pub fn parse(url: &str) -> Result<Self, ServerError> {
        let invalid = |reason: &str| ServerError::InvalidEndpoint {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let rest = url
            .strip_prefix(ENDPOINT_SCHEME)
            .ok_or_else(|| invalid("expected opc.tcp:// scheme"))?;
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// The URL with `port` substituted.
    pub fn with_port(&self, port: u16) -> String {
        format!("{ENDPOINT_SCHEME}{}:{}{}", self.host, port, self.path)
    }
}

/// One client command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Hello {
        session_name: String,
        chain_result: Result<(), ValidationStatus>,
        subject: String,
    },
    Activate {
        identity: Option<UserIdentity>,
    },
    Ping,
    Bye,
}

impl ClientCommand {
    /// Parses one protocol line.  Returns a human-readable reason on failure.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, args) = match line.split_once(char::is_whitespace) {
            Some((verb, args)) => (verb, args.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_uppercase().as_str() {
            "HELLO" => {
                let mut parts = args.splitn(3, char::is_whitespace);
                let session_name = parts.next().filter(|s| !s.is_empty());
                let chain = parts.next();
                let subject = parts.next().map(str::trim).filter(|s| !s.is_empty());
                let (Some(session_name), Some(chain), Some(subject)) = (session_name, chain, subject)
                else {
                    return Err("usage: HELLO <session-name> <chain> <subject>".to_string());
                };
                let chain_result = if chain.eq_ignore_ascii_case("Good") {
                    Ok(())
                } else {
                    Err(chain.parse::<ValidationStatus>().map_err(|e| e.to_string())?)
                };
                Ok(ClientCommand::Hello {
                    session_name: session_name.to_string(),
                    chain_result,
                    subject: subject.to_string(),
                })
            }
            "ACTIVATE" => Ok(ClientCommand::Activate {
                identity: (!args.is_empty()).then(|| UserIdentity::new(args)),
            }),
            "PING" => Ok(ClientCommand::Ping),
            "BYE" => Ok(ClientCommand::Bye),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command {other}")),
        }
    }
}

/// Hosts sessions for the server's endpoints.
pub struct EndpointHost {
    sessions: Arc<SessionManager>,
    validator: Arc<CertificateValidator>,
    nodes: Vec<NodeToCreate>,
}

impl EndpointHost {
    pub fn new(
        sessions: Arc<SessionManager>,
        validator: Arc<CertificateValidator>,
        nodes: Vec<NodeToCreate>,
    ) -> Self {
        Self {
            sessions,
            validator,
            nodes,
        }
    }

    /// Binds every distinct endpoint and starts serving until `running` is
    /// cleared.  Returns the distinct endpoint URLs in configuration order,
    /// with the port actually bound.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid URL or bind failure; nothing is served then.
    pub async fn start(
        &self,
        endpoints: &[String],
        running: Arc<AtomicBool>,
    ) -> Result<Vec<String>, ServerError> {
        if endpoints.is_empty() {
            return Err(ServerError::NoEndpoints);
        }

        let mut seen = BTreeSet::new();
        let mut bound = Vec::new();
        for url in endpoints {
            if !seen.insert(url.as_str()) {
                continue;
            }
            let endpoint = EndpointUrl::parse(url)?;
            let listener = TcpListener::bind((endpoint.host.as_str(), endpoint.port))
                .await
                .map_err(|source| ServerError::BindFailed {
                    addr: format!("{}:{}", endpoint.host, endpoint.port),
                    source,
                })?;
            let port = listener.local_addr()?.port();
            bound.push((endpoint.with_port(port), listener));
        }

        info!("loaded {} node descriptors", self.nodes.len());

        let mut urls = Vec::with_capacity(bound.len());
        for (url, listener) in bound {
            info!("endpoint listening on {url}");
            tokio::spawn(accept_loop(
                listener,
                Arc::clone(&self.sessions),
                Arc::clone(&self.validator),
                Arc::clone(&running),
            ));
            urls.push(url);
        }
        Ok(urls)
    }
}

async fn accept_loop(
    listener: TcpListener,
    sessions: Arc<SessionManager>,
    validator: Arc<CertificateValidator>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                debug!("connection from {peer}");
                let sessions = Arc::clone(&sessions);
                let validator = Arc::clone(&validator);
                tokio::spawn(async move {
                    match serve_connection(stream, peer, &sessions, &validator).await {
                        Ok(()) => debug!("connection {peer} closed"),
                        Err(e) => warn!("connection {peer} closed with error: {e}"),
                    }
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
    debug!("accept loop stopped");
}

/// Reads one command line of at most [`MAX_LINE_LEN`] bytes.  Returns `None`
/// at EOF.  The trailing `\n` or `\r\n` is stripped.
pub async fn read_command_line<R>(reader: &mut R) -> Result<Option<String>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LEN as u64 + 2)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    if buf.len() > MAX_LINE_LEN {
        return Err(ServerError::LineTooLong {
            limit: MAX_LINE_LEN,
        });
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| ServerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    sessions: &SessionManager,
    validator: &CertificateValidator,
) -> Result<(), ServerError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let first = match read_command_line(&mut reader).await {
        Ok(Some(line)) => line,
        Ok(None) => return Ok(()),
        Err(e @ ServerError::LineTooLong { .. }) => {
            writer.write_all(format!("ERR {e}\n").as_bytes()).await?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    let (session_name, chain_result, subject) = match ClientCommand::parse(&first) {
        Ok(ClientCommand::Hello {
            session_name,
            chain_result,
            subject,
        }) => (session_name, chain_result, subject),
        Ok(_) => {
            writer.write_all(b"ERR expected HELLO\n").await?;
            return Err(ServerError::Protocol {
                peer,
                reason: "first command must be HELLO".to_string(),
            });
        }
        Err(reason) => {
            writer.write_all(format!("ERR {reason}\n").as_bytes()).await?;
            return Err(ServerError::Protocol { peer, reason });
        }
    };

    if let Err(status) = validator.validate(&Certificate::new(subject), chain_result) {
        writer.write_all(format!("ERR {status}\n").as_bytes()).await?;
        return Err(ServerError::CertificateRejected(status));
    }

    let session = match sessions.create_session(&session_name, Utc::now()) {
        Ok(session) => session,
        Err(e) => {
            writer.write_all(format!("ERR {e}\n").as_bytes()).await?;
            return Err(e);
        }
    };
    let id = session.id().clone();
    writer.write_all(format!("OK {id}\n").as_bytes()).await?;

    let result = async {
        while let Some(line) = read_command_line(&mut reader).await? {
            sessions.touch_session(&id, Utc::now())?;
            match ClientCommand::parse(&line) {
                Ok(ClientCommand::Activate { identity }) => {
                    sessions.activate_session(&id, identity, Utc::now())?;
                    writer.write_all(b"OK\n").await?;
                }
                Ok(ClientCommand::Ping) => writer.write_all(b"OK\n").await?,
                Ok(ClientCommand::Bye) => break,
                Ok(ClientCommand::Hello { .. }) => {
                    writer.write_all(b"ERR session already open\n").await?
                }
                Err(reason) => writer.write_all(format!("ERR {reason}\n").as_bytes()).await?,
            }
        }
        Ok::<(), ServerError>(())
    }
    .await;

    sessions.close_session(&id)?;
    result
}
