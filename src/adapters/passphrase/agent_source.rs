use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use secrecy::SecretString;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::core::errors::{KeepError, Result};
use crate::core::traits::passphrase::{KeyPrompt, PassphraseSource, StrategyKind};

/// Error code gpg-agent answers with when the cache has no entry and no
/// pinentry could be asked (`GPG_ERR_NO_DATA` from the agent source).
pub const AGENT_CACHE_MISS: u32 = 67_108_922;

/// One reply of the agent to a command.
enum Reply {
    /// `OK [text]`, plus any `D` lines that preceded it.
    Ok { text: String, data: Vec<u8> },
    /// `ERR <code> [description]`.
    Err { code: u32, description: String },
}

/// A client connection speaking the Assuan line protocol.
///
/// The handshake reads the agent greeting; dropping the connection sends
/// `BYE` so the agent releases it right away.
pub struct AgentConnection<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl AgentConnection<BufReader<UnixStream>, UnixStream> {
    pub fn connect(socket: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket).map_err(|e| KeepError::Agent {
            detail: format!("cannot connect to {}: {e}", socket.display()),
        })?;
        let reader = BufReader::new(stream.try_clone()?);
        Self::handshake(reader, stream)
    }
}

impl<R: BufRead, W: Write> AgentConnection<R, W> {
    pub fn handshake(reader: R, writer: W) -> Result<Self> {
        let mut conn = Self { reader, writer };
        match conn.read_reply()? {
            Reply::Ok { .. } => Ok(conn),
            Reply::Err { description, .. } => Err(KeepError::Agent {
                detail: format!("agent refused the connection: {description}"),
            }),
        }
    }

    pub fn set_option(&mut self, option: &str) -> Result<()> {
        self.expect_ok(&format!("OPTION {option}"))
    }

    /// Ask for the passphrase cached under `cache_id`, letting the agent
    /// run its pinentry when needed. `None` on a cache miss.
    pub fn get_passphrase(
        &mut self,
        cache_id: &str,
        error: Option<&str>,
        prompt: &str,
        description: &str,
    ) -> Result<Option<SecretString>> {
        let line = format!(
            "GET_PASSPHRASE {} {} {} {}",
            escape(cache_id),
            error.map(escape).unwrap_or_else(|| "X".into()),
            escape(prompt),
            escape(description),
        );

        match self.command(&line)? {
            Reply::Ok { text, data } => {
                let text = Zeroizing::new(text);
                let data = Zeroizing::new(data);
                let bytes = if data.is_empty() {
                    Zeroizing::new(hex::decode(text.trim()).map_err(|_| KeepError::Agent {
                        detail: "malformed GET_PASSPHRASE reply".into(),
                    })?)
                } else {
                    data
                };
                let passphrase =
                    String::from_utf8(bytes.to_vec()).map_err(|_| KeepError::Agent {
                        detail: "passphrase is not valid UTF-8".into(),
                    })?;
                Ok(Some(SecretString::from(passphrase)))
            }
            Reply::Err { code, .. } if code == AGENT_CACHE_MISS => Ok(None),
            Reply::Err { code, description } => Err(KeepError::Agent {
                detail: format!("GET_PASSPHRASE failed: {description} ({code})"),
            }),
        }
    }

    pub fn clear_passphrase(&mut self, cache_id: &str) -> Result<()> {
        self.expect_ok(&format!("CLEAR_PASSPHRASE {}", escape(cache_id)))
    }

    fn expect_ok(&mut self, line: &str) -> Result<()> {
        match self.command(line)? {
            Reply::Ok { .. } => Ok(()),
            Reply::Err { code, description } => Err(KeepError::Agent {
                detail: format!("{description} ({code})"),
            }),
        }
    }

    fn command(&mut self, line: &str) -> Result<Reply> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.read_reply()
    }

    fn read_reply(&mut self) -> Result<Reply> {
        let mut data = Vec::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(KeepError::Agent {
                    detail: "connection closed by the agent".into(),
                });
            }
            let line = line.trim_end_matches(['\r', '\n']);

            if line == "OK" {
                return Ok(Reply::Ok {
                    text: String::new(),
                    data,
                });
            }
            if let Some(text) = line.strip_prefix("OK ") {
                return Ok(Reply::Ok {
                    text: text.to_string(),
                    data,
                });
            }
            if let Some(rest) = line.strip_prefix("ERR ") {
                let (code, description) = rest.split_once(' ').unwrap_or((rest, ""));
                return Ok(Reply::Err {
                    code: code.parse().unwrap_or(0),
                    description: description.to_string(),
                });
            }
            if let Some(chunk) = line.strip_prefix("D ") {
                data.extend(unescape(chunk));
                continue;
            }
            if line.starts_with("INQUIRE ") {
                self.writer.write_all(b"CAN\n")?;
                self.writer.flush()?;
                continue;
            }
            if line == "S" || line.starts_with("S ") || line.starts_with('#') {
                continue;
            }
            return Err(KeepError::Agent {
                detail: "unexpected reply from the agent".into(),
            });
        }
    }
}

impl<R: BufRead, W: Write> Drop for AgentConnection<R, W> {
    fn drop(&mut self) {
        if self
            .writer
            .write_all(b"BYE\n")
            .and_then(|()| self.writer.flush())
            .is_err()
        {
            debug!("agent connection already gone");
        }
    }
}

/// Percent-escape an Assuan argument; spaces become `+`.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ' ' => out.push('+'),
            '+' | '%' | '"' => out.push_str(&format!("%{:02X}", c as u32)),
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for b in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{b:02X}"));
                }
            }
            c => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(b) = decoded {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Passphrase source backed by a running gpg-agent.
///
/// The fingerprint of each candidate key is its cache id, so a passphrase
/// entered once is reused by later invocations until the agent expires it.
pub struct AgentSource<R: BufRead, W: Write> {
    conn: AgentConnection<R, W>,
}

pub type UnixAgentSource = AgentSource<BufReader<UnixStream>, UnixStream>;

impl UnixAgentSource {
    pub fn connect(socket: &Path, tty: Option<&str>) -> Result<Self> {
        Self::with_connection(AgentConnection::connect(socket)?, tty)
    }
}

impl<R: BufRead, W: Write> AgentSource<R, W> {
    pub fn with_connection(mut conn: AgentConnection<R, W>, tty: Option<&str>) -> Result<Self> {
        if let Some(tty) = tty {
            conn.set_option(&format!("ttyname={tty}"))?;
        }
        Ok(Self { conn })
    }
}

impl<R: BufRead, W: Write> PassphraseSource for AgentSource<R, W> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AgentBacked
    }

    fn passphrase_for(&mut self, key: &KeyPrompt) -> Result<Option<SecretString>> {
        let description = match &key.user_id {
            Some(uid) => format!(
                "Please enter the passphrase to unlock the OpenPGP secret key {} ({uid})",
                key.short_id
            ),
            None => format!(
                "Please enter the passphrase to unlock the OpenPGP secret key {}",
                key.short_id
            ),
        };
        info!(key = %key.short_id, "asking gpg-agent for passphrase");
        self.conn
            .get_passphrase(&key.fingerprint, None, "Passphrase", &description)
    }

    fn reject(&mut self, key: &KeyPrompt) -> Result<()> {
        if let Err(e) = self.conn.clear_passphrase(&key.fingerprint) {
            warn!(key = %key.short_id, error = %e, "cannot remove the key from the agent cache");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::thread::JoinHandle;

    use secrecy::ExposeSecret;

    use super::*;

    type Client = AgentConnection<BufReader<UnixStream>, UnixStream>;

    /// Fake agent: greets, answers `GET_PASSPHRASE` with `passphrase_reply`
    /// and every other command with `OK`, and returns the lines it received.
    fn fake_agent(passphrase_reply: &'static str) -> (Client, JoinHandle<Vec<String>>) {
        let (client, server) = UnixStream::pair().unwrap();
        let handle = std::thread::spawn(move || {
            let mut writer = server.try_clone().unwrap();
            let reader = BufReader::new(server);
            writer.write_all(b"OK Pleased to meet you\n").unwrap();

            let mut received = Vec::new();
            for line in reader.lines() {
                let line = line.unwrap();
                let reply = if line.starts_with("GET_PASSPHRASE ") {
                    format!("S PROGRESS\n{passphrase_reply}\n")
                } else if line == "BYE" {
                    "OK closing connection\n".to_string()
                } else {
                    "OK\n".to_string()
                };
                let done = line == "BYE";
                received.push(line);
                let _ = writer.write_all(reply.as_bytes());
                if done {
                    break;
                }
            }
            received
        });

        let conn = AgentConnection::handshake(BufReader::new(client.try_clone().unwrap()), client)
            .unwrap();
        (conn, handle)
    }

    fn prompt() -> KeyPrompt {
        KeyPrompt {
            short_id: "DEADBEEF".into(),
            fingerprint: "0123456789ABCDEFDEADBEEF".into(),
            user_id: Some("Alice <alice@example.com>".into()),
        }
    }

    #[test]
    fn returns_hex_decoded_passphrase() {
        let (mut conn, agent) = fake_agent("OK 68756E74657232");

        let answer = conn
            .get_passphrase("CACHE", None, "Passphrase", "unlock it")
            .unwrap()
            .unwrap();
        drop(conn);

        assert_eq!(answer.expose_secret(), "hunter2");
        let received = agent.join().unwrap();
        assert_eq!(received[0], "GET_PASSPHRASE CACHE X Passphrase unlock+it");
        assert_eq!(received.last().map(String::as_str), Some("BYE"));
    }

    #[test]
    fn cache_miss_is_no_answer() {
        let (mut conn, _agent) = fake_agent("ERR 67108922 No data <GPG Agent>");
        let answer = conn
            .get_passphrase("CACHE", None, "Passphrase", "unlock it")
            .unwrap();
        assert!(answer.is_none());
    }

    #[test]
    fn other_agent_errors_are_reported() {
        let (mut conn, _agent) = fake_agent("ERR 83886179 Operation cancelled <Pinentry>");
        let err = conn
            .get_passphrase("CACHE", None, "Passphrase", "unlock it")
            .unwrap_err();
        assert!(matches!(err, KeepError::Agent { .. }));
    }

    #[test]
    fn source_sets_tty_and_evicts_rejected_key() {
        let (conn, agent) = fake_agent("OK 77726F6E67");
        let mut source = AgentSource::with_connection(conn, Some("/dev/pts/3")).unwrap();

        let answer = source.passphrase_for(&prompt()).unwrap().unwrap();
        assert_eq!(answer.expose_secret(), "wrong");
        source.reject(&prompt()).unwrap();
        drop(source);

        let received = agent.join().unwrap();
        assert_eq!(received[0], "OPTION ttyname=/dev/pts/3");
        assert!(received[1].starts_with("GET_PASSPHRASE 0123456789ABCDEFDEADBEEF X "));
        assert!(received[1].ends_with("DEADBEEF+(Alice+<alice@example.com>)"));
        assert_eq!(received[2], "CLEAR_PASSPHRASE 0123456789ABCDEFDEADBEEF");
        assert_eq!(received[3], "BYE");
        assert_eq!(received.len(), 4);
    }

    #[test]
    fn escape_follows_assuan_rules() {
        assert_eq!(escape("a b+c%d"), "a+b%2Bc%25d");
        assert_eq!(escape("line\nbreak"), "line%0Abreak");
    }

    #[test]
    fn unescape_decodes_percent_sequences() {
        assert_eq!(unescape("a%25b%0A"), b"a%b\n");
        assert_eq!(unescape("100%"), b"100%");
    }
}
