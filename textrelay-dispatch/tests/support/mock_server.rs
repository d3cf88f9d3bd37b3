//! Mock SMTP relay for transport tests.
//!
//! The server can:
//! - Answer each command with a configurable reply
//! - Advertise STARTTLS and AUTH, and drop the connection after agreeing to
//!   STARTTLS to simulate a failed handshake
//! - Hang on the Nth command to exercise timeouts
//! - Record every command and message body it receives
//!
//! ```rust,no_run
//! use support::mock_server::MockSmtpServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = MockSmtpServer::builder()
//!     .with_rcpt_to_response(550, "User unknown")
//!     .build()
//!     .await?;
//!
//! // Point a relay at server.addr() and send.
//!
//! server.shutdown();
//! # Ok(())
//! # }
//! ```

#![allow(dead_code)]

use std::{
    fmt::Write,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    time::timeout,
};

/// SMTP command received by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    Ehlo(String),
    /// `AUTH` with its mechanism and initial response
    Auth(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    /// Message content between DATA and the terminating dot, still stuffed
    MessageContent(String),
    Quit,
    StartTls,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct SmtpResponse {
    pub code: u16,
    pub message: String,
}

impl SmtpResponse {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!("{} {}\r\n", self.code, self.message).into_bytes()
    }
}

#[derive(Clone)]
struct EhloResponse {
    code: u16,
    capabilities: Vec<String>,
}

impl EhloResponse {
    fn to_bytes(&self) -> Vec<u8> {
        let mut response = String::new();
        let last = self.capabilities.len().saturating_sub(1);

        for (i, cap) in self.capabilities.iter().enumerate() {
            let separator = if i < last { '-' } else { ' ' };
            let _ = write!(&mut response, "{}{separator}{cap}\r\n", self.code);
        }

        response.into_bytes()
    }
}

#[derive(Clone)]
struct MockServerConfig {
    greeting: SmtpResponse,
    ehlo_response: EhloResponse,
    auth_response: SmtpResponse,
    mail_from_response: SmtpResponse,
    rcpt_to_response: SmtpResponse,
    data_response: SmtpResponse,
    data_end_response: SmtpResponse,
    quit_response: Option<SmtpResponse>,
    starttls_response: Option<SmtpResponse>,
    timeout_on_command: Option<usize>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            greeting: SmtpResponse::new(220, "Mock SMTP Relay"),
            ehlo_response: EhloResponse {
                code: 250,
                capabilities: vec!["localhost".to_string(), "AUTH PLAIN LOGIN".to_string()],
            },
            auth_response: SmtpResponse::new(235, "2.7.0 Authentication successful"),
            mail_from_response: SmtpResponse::new(250, "OK"),
            rcpt_to_response: SmtpResponse::new(250, "OK"),
            data_response: SmtpResponse::new(354, "Start mail input; end with <CRLF>.<CRLF>"),
            data_end_response: SmtpResponse::new(250, "OK: Message accepted"),
            quit_response: Some(SmtpResponse::new(221, "Bye")),
            starttls_response: None,
            timeout_on_command: None,
        }
    }
}

pub struct MockSmtpServer {
    addr: SocketAddr,
    commands_received: Arc<RwLock<Vec<SmtpCommand>>>,
    shutdown: Arc<AtomicBool>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::new()
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Commands received so far, across all connections.
    pub async fn commands(&self) -> Vec<SmtpCommand> {
        self.commands_received.read().await.clone()
    }

    /// Bodies of every message accepted for delivery.
    pub async fn messages(&self) -> Vec<String> {
        self.commands_received
            .read()
            .await
            .iter()
            .filter_map(|command| match command {
                SmtpCommand::MessageContent(content) => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    async fn handle_client(
        mut stream: TcpStream,
        config: Arc<MockServerConfig>,
        commands: Arc<RwLock<Vec<SmtpCommand>>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        let mut command_index = 0;

        writer.write_all(&config.greeting.to_bytes()).await?;
        writer.flush().await?;

        loop {
            line.clear();

            if config.timeout_on_command == Some(command_index) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                return Ok(());
            }

            let Ok(read) = timeout(Duration::from_secs(10), reader.read_line(&mut line)).await
            else {
                return Ok(());
            };
            if read? == 0 {
                return Ok(());
            }
            command_index += 1;

            let cmd_line = line.trim_end_matches(['\r', '\n']).to_string();
            tracing::debug!("Mock server received: {cmd_line}");

            let (verb, argument) = cmd_line.split_once(" ").unwrap_or((cmd_line.as_str(), ""));
            let argument = argument.to_string();

            let (response, smtp_cmd) = match verb.to_uppercase().as_str() {
                "EHLO" => (config.ehlo_response.to_bytes(), SmtpCommand::Ehlo(argument)),
                "AUTH" => (config.auth_response.to_bytes(), SmtpCommand::Auth(argument)),
                "MAIL" => (
                    config.mail_from_response.to_bytes(),
                    SmtpCommand::MailFrom(argument),
                ),
                "RCPT" => (config.rcpt_to_response.to_bytes(), SmtpCommand::RcptTo(argument)),
                "DATA" => (config.data_response.to_bytes(), SmtpCommand::Data),
                "QUIT" => {
                    commands.write().await.push(SmtpCommand::Quit);
                    if let Some(quit) = &config.quit_response {
                        writer.write_all(&quit.to_bytes()).await?;
                        writer.flush().await?;
                    }
                    return Ok(());
                }
                "STARTTLS" => {
                    commands.write().await.push(SmtpCommand::StartTls);
                    let Some(starttls) = &config.starttls_response else {
                        writer
                            .write_all(&SmtpResponse::new(502, "Command not implemented").to_bytes())
                            .await?;
                        continue;
                    };
                    writer.write_all(&starttls.to_bytes()).await?;
                    writer.flush().await?;
                    if starttls.code == 220 {
                        // No TLS here: hang up mid-handshake.
                        return Ok(());
                    }
                    continue;
                }
                _ => (
                    SmtpResponse::new(500, "Unknown command").to_bytes(),
                    SmtpCommand::Other(cmd_line.clone()),
                ),
            };

            commands.write().await.push(smtp_cmd.clone());
            writer.write_all(&response).await?;
            writer.flush().await?;

            if smtp_cmd == SmtpCommand::Data && config.data_response.code == 354 {
                let mut content = String::new();
                let mut data_line = String::new();

                loop {
                    data_line.clear();
                    if reader.read_line(&mut data_line).await? == 0 {
                        return Ok(());
                    }
                    if data_line == ".\r\n" {
                        break;
                    }
                    content.push_str(&data_line);
                }

                commands
                    .write()
                    .await
                    .push(SmtpCommand::MessageContent(content));
                writer
                    .write_all(&config.data_end_response.to_bytes())
                    .await?;
                writer.flush().await?;
            }
        }
    }
}

pub struct MockSmtpServerBuilder {
    config: MockServerConfig,
}

impl MockSmtpServerBuilder {
    fn new() -> Self {
        Self {
            config: MockServerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_greeting(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.greeting = SmtpResponse::new(code, message);
        self
    }

    /// Lines of the EHLO reply; the first is the server name.
    #[must_use]
    pub fn with_ehlo_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.config.ehlo_response.capabilities =
            capabilities.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_auth_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.auth_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_mail_from_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.mail_from_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.rcpt_to_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_data_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.data_response = SmtpResponse::new(code, message);
        self
    }

    /// Reply after the terminating `<CRLF>.<CRLF>`.
    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.data_end_response = SmtpResponse::new(code, message);
        self
    }

    /// Close the connection on QUIT without replying.
    #[must_use]
    pub fn without_quit_response(mut self) -> Self {
        self.config.quit_response = None;
        self
    }

    /// Reply to STARTTLS. A 220 makes the server hang up instead of
    /// negotiating TLS.
    #[must_use]
    pub fn with_starttls_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.starttls_response = Some(SmtpResponse::new(code, message));
        self
    }

    /// Hang on the Nth command (0-indexed) of every connection.
    #[must_use]
    pub const fn with_timeout_on_command(mut self, command_index: usize) -> Self {
        self.config.timeout_on_command = Some(command_index);
        self
    }

    /// Binds to a random loopback port and starts serving.
    pub async fn build(self) -> Result<MockSmtpServer, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = Arc::new(self.config);
        let commands = Arc::new(RwLock::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let commands_clone = Arc::clone(&commands);
        let shutdown_clone = Arc::clone(&shutdown);

        tokio::spawn(async move {
            while !shutdown_clone.load(Ordering::Relaxed) {
                let Ok(Ok((stream, _peer))) =
                    timeout(Duration::from_millis(100), listener.accept()).await
                else {
                    continue;
                };

                let config = Arc::clone(&config);
                let commands = Arc::clone(&commands_clone);
                tokio::spawn(async move {
                    if let Err(e) = MockSmtpServer::handle_client(stream, config, commands).await {
                        tracing::debug!("Mock server client error: {e}");
                    }
                });
            }
        });

        Ok(MockSmtpServer {
            addr,
            commands_received: commands,
            shutdown,
        })
    }
}
