// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! SSM session (C3): connect, credential-wrap if remote, run the launch
//! handshake of spec §4.3, send notifications, and detect peer-initiated
//! close.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, UnixStream};

use dv_core::Transport;

use crate::frame::{read_message, write_message, ProtocolError};
use crate::messages::{
    GetServerConfigQuery, Identity, ResponseServerConfig, ServerTypeTag, UpdateXAvail,
};
use crate::messages::Response as WireResponse;

/// The connected transport, local or remote, behind one `AsyncRead` +
/// `AsyncWrite` surface.
pub enum SsmStream {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl SsmStream {
    /// Wait for the socket to become readable, without consuming data —
    /// the event loop's entry point for detecting a peer-initiated close
    /// (§4.3 "Asynchronous signal").
    pub async fn readable(&self) -> std::io::Result<()> {
        match self {
            SsmStream::Unix(s) => s.readable().await,
            SsmStream::Tcp(s) => s.readable().await,
        }
    }

    /// True if the peer has closed its end: a zero-length `try_read`
    /// after the socket reports readable.
    pub fn peer_closed(&self) -> std::io::Result<bool> {
        let mut probe = [0u8; 1];
        match self {
            SsmStream::Unix(s) => match s.try_read(&mut probe) {
                Ok(0) => Ok(true),
                Ok(_) => Ok(false),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
                Err(e) => Err(e),
            },
            SsmStream::Tcp(s) => match s.try_read(&mut probe) {
                Ok(0) => Ok(true),
                Ok(_) => Ok(false),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(false),
                Err(e) => Err(e),
            },
        }
    }
}

impl AsyncRead for SsmStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            SsmStream::Unix(s) => Pin::new(s).poll_read(cx, buf),
            SsmStream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for SsmStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            SsmStream::Unix(s) => Pin::new(s).poll_write(cx, buf),
            SsmStream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            SsmStream::Unix(s) => Pin::new(s).poll_flush(cx),
            SsmStream::Tcp(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            SsmStream::Unix(s) => Pin::new(s).poll_shutdown(cx),
            SsmStream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

/// The outcome of a successful launch handshake (§4.3 steps 3-5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub owner: u32,
    pub server_type: ServerTypeTag,
}

/// An open, possibly-authenticated session with the State Manager.
pub struct SsmSession {
    stream: SsmStream,
    remote: bool,
    credential_mint: Option<PathBuf>,
    authenticated: bool,
}

impl SsmSession {
    /// Connect using the transport resolved from the master configuration
    /// (§6.1). `credential_mint` is required when `transport` is `Tcp`
    /// (remote) and ignored for `Unix` (local).
    pub async fn connect(
        transport: &Transport,
        credential_mint: Option<PathBuf>,
    ) -> std::io::Result<Self> {
        let (stream, remote) = match transport {
            Transport::Unix(path) => (SsmStream::Unix(UnixStream::connect(path).await?), false),
            Transport::Tcp { host, port } => {
                (SsmStream::Tcp(TcpStream::connect((host.as_str(), *port)).await?), true)
            }
        };
        Ok(Self {
            stream,
            remote,
            credential_mint,
            authenticated: false,
        })
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// True once a peer-initiated close has been observed.
    pub fn peer_closed(&self) -> std::io::Result<bool> {
        self.stream.peer_closed()
    }

    pub async fn readable(&self) -> std::io::Result<()> {
        self.stream.readable().await
    }

    async fn send_frame(&mut self, xml: &str) -> Result<(), ProtocolError> {
        let payload = if self.remote && !self.authenticated {
            let mint = self
                .credential_mint
                .as_deref()
                .ok_or_else(|| ProtocolError::Encode("remote session has no credential mint configured".into()))?;
            let minted = crate::credential::mint_credential(mint, xml.as_bytes()).await?;
            self.authenticated = true;
            minted
        } else {
            xml.as_bytes().to_vec()
        };
        write_message(&mut self.stream, &payload).await
    }

    async fn recv_frame(&mut self) -> Result<Vec<u8>, ProtocolError> {
        read_message(&mut self.stream).await
    }

    /// Run the launch handshake of §4.3: send the identity frame, send
    /// `get_serverconfig`, parse the response, and validate `server_type`
    /// matches what this variant expects.
    pub async fn handshake(
        &mut self,
        identity: &Identity,
        expected_type: ServerTypeTag,
    ) -> Result<Authorization, ProtocolError> {
        let identity_xml = identity.to_xml()?;
        self.send_frame(&identity_xml).await?;

        let query = GetServerConfigQuery::new(identity.clone());
        self.send_frame(&query.to_xml()?).await?;

        let raw = self.recv_frame().await?;
        let xml = std::str::from_utf8(&raw).map_err(|e| ProtocolError::Decode(e.to_string()))?;
        let response = WireResponse::from_xml(xml)?;

        if !response.is_success() {
            return Err(ProtocolError::Decode(
                response
                    .message
                    .unwrap_or_else(|| "SSM denied launch with no message".to_string()),
            ));
        }

        let ResponseServerConfig { owner, server_type } = response
            .return_value
            .serverconfig
            .ok_or_else(|| ProtocolError::Decode("response missing return_value/serverconfig".into()))?;

        if server_type != expected_type {
            return Err(ProtocolError::Decode(format!(
                "expected server_type {:?}, SSM returned {:?}",
                expected_type, server_type
            )));
        }

        Ok(Authorization { owner, server_type })
    }

    /// Notify the SSM the display server is ready (`newState=1`).
    pub async fn notify_ready(&mut self, identity: &Identity) -> Result<(), ProtocolError> {
        let msg = UpdateXAvail::ready(identity.clone());
        self.send_frame(&msg.to_xml()?).await
    }

    /// Notify the SSM the display server has exited (`newState=0`).
    /// Best-effort: spec §4.3 says failure here must not change the
    /// supervisor's exit code, so callers should log and ignore errors.
    pub async fn notify_exit(&mut self, identity: &Identity) -> Result<(), ProtocolError> {
        let msg = UpdateXAvail::exited(identity.clone());
        self.send_frame(&msg.to_xml()?).await
    }

    /// Helper for computing the local-vs-remote path of a config path the
    /// credential mint also needs, kept here since both concerns share
    /// the "is this session remote" question.
    pub fn credential_mint_path(&self) -> Option<&Path> {
        self.credential_mint.as_deref()
    }
}
