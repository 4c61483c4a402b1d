//! Command/response transport to the AUX bus.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, trace, warn};

use crate::error::{Result, TransportError};
use crate::protocol::{AuxCommand, MAX_FRAME, START_BYTE};

/// Sends one AUX command and returns the device's reply.
///
/// Implementations must drop the bus echo of the sent frame and fail with
/// [`TransportError::Timeout`] when no reply arrives in time.
#[async_trait]
pub trait MountTransport: Send {
    /// Send `command` and wait for the matching response.
    async fn send_command(&mut self, command: &AuxCommand) -> Result<AuxCommand>;
}

#[async_trait]
impl<T: MountTransport + ?Sized> MountTransport for Box<T> {
    async fn send_command(&mut self, command: &AuxCommand) -> Result<AuxCommand> {
        (**self).send_command(command).await
    }
}

/// AUX transport over any byte stream, e.g. a TCP socket to a WiFi mount.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    timeout: Duration,
}

impl StreamTransport<TcpStream> {
    /// Connect to a mount's TCP bridge.
    pub async fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Timeout)??;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream, timeout))
    }
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream.
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self { stream, timeout }
    }

    /// Round-trip deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Read frames until the reply to `command` arrives.
    async fn read_response(&mut self, command: &AuxCommand) -> Result<AuxCommand> {
        loop {
            let frame = self.read_frame().await?;
            if frame.is_echo_of(command) {
                trace!("skipping echo");
                continue;
            }
            if frame.source == command.destination && frame.command == command.command {
                return Ok(frame);
            }
            debug!(
                source = %frame.source,
                command = %frame.command,
                "skipping unrelated frame"
            );
        }
    }

    /// Read the next well-framed message, skipping noise before the start
    /// byte and frames that fail to decode.
    async fn read_frame(&mut self) -> Result<AuxCommand> {
        let mut frame = [0u8; MAX_FRAME];
        loop {
            if self.stream.read_u8().await? != START_BYTE {
                continue;
            }
            let len = self.stream.read_u8().await?;
            let total = usize::from(len) + 3;
            if total > MAX_FRAME || len < 3 {
                debug!(len, "discarding frame with bad length");
                continue;
            }
            frame[0] = START_BYTE;
            frame[1] = len;
            self.stream.read_exact(&mut frame[2..total]).await?;

            match AuxCommand::decode_lenient(&frame[..total]) {
                Ok(decoded) => {
                    if let Some(err) = decoded.checksum_error {
                        warn!(error = %err, command = %decoded.command.command, "AUX checksum mismatch");
                    }
                    return Ok(decoded.command);
                }
                Err(err) => debug!(error = %err, "discarding undecodable frame"),
            }
        }
    }
}

#[async_trait]
impl<S> MountTransport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_command(&mut self, command: &AuxCommand) -> Result<AuxCommand> {
        trace!(
            destination = %command.destination,
            command = %command.command,
            payload = ?command.payload.as_slice(),
            "sending"
        );
        self.stream.write_all(&command.encode()).await?;
        self.stream.flush().await?;

        let deadline = self.timeout;
        let response = tokio::time::timeout(deadline, self.read_response(command))
            .await
            .map_err(|_| TransportError::Timeout)?;

        if let Err(err) = &response {
            warn!(error = %err, command = %command.command, "AUX round trip failed");
        }
        response
    }
}
