// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! The byte link between the host and a laser module.

use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

/// A bidirectional byte link to a single module.
///
/// Reads are expected to give up after some implementation-defined timeout,
/// reporting `io::ErrorKind::TimedOut`. A link that reaches end-of-file in
/// the middle of a read reports `io::ErrorKind::UnexpectedEof`. Both are
/// treated as a missing response.
///
/// Dropping one of these futures before it completes may leave part of a
/// frame on the wire, after which the link is in an undefined state.
pub trait Transport: Send {
    /// Write all of `bytes` to the module.
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Fill `buf` with bytes from the module.
    fn read_exact(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<()>> + Send;
}

/// A [`Transport`] over any async byte stream, with a timeout on each read.
///
/// This is usually a `tokio_serial::SerialStream`.
#[derive(Debug)]
pub struct SerialLink<S> {
    stream: S,
    timeout: Duration,
}

impl<S> SerialLink<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    /// Wrap a stream, timing out reads after `timeout`.
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self { stream, timeout }
    }

    /// Return the read timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Consume the link, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for SerialLink<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        match tokio::time::timeout(self.timeout, self.stream.read_exact(buf)).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out waiting for module response",
            )),
        }
    }
}
