// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Helpers for testing against a scripted laser module.

use crate::Config;
use crate::Controller;
use crate::SerialLink;
use itla_messages::register::address;
use itla_messages::CommandFrame;
use itla_messages::NopErrorKind;
use itla_messages::RegisterAddress;
use itla_messages::ResponseFrame;
use itla_messages::StatusCode;
use itla_messages::FRAME_SIZE;
use slog::o;
use slog::Drain;
use slog::Logger;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

pub(crate) fn test_logger() -> Logger {
    let decorator = slog_term::PlainSyncDecorator::new(slog_term::TestStdoutWriter);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    Logger::root(drain, o!())
}

/// How the mock module answers a command.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Reply {
    /// Send a well-formed response.
    Frame(ResponseFrame),
    /// Send these exact bytes.
    Raw([u8; FRAME_SIZE]),
    /// Never answer, holding the link open.
    Silent,
}

/// One command the mock module expects, and its reply.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Exchange {
    pub expect: CommandFrame,
    pub reply: Reply,
}

impl Exchange {
    pub(crate) fn new(expect: CommandFrame, reply: Reply) -> Self {
        Self { expect, reply }
    }
}

pub(crate) fn respond(status: StatusCode, register: RegisterAddress, word: u16) -> Reply {
    Reply::Frame(ResponseFrame::new(status, register, word.to_be_bytes()))
}

pub(crate) fn ok(register: RegisterAddress, word: u16) -> Reply {
    respond(StatusCode::Ok, register, word)
}

pub(crate) fn pending(register: RegisterAddress) -> Reply {
    respond(StatusCode::CommandPending, register, 0)
}

pub(crate) fn failed(register: RegisterAddress) -> Reply {
    respond(StatusCode::ExecutionError, register, 0)
}

/// A successful NOP read carrying the raw word `word`.
pub(crate) fn nop_code(word: u16) -> Reply {
    ok(address::NOP, word)
}

/// A successful NOP read reporting `kind`, with the module ready.
pub(crate) fn nop_error(kind: NopErrorKind) -> Reply {
    nop_code(0x0010 | u16::from(u8::from(kind)))
}

/// The exchanges of a read of `register` that returns `bytes` through
/// extended addressing.
///
/// An odd trailing byte is padded with NUL.
pub(crate) fn extended_read(register: RegisterAddress, bytes: &[u8]) -> Vec<Exchange> {
    let ear = CommandFrame::read(address::AEA_EAR);
    let mut script = vec![Exchange::new(
        CommandFrame::read(register),
        respond(StatusCode::ExtendedRead, register, bytes.len() as u16),
    )];
    script.extend(bytes.chunks(2).map(|chunk| {
        let word = [chunk[0], chunk.get(1).copied().unwrap_or(0)];
        Exchange::new(
            ear,
            Reply::Frame(ResponseFrame::new(StatusCode::Ok, address::AEA_EAR, word)),
        )
    }));
    script.push(Exchange::new(ear, failed(address::AEA_EAR)));
    script.push(Exchange::new(
        CommandFrame::read(address::NOP),
        nop_error(NopErrorKind::ExtendedAddressRangeError),
    ));
    script
}

/// A fake module on the far end of an in-memory link.
///
/// The module expects exactly the scripted commands, in order, and panics on
/// anything else.
#[derive(Debug)]
pub(crate) struct MockLaser {
    stream: DuplexStream,
    script: VecDeque<Exchange>,
}

impl MockLaser {
    /// Create a mock module and the host side of its link.
    pub(crate) fn new(
        script: Vec<Exchange>,
        timeout: Duration,
    ) -> (SerialLink<DuplexStream>, Self) {
        let (host, stream) = tokio::io::duplex(256);
        let laser = Self {
            stream,
            script: script.into(),
        };
        (SerialLink::new(host, timeout), laser)
    }

    /// Play the script, returning every command received.
    pub(crate) async fn run(mut self) -> Vec<CommandFrame> {
        let mut seen = Vec::new();
        while let Some(exchange) = self.script.pop_front() {
            let mut buf = [0u8; FRAME_SIZE];
            self.stream
                .read_exact(&mut buf)
                .await
                .expect("failed to read command frame");
            let command = CommandFrame::decode(buf).expect("command has a bad checksum");
            assert_eq!(command, exchange.expect, "unexpected command");
            seen.push(command);
            match exchange.reply {
                Reply::Frame(response) => self
                    .stream
                    .write_all(&response.encode())
                    .await
                    .expect("failed to write response"),
                Reply::Raw(bytes) => self
                    .stream
                    .write_all(&bytes)
                    .await
                    .expect("failed to write response"),
                Reply::Silent => std::future::pending::<()>().await,
            }
        }
        seen
    }
}

/// Create a controller talking to a mock module playing `script`.
///
/// The handle resolves to the commands the module received once the script
/// is exhausted.
pub(crate) fn controller_with(
    config: Config,
    script: Vec<Exchange>,
) -> (Controller<SerialLink<DuplexStream>>, JoinHandle<Vec<CommandFrame>>) {
    let (link, laser) = MockLaser::new(script, config.response_timeout);
    let controller = Controller::new(config, test_logger(), link).unwrap();
    (controller, tokio::spawn(laser.run()))
}
