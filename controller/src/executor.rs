// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2024 Oxide Computer Company

//! Execution of a single register command, including its follow-up traffic.

use crate::probes;
use crate::Error;
use crate::Transport;
use crate::MAX_EXTENDED_READ_SIZE;
use itla_messages::register::address;
use itla_messages::CommandFrame;
use itla_messages::NopErrorKind;
use itla_messages::RegisterAddress;
use itla_messages::ResponseFrame;
use itla_messages::StatusOutcome;
use itla_messages::FRAME_SIZE;
use slog::debug;
use slog::error;
use slog::trace;
use slog::warn;
use slog::Logger;
use std::io;
use std::time::Duration;
use tokio::time::sleep;

// Drives one command at a time over the transport.
//
// A command may take several frames to resolve: a failed command is followed
// by a NOP read for the reason, a pending command by NOP polls until it
// completes, and an extended read by AEA-EAR reads until the module runs out
// of data. The command frame itself is never re-sent.
#[derive(Debug)]
pub(crate) struct Executor<T> {
    log: Logger,
    transport: T,
    poll_interval: Option<Duration>,
    max_pending_polls: usize,
}

impl<T: Transport> Executor<T> {
    pub(crate) fn new(
        log: Logger,
        transport: T,
        poll_interval: Option<Duration>,
        max_pending_polls: Option<usize>,
    ) -> Self {
        Self {
            log,
            transport,
            poll_interval,
            max_pending_polls: max_pending_polls.unwrap_or(usize::MAX),
        }
    }

    /// Run `command` to completion.
    ///
    /// Ordinary reads and writes return the 2-byte data word of the final
    /// response. Reads answered with extended data return the whole buffer
    /// drained through AEA-EAR.
    pub(crate) async fn execute(&mut self, command: CommandFrame) -> Result<Vec<u8>, Error> {
        let register = command.register;
        let response = self.transact(command).await?;
        match response.outcome() {
            StatusOutcome::Ok(data) => Ok(data.to_vec()),
            StatusOutcome::ExecutionFailed => Err(self.execution_failure(register).await),
            StatusOutcome::Pending => self.poll_pending(register).await.map(|d| d.to_vec()),
            StatusOutcome::ExtendedRead(length) => self.drain(register, length).await,
        }
    }

    // Send one frame and read back its response.
    //
    // The response must carry a valid checksum and echo `command.register`,
    // unless it announces extended data.
    async fn transact(&mut self, command: CommandFrame) -> Result<ResponseFrame, Error> {
        let register = command.register;
        let tx_buf = command.encode();
        self.transport.write(&tx_buf).await?;
        probes::frame__sent!(|| (register, tx_buf.as_ptr()));
        trace!(
            self.log,
            "sent command";
            "register" => register,
            "write" => command.write,
            "payload" => command.payload,
        );

        let mut rx_buf = [0u8; FRAME_SIZE];
        if let Err(e) = self.transport.read_exact(&mut rx_buf).await {
            return Err(match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::UnexpectedEof => {
                    debug!(
                        self.log,
                        "no response from module";
                        "register" => register,
                        "reason" => ?e,
                    );
                    Error::Timeout { register }
                }
                _ => Error::Io(e),
            });
        }
        probes::frame__received!(|| (register, rx_buf.as_ptr()));

        let response = match ResponseFrame::decode_for(rx_buf, register) {
            Ok(response) => response,
            Err(e) => {
                error!(
                    self.log,
                    "received bad response frame";
                    "register" => register,
                    "frame" => ?rx_buf,
                    "reason" => ?e,
                );
                probes::bad__frame!(|| (register, rx_buf.as_ptr(), "bad response frame"));
                return Err(Error::Protocol(e));
            }
        };
        trace!(
            self.log,
            "received response";
            "register" => response.register,
            "status" => ?response.status,
            "data" => ?response.data,
        );
        if response.communication_error {
            warn!(
                self.log,
                "module reported a communication error on a previous command";
                "register" => register,
            );
        }
        Ok(response)
    }

    // Read NOP after a command failed, and turn its error field into an error.
    async fn execution_failure(&mut self, register: RegisterAddress) -> Error {
        let nop = match self.transact(CommandFrame::read(address::NOP)).await {
            Ok(nop) => nop,
            Err(e) => return e,
        };
        let StatusOutcome::Ok(data) = nop.outcome() else {
            return Error::ProtocolInconsistency {
                register,
                reason: "NOP read after an execution error did not complete",
            };
        };
        match nop_error(register, data) {
            Ok(Some(kind)) => {
                warn!(
                    self.log,
                    "command failed";
                    "register" => register,
                    "kind" => ?kind,
                );
                Error::Device { register, kind }
            }
            Ok(None) => Error::ProtocolInconsistency {
                register,
                reason: "execution error without an error code in NOP",
            },
            Err(e) => e,
        }
    }

    // Poll NOP until a pending command completes.
    async fn poll_pending(&mut self, register: RegisterAddress) -> Result<[u8; 2], Error> {
        let mut attempts = 0;
        loop {
            if attempts >= self.max_pending_polls {
                warn!(
                    self.log,
                    "command still pending, giving up";
                    "register" => register,
                    "attempts" => attempts,
                );
                return Err(Error::PendingTimeout { register, attempts });
            }
            if let Some(interval) = self.poll_interval {
                sleep(interval).await;
            }
            attempts += 1;
            probes::pending__poll!(|| (register, attempts as u64));

            let nop = self.transact(CommandFrame::read(address::NOP)).await?;
            match nop.outcome() {
                StatusOutcome::Pending => {
                    debug!(
                        self.log,
                        "command pending";
                        "register" => register,
                        "attempts" => attempts,
                    );
                }
                StatusOutcome::Ok(data) => {
                    return match nop_error(register, data)? {
                        Some(kind) => {
                            warn!(
                                self.log,
                                "pending command failed";
                                "register" => register,
                                "kind" => ?kind,
                            );
                            Err(Error::Device { register, kind })
                        }
                        None => {
                            debug!(
                                self.log,
                                "pending command complete";
                                "register" => register,
                                "attempts" => attempts,
                            );
                            Ok(data)
                        }
                    };
                }
                StatusOutcome::ExecutionFailed => {
                    return Err(self.execution_failure(register).await);
                }
                StatusOutcome::ExtendedRead(_) => {
                    return Err(Error::ProtocolInconsistency {
                        register,
                        reason: "NOP announced extended data while polling",
                    });
                }
            }
        }
    }

    // Drain an extended read through AEA-EAR.
    //
    // The module signals the end of the data by failing the next AEA-EAR read
    // with an extended address range error.
    async fn drain(&mut self, register: RegisterAddress, length: u16) -> Result<Vec<u8>, Error> {
        debug!(
            self.log,
            "draining extended read";
            "register" => register,
            "advertised_length" => length,
        );
        let mut buf = Vec::with_capacity(usize::from(length));
        loop {
            let response = self.transact(CommandFrame::read(address::AEA_EAR)).await?;
            match response.outcome() {
                StatusOutcome::Ok(_) | StatusOutcome::ExtendedRead(_) => {
                    buf.extend_from_slice(&response.data);
                    if buf.len() > MAX_EXTENDED_READ_SIZE {
                        return Err(Error::ProtocolInconsistency {
                            register,
                            reason: "extended read exceeds the maximum size",
                        });
                    }
                }
                StatusOutcome::ExecutionFailed => break,
                StatusOutcome::Pending => {
                    return Err(Error::ProtocolInconsistency {
                        register,
                        reason: "pending status during an extended read",
                    });
                }
            }
        }

        let nop = self.transact(CommandFrame::read(address::NOP)).await?;
        let StatusOutcome::Ok(data) = nop.outcome() else {
            return Err(Error::ProtocolInconsistency {
                register,
                reason: "NOP read after an extended read did not complete",
            });
        };
        match nop_error(register, data)? {
            Some(NopErrorKind::ExtendedAddressRangeError) => {
                if buf.len() != usize::from(length) {
                    debug!(
                        self.log,
                        "extended read length differs from advertised";
                        "register" => register,
                        "advertised_length" => length,
                        "length" => buf.len(),
                    );
                }
                Ok(buf)
            }
            Some(kind) => {
                warn!(
                    self.log,
                    "extended read failed";
                    "register" => register,
                    "kind" => ?kind,
                    "n_bytes_discarded" => buf.len(),
                );
                Err(Error::Device { register, kind })
            }
            None => Err(Error::ProtocolInconsistency {
                register,
                reason: "extended read ended without an error code in NOP",
            }),
        }
    }
}

// Decode the error field of a NOP data word. Reserved codes are a protocol
// inconsistency, not a device error.
fn nop_error(register: RegisterAddress, data: [u8; 2]) -> Result<Option<NopErrorKind>, Error> {
    NopErrorKind::from_field(NopErrorKind::field(data)).map_err(|_| Error::ProtocolInconsistency {
        register,
        reason: "NOP reported a reserved error code",
    })
}
