//! Shared test fixtures: a scripted in-memory motor controller.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use aux_mount::error::{Error, Result, TransportError};
use aux_mount::mount::MountTransport;
use aux_mount::protocol::{pack_int3_steps, AuxCommand, CommandCode, DeviceId};

/// Mutable state behind a [`MockTransport`].
#[derive(Debug, Default)]
pub struct MockState {
    /// Every command received, in order.
    pub log: Vec<AuxCommand>,
    /// Encoder positions (azimuth, altitude).
    pub positions: [u32; 2],
    /// Cord-wrap position.
    pub cord_wrap: u32,
    /// Number of slew-done polls to answer "still moving" before "done".
    pub busy_polls: u32,
    /// Never answer, to exercise timeouts.
    pub silent: bool,
    /// Commands answered with a closed-connection error.
    pub reject: Vec<(CommandCode, DeviceId)>,
}

/// Records every command and answers like an idle motor controller that
/// reaches its GoTo target instantly.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    pub state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(azm: u32, alt: u32) -> Self {
        let transport = Self::default();
        transport.state.lock().positions = [azm, alt];
        transport
    }

    pub fn log(&self) -> Vec<AuxCommand> {
        self.state.lock().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }

    /// GoTo commands as (device, steps, command).
    pub fn gotos(&self) -> Vec<(DeviceId, u32, CommandCode)> {
        self.log()
            .into_iter()
            .filter(|c| c.command == CommandCode::MC_GOTO_FAST || c.command == CommandCode::MC_GOTO_SLOW)
            .map(|c| (c.destination, c.steps().unwrap(), c.command))
            .collect()
    }

    /// Fail every `code` sent to `device`.
    pub fn reject(&self, code: CommandCode, device: DeviceId) {
        self.state.lock().reject.push((code, device));
    }

    /// Commands with the given code.
    pub fn commands(&self, code: CommandCode) -> Vec<AuxCommand> {
        self.log().into_iter().filter(|c| c.command == code).collect()
    }

    fn index(device: DeviceId) -> usize {
        if device == DeviceId::ALT {
            1
        } else {
            0
        }
    }
}

fn reply(command: &AuxCommand, payload: &[u8]) -> AuxCommand {
    let mut response = AuxCommand::with_payload(command.command, DeviceId::APP, payload).unwrap();
    response.source = command.destination;
    response
}

#[async_trait]
impl MountTransport for MockTransport {
    async fn send_command(&mut self, command: &AuxCommand) -> Result<AuxCommand> {
        let response = {
            let mut state = self.state.lock();
            state.log.push(command.clone());
            if state.reject.contains(&(command.command, command.destination)) {
                return Err(Error::Transport(TransportError::Closed));
            }
            if state.silent {
                None
            } else {
                let axis = Self::index(command.destination);
                Some(match command.command {
                    CommandCode::MC_GOTO_FAST | CommandCode::MC_GOTO_SLOW | CommandCode::MC_SET_POSITION => {
                        state.positions[axis] = command.steps().unwrap();
                        reply(command, &[])
                    }
                    CommandCode::MC_GET_POSITION => reply(command, &pack_int3_steps(state.positions[axis])),
                    CommandCode::MC_SLEW_DONE => {
                        if state.busy_polls > 0 {
                            state.busy_polls -= 1;
                            reply(command, &[0x00])
                        } else {
                            reply(command, &[0xFF])
                        }
                    }
                    CommandCode::MC_SET_CORDWRAP_POS => {
                        state.cord_wrap = command.steps().unwrap();
                        reply(command, &[])
                    }
                    CommandCode::MC_GET_CORDWRAP_POS => reply(command, &pack_int3_steps(state.cord_wrap)),
                    _ => reply(command, &[]),
                })
            }
        };

        match response {
            Some(response) => Ok(response),
            None => std::future::pending().await,
        }
    }
}
