//! The task state machine.
//!
//! A task is armed locally, then driven entirely by relay traffic. The
//! relay echoes our own submissions back to us, so the echo of the line
//! that announced a task doubles as its key material: the coordinator
//! buffers every relay message and completes a task once the expected
//! number of inputs is in.
//!
//! Input counts per task:
//! 1. Shift, Vigenere and RSA complete on the second message (task line
//!    echo carrying the key, then the payload to encode)
//! 2. Hash generation completes on the second (prompt, payload); hash
//!    verification on the third (prompt, payload, claimed digest)
//! 3. The key exchange replies three times: to the opening prompt, to the
//!    peer's partial key, and to the echo of its own partial key

use log::debug;
use num_bigint::BigUint;

use crate::crypto;
use crate::error::{TaskError, TaskInputError};

/// Direction of a cipher task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherDirection {
    /// Encode the payload with the announced key.
    Encode,
    /// Decode direction. The relay never grades these, and the original
    /// exercise flow consumed the inputs without replying; that behaviour
    /// is kept.
    Decode,
}

/// Mode of a hash task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    /// Digest the payload and submit its hex form.
    Generate,
    /// Compare a claimed digest against the payload.
    Verify,
}

/// A task to arm on the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRequest {
    /// Shift cipher with the key taken from the first input's last token.
    Shift(CipherDirection),
    /// Vigenere cipher keyed by the first input's last token.
    Vigenere(CipherDirection),
    /// RSA with `n=<modulus>, e=<exponent>` parsed from the first input.
    Rsa(CipherDirection),
    /// SHA-256 digest exercise.
    Hash(HashMode),
    /// Diffie-Hellman key exchange.
    Dh,
}

/// Payload produced by a completed task step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskReply {
    /// Raw cipher cells, framed verbatim.
    Cells(Vec<u8>),
    /// Plain text, framed like a typed message.
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DhState {
    /// Waiting for the relay's opening prompt.
    AwaitOpening,
    /// Parameters published; waiting for our echo plus the peer's partial.
    AwaitPartial { p: u64, g: u64 },
    /// Partial key sent; its echo triggers the final confirmation.
    AwaitConfirm { shared: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveTask {
    Idle,
    Shift(CipherDirection),
    Vigenere(CipherDirection),
    Rsa(CipherDirection),
    Hash(HashMode),
    Dh(DhState),
}

/// Buffers relay messages and runs the armed task to completion.
#[derive(Debug)]
pub struct TaskCoordinator {
    task: ActiveTask,
    pending: Vec<String>,
}

impl TaskCoordinator {
    pub fn new() -> Self {
        Self {
            task: ActiveTask::Idle,
            pending: Vec::new(),
        }
    }

    /// Whether no task is in progress.
    pub fn is_idle(&self) -> bool {
        self.task == ActiveTask::Idle
    }

    /// Arms `request`, discarding any task in progress and its inputs.
    pub fn start(&mut self, request: TaskRequest) {
        debug!("arming task {request:?}");
        self.pending.clear();
        self.task = match request {
            TaskRequest::Shift(direction) => ActiveTask::Shift(direction),
            TaskRequest::Vigenere(direction) => ActiveTask::Vigenere(direction),
            TaskRequest::Rsa(direction) => ActiveTask::Rsa(direction),
            TaskRequest::Hash(mode) => ActiveTask::Hash(mode),
            TaskRequest::Dh => ActiveTask::Dh(DhState::AwaitOpening),
        };
    }

    /// Feeds one relay message to the state machine.
    ///
    /// The message is buffered even when no task is armed; arming clears
    /// the buffer. A completed step returns the payload to submit. An
    /// error means the task was aborted: the coordinator is idle again and
    /// nothing should be sent.
    pub fn on_relay_message(&mut self, text: &str) -> Result<Option<TaskReply>, TaskError> {
        self.pending.push(text.to_owned());
        match (self.task, self.pending.len()) {
            (ActiveTask::Shift(direction), 2) => self.finish_cipher(|this| {
                this.cipher_reply(direction, |this| {
                    let key = this.shift_key()?;
                    Ok(crypto::shift_encode(&this.pending[1], key)?)
                })
            }),
            (ActiveTask::Vigenere(direction), 2) => self.finish_cipher(|this| {
                this.cipher_reply(direction, |this| {
                    let key = this.key_token(0)?.to_owned();
                    Ok(crypto::vigenere_encode(&this.pending[1], &key))
                })
            }),
            (ActiveTask::Rsa(direction), 2) => self.finish_cipher(|this| {
                this.cipher_reply(direction, |this| {
                    let (n, e) = parse_rsa_params(&this.pending[0])?;
                    Ok(crypto::rsa_encode(&this.pending[1], &n, &e)?)
                })
            }),
            (ActiveTask::Hash(HashMode::Generate), 2) => self.finish_cipher(|this| {
                Ok(Some(TaskReply::Cells(crypto::hash_generate(
                    &this.pending[1],
                ))))
            }),
            (ActiveTask::Hash(HashMode::Verify), 3) => self.finish_cipher(|this| {
                Ok(Some(TaskReply::Cells(crypto::hash_verify(
                    &this.pending[1],
                    &this.pending[2],
                ))))
            }),
            (ActiveTask::Dh(DhState::AwaitOpening), 1) => self.dh_open(),
            (ActiveTask::Dh(DhState::AwaitPartial { p, g }), 2) => self.dh_partial(p, g),
            (ActiveTask::Dh(DhState::AwaitConfirm { shared }), 1) => self.dh_confirm(shared),
            // Idle, or still short of the required input count.
            _ => Ok(None),
        }
    }

    /// Runs a single-reply task to its end: whatever `step` produces, the
    /// coordinator is idle afterwards.
    fn finish_cipher<F>(&mut self, step: F) -> Result<Option<TaskReply>, TaskError>
    where
        F: FnOnce(&Self) -> Result<Option<TaskReply>, TaskError>,
    {
        let outcome = step(self);
        self.reset();
        outcome
    }

    fn cipher_reply<F>(
        &self,
        direction: CipherDirection,
        encode: F,
    ) -> Result<Option<TaskReply>, TaskError>
    where
        F: FnOnce(&Self) -> Result<Vec<u8>, TaskError>,
    {
        match direction {
            CipherDirection::Decode => Ok(None),
            CipherDirection::Encode => Ok(Some(TaskReply::Cells(encode(self)?))),
        }
    }

    fn dh_open(&mut self) -> Result<Option<TaskReply>, TaskError> {
        let (p, g) = crypto::generate_parameters();
        debug!("key exchange opened with p={p}, g={g}");
        self.pending.clear();
        self.task = ActiveTask::Dh(DhState::AwaitPartial { p, g });
        Ok(Some(TaskReply::Text(format!("{p},{g}"))))
    }

    fn dh_partial(&mut self, p: u64, g: u64) -> Result<Option<TaskReply>, TaskError> {
        let raw = self.pending[1].trim().to_owned();
        match raw.parse::<u64>() {
            Ok(peer_partial) => {
                let response = crypto::respond(peer_partial, p, g);
                self.pending.clear();
                self.task = ActiveTask::Dh(DhState::AwaitConfirm {
                    shared: response.shared,
                });
                Ok(Some(TaskReply::Text(response.own_partial.to_string())))
            }
            Err(_) => {
                self.reset();
                Err(TaskInputError::InvalidPartialKey(raw).into())
            }
        }
    }

    fn dh_confirm(&mut self, shared: u64) -> Result<Option<TaskReply>, TaskError> {
        self.reset();
        Ok(Some(TaskReply::Text(shared.to_string())))
    }

    /// Integer shift key from the task line's last token.
    fn shift_key(&self) -> Result<i64, TaskError> {
        let token = self.key_token(0)?;
        token
            .parse()
            .map_err(|_| TaskInputError::InvalidShiftKey(token.to_owned()).into())
    }

    /// Last whitespace-separated token of the buffered message at `index`.
    fn key_token(&self, index: usize) -> Result<&str, TaskError> {
        let message = &self.pending[index];
        message
            .split_whitespace()
            .last()
            .ok_or_else(|| TaskInputError::MissingKey(message.clone()).into())
    }

    fn reset(&mut self) {
        self.task = ActiveTask::Idle;
        self.pending.clear();
    }
}

impl Default for TaskCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts `(n, e)` from a message of the form `... n=<int>, e=<int>`.
///
/// Surrounding prose is allowed; the values are read from the last
/// `n=`/`, e=` markers. A modulus of zero is rejected here so the cipher
/// never sees it.
fn parse_rsa_params(message: &str) -> Result<(BigUint, BigUint), TaskInputError> {
    let malformed = || TaskInputError::InvalidRsaParams(message.to_owned());
    let (head, e_text) = message.rsplit_once(", e=").ok_or_else(malformed)?;
    let (_, n_text) = head.rsplit_once("n=").ok_or_else(malformed)?;
    let n: BigUint = n_text.trim().parse().map_err(|_| malformed())?;
    let e: BigUint = e_text.trim().parse().map_err(|_| malformed())?;
    if n == BigUint::from(0u8) {
        return Err(malformed());
    }
    Ok((n, e))
}
