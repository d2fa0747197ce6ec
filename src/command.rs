//! Interpretation of submitted input lines.
//!
//! A line can do four things: transmit (chat or relay kind), arm a task,
//! run a cipher locally via `/crypto`, or fall through to the interface's
//! own slash commands. Task arming piggybacks on transmission: a line
//! containing a `task` announcement is sent as relay text and arms the
//! matching task, so the relay's echo of that same line delivers the key.

use num_bigint::BigUint;

use crate::crypto;
use crate::protocol::{codec, FrameKind};
use crate::tasks::{CipherDirection, HashMode, TaskRequest};

/// Label for locally evaluated cipher output.
pub const LABEL_CRYPTO: &str = "<Crypto> ";

/// What a submitted line amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Task armed by a `task <kind> <direction> <key>` announcement.
    pub armed: Option<TaskRequest>,
    /// The action to carry out after arming.
    pub action: Action,
}

/// Action derived from a submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Transmit the text on the wire.
    Send {
        /// Frame kind to use.
        kind: FrameKind,
        /// Text to transmit, with any `/s ` prefix stripped.
        text: String,
    },
    /// Surface locally produced cipher output, one line per entry.
    Crypto(Vec<String>),
    /// Arm a task without transmitting anything.
    Arm(TaskRequest),
    /// A slash command owned by the interface (help, quit and friends).
    Tui,
}

/// Interprets one submitted line.
pub fn interpret(input: &str) -> Directive {
    let armed = detect_task_arming(input);

    // An explicit "/s " prefix forces the relay kind, as does arming.
    let (kind, text, explicit_relay) = match input.strip_prefix("/s ") {
        Some(rest) => (FrameKind::Relay, rest, true),
        None => {
            let kind = if armed.is_some() {
                FrameKind::Relay
            } else {
                FrameKind::Text
            };
            (kind, input, false)
        }
    };

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.first() == Some(&"/crypto") {
        return Directive {
            armed,
            action: Action::Crypto(run_crypto_command(&tokens[1..])),
        };
    }

    if !explicit_relay {
        if tokens.first() == Some(&"/task") {
            if let Some(request) = parse_task_request(&tokens[1..]) {
                return Directive {
                    armed: None,
                    action: Action::Arm(request),
                };
            }
            return Directive {
                armed,
                action: Action::Tui,
            };
        }
        if text.starts_with('/') {
            return Directive {
                armed,
                action: Action::Tui,
            };
        }
    }

    Directive {
        armed,
        action: Action::Send {
            kind,
            text: text.to_string(),
        },
    }
}

/// Scans for a `task (shift|vigenere|RSA) (encode|decode) <key>` window
/// anywhere in the line. The key must be 1 through 10000 without leading
/// zeros; the key value itself is not kept, since the relay echoes the
/// whole line back as the task's first input.
fn detect_task_arming(input: &str) -> Option<TaskRequest> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    tokens.windows(4).find_map(|window| {
        if window[0] != "task" || !is_task_key(window[3]) {
            return None;
        }
        let direction = match window[2] {
            "encode" => CipherDirection::Encode,
            "decode" => CipherDirection::Decode,
            _ => return None,
        };
        match window[1] {
            "shift" => Some(TaskRequest::Shift(direction)),
            "vigenere" => Some(TaskRequest::Vigenere(direction)),
            "RSA" => Some(TaskRequest::Rsa(direction)),
            _ => None,
        }
    })
}

/// Accepts the decimal integers 1 through 10000, without leading zeros.
fn is_task_key(token: &str) -> bool {
    let bytes = token.as_bytes();
    match bytes.len() {
        1..=4 => (b'1'..=b'9').contains(&bytes[0]) && bytes.iter().all(|b| b.is_ascii_digit()),
        5 => token == "10000",
        _ => false,
    }
}

/// Parses the arguments of a `/task` command.
fn parse_task_request(args: &[&str]) -> Option<TaskRequest> {
    let direction = |token: &str| match token {
        "encode" => Some(CipherDirection::Encode),
        "decode" => Some(CipherDirection::Decode),
        _ => None,
    };
    match args {
        ["shift", dir] => direction(dir).map(TaskRequest::Shift),
        ["vigenere", dir] => direction(dir).map(TaskRequest::Vigenere),
        ["rsa" | "RSA", dir] => direction(dir).map(TaskRequest::Rsa),
        ["hash", "generate"] => Some(TaskRequest::Hash(HashMode::Generate)),
        ["hash", "verify"] => Some(TaskRequest::Hash(HashMode::Verify)),
        ["dh"] => Some(TaskRequest::Dh),
        _ => None,
    }
}

/// Evaluates a `/crypto` command locally.
///
/// Always produces two lines: the command's arguments as typed, then the
/// result preview (or the problem with the command). Nothing is sent.
fn run_crypto_command(args: &[&str]) -> Vec<String> {
    let echo = args.join(" ");
    let output = match evaluate_crypto(args) {
        Ok(cells) => codec::cells_preview(&cells),
        Err(problem) => problem,
    };
    vec![echo, output]
}

fn evaluate_crypto(args: &[&str]) -> Result<Vec<u8>, String> {
    if args.len() < 2 {
        return Err("usage: /crypto <cipher> <operation> <message> <key>".to_string());
    }
    let encoding = args[1] == "encode";
    match args[0] {
        "shift" => {
            let key_token = args[args.len() - 1];
            let key: i64 = key_token
                .parse()
                .map_err(|_| format!("invalid shift key {key_token:?}"))?;
            let message = joined_middle(args);
            let result = if encoding {
                crypto::shift_encode(&message, key)
            } else {
                crypto::shift_decode(&message, key)
            };
            result.map_err(|error| error.to_string())
        }
        "vigenere" if encoding => {
            Ok(crypto::vigenere_encode(&joined_middle(args), args[args.len() - 1]))
        }
        "RSA" if encoding => {
            if args.len() < 4 {
                return Err("usage: /crypto RSA encode <message> <n> <e>".to_string());
            }
            let n = parse_modulus(args[args.len() - 2])?;
            let e: BigUint = args[args.len() - 1]
                .parse()
                .map_err(|_| format!("invalid RSA exponent {:?}", args[args.len() - 1]))?;
            let message = args[2..args.len() - 2].join(" ");
            crypto::rsa_encode(&message, &n, &e).map_err(|error| error.to_string())
        }
        "hash" => {
            if args[1] == "verify" {
                let message = joined_middle(args);
                Ok(crypto::hash_verify(&message, args[args.len() - 1]))
            } else {
                Ok(crypto::hash_generate(&args[2..].join(" ")))
            }
        }
        // Unknown ciphers and unsupported directions produce no cells.
        _ => Ok(Vec::new()),
    }
}

fn parse_modulus(token: &str) -> Result<BigUint, String> {
    let n: BigUint = token
        .parse()
        .map_err(|_| format!("invalid RSA modulus {token:?}"))?;
    if n == BigUint::from(0u8) {
        return Err("invalid RSA modulus 0".to_string());
    }
    Ok(n)
}

/// Message tokens between the operation and the trailing key.
fn joined_middle(args: &[&str]) -> String {
    if args.len() >= 3 {
        args[2..args.len() - 1].join(" ")
    } else {
        String::new()
    }
}
