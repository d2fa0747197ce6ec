//! Relay exercise coordination.
//!
//! The relay runs its crypto exercises over ordinary relay messages; this
//! module tracks which exercise is armed, collects the messages that
//! belong to it and produces the submission payloads.

pub mod coordinator;

pub use coordinator::{
    CipherDirection, HashMode, TaskCoordinator, TaskReply, TaskRequest,
};
