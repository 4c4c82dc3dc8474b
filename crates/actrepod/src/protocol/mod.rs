//! Wire protocol: length-prefixed frames carrying XML command and response
//! documents.

pub mod command;
pub mod frame;
pub mod response;

pub use self::command::{Command, CommandError};
pub use self::frame::{
    FrameDecoder, FrameError, FrameState, MAX_HEADER_LEN, MAX_PAYLOAD_LEN, Transition,
};
pub use self::response::{ErrorDetail, Response, ResponseError, ResponseStatus, ResponseWriter};
