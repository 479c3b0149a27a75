//! Line-delimited JSON transport over TCP
//!
//! Each client opens a TCP connection, sends a `join` frame, then exchanges
//! newline-terminated JSON envelopes with the server:
//!
//! ```text
//! -> {"type":"join","payload":{"quizId":"q","userId":"u","name":"Ann"}}
//! <- {"type":"joined","payload":{...leaderboard...}}
//! -> {"type":"answer","payload":{"questionId":"q1","optionId":"b"}}
//! <- {"type":"answerResult","payload":{"questionId":"q1","correct":true,...}}
//! <- {"type":"leaderboard","payload":{...}}
//! ```

pub mod config;
pub mod connection;
pub mod frame;
pub mod listener;
pub mod message;

pub use config::ServerConfig;
pub use connection::Connection;
pub use frame::{encode_line, FrameReader, LineDecoder, DEFAULT_MAX_FRAME_SIZE};
pub use listener::QuizServer;
pub use message::{DecodeError, ErrorPayload, Inbound, JoinRequest, Outbound};
