//! Per-connection handler
//!
//! Lifecycle of one client:
//!
//! ```text
//!   join frame ──► service.join ──► service.subscribe ──► "joined"
//!                                                            │
//!        ┌───────────────────────────────────────────────────┘
//!        ▼
//!   select! { inbound frame ──► answer ──► "answerResult" + "leaderboard"
//!             update        ──► "leaderboard" }
//!        │
//!        ▼ (EOF, fatal error)
//!   cancel subscription ──► service.leave
//! ```
//!
//! Writes only ever happen from this task, so frames never interleave.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::cache::QuizSource;
use crate::error::Result;
use crate::model::Leaderboard;
use crate::registry::SessionStore;
use crate::server::frame::{encode_line, FrameReader};
use crate::server::message::{DecodeError, Inbound, JoinRequest, Outbound};
use crate::service::QuizService;
use crate::session::LeaderboardReceiver;

const MISSING_JOIN_FIELDS: &str = "missing quizId, userId, or name";
const EXPECTED_JOIN: &str = "expected join message";
const UNSUPPORTED_TYPE: &str = "unsupported message type";
const INVALID_ANSWER: &str = "invalid answer payload";

/// A single client connection
pub struct Connection<S, Q, T> {
    id: u64,
    service: Arc<QuizService<S, Q>>,
    frames: FrameReader<ReadHalf<T>>,
    writer: WriteHalf<T>,
}

impl<S, Q, T> Connection<S, Q, T>
where
    S: SessionStore,
    Q: QuizSource,
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: u64, stream: T, service: Arc<QuizService<S, Q>>, max_frame_size: usize) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            id,
            service,
            frames: FrameReader::new(reader, max_frame_size),
            writer,
        }
    }

    /// Connection ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drive the connection until the peer disconnects or a fatal error
    ///
    /// Once the join has succeeded the participant is removed from the
    /// session however the connection ends, write failures included.
    pub async fn run(mut self) -> Result<()> {
        let Some((join, joined)) = self.handshake().await? else {
            return Ok(());
        };

        let result = self.participate(&join, joined).await;

        self.service.leave(&join.quiz_id, &join.user_id).await;
        tracing::debug!(
            conn_id = self.id,
            quiz = %join.quiz_id,
            user = %join.user_id,
            "Participant disconnected"
        );

        result
    }

    /// Subscribe, confirm the join and serve until the connection ends
    async fn participate(&mut self, join: &JoinRequest, joined: Leaderboard) -> Result<()> {
        let (mut updates, subscription) = match self.service.subscribe(&join.quiz_id).await {
            Ok(sub) => sub,
            Err(e) => return self.send(&Outbound::error(e.to_string())).await,
        };

        let result = match self.send(&Outbound::Joined(joined)).await {
            Ok(()) => self.serve(join, &mut updates).await,
            Err(e) => Err(e),
        };

        subscription.cancel().await;
        result
    }

    /// Read the join frame and register the participant
    ///
    /// Returns the request and the leaderboard after joining, or `None` when
    /// the connection should close without serving. Nothing is written after
    /// a successful join.
    async fn handshake(&mut self) -> Result<Option<(JoinRequest, Leaderboard)>> {
        let Some(line) = self.frames.next_frame().await? else {
            return Ok(None);
        };

        let join = match Inbound::decode(&line) {
            Ok(Inbound::Join(join)) if join.is_complete() => join,
            Ok(Inbound::Join(_)) | Err(DecodeError::InvalidPayload { kind: "join", .. }) => {
                self.send(&Outbound::error(MISSING_JOIN_FIELDS)).await?;
                return Ok(None);
            }
            Ok(_) | Err(_) => {
                self.send(&Outbound::error(EXPECTED_JOIN)).await?;
                return Ok(None);
            }
        };

        let leaderboard = match self
            .service
            .join(&join.quiz_id, &join.user_id, &join.name)
            .await
        {
            Ok(lb) => lb,
            Err(e) => {
                tracing::debug!(conn_id = self.id, quiz = %join.quiz_id, error = %e, "Join rejected");
                self.send(&Outbound::error(e.to_string())).await?;
                return Ok(None);
            }
        };

        tracing::debug!(
            conn_id = self.id,
            quiz = %join.quiz_id,
            user = %join.user_id,
            "Participant joined"
        );

        Ok(Some((join, leaderboard)))
    }

    async fn serve(
        &mut self,
        join: &JoinRequest,
        updates: &mut LeaderboardReceiver,
    ) -> Result<()> {
        loop {
            tokio::select! {
                frame = self.frames.next_frame() => match frame? {
                    Some(line) => self.handle_frame(join, &line).await?,
                    None => return Ok(()),
                },
                update = updates.recv() => match update {
                    Some(leaderboard) => self.send(&Outbound::Leaderboard(leaderboard)).await?,
                    None => return Ok(()),
                },
            }
        }
    }

    async fn handle_frame(&mut self, join: &JoinRequest, line: &str) -> Result<()> {
        let submission = match Inbound::decode(line) {
            Ok(Inbound::Answer(submission)) => submission,
            Ok(Inbound::Join(_)) | Err(DecodeError::Unsupported(_)) => {
                return self.send(&Outbound::error(UNSUPPORTED_TYPE)).await;
            }
            Err(DecodeError::InvalidPayload { .. }) => {
                return self.send(&Outbound::error(INVALID_ANSWER)).await;
            }
            Err(DecodeError::Malformed(e)) => return Err(e.into()),
        };

        match self
            .service
            .submit_answer(&join.quiz_id, &join.user_id, &submission)
            .await
        {
            Ok(outcome) => {
                self.send(&Outbound::AnswerResult(outcome.result(&submission.question_id)))
                    .await?;
                self.send(&Outbound::Leaderboard(outcome.leaderboard)).await
            }
            Err(e) => {
                tracing::debug!(conn_id = self.id, kind = e.kind(), error = %e, "Answer rejected");
                self.send(&Outbound::error(e.to_string())).await
            }
        }
    }

    async fn send(&mut self, message: &Outbound) -> Result<()> {
        let line = encode_line(message)?;
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
