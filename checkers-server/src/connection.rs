//! 连接处理
//!
//! 每个连接一个读循环和一个写任务。读循环逐条解码消息并交给房间处理；
//! 写任务把发送队列中的消息写到传输层，写失败即退出，之后房间发现该连接
//! 的队列已关闭，把它当作断线移除。

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use protocol::{decode, encode, FrameReader, FrameWriter, ParticipantId, ServerMessage};

use crate::room::{Outbox, Seat, OUTBOX_CAPACITY};
use crate::server::{MessageHandler, ServerState};

/// 处理一个连接的完整生命周期
///
/// 加入房间（房间已满时发送错误并关闭）、运行读循环，
/// 读循环结束后离开房间，再等待写任务发送完剩余消息并关闭连接。
pub async fn serve<R, W>(state: Arc<ServerState>, room_id: String, mut reader: R, writer: W)
where
    R: FrameReader,
    W: FrameWriter + 'static,
{
    let participant = state.registry.next_participant_id();
    let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
    let write_task = tokio::spawn(write_loop(writer, inbox, participant));

    match state.registry.join(&room_id, participant, outbox.clone()).await {
        Ok(seat) => {
            read_loop(&mut reader, &seat, &outbox).await;
            seat.leave().await;
        }
        Err(err) => {
            info!(room = %room_id, participant, error = %err, "加入房间失败");
            let _ = outbox.try_send(ServerMessage::from(&err));
        }
    }

    drop(outbox);
    if let Err(err) = write_task.await {
        warn!(participant, error = %err, "写任务异常退出");
    }
}

/// 读循环：传输关闭或读取失败时结束，格式错误的消息直接丢弃
async fn read_loop<R: FrameReader>(reader: &mut R, seat: &Seat, outbox: &Outbox) {
    let participant = seat.participant();

    loop {
        let frame = match reader.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!(participant, "连接已关闭");
                break;
            }
            Err(err) => {
                debug!(participant, error = %err, "读取失败");
                break;
            }
        };

        let msg = match decode(&frame) {
            Ok(msg) => msg,
            Err(err) => {
                debug!(participant, error = %err, "丢弃无法解析的消息");
                continue;
            }
        };

        if let Some(reply) = MessageHandler::handle(seat, msg).await {
            if let Err(err) = outbox.try_send(reply) {
                debug!(participant, error = %err, "回复发送失败");
                break;
            }
        }
    }
}

/// 写任务：所有发送端释放后关闭连接
async fn write_loop<W: FrameWriter>(
    mut writer: W,
    mut inbox: mpsc::Receiver<ServerMessage>,
    participant: ParticipantId,
) {
    while let Some(msg) = inbox.recv().await {
        let frame = match encode(&msg) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(participant, error = %err, "消息编码失败");
                continue;
            }
        };
        if let Err(err) = writer.write_frame(frame).await {
            debug!(participant, error = %err, "写入失败");
            return;
        }
    }

    if let Err(err) = writer.close().await {
        debug!(participant, error = %err, "关闭连接失败");
    }
}
