//! 服务器主逻辑

use std::sync::Arc;

use tracing::{debug, trace};

use protocol::{ClientMessage, Move, Position, ServerMessage};

use crate::config::ServerConfig;
use crate::room::{RoomRegistry, Seat};

/// 服务器状态
///
/// 在进程入口创建，注入到每个连接处理器中。
pub struct ServerState {
    pub config: ServerConfig,
    pub registry: Arc<RoomRegistry>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(RoomRegistry::new()),
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 处理客户端消息，返回需要单独回复给发送者的消息
    ///
    /// 走棋成功后的广播由房间完成，这里不再回复。
    pub async fn handle(seat: &Seat, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Move { from, to } => Self::handle_move(seat, from, to).await,
            ClientMessage::GetPlayers => Self::handle_get_players(seat).await,
            ClientMessage::Unknown => {
                trace!(participant = seat.participant(), "忽略未知消息");
                None
            }
        }
    }

    /// 处理走棋
    async fn handle_move(seat: &Seat, from: Position, to: Position) -> Option<ServerMessage> {
        let mv = Move::new(from, to);
        match seat.submit_move(mv).await {
            Ok(_) => None,
            Err(err) => {
                debug!(
                    room = seat.room().id(),
                    player = %seat.player(),
                    %mv,
                    error = ?err,
                    "拒绝走棋"
                );
                Some(ServerMessage::from(&err))
            }
        }
    }

    /// 处理人数查询
    async fn handle_get_players(seat: &Seat) -> Option<ServerMessage> {
        Some(seat.room().status().await.into())
    }
}
