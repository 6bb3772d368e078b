//! 消息类型定义
//!
//! 所有消息均为带 `type` 字段的 JSON 对象。

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::constants::{GAME_READY_MESSAGE, MAX_PLAYERS};
use crate::error::GameError;
use crate::piece::{Player, Position};

/// 连接 ID（每个 WebSocket 连接分配一个）
pub type ParticipantId = u64;

/// 房间 ID
pub type RoomId = String;

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 走棋
    Move { from: Position, to: Position },
    /// 查询房间人数
    GetPlayers,
    /// 无法识别的消息类型，服务端忽略
    #[serde(other)]
    Unknown,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 加入房间成功
    #[serde(rename_all = "camelCase")]
    ConnectionAck {
        your_player_number: Player,
        total_players: usize,
        game_ready: bool,
        current_player: Player,
        board: Board,
    },
    /// 双方就位，游戏开始
    #[serde(rename_all = "camelCase")]
    GameStart { message: String, your_turn: bool },
    /// 房间人数变化
    #[serde(rename_all = "camelCase")]
    PlayersUpdate { count: usize, game_ready: bool },
    /// 走棋完成后的新局面
    #[serde(rename_all = "camelCase")]
    Update {
        board: Board,
        current_player: Player,
        /// 被吃的格子，编码为 `[x, y]`
        captures: Vec<[i32; 2]>,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<Player>,
    },
    /// 错误消息
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    /// 开局通知
    pub fn game_start(your_turn: bool) -> Self {
        ServerMessage::GameStart {
            message: GAME_READY_MESSAGE.to_string(),
            your_turn,
        }
    }

    /// 人数通知
    pub fn players_update(count: usize) -> Self {
        ServerMessage::PlayersUpdate {
            count,
            game_ready: count == MAX_PLAYERS,
        }
    }

    /// 走棋广播
    pub fn update(
        board: Board,
        current_player: Player,
        captures: &[Position],
        mover: Player,
    ) -> Self {
        let winner = board.winner();
        ServerMessage::Update {
            board,
            current_player,
            captures: captures.iter().map(|&pos| pos.into()).collect(),
            message: format!("{} moved", mover),
            winner,
        }
    }
}

impl From<&GameError> for ServerMessage {
    fn from(err: &GameError) -> Self {
        ServerMessage::Error {
            code: ErrorCode::from(err),
            message: err.to_string(),
        }
    }
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// 房间已满
    RoomFull,
    /// 不是你的回合
    NotYourTurn,
    /// 只能移动己方棋子
    WrongPieceOwnership,
    /// 无效走法
    InvalidMove,
    /// 不在房间中
    NotInRoom,
    /// 内部错误
    InternalError,
}

impl From<&GameError> for ErrorCode {
    fn from(err: &GameError) -> Self {
        match err {
            GameError::RoomFull => ErrorCode::RoomFull,
            GameError::NotYourTurn => ErrorCode::NotYourTurn,
            GameError::WrongPieceOwnership => ErrorCode::WrongPieceOwnership,
            GameError::InvalidMove(_) => ErrorCode::InvalidMove,
            GameError::NotInRoom => ErrorCode::NotInRoom,
            GameError::RoomClosed => ErrorCode::InternalError,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
