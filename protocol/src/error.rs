//! 错误类型定义

use thiserror::Error;

use crate::piece::Position;

/// 走法规则错误（规则引擎返回，按检查顺序排列）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// 起点或终点不在棋盘内
    #[error("Position out of board: {0}")]
    OutOfBoard(Position),

    /// 终点已有棋子
    #[error("Destination {0} is occupied")]
    DestinationOccupied(Position),

    /// 起点不是己方棋子
    #[error("No own piece at {0}")]
    NotOwnPiece(Position),

    /// 不是斜线走法
    #[error("Move from {from} to {to} is not diagonal")]
    NotDiagonal { from: Position, to: Position },

    /// 普通棋子只能向前
    #[error("Men can only move forward")]
    WrongDirection,

    /// 普通棋子最多走两格
    #[error("Men move one step or jump two")]
    TooFar,

    /// 跳吃时中间不是对方棋子
    #[error("Nothing to capture at {0}")]
    InvalidJump(Position),

    /// 王棋路径被阻挡（己方棋子或第二个棋子）
    #[error("Path blocked at {0}")]
    BlockedPath(Position),
}

/// 房间内的对局错误，Display 即发给玩家的提示文本
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// 房间已满
    #[error("Room is full")]
    RoomFull,

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 起点棋子不属于该玩家
    #[error("You can only move your pieces")]
    WrongPieceOwnership,

    /// 规则引擎拒绝的走法
    #[error("Invalid move")]
    InvalidMove(#[from] MoveError),

    /// 连接不在该房间中
    #[error("Not in room")]
    NotInRoom,

    /// 房间正在销毁，加入方需要重新查找
    #[error("Room is closed")]
    RoomClosed,
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 无法识别的数值编码
    #[error("Invalid {kind} value: {value}")]
    InvalidValue { kind: &'static str, value: u8 },

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 底层传输错误
    #[error("Transport error: {0}")]
    Transport(String),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
