//! 跳棋共享协议库
//!
//! 包含:
//! - 棋子、棋盘、位置等核心数据结构
//! - 走法验证与执行（规则引擎）
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 传输层抽象 (FrameReader, FrameWriter) 与 JSON 编解码

mod board;
mod constants;
mod error;
mod message;
mod moves;
mod piece;
mod transport;

pub use board::{Board, BoardState};
pub use constants::*;
pub use error::{GameError, MoveError, ProtocolError, Result};
pub use message::{ClientMessage, ErrorCode, ParticipantId, RoomId, ServerMessage};
pub use moves::{Move, MoveOutcome, Rules};
pub use piece::{Piece, Player, Position};
pub use transport::{decode, encode, FrameReader, FrameWriter};
