//! 棋子、玩家与坐标定义

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;
use crate::error::ProtocolError;

/// 玩家身份（线上协议中编码为 1 / 2）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    /// 先手，执黑，从第 0 行向第 7 行推进
    First,
    /// 后手，执白，从第 7 行向第 0 行推进
    Second,
}

impl Player {
    /// 获取对手
    pub fn opponent(&self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// 协议中的玩家编号
    pub fn number(&self) -> u8 {
        match self {
            Player::First => 1,
            Player::Second => 2,
        }
    }

    /// 普通棋子的前进方向（行增量）
    pub fn forward(&self) -> i32 {
        match self {
            Player::First => 1,
            Player::Second => -1,
        }
    }

    /// 升变所在行
    pub fn promotion_row(&self) -> i32 {
        match self {
            Player::First => BOARD_SIZE as i32 - 1,
            Player::Second => 0,
        }
    }

    /// 该玩家的普通棋子
    pub fn man(&self) -> Piece {
        match self {
            Player::First => Piece::BlackMan,
            Player::Second => Piece::WhiteMan,
        }
    }

    /// 该玩家的王棋
    pub fn king(&self) -> Piece {
        match self {
            Player::First => Piece::BlackKing,
            Player::Second => Piece::WhiteKing,
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        player.number()
    }
}

impl TryFrom<u8> for Player {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::First),
            2 => Ok(Player::Second),
            _ => Err(ProtocolError::InvalidValue {
                kind: "player",
                value,
            }),
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// 格子上的棋子（线上协议中编码为 0-4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Piece {
    #[default]
    Empty,
    BlackMan,
    WhiteMan,
    BlackKing,
    WhiteKing,
}

impl Piece {
    /// 棋子所属玩家，空格返回 None
    pub fn owner(&self) -> Option<Player> {
        match self {
            Piece::Empty => None,
            Piece::BlackMan | Piece::BlackKing => Some(Player::First),
            Piece::WhiteMan | Piece::WhiteKing => Some(Player::Second),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Piece::Empty
    }

    pub fn is_man(&self) -> bool {
        matches!(self, Piece::BlackMan | Piece::WhiteMan)
    }

    pub fn is_king(&self) -> bool {
        matches!(self, Piece::BlackKing | Piece::WhiteKing)
    }

    /// 升变后的棋子，王棋和空格保持不变
    pub fn promoted(&self) -> Piece {
        self.owner().map_or(Piece::Empty, |player| player.king())
    }
}

impl From<Piece> for u8 {
    fn from(piece: Piece) -> u8 {
        match piece {
            Piece::Empty => 0,
            Piece::BlackMan => 1,
            Piece::WhiteMan => 2,
            Piece::BlackKing => 3,
            Piece::WhiteKing => 4,
        }
    }
}

impl TryFrom<u8> for Piece {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Piece::Empty),
            1 => Ok(Piece::BlackMan),
            2 => Ok(Piece::WhiteMan),
            3 => Ok(Piece::BlackKing),
            4 => Ok(Piece::WhiteKing),
            _ => Err(ProtocolError::InvalidValue {
                kind: "piece",
                value,
            }),
        }
    }
}

/// 棋盘坐标
///
/// 使用有符号整数，客户端发来的越界坐标可以正常解码，由规则引擎拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 列 (0-7)
    pub x: i32,
    /// 行 (0-7)
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 检查位置是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (0..BOARD_SIZE as i32).contains(&self.x) && (0..BOARD_SIZE as i32).contains(&self.y)
    }

    /// 获取偏移后的位置（不检查边界）
    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl From<Position> for [i32; 2] {
    fn from(pos: Position) -> [i32; 2] {
        [pos.x, pos.y]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
