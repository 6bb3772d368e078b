//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;
use crate::piece::{Piece, Player, Position};

/// 棋盘
///
/// 8x8 网格，索引为 `[y][x]`，序列化为 8 行整数数组。
/// 只有 `(x + y)` 为奇数的格子会放置棋子。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [[Piece; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: [[Piece::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// 创建初始棋盘：先手占第 0-2 行的深色格，后手占第 5-7 行
    pub fn initial() -> Self {
        let mut board = Self::empty();

        for y in 0..BOARD_SIZE as i32 {
            for x in 0..BOARD_SIZE as i32 {
                if (x + y) % 2 == 0 {
                    continue;
                }
                let pos = Position::new(x, y);
                if y < 3 {
                    board.set(pos, Player::First.man());
                } else if y > 4 {
                    board.set(pos, Player::Second.man());
                }
            }
        }

        board
    }

    /// 获取指定位置的棋子，越界返回空格
    pub fn get(&self, pos: Position) -> Piece {
        if pos.is_valid() {
            self.squares[pos.y as usize][pos.x as usize]
        } else {
            Piece::Empty
        }
    }

    /// 设置指定位置的棋子，越界时忽略
    pub fn set(&mut self, pos: Position, piece: Piece) {
        if pos.is_valid() {
            self.squares[pos.y as usize][pos.x as usize] = piece;
        }
    }

    /// 统计指定玩家的棋子数量
    pub fn count(&self, player: Player) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|piece| piece.owner() == Some(player))
            .count()
    }

    /// 一方棋子被吃光时返回另一方
    pub fn winner(&self) -> Option<Player> {
        match (self.count(Player::First), self.count(Player::Second)) {
            (0, 0) => None,
            (_, 0) => Some(Player::First),
            (0, _) => Some(Player::Second),
            _ => None,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// 完整的棋局状态（棋盘 + 走子方）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    pub board: Board,
    pub current_turn: Player,
}

impl BoardState {
    /// 创建初始状态，先手走第一步
    pub fn initial() -> Self {
        Self {
            board: Board::initial(),
            current_turn: Player::First,
        }
    }

    /// 从棋盘创建状态
    pub fn from_board(board: Board, current_turn: Player) -> Self {
        Self {
            board,
            current_turn,
        }
    }

    /// 切换走子方
    pub fn switch_turn(&mut self) {
        self.current_turn = self.current_turn.opponent();
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}
