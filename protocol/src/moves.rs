//! 走法验证与执行
//!
//! 规则引擎是纯函数：相同的（棋盘，玩家，走法）总是得到相同结果。
//! 每步最多吃一子，不强制吃子。

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::{Board, BoardState};
use crate::error::MoveError;
use crate::piece::{Piece, Player, Position};

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 起始位置
    pub from: Position,
    /// 目标位置
    pub to: Position,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// 走法执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// 落子后的棋子（已升变则为王棋）
    pub piece: Piece,
    /// 被吃掉的格子，最多一个
    pub captures: Vec<Position>,
    /// 本步是否升变
    pub promoted: bool,
}

/// 规则引擎
pub struct Rules;

impl Rules {
    /// 验证走法，返回被吃的格子（如果有）
    ///
    /// 检查顺序：边界、终点为空、起点为己方棋子、斜线、普通棋子/王棋规则。
    /// 第一项失败即返回。
    pub fn validate(board: &Board, player: Player, mv: &Move) -> Result<Option<Position>, MoveError> {
        if !mv.from.is_valid() {
            return Err(MoveError::OutOfBoard(mv.from));
        }
        if !mv.to.is_valid() {
            return Err(MoveError::OutOfBoard(mv.to));
        }

        if !board.get(mv.to).is_empty() {
            return Err(MoveError::DestinationOccupied(mv.to));
        }

        let piece = board.get(mv.from);
        if piece.owner() != Some(player) {
            return Err(MoveError::NotOwnPiece(mv.from));
        }

        let dx = mv.to.x - mv.from.x;
        let dy = mv.to.y - mv.from.y;
        if dx == 0 || dx.abs() != dy.abs() {
            return Err(MoveError::NotDiagonal {
                from: mv.from,
                to: mv.to,
            });
        }

        if piece.is_king() {
            Self::validate_king(board, player, mv, dx.signum(), dy.signum())
        } else {
            Self::validate_man(board, player, mv, dx, dy)
        }
    }

    /// 普通棋子：向前一格，或跳过相邻的对方棋子
    fn validate_man(
        board: &Board,
        player: Player,
        mv: &Move,
        dx: i32,
        dy: i32,
    ) -> Result<Option<Position>, MoveError> {
        if dy.signum() != player.forward() {
            return Err(MoveError::WrongDirection);
        }

        match dx.abs() {
            1 => Ok(None),
            2 => {
                let middle = mv.from.offset(dx / 2, dy / 2);
                if board.get(middle).owner() == Some(player.opponent()) {
                    Ok(Some(middle))
                } else {
                    Err(MoveError::InvalidJump(middle))
                }
            }
            _ => Err(MoveError::TooFar),
        }
    }

    /// 王棋：沿斜线逐格检查，路径上至多一个对方棋子
    fn validate_king(
        board: &Board,
        player: Player,
        mv: &Move,
        step_x: i32,
        step_y: i32,
    ) -> Result<Option<Position>, MoveError> {
        let mut captured = None;
        let mut cursor = mv.from.offset(step_x, step_y);

        while cursor != mv.to {
            let cell = board.get(cursor);
            if !cell.is_empty() {
                if cell.owner() == Some(player.opponent()) && captured.is_none() {
                    captured = Some(cursor);
                } else {
                    return Err(MoveError::BlockedPath(cursor));
                }
            }
            cursor = cursor.offset(step_x, step_y);
        }

        Ok(captured)
    }

    /// 验证并执行走法：移动棋子、移除被吃棋子、升变、切换走子方
    ///
    /// 失败时不修改状态。
    pub fn apply(state: &mut BoardState, player: Player, mv: &Move) -> Result<MoveOutcome, MoveError> {
        let captured = Self::validate(&state.board, player, mv)?;

        let mut piece = state.board.get(mv.from);
        let promoted = piece.is_man() && mv.to.y == player.promotion_row();
        if promoted {
            piece = piece.promoted();
        }

        if let Some(pos) = captured {
            state.board.set(pos, Piece::Empty);
        }
        state.board.set(mv.to, piece);
        state.board.set(mv.from, Piece::Empty);
        state.switch_turn();

        trace!(%mv, ?captured, promoted, "执行走法");

        Ok(MoveOutcome {
            piece,
            captures: captured.into_iter().collect(),
            promoted,
        })
    }
}
