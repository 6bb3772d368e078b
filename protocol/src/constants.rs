//! 协议常量定义

/// 棋盘边长（8x8）
pub const BOARD_SIZE: usize = 8;

/// 每个房间的最大玩家数
pub const MAX_PLAYERS: usize = 2;

/// 未指定房间时使用的默认房间 ID
pub const DEFAULT_ROOM_ID: &str = "default";

/// 默认监听地址
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8080;

/// WebSocket 升级路径
pub const WS_PATH: &str = "/ws";

/// 第二名玩家加入后的开局提示
pub const GAME_READY_MESSAGE: &str = "Game is ready!";
