//! 跳棋服务端
//!
//! 包含:
//! - 房间系统（加入、走棋、离开、广播）
//! - 连接处理
//! - WebSocket 接入
//! - 配置

pub mod config;
pub mod connection;
pub mod room;
pub mod server;
pub mod ws;

pub use config::ServerConfig;
pub use room::{Room, RoomRegistry, RoomStatus, Seat};
pub use server::{MessageHandler, ServerState};
pub use ws::router;
