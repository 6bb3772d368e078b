//! 传输层抽象
//!
//! 提供 FrameReader/FrameWriter traits 使连接处理逻辑与具体传输实现解耦，
//! 服务端用 WebSocket 实现，测试用内存通道实现。
//! 每一帧是一条 JSON 文本消息。

use async_trait::async_trait;

use crate::error::Result;
use crate::message::{ClientMessage, ServerMessage};

/// 帧读取端
#[async_trait]
pub trait FrameReader: Send {
    /// 读取下一帧文本
    ///
    /// 返回 `Ok(None)` 表示对端正常关闭，`Err` 表示传输失败。
    async fn read_frame(&mut self) -> Result<Option<String>>;
}

/// 帧写入端
#[async_trait]
pub trait FrameWriter: Send {
    /// 写入一帧文本
    async fn write_frame(&mut self, frame: String) -> Result<()>;

    /// 关闭连接
    async fn close(&mut self) -> Result<()>;
}

/// 编码服务端消息
pub fn encode(msg: &ServerMessage) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

/// 解码客户端消息
pub fn decode(frame: &str) -> Result<ClientMessage> {
    Ok(serde_json::from_str(frame)?)
}
