//! WebSocket 接入与路由

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tower_http::services::ServeDir;

use protocol::{FrameReader, FrameWriter, ProtocolError, Result, WS_PATH};

use crate::connection;
use crate::server::ServerState;

/// 构建路由：`/ws` 升级为 WebSocket，配置了静态目录时其余路径提供客户端页面
pub fn router(state: Arc<ServerState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let router = Router::new()
        .route(WS_PATH, get(ws_handler))
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

/// 升级请求参数
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub room: Option<String>,
}

impl WsParams {
    /// 房间 ID，缺省或为空时使用默认房间
    fn room_id(self, default_room: &str) -> String {
        self.room
            .filter(|room| !room.is_empty())
            .unwrap_or_else(|| default_room.to_string())
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let room_id = params.room_id(&state.config.default_room);
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<ServerState>, room_id: String) {
    let (sink, stream) = socket.split();
    connection::serve(state, room_id, WsReader(stream), WsWriter(sink)).await;
}

/// WebSocket 读端，只处理文本帧
pub struct WsReader(SplitStream<WebSocket>);

#[async_trait]
impl FrameReader for WsReader {
    async fn read_frame(&mut self) -> Result<Option<String>> {
        loop {
            match self.0.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(ProtocolError::Transport(err.to_string())),
            }
        }
    }
}

/// WebSocket 写端
pub struct WsWriter(SplitSink<WebSocket, Message>);

#[async_trait]
impl FrameWriter for WsWriter {
    async fn write_frame(&mut self, frame: String) -> Result<()> {
        self.0
            .send(Message::Text(frame.into()))
            .await
            .map_err(|err| ProtocolError::Transport(err.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.0
            .close()
            .await
            .map_err(|err| ProtocolError::Transport(err.to_string()))
    }
}
