//! 服务端配置

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use protocol::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_ROOM_ID};

/// 服务端配置
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 未指定 `room` 参数时加入的房间
    pub default_room: String,
    /// 静态客户端目录，为空时不提供页面
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_room: DEFAULT_ROOM_ID.to_string(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// 从环境变量读取配置
    ///
    /// `CHECKERS_HOST`、`CHECKERS_PORT`、`CHECKERS_DEFAULT_ROOM`、`CHECKERS_STATIC_DIR`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，缺省项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("CHECKERS_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("CHECKERS_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("无效的端口: {}", port))?;
        }
        if let Some(room) = lookup("CHECKERS_DEFAULT_ROOM").filter(|r| !r.is_empty()) {
            config.default_room = room;
        }
        if let Some(dir) = lookup("CHECKERS_STATIC_DIR").filter(|d| !d.is_empty()) {
            config.static_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// 监听地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
