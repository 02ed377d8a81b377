pub mod auth;
pub mod client;
pub mod friend;
pub mod group;
pub mod http;
pub mod post;
pub mod session;
pub mod types;

// 重新导出认证相关函数
pub use auth::{login_async, refresh_async};

// 重新导出会话相关类型
pub use session::{
    EmptySessionExpiredHandler, MemorySession, SessionExpiredHandler, SessionProvider,
};
