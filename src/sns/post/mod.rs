//! 帖子模块
//!
//! 帖子、评论和点赞的状态镜像与动作

pub mod api;
pub mod listener;
pub mod models;
pub mod store;

// 重新导出主要类型
pub use api::PostApi;
pub use listener::{EmptyPostListener, PostListener};
pub use models::{Comment, Post, Visibility};
pub use store::PostStore;
