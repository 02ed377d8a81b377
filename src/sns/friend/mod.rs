//! 好友模块
//!
//! 好友申请、好友列表和屏蔽列表的状态镜像与动作

pub mod api;
pub mod listener;
pub mod models;
pub mod store;

// 重新导出主要类型
pub use api::FriendApi;
pub use listener::{EmptyFriendListener, FriendListener};
pub use models::{Friend, FriendRequest, FriendRequestStatus};
pub use store::FriendStore;
