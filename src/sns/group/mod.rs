//! 群组模块
//!
//! 群组列表、成员关系和管理员管理的状态镜像与动作

pub mod api;
pub mod listener;
pub mod models;
pub mod store;

// 重新导出主要类型
pub use api::GroupApi;
pub use listener::{EmptyGroupListener, GroupListener};
pub use models::{Group, GroupMember};
pub use store::GroupStore;
