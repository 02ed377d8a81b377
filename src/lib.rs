pub mod sns;

// 重新导出常用类型和函数，方便外部使用
pub use sns::{
    client::{ClientConfig, SnsClient},
    friend::{Friend, FriendRequest, FriendRequestStatus, FriendStore},
    group::{Group, GroupMember, GroupStore},
    http::HttpApi,
    login_async,
    post::{Comment, Post, PostStore, Visibility},
    types::ApiResult,
    MemorySession, SessionExpiredHandler, SessionProvider,
};
