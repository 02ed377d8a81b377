//! 好友状态容器
//!
//! 持有好友申请、好友和屏蔽列表的内存镜像，暴露派生视图和动作函数。
//! 每个动作的统一形状：会话守卫 → 置 loading → 一次 HTTP 请求 →
//! 成功时通过显式对账函数更新本地集合并触发监听器 →
//! 失败时保存人类可读错误信息 → 清 loading → 返回失败哨兵
//! （`None`/`false`）而不是抛异常。

use crate::sns::friend::api::FriendApi;
use crate::sns::friend::listener::{EmptyFriendListener, FriendListener};
use crate::sns::friend::models::{Friend, FriendRequest, FriendRequestStatus};
use crate::sns::http::HttpApi;
use crate::sns::session::SessionProvider;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// 好友状态容器
pub struct FriendStore {
    session: Arc<dyn SessionProvider>,
    api: FriendApi,
    requests: RwLock<Vec<FriendRequest>>,
    friends: RwLock<Vec<Friend>>,
    blocked: RwLock<Vec<String>>,
    loading: AtomicBool,
    error: RwLock<Option<String>>,
    listener: RwLock<Arc<dyn FriendListener>>,
}

impl FriendStore {
    /// 创建新的好友状态容器
    pub fn new(http: Arc<HttpApi>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            session,
            api: FriendApi::new(http),
            requests: RwLock::new(Vec::new()),
            friends: RwLock::new(Vec::new()),
            blocked: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            error: RwLock::new(None),
            listener: RwLock::new(Arc::new(EmptyFriendListener)),
        }
    }

    /// 注册好友监听器
    pub fn set_listener(&self, listener: Arc<dyn FriendListener>) {
        *self.listener.write().unwrap() = listener;
    }

    // ===================== 状态读取 =====================

    /// 当前好友申请列表快照
    pub fn friend_requests(&self) -> Vec<FriendRequest> {
        self.requests.read().unwrap().clone()
    }

    /// 当前好友列表快照
    pub fn friends(&self) -> Vec<Friend> {
        self.friends.read().unwrap().clone()
    }

    /// 当前屏蔽用户 ID 列表快照
    pub fn blocked_users(&self) -> Vec<String> {
        self.blocked.read().unwrap().clone()
    }

    /// 是否有动作正在进行
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// 最近一次失败的错误信息
    pub fn last_error(&self) -> Option<String> {
        self.error.read().unwrap().clone()
    }

    // ===================== 派生视图 =====================

    /// 发给当前用户的待处理申请
    pub fn incoming_requests(&self) -> Vec<FriendRequest> {
        let Some(uid) = self.session.user_id() else {
            return Vec::new();
        };
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.receiver_id == uid && r.status == FriendRequestStatus::Pending)
            .cloned()
            .collect()
    }

    /// 当前用户发出的待处理申请
    pub fn outgoing_requests(&self) -> Vec<FriendRequest> {
        let Some(uid) = self.session.user_id() else {
            return Vec::new();
        };
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.sender_id == uid && r.status == FriendRequestStatus::Pending)
            .cloned()
            .collect()
    }

    /// 指定用户是否是当前用户的好友
    pub fn is_friend(&self, user_id: &str) -> bool {
        self.friends
            .read()
            .unwrap()
            .iter()
            .any(|f| f.user_id == user_id)
    }

    /// 指定用户是否被当前用户屏蔽
    pub fn is_blocked(&self, user_id: &str) -> bool {
        self.blocked.read().unwrap().iter().any(|id| id == user_id)
    }

    /// 指定用户是否向当前用户发过待处理申请
    pub fn has_pending_request_from(&self, user_id: &str) -> bool {
        let Some(uid) = self.session.user_id() else {
            return false;
        };
        self.requests.read().unwrap().iter().any(|r| {
            r.sender_id == user_id
                && r.receiver_id == uid
                && r.status == FriendRequestStatus::Pending
        })
    }

    /// 当前用户是否向指定用户发过待处理申请
    pub fn has_pending_request_to(&self, user_id: &str) -> bool {
        let Some(uid) = self.session.user_id() else {
            return false;
        };
        self.requests.read().unwrap().iter().any(|r| {
            r.sender_id == uid
                && r.receiver_id == user_id
                && r.status == FriendRequestStatus::Pending
        })
    }

    // ===================== 动作 =====================

    /// 拉取好友申请列表
    pub async fn fetch_friend_requests(&self) -> bool {
        if self.guard_session("获取好友申请列表").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.get_friend_requests().await;
        let ok = match resp.data {
            Some(fetched) if resp.is_ok() => {
                *self.requests.write().unwrap() = fetched;
                self.emit_request_list_changed().await;
                true
            }
            _ => {
                self.store_error(resp.error);
                false
            }
        };

        self.end_action();
        ok
    }

    /// 拉取好友列表
    pub async fn fetch_friends(&self) -> bool {
        if self.guard_session("获取好友列表").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.get_friends().await;
        let ok = match resp.data {
            Some(fetched) if resp.is_ok() => {
                *self.friends.write().unwrap() = fetched;
                self.emit_friend_list_changed().await;
                true
            }
            _ => {
                self.store_error(resp.error);
                false
            }
        };

        self.end_action();
        ok
    }

    /// 拉取屏蔽用户列表
    pub async fn fetch_blocked_users(&self) -> bool {
        if self.guard_session("获取屏蔽列表").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.get_blocked_users().await;
        let ok = match resp.data {
            Some(fetched) if resp.is_ok() => {
                *self.blocked.write().unwrap() = fetched;
                self.emit_blocked_list_changed().await;
                true
            }
            _ => {
                self.store_error(resp.error);
                false
            }
        };

        self.end_action();
        ok
    }

    /// 发送好友申请，成功时返回服务器创建的申请记录
    pub async fn send_friend_request(&self, receiver_id: &str) -> Option<FriendRequest> {
        self.guard_session("发送好友申请")?;
        self.begin_action();

        let resp = self.api.send_friend_request(receiver_id).await;
        let out = match resp.data {
            Some(request) if resp.is_ok() => {
                self.requests.write().unwrap().push(request.clone());
                self.emit_request_list_changed().await;
                Some(request)
            }
            _ => {
                self.store_error(resp.error);
                None
            }
        };

        self.end_action();
        out
    }

    /// 响应好友申请（只接受 `Accepted` 或 `Rejected`）
    ///
    /// 接受时本地合成一个好友记录（来自申请的发送方字段），
    /// 保证好友集合恰好增加一条。
    pub async fn respond_to_friend_request(
        &self,
        request_id: &str,
        status: FriendRequestStatus,
    ) -> bool {
        if !matches!(
            status,
            FriendRequestStatus::Accepted | FriendRequestStatus::Rejected
        ) {
            self.store_error(Some(format!("无效的申请响应状态: {:?}", status)));
            return false;
        }
        if self.guard_session("响应好友申请").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.respond_to_friend_request(request_id, status).await;
        let ok = if resp.is_ok() {
            let now = Utc::now();
            let accepted_request = {
                let mut requests = self.requests.write().unwrap();
                reconcile::mark_request_status(&mut requests, request_id, status, now);
                requests.iter().find(|r| r.id == request_id).cloned()
            };

            if status == FriendRequestStatus::Accepted {
                match accepted_request {
                    Some(request) => {
                        let friend = reconcile::friend_from_accepted_request(&request);
                        self.friends.write().unwrap().push(friend);
                        self.emit_friend_list_changed().await;
                    }
                    None => {
                        // 本地没有该申请的镜像，退回全量拉取好友列表
                        warn!(
                            "[FriendStore] 本地未找到申请 {}，改为重新拉取好友列表",
                            request_id
                        );
                        let refetch = self.api.get_friends().await;
                        if let Some(fetched) = refetch.data {
                            *self.friends.write().unwrap() = fetched;
                            self.emit_friend_list_changed().await;
                        }
                    }
                }
            }

            self.emit_request_list_changed().await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 删除好友
    pub async fn unfriend(&self, friend_user_id: &str) -> bool {
        if self.guard_session("删除好友").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.unfriend(friend_user_id).await;
        let ok = if resp.is_ok() {
            let removed = {
                let mut friends = self.friends.write().unwrap();
                reconcile::remove_friend(&mut friends, friend_user_id)
            };
            if removed.is_some() {
                info!("[FriendStore] 🗑️ 已删除好友: {}", friend_user_id);
            }
            self.emit_friend_list_changed().await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 屏蔽用户
    ///
    /// 先请求屏蔽，成功后如双方是好友则再删除好友，并把双方之间的
    /// 待处理申请标记为已拒绝。两步之间没有补偿：若删除好友失败，
    /// 屏蔽仍然生效，错误信息会被保存。
    pub async fn block_user(&self, user_id: &str, user_name: &str) -> bool {
        let Some(uid) = self.guard_session("屏蔽用户") else {
            return false;
        };
        if self.is_blocked(user_id) {
            self.store_error(Some("用户已被屏蔽".to_string()));
            return false;
        }
        self.begin_action();

        let resp = self.api.block_user(user_id, user_name).await;
        let ok = if resp.is_ok() {
            if self.is_friend(user_id) {
                let unfriend_resp = self.api.unfriend(user_id).await;
                if unfriend_resp.is_ok() {
                    let mut friends = self.friends.write().unwrap();
                    reconcile::remove_friend(&mut friends, user_id);
                } else {
                    warn!(
                        "[FriendStore] ⚠️ 屏蔽后删除好友失败: {:?}",
                        unfriend_resp.error
                    );
                    self.store_error(unfriend_resp.error);
                }
            }

            {
                let mut requests = self.requests.write().unwrap();
                reconcile::reject_pending_requests_between(
                    &mut requests,
                    &uid,
                    user_id,
                    Utc::now(),
                );
            }
            self.blocked.write().unwrap().push(user_id.to_string());

            self.emit_friend_list_changed().await;
            self.emit_request_list_changed().await;
            self.emit_blocked_list_changed().await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 取消屏蔽用户
    pub async fn unblock_user(&self, user_id: &str) -> bool {
        if self.guard_session("取消屏蔽用户").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.unblock_user(user_id).await;
        let ok = if resp.is_ok() {
            self.blocked.write().unwrap().retain(|id| id != user_id);
            self.emit_blocked_list_changed().await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    // ===================== 内部辅助 =====================

    /// 会话守卫：要求已登录（用户 ID 和访问令牌都存在），
    /// 否则保存错误并返回 None。守卫失败时不会发出任何网络请求。
    fn guard_session(&self, action: &str) -> Option<String> {
        match (self.session.user_id(), self.session.access_token()) {
            (Some(uid), Some(_)) => Some(uid),
            _ => {
                self.store_error(Some(format!("需要先登录才能{}", action)));
                None
            }
        }
    }

    fn begin_action(&self) {
        self.loading.store(true, Ordering::SeqCst);
        *self.error.write().unwrap() = None;
    }

    fn end_action(&self) {
        self.loading.store(false, Ordering::SeqCst);
    }

    fn store_error(&self, error: Option<String>) {
        let message = error.unwrap_or_else(|| "未知错误".to_string());
        warn!("[FriendStore] ❌ {}", message);
        *self.error.write().unwrap() = Some(message);
    }

    async fn emit_friend_list_changed(&self) {
        let listener = self.listener.read().unwrap().clone();
        if let Ok(json) = serde_json::to_string(&*self.friends.read().unwrap()) {
            listener.on_friend_list_changed(json).await;
        }
    }

    async fn emit_request_list_changed(&self) {
        let listener = self.listener.read().unwrap().clone();
        if let Ok(json) = serde_json::to_string(&*self.requests.read().unwrap()) {
            listener.on_friend_request_list_changed(json).await;
        }
    }

    async fn emit_blocked_list_changed(&self) {
        let listener = self.listener.read().unwrap().clone();
        if let Ok(json) = serde_json::to_string(&*self.blocked.read().unwrap()) {
            listener.on_blocked_list_changed(json).await;
        }
    }
}

/// 显式对账函数：每个实体状态迁移对应一个可单测的函数
pub(crate) mod reconcile {
    use super::*;

    /// 从已接受的申请合成好友记录（发送方字段）
    pub fn friend_from_accepted_request(request: &FriendRequest) -> Friend {
        Friend {
            id: request.id.clone(),
            user_id: request.sender_id.clone(),
            display_name: request.sender_name.clone(),
            photo_url: request.sender_photo_url.clone(),
            email: None,
        }
    }

    /// 更新指定申请的状态和更新时间
    pub fn mark_request_status(
        requests: &mut [FriendRequest],
        request_id: &str,
        status: FriendRequestStatus,
        updated_at: DateTime<Utc>,
    ) {
        if let Some(request) = requests.iter_mut().find(|r| r.id == request_id) {
            request.status = status;
            request.updated_at = Some(updated_at);
        }
    }

    /// 按用户 ID 移除好友，返回被移除的记录
    pub fn remove_friend(friends: &mut Vec<Friend>, user_id: &str) -> Option<Friend> {
        let index = friends.iter().position(|f| f.user_id == user_id)?;
        Some(friends.remove(index))
    }

    /// 把两个用户之间的待处理申请全部标记为已拒绝
    pub fn reject_pending_requests_between(
        requests: &mut [FriendRequest],
        user_a: &str,
        user_b: &str,
        updated_at: DateTime<Utc>,
    ) {
        for request in requests.iter_mut() {
            let between = (request.sender_id == user_a && request.receiver_id == user_b)
                || (request.sender_id == user_b && request.receiver_id == user_a);
            if between && request.status == FriendRequestStatus::Pending {
                request.status = FriendRequestStatus::Rejected;
                request.updated_at = Some(updated_at);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use super::*;

    fn request(id: &str, sender: &str, receiver: &str, status: FriendRequestStatus) -> FriendRequest {
        FriendRequest {
            id: id.to_string(),
            sender_id: sender.to_string(),
            sender_name: format!("{}-name", sender),
            sender_photo_url: Some(format!("https://cdn.example.com/{}.png", sender)),
            receiver_id: receiver.to_string(),
            receiver_name: format!("{}-name", receiver),
            receiver_photo_url: None,
            status,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn friend_synthesized_from_sender_fields() {
        let req = request("r1", "u_alice", "u_bob", FriendRequestStatus::Pending);
        let friend = reconcile::friend_from_accepted_request(&req);
        assert_eq!(friend.id, "r1");
        assert_eq!(friend.user_id, "u_alice");
        assert_eq!(friend.display_name, "u_alice-name");
        assert_eq!(friend.photo_url.as_deref(), Some("https://cdn.example.com/u_alice.png"));
    }

    #[test]
    fn mark_status_updates_only_matching_request() {
        let mut requests = vec![
            request("r1", "a", "b", FriendRequestStatus::Pending),
            request("r2", "c", "b", FriendRequestStatus::Pending),
        ];
        let now = Utc::now();
        reconcile::mark_request_status(&mut requests, "r1", FriendRequestStatus::Accepted, now);
        assert_eq!(requests[0].status, FriendRequestStatus::Accepted);
        assert_eq!(requests[0].updated_at, Some(now));
        assert_eq!(requests[1].status, FriendRequestStatus::Pending);
        assert_eq!(requests[1].updated_at, None);
    }

    #[test]
    fn remove_friend_by_user_id() {
        let mut friends = vec![
            Friend {
                id: "f1".into(),
                user_id: "u1".into(),
                display_name: "一号".into(),
                photo_url: None,
                email: None,
            },
            Friend {
                id: "f2".into(),
                user_id: "u2".into(),
                display_name: "二号".into(),
                photo_url: None,
                email: None,
            },
        ];
        let removed = reconcile::remove_friend(&mut friends, "u1");
        assert_eq!(removed.map(|f| f.id), Some("f1".to_string()));
        assert_eq!(friends.len(), 1);
        assert!(reconcile::remove_friend(&mut friends, "u_missing").is_none());
    }

    #[test]
    fn reject_pending_requests_in_both_directions() {
        let mut requests = vec![
            request("r1", "me", "them", FriendRequestStatus::Pending),
            request("r2", "them", "me", FriendRequestStatus::Pending),
            request("r3", "me", "other", FriendRequestStatus::Pending),
            request("r4", "them", "me", FriendRequestStatus::Accepted),
        ];
        reconcile::reject_pending_requests_between(&mut requests, "me", "them", Utc::now());
        assert_eq!(requests[0].status, FriendRequestStatus::Rejected);
        assert_eq!(requests[1].status, FriendRequestStatus::Rejected);
        // 其他用户和非待处理的申请保持不变
        assert_eq!(requests[2].status, FriendRequestStatus::Pending);
        assert_eq!(requests[3].status, FriendRequestStatus::Accepted);
    }
}
