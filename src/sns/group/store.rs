//! 群组状态容器
//!
//! 持有群组列表、我的群组、当前查看的群组和按群组分组的成员缓存。
//! `Group.members` / `Group.admins` 是成员关系的权威本地表示，
//! 成员缓存只做展示用：变更时尽力更新，`fetch_group_members`
//! 负责权威刷新。

use crate::sns::group::api::GroupApi;
use crate::sns::group::listener::{EmptyGroupListener, GroupListener};
use crate::sns::group::models::{Group, GroupMember};
use crate::sns::http::HttpApi;
use crate::sns::session::SessionProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// 群组状态容器
pub struct GroupStore {
    session: Arc<dyn SessionProvider>,
    api: GroupApi,
    groups: RwLock<Vec<Group>>,
    my_groups: RwLock<Vec<Group>>,
    current_group: RwLock<Option<Group>>,
    members: RwLock<HashMap<String, Vec<GroupMember>>>,
    loading: AtomicBool,
    error: RwLock<Option<String>>,
    listener: RwLock<Arc<dyn GroupListener>>,
}

impl GroupStore {
    /// 创建新的群组状态容器
    pub fn new(http: Arc<HttpApi>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            session,
            api: GroupApi::new(http),
            groups: RwLock::new(Vec::new()),
            my_groups: RwLock::new(Vec::new()),
            current_group: RwLock::new(None),
            members: RwLock::new(HashMap::new()),
            loading: AtomicBool::new(false),
            error: RwLock::new(None),
            listener: RwLock::new(Arc::new(EmptyGroupListener)),
        }
    }

    /// 注册群组监听器
    pub fn set_listener(&self, listener: Arc<dyn GroupListener>) {
        *self.listener.write().unwrap() = listener;
    }

    // ===================== 状态读取 =====================

    /// 所有群组快照
    pub fn groups(&self) -> Vec<Group> {
        self.groups.read().unwrap().clone()
    }

    /// 我的群组快照
    pub fn my_groups(&self) -> Vec<Group> {
        self.my_groups.read().unwrap().clone()
    }

    /// 当前查看的群组
    pub fn current_group(&self) -> Option<Group> {
        self.current_group.read().unwrap().clone()
    }

    /// 指定群组的成员缓存快照（未拉取过时为空）
    pub fn group_members(&self, group_id: &str) -> Vec<GroupMember> {
        self.members
            .read()
            .unwrap()
            .get(group_id)
            .cloned()
            .unwrap_or_default()
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

    /// 当前用户是否是指定群组的成员（以 `Group.members` 为准）
    pub fn is_group_member(&self, group_id: &str) -> bool {
        let Some(uid) = self.session.user_id() else {
            return false;
        };
        self.groups
            .read()
            .unwrap()
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.members.contains(&uid))
            .unwrap_or(false)
    }

    /// 当前用户是否是指定群组的管理员（以 `Group.admins` 为准）
    pub fn is_group_admin(&self, group_id: &str) -> bool {
        let Some(uid) = self.session.user_id() else {
            return false;
        };
        self.groups
            .read()
            .unwrap()
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.admins.contains(&uid))
            .unwrap_or(false)
    }

    /// 当前用户加入的所有群组（在全量列表上过滤）
    pub fn user_groups(&self) -> Vec<Group> {
        let Some(uid) = self.session.user_id() else {
            return Vec::new();
        };
        self.groups
            .read()
            .unwrap()
            .iter()
            .filter(|g| g.members.contains(&uid))
            .cloned()
            .collect()
    }

    // ===================== 动作 =====================

    /// 拉取所有群组（允许匿名）
    pub async fn fetch_groups(&self) -> bool {
        self.begin_action();

        let resp = self.api.get_groups().await;
        let ok = match resp.data {
            Some(fetched) if resp.is_ok() => {
                *self.groups.write().unwrap() = fetched;
                self.emit_group_list_changed().await;
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

    /// 拉取我的群组
    pub async fn fetch_my_groups(&self) -> bool {
        if self.guard_session("获取我的群组").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.get_my_groups().await;
        let ok = match resp.data {
            Some(fetched) if resp.is_ok() => {
                *self.my_groups.write().unwrap() = fetched;
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

    /// 按 ID 拉取群组详情（允许匿名），成功时设为当前查看的群组
    pub async fn fetch_group_by_id(&self, group_id: &str) -> Option<Group> {
        self.begin_action();

        let resp = self.api.get_group_by_id(group_id).await;
        let out = match resp.data {
            Some(group) if resp.is_ok() => {
                *self.current_group.write().unwrap() = Some(group.clone());
                Some(group)
            }
            _ => {
                let message = resp.error.unwrap_or_else(|| "群组不存在".to_string());
                self.store_error(Some(message));
                *self.current_group.write().unwrap() = None;
                None
            }
        };

        self.end_action();
        out
    }

    /// 拉取群组成员并刷新成员缓存（允许匿名），失败时返回空列表
    pub async fn fetch_group_members(&self, group_id: &str) -> Vec<GroupMember> {
        if group_id.is_empty() {
            return Vec::new();
        }
        self.begin_action();

        let resp = self.api.get_group_members(group_id).await;
        let out = match resp.data {
            Some(fetched) if resp.is_ok() => {
                self.members
                    .write()
                    .unwrap()
                    .insert(group_id.to_string(), fetched.clone());
                self.emit_members_changed(group_id).await;
                fetched
            }
            _ => {
                self.store_error(resp.error);
                Vec::new()
            }
        };

        self.end_action();
        out
    }

    /// 创建群组
    ///
    /// 本地只镜像服务器返回的群组，不会自行把创建者加入 `members`；
    /// 创建者是否入组由服务器契约决定。
    pub async fn create_group(
        &self,
        name: &str,
        description: &str,
        image_url: Option<&str>,
    ) -> Option<Group> {
        self.guard_session("创建群组")?;
        self.begin_action();

        let resp = self.api.create_group(name, description, image_url).await;
        let out = match resp.data {
            Some(group) if resp.is_ok() => {
                self.groups.write().unwrap().push(group.clone());
                self.my_groups.write().unwrap().push(group.clone());
                self.emit_group_list_changed().await;
                info!("[GroupStore] ✅ 群组已创建: {}", group.id);
                Some(group)
            }
            _ => {
                self.store_error(resp.error);
                None
            }
        };

        self.end_action();
        out
    }

    /// 更新群组描述字段，用服务器返回的记录替换所有本地镜像
    pub async fn update_group(
        &self,
        group_id: &str,
        name: &str,
        description: &str,
        image_url: Option<&str>,
    ) -> bool {
        if self.guard_session("更新群组").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self
            .api
            .update_group(group_id, name, description, image_url)
            .await;
        let ok = match resp.data {
            Some(updated) if resp.is_ok() => {
                {
                    let mut groups = self.groups.write().unwrap();
                    reconcile::replace_group(&mut groups, &updated);
                }
                {
                    let mut my_groups = self.my_groups.write().unwrap();
                    reconcile::replace_group(&mut my_groups, &updated);
                }
                {
                    let mut current = self.current_group.write().unwrap();
                    if current.as_ref().map(|g| g.id.as_str()) == Some(group_id) {
                        *current = Some(updated);
                    }
                }
                self.emit_group_list_changed().await;
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

    /// 删除群组，连同本地成员缓存一并移除
    pub async fn delete_group(&self, group_id: &str) -> bool {
        if self.guard_session("删除群组").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.delete_group(group_id).await;
        let ok = if resp.is_ok() {
            self.groups.write().unwrap().retain(|g| g.id != group_id);
            self.my_groups.write().unwrap().retain(|g| g.id != group_id);
            {
                let mut current = self.current_group.write().unwrap();
                if current.as_ref().map(|g| g.id.as_str()) == Some(group_id) {
                    *current = None;
                }
            }
            self.members.write().unwrap().remove(group_id);
            self.emit_group_list_changed().await;
            info!("[GroupStore] 🗑️ 群组已删除: {}", group_id);
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 加入群组
    pub async fn join_group(&self, group_id: &str) -> bool {
        let Some(uid) = self.guard_session("加入群组") else {
            return false;
        };
        self.begin_action();

        let resp = self.api.join_group(group_id).await;
        let ok = if resp.is_ok() {
            let joined = {
                let mut groups = self.groups.write().unwrap();
                if let Some(group) = groups.iter_mut().find(|g| g.id == group_id) {
                    reconcile::add_member(group, &uid);
                    Some(group.clone())
                } else {
                    None
                }
            };
            if let Some(group) = joined {
                let mut my_groups = self.my_groups.write().unwrap();
                if !my_groups.iter().any(|g| g.id == group_id) {
                    my_groups.push(group);
                }
            }
            {
                let mut current = self.current_group.write().unwrap();
                if let Some(group) = current.as_mut().filter(|g| g.id == group_id) {
                    reconcile::add_member(group, &uid);
                }
            }
            self.emit_group_list_changed().await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 退出群组（同时移除成员和管理员身份）
    pub async fn leave_group(&self, group_id: &str) -> bool {
        let Some(uid) = self.guard_session("退出群组") else {
            return false;
        };
        self.begin_action();

        let resp = self.api.leave_group(group_id).await;
        let ok = if resp.is_ok() {
            {
                let mut groups = self.groups.write().unwrap();
                if let Some(group) = groups.iter_mut().find(|g| g.id == group_id) {
                    reconcile::remove_member(group, &uid);
                }
            }
            self.my_groups.write().unwrap().retain(|g| g.id != group_id);
            {
                let mut current = self.current_group.write().unwrap();
                if let Some(group) = current.as_mut().filter(|g| g.id == group_id) {
                    reconcile::remove_member(group, &uid);
                }
            }
            {
                let mut members = self.members.write().unwrap();
                if let Some(list) = members.get_mut(group_id) {
                    list.retain(|m| m.user_id != uid);
                }
            }
            self.emit_group_list_changed().await;
            self.emit_members_changed(group_id).await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 把指定用户设为群组管理员
    pub async fn make_admin(&self, group_id: &str, user_id: &str) -> bool {
        if self.guard_session("管理群组管理员").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.make_admin(group_id, user_id).await;
        let ok = if resp.is_ok() {
            self.apply_admin_change(group_id, user_id, true).await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 移除指定用户的群组管理员身份
    pub async fn remove_admin(&self, group_id: &str, user_id: &str) -> bool {
        if self.guard_session("管理群组管理员").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.remove_admin(group_id, user_id).await;
        let ok = if resp.is_ok() {
            self.apply_admin_change(group_id, user_id, false).await;
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    // ===================== 内部辅助 =====================

    /// 在所有镜像上应用管理员变更，并翻转成员缓存里的管理员标记
    async fn apply_admin_change(&self, group_id: &str, user_id: &str, is_admin: bool) {
        {
            let mut groups = self.groups.write().unwrap();
            if let Some(group) = groups.iter_mut().find(|g| g.id == group_id) {
                reconcile::set_admin(group, user_id, is_admin);
            }
        }
        {
            let mut my_groups = self.my_groups.write().unwrap();
            if let Some(group) = my_groups.iter_mut().find(|g| g.id == group_id) {
                reconcile::set_admin(group, user_id, is_admin);
            }
        }
        {
            let mut current = self.current_group.write().unwrap();
            if let Some(group) = current.as_mut().filter(|g| g.id == group_id) {
                reconcile::set_admin(group, user_id, is_admin);
            }
        }
        {
            let mut members = self.members.write().unwrap();
            if let Some(list) = members.get_mut(group_id) {
                reconcile::set_member_admin_flag(list, user_id, is_admin);
            }
        }
        self.emit_group_list_changed().await;
        self.emit_members_changed(group_id).await;
    }

    /// 会话守卫：要求已登录，否则保存错误并返回 None。
    /// 守卫失败时不会发出任何网络请求。
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
        warn!("[GroupStore] ❌ {}", message);
        *self.error.write().unwrap() = Some(message);
    }

    async fn emit_group_list_changed(&self) {
        let listener = self.listener.read().unwrap().clone();
        if let Ok(json) = serde_json::to_string(&*self.groups.read().unwrap()) {
            listener.on_group_list_changed(json).await;
        }
    }

    async fn emit_members_changed(&self, group_id: &str) {
        let listener = self.listener.read().unwrap().clone();
        let json = {
            let members = self.members.read().unwrap();
            serde_json::to_string(members.get(group_id).map(Vec::as_slice).unwrap_or(&[])).ok()
        };
        if let Some(json) = json {
            listener
                .on_group_members_changed(group_id.to_string(), json)
                .await;
        }
    }
}

/// 显式对账函数：每个成员关系迁移对应一个可单测的函数
pub(crate) mod reconcile {
    use super::*;

    /// 用服务器返回的记录替换列表中的同 ID 群组
    pub fn replace_group(groups: &mut [Group], updated: &Group) {
        if let Some(group) = groups.iter_mut().find(|g| g.id == updated.id) {
            *group = updated.clone();
        }
    }

    /// 把用户加入群组成员列表（幂等）
    pub fn add_member(group: &mut Group, user_id: &str) {
        if !group.members.iter().any(|id| id == user_id) {
            group.members.push(user_id.to_string());
        }
    }

    /// 把用户从成员和管理员列表中移除
    pub fn remove_member(group: &mut Group, user_id: &str) {
        group.members.retain(|id| id != user_id);
        group.admins.retain(|id| id != user_id);
    }

    /// 设置或取消管理员身份（幂等）
    pub fn set_admin(group: &mut Group, user_id: &str, is_admin: bool) {
        if is_admin {
            if !group.admins.iter().any(|id| id == user_id) {
                group.admins.push(user_id.to_string());
            }
        } else {
            group.admins.retain(|id| id != user_id);
        }
    }

    /// 翻转成员缓存中指定成员的管理员标记
    pub fn set_member_admin_flag(members: &mut [GroupMember], user_id: &str, is_admin: bool) {
        if let Some(member) = members.iter_mut().find(|m| m.user_id == user_id) {
            member.is_admin = is_admin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use super::*;
    use chrono::Utc;

    fn group(id: &str, members: &[&str], admins: &[&str]) -> Group {
        Group {
            id: id.to_string(),
            name: format!("群组 {}", id),
            description: "测试群组".to_string(),
            image_url: None,
            created_at: Utc::now(),
            created_by: "creator".to_string(),
            creator_name: "创建者".to_string(),
            members: members.iter().map(|s| s.to_string()).collect(),
            admins: admins.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn add_member_is_idempotent() {
        let mut g = group("g1", &["u1"], &[]);
        reconcile::add_member(&mut g, "u2");
        reconcile::add_member(&mut g, "u2");
        assert_eq!(g.members, vec!["u1", "u2"]);
    }

    #[test]
    fn remove_member_also_drops_admin_role() {
        let mut g = group("g1", &["u1", "u2"], &["u2"]);
        reconcile::remove_member(&mut g, "u2");
        assert_eq!(g.members, vec!["u1"]);
        assert!(g.admins.is_empty());
    }

    #[test]
    fn set_admin_toggles_without_duplicates() {
        let mut g = group("g1", &["u1", "u2"], &[]);
        reconcile::set_admin(&mut g, "u2", true);
        reconcile::set_admin(&mut g, "u2", true);
        assert_eq!(g.admins, vec!["u2"]);
        reconcile::set_admin(&mut g, "u2", false);
        assert!(g.admins.is_empty());
    }

    #[test]
    fn replace_group_only_touches_matching_id() {
        let mut groups = vec![group("g1", &[], &[]), group("g2", &[], &[])];
        let mut updated = group("g2", &["u9"], &[]);
        updated.name = "新名字".to_string();
        reconcile::replace_group(&mut groups, &updated);
        assert_eq!(groups[0].name, "群组 g1");
        assert_eq!(groups[1].name, "新名字");
        assert_eq!(groups[1].members, vec!["u9"]);
    }

    #[test]
    fn member_admin_flag_follows_admin_changes() {
        let mut members = vec![GroupMember {
            user_id: "u1".to_string(),
            display_name: "一号".to_string(),
            photo_url: None,
            joined_at: Utc::now(),
            is_admin: false,
        }];
        reconcile::set_member_admin_flag(&mut members, "u1", true);
        assert!(members[0].is_admin);
        reconcile::set_member_admin_flag(&mut members, "u1", false);
        assert!(!members[0].is_admin);
    }
}
