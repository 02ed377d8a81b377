//! 帖子状态容器
//!
//! 持有帖子列表和按帖子分组的评论缓存，暴露可见性相关的派生视图
//! 和帖子/评论/点赞动作。点赞是乐观更新：本地在请求成功后立即
//! 调整计数，不会再次向服务器确认。

use crate::sns::http::HttpApi;
use crate::sns::post::api::PostApi;
use crate::sns::post::listener::{EmptyPostListener, PostListener};
use crate::sns::post::models::{Comment, Post, Visibility};
use crate::sns::session::SessionProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// 帖子状态容器
pub struct PostStore {
    session: Arc<dyn SessionProvider>,
    api: PostApi,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<HashMap<String, Vec<Comment>>>,
    loading: AtomicBool,
    error: RwLock<Option<String>>,
    listener: RwLock<Arc<dyn PostListener>>,
}

impl PostStore {
    /// 创建新的帖子状态容器
    pub fn new(http: Arc<HttpApi>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            session,
            api: PostApi::new(http),
            posts: RwLock::new(Vec::new()),
            comments: RwLock::new(HashMap::new()),
            loading: AtomicBool::new(false),
            error: RwLock::new(None),
            listener: RwLock::new(Arc::new(EmptyPostListener)),
        }
    }

    /// 注册帖子监听器
    pub fn set_listener(&self, listener: Arc<dyn PostListener>) {
        *self.listener.write().unwrap() = listener;
    }

    // ===================== 状态读取 =====================

    /// 帖子列表快照
    pub fn posts(&self) -> Vec<Post> {
        self.posts.read().unwrap().clone()
    }

    /// 指定帖子的评论缓存快照（未拉取过时为空）
    pub fn comments(&self, post_id: &str) -> Vec<Comment> {
        self.comments
            .read()
            .unwrap()
            .get(post_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 指定帖子是否存在评论缓存条目
    pub fn has_comments_entry(&self, post_id: &str) -> bool {
        self.comments.read().unwrap().contains_key(post_id)
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

    /// 公开帖子
    pub fn public_posts(&self) -> Vec<Post> {
        self.posts
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.visibility == Visibility::Public)
            .cloned()
            .collect()
    }

    /// 当前用户自己的帖子
    pub fn user_posts(&self) -> Vec<Post> {
        let Some(uid) = self.session.user_id() else {
            return Vec::new();
        };
        self.posts
            .read()
            .unwrap()
            .iter()
            .filter(|p| p.author_id == uid)
            .cloned()
            .collect()
    }

    /// 好友可见的帖子：他人的私密帖子加所有公开帖子
    pub fn friend_posts(&self) -> Vec<Post> {
        let uid = self.session.user_id();
        self.posts
            .read()
            .unwrap()
            .iter()
            .filter(|p| {
                (p.visibility == Visibility::Private && Some(&p.author_id) != uid.as_ref())
                    || p.visibility == Visibility::Public
            })
            .cloned()
            .collect()
    }

    /// 指定群组内的帖子
    pub fn group_posts(&self, group_id: &str) -> Vec<Post> {
        self.posts
            .read()
            .unwrap()
            .iter()
            .filter(|p| {
                p.visibility == Visibility::Group && p.group_id.as_deref() == Some(group_id)
            })
            .cloned()
            .collect()
    }

    // ===================== 动作 =====================

    /// 拉取帖子列表（允许匿名）
    pub async fn fetch_posts(&self) -> bool {
        self.begin_action();

        let resp = self.api.get_posts().await;
        let ok = match resp.data {
            Some(fetched) if resp.is_ok() => {
                *self.posts.write().unwrap() = fetched.posts;
                self.emit_post_list_changed().await;
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

    /// 创建帖子，成功时插入列表头部
    pub async fn create_post(
        &self,
        content: &str,
        visibility: Visibility,
        group_id: Option<&str>,
        media: Option<&str>,
    ) -> Option<Post> {
        self.guard_session("发布帖子")?;
        self.begin_action();

        let resp = self
            .api
            .create_post(content, visibility, group_id, media)
            .await;
        let out = match resp.data {
            Some(post) if resp.is_ok() => {
                self.posts.write().unwrap().insert(0, post.clone());
                self.emit_post_list_changed().await;
                info!("[PostStore] ✅ 帖子已发布: {}", post.post_id);
                Some(post)
            }
            _ => {
                self.store_error(resp.error);
                None
            }
        };

        self.end_action();
        out
    }

    /// 更新帖子，用服务器返回的记录替换本地镜像
    pub async fn update_post(
        &self,
        post_id: &str,
        content: &str,
        visibility: Visibility,
        group_id: Option<&str>,
        media: Option<&str>,
    ) -> bool {
        if self.guard_session("更新帖子").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self
            .api
            .update_post(post_id, content, visibility, group_id, media)
            .await;
        let ok = match resp.data {
            Some(updated) if resp.is_ok() => {
                {
                    let mut posts = self.posts.write().unwrap();
                    reconcile::replace_post(&mut posts, &updated);
                }
                self.emit_post_list_changed().await;
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

    /// 删除帖子，连同本地评论缓存条目一并移除
    pub async fn delete_post(&self, post_id: &str) -> bool {
        if self.guard_session("删除帖子").is_none() {
            return false;
        }
        self.begin_action();

        let resp = self.api.delete_post(post_id).await;
        let ok = if resp.is_ok() {
            {
                let mut posts = self.posts.write().unwrap();
                let mut comments = self.comments.write().unwrap();
                reconcile::remove_post(&mut posts, &mut comments, post_id);
            }
            self.emit_post_list_changed().await;
            info!("[PostStore] 🗑️ 帖子已删除: {}", post_id);
            true
        } else {
            self.store_error(resp.error);
            false
        };

        self.end_action();
        ok
    }

    /// 点赞帖子
    pub async fn like_post(&self, post_id: &str) -> bool {
        let Some(uid) = self.guard_session("点赞") else {
            return false;
        };

        let resp = self.api.like_post(post_id).await;
        if resp.is_ok() {
            {
                let mut posts = self.posts.write().unwrap();
                if let Some(post) = posts.iter_mut().find(|p| p.post_id == post_id) {
                    reconcile::apply_like(post, &uid);
                }
            }
            self.emit_post_list_changed().await;
            true
        } else {
            self.store_error(resp.error);
            false
        }
    }

    /// 取消点赞（计数不会减到 0 以下）
    pub async fn unlike_post(&self, post_id: &str) -> bool {
        let Some(uid) = self.guard_session("取消点赞") else {
            return false;
        };

        let resp = self.api.unlike_post(post_id).await;
        if resp.is_ok() {
            {
                let mut posts = self.posts.write().unwrap();
                if let Some(post) = posts.iter_mut().find(|p| p.post_id == post_id) {
                    reconcile::apply_unlike(post, &uid);
                }
            }
            self.emit_post_list_changed().await;
            true
        } else {
            self.store_error(resp.error);
            false
        }
    }

    /// 拉取帖子评论并刷新评论缓存（允许匿名），失败时返回空列表
    pub async fn fetch_comments(&self, post_id: &str) -> Vec<Comment> {
        if post_id.is_empty() {
            return Vec::new();
        }
        self.begin_action();

        let resp = self.api.get_comments(post_id).await;
        let out = match resp.data {
            Some(fetched) if resp.is_ok() => {
                self.comments
                    .write()
                    .unwrap()
                    .insert(post_id.to_string(), fetched.comments.clone());
                self.emit_comments_changed(post_id).await;
                fetched.comments
            }
            _ => {
                self.store_error(resp.error);
                Vec::new()
            }
        };

        self.end_action();
        out
    }

    /// 添加评论，成功时追加到评论缓存并递增帖子的评论计数
    pub async fn add_comment(&self, post_id: &str, content: &str) -> Option<Comment> {
        self.guard_session("评论")?;
        self.begin_action();

        let resp = self.api.add_comment(post_id, content).await;
        let out = match resp.data {
            Some(comment) if resp.is_ok() => {
                {
                    let mut posts = self.posts.write().unwrap();
                    let mut comments = self.comments.write().unwrap();
                    reconcile::append_comment(&mut posts, &mut comments, comment.clone());
                }
                self.emit_comments_changed(post_id).await;
                self.emit_post_list_changed().await;
                Some(comment)
            }
            _ => {
                self.store_error(resp.error);
                None
            }
        };

        self.end_action();
        out
    }

    // ===================== 内部辅助 =====================

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
        warn!("[PostStore] ❌ {}", message);
        *self.error.write().unwrap() = Some(message);
    }

    async fn emit_post_list_changed(&self) {
        let listener = self.listener.read().unwrap().clone();
        if let Ok(json) = serde_json::to_string(&*self.posts.read().unwrap()) {
            listener.on_post_list_changed(json).await;
        }
    }

    async fn emit_comments_changed(&self, post_id: &str) {
        let listener = self.listener.read().unwrap().clone();
        let json = {
            let comments = self.comments.read().unwrap();
            serde_json::to_string(comments.get(post_id).map(Vec::as_slice).unwrap_or(&[])).ok()
        };
        if let Some(json) = json {
            listener
                .on_comments_changed(post_id.to_string(), json)
                .await;
        }
    }
}

/// 显式对账函数：每个帖子状态迁移对应一个可单测的函数
pub(crate) mod reconcile {
    use super::*;

    /// 用服务器返回的记录替换列表中的同 ID 帖子
    pub fn replace_post(posts: &mut [Post], updated: &Post) {
        if let Some(post) = posts.iter_mut().find(|p| p.post_id == updated.post_id) {
            *post = updated.clone();
        }
    }

    /// 删除帖子并清理评论缓存条目，不留孤儿键
    pub fn remove_post(
        posts: &mut Vec<Post>,
        comments: &mut HashMap<String, Vec<Comment>>,
        post_id: &str,
    ) {
        posts.retain(|p| p.post_id != post_id);
        comments.remove(post_id);
    }

    /// 点赞：计数加一，把用户加入 `user_likes`（幂等）
    pub fn apply_like(post: &mut Post, user_id: &str) {
        post.likes_count += 1;
        let likes = post.user_likes.get_or_insert_with(Vec::new);
        if !likes.iter().any(|id| id == user_id) {
            likes.push(user_id.to_string());
        }
    }

    /// 取消点赞：计数减一但不低于 0，并把用户移出 `user_likes`
    pub fn apply_unlike(post: &mut Post, user_id: &str) {
        post.likes_count = (post.likes_count - 1).max(0);
        if let Some(likes) = post.user_likes.as_mut() {
            likes.retain(|id| id != user_id);
        }
    }

    /// 追加评论并递增对应帖子的评论计数
    pub fn append_comment(
        posts: &mut [Post],
        comments: &mut HashMap<String, Vec<Comment>>,
        comment: Comment,
    ) {
        if let Some(post) = posts.iter_mut().find(|p| p.post_id == comment.post_id) {
            post.comments_count += 1;
        }
        comments
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
    }
}

#[cfg(test)]
mod tests {
    use super::reconcile;
    use super::*;
    use chrono::Utc;

    fn post(id: &str, likes: i64, user_likes: Option<Vec<&str>>) -> Post {
        Post {
            post_id: id.to_string(),
            content: "测试内容".to_string(),
            media: None,
            author_id: "author".to_string(),
            author_name: "作者".to_string(),
            author_avatar: None,
            created_at: Utc::now(),
            updated_at: None,
            group_id: None,
            visibility: Visibility::Public,
            likes_count: likes,
            comments_count: 0,
            user_likes: user_likes.map(|v| v.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn like_then_unlike_restores_original_state() {
        let mut p = post("p1", 3, Some(vec!["u_other"]));
        reconcile::apply_like(&mut p, "u_me");
        assert_eq!(p.likes_count, 4);
        assert!(p.user_likes.as_ref().unwrap().contains(&"u_me".to_string()));

        reconcile::apply_unlike(&mut p, "u_me");
        assert_eq!(p.likes_count, 3);
        assert!(!p.user_likes.as_ref().unwrap().contains(&"u_me".to_string()));
    }

    #[test]
    fn like_initializes_missing_user_likes() {
        let mut p = post("p1", 0, None);
        reconcile::apply_like(&mut p, "u_me");
        assert_eq!(p.user_likes.as_deref(), Some(&["u_me".to_string()][..]));
    }

    #[test]
    fn unlike_never_goes_below_zero() {
        let mut p = post("p1", 0, Some(vec![]));
        reconcile::apply_unlike(&mut p, "u_me");
        assert_eq!(p.likes_count, 0);
    }

    #[test]
    fn remove_post_drops_comment_entry() {
        let mut posts = vec![post("p1", 0, None), post("p2", 0, None)];
        let mut comments = HashMap::new();
        comments.insert("p1".to_string(), Vec::<Comment>::new());
        reconcile::remove_post(&mut posts, &mut comments, "p1");
        assert_eq!(posts.len(), 1);
        assert!(!comments.contains_key("p1"));
    }

    #[test]
    fn append_comment_bumps_post_counter() {
        let mut posts = vec![post("p1", 0, None)];
        let mut comments = HashMap::new();
        let comment = Comment {
            comment_id: "c1".to_string(),
            post_id: "p1".to_string(),
            content: "不错".to_string(),
            author_id: "u1".to_string(),
            author_name: "一号".to_string(),
            author_avatar: None,
            created_at: Utc::now(),
        };
        reconcile::append_comment(&mut posts, &mut comments, comment);
        assert_eq!(posts[0].comments_count, 1);
        assert_eq!(comments.get("p1").map(Vec::len), Some(1));
    }
}
