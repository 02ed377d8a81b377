//! 帖子监听器回调接口

use async_trait::async_trait;

/// 帖子监听器回调接口
///
/// 状态容器完成一次成功的本地对账后触发
#[async_trait]
pub trait PostListener: Send + Sync {
    /// 帖子列表发生变更，参数为 JSON 数组字符串
    async fn on_post_list_changed(&self, posts_json: String);

    /// 某个帖子的评论发生变更，参数为帖子 ID 和评论 JSON 数组字符串
    async fn on_comments_changed(&self, post_id: String, comments_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyPostListener;

#[async_trait]
impl PostListener for EmptyPostListener {
    async fn on_post_list_changed(&self, _posts_json: String) {
        // 默认不做任何处理
    }

    async fn on_comments_changed(&self, _post_id: String, _comments_json: String) {
        // 默认不做任何处理
    }
}
