//! 群组监听器回调接口

use async_trait::async_trait;

/// 群组监听器回调接口
///
/// 状态容器完成一次成功的本地对账后触发
#[async_trait]
pub trait GroupListener: Send + Sync {
    /// 群组列表发生变更，参数为 JSON 数组字符串
    async fn on_group_list_changed(&self, groups_json: String);

    /// 某个群组的成员缓存发生变更，参数为群组 ID 和成员 JSON 数组字符串
    async fn on_group_members_changed(&self, group_id: String, members_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyGroupListener;

#[async_trait]
impl GroupListener for EmptyGroupListener {
    async fn on_group_list_changed(&self, _groups_json: String) {
        // 默认不做任何处理
    }

    async fn on_group_members_changed(&self, _group_id: String, _members_json: String) {
        // 默认不做任何处理
    }
}
