//! SNS CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示 SNS 功能
//! 启动时通过命令行参数指定账号，自动登录，拉取好友/群组/帖子并打印摘要

use anyhow::Result;
use clap::Parser;
use sns_sdk_core_rust::sns::client::{ClientConfig, SnsClient};
use sns_sdk_core_rust::sns::friend::FriendListener;
use sns_sdk_core_rust::sns::group::GroupListener;
use sns_sdk_core_rust::sns::post::PostListener;
use sns_sdk_core_rust::sns::session::SessionExpiredHandler;
use std::sync::Arc;
use tracing::{error, info};

/// SNS CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "sns-cli")]
#[command(about = "SNS CLI 客户端 - 用于测试和展示好友/群组/帖子功能", long_about = None)]
struct Args {
    /// API 基础地址（默认: http://localhost:3000/api）
    #[arg(short, long, default_value = "http://localhost:3000/api")]
    server: String,

    /// 登录邮箱
    #[arg(short, long)]
    email: String,

    /// 登录密码
    #[arg(short, long)]
    password: String,

    /// 日志级别（默认: info,sns_sdk_core_rust=debug）
    #[arg(long, default_value = "info,sns_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 设置监听器（输出所有状态变更）
fn setup_listeners(client: &SnsClient) {
    // 好友监听器
    struct CliFriendListener;
    #[async_trait::async_trait]
    impl FriendListener for CliFriendListener {
        async fn on_friend_list_changed(&self, friends_json: String) {
            info!("[CLI/Friend] 👥 好友列表变更: {}", friends_json);
        }

        async fn on_friend_request_list_changed(&self, requests_json: String) {
            info!("[CLI/Friend] 📝 好友申请变更: {}", requests_json);
        }

        async fn on_blocked_list_changed(&self, blocked_json: String) {
            info!("[CLI/Friend] 🚫 屏蔽列表变更: {}", blocked_json);
        }
    }
    client.set_friend_listener(Arc::new(CliFriendListener));

    // 群组监听器
    struct CliGroupListener;
    #[async_trait::async_trait]
    impl GroupListener for CliGroupListener {
        async fn on_group_list_changed(&self, groups_json: String) {
            info!("[CLI/Group] 🏘️ 群组列表变更: {}", groups_json);
        }

        async fn on_group_members_changed(&self, group_id: String, members_json: String) {
            info!(
                "[CLI/Group] 👥 群成员变更: groupID={}, members={}",
                group_id, members_json
            );
        }
    }
    client.set_group_listener(Arc::new(CliGroupListener));

    // 帖子监听器
    struct CliPostListener;
    #[async_trait::async_trait]
    impl PostListener for CliPostListener {
        async fn on_post_list_changed(&self, posts_json: String) {
            info!("[CLI/Post] 📰 帖子列表变更: {}", posts_json);
        }

        async fn on_comments_changed(&self, post_id: String, comments_json: String) {
            info!(
                "[CLI/Post] 💬 评论变更: postID={}, comments={}",
                post_id, comments_json
            );
        }
    }
    client.set_post_listener(Arc::new(CliPostListener));
}

/// 会话过期回调：CLI 场景下只打印错误
struct CliSessionExpiredHandler;

#[async_trait::async_trait]
impl SessionExpiredHandler for CliSessionExpiredHandler {
    async fn on_session_expired(&self) {
        error!("[CLI] ⚠️ 会话已过期，请重新登录");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 SNS CLI 客户端（测试模式）");
    info!("[CLI] 🌐 服务器: {}", args.server);
    info!("[CLI] 📧 账号: {}", args.email);

    // 创建客户端
    let config = ClientConfig::new(args.server.clone());
    let client = SnsClient::with_session_expired_handler(config, Arc::new(CliSessionExpiredHandler));

    // 设置监听器
    setup_listeners(&client);

    // 登录
    info!("[CLI] 🔐 正在登录...");
    client
        .login(&args.email, &args.password)
        .await
        .map_err(|e| anyhow::anyhow!("登录失败: {}", e))?;
    info!("[CLI] ✅ 登录成功！");

    // 拉取好友
    if client.friend.fetch_friends().await {
        let friends = client.friend.friends();
        info!("[CLI] 👥 好友列表（共 {} 个）:", friends.len());
        for friend in friends.iter().take(5) {
            info!("[CLI]   - {} ({})", friend.display_name, friend.user_id);
        }
    }

    if client.friend.fetch_friend_requests().await {
        let incoming = client.friend.incoming_requests();
        info!("[CLI] 📝 待处理好友申请（共 {} 个）", incoming.len());
    }

    // 拉取群组
    if client.group.fetch_my_groups().await {
        let groups = client.group.my_groups();
        info!("[CLI] 🏘️ 我的群组（共 {} 个）:", groups.len());
        for group in groups.iter().take(5) {
            info!(
                "[CLI]   - {} | 成员: {}",
                group.name,
                group.members.len()
            );
        }
    }

    // 拉取帖子
    if client.post.fetch_posts().await {
        let posts = client.post.posts();
        info!("[CLI] 📰 帖子列表（共 {} 个）:", posts.len());
        for post in posts.iter().take(5) {
            let preview = if post.content.chars().count() > 30 {
                post.content.chars().take(30).collect::<String>()
            } else {
                post.content.clone()
            };
            info!(
                "[CLI]   - {} | 👍 {} | 💬 {} | {}",
                post.author_name, post.likes_count, post.comments_count, preview
            );
        }
    }

    info!("[CLI] 👋 完成");
    Ok(())
}
