//! 项目与评论查询服务公共模块
//!
//! 提供以下共享组件：
//! - 环境配置加载
//! - 统一错误类型与 HTTP 错误映射
//! - 响应信封与计时包装
//! - 数据模型与行映射
//! - 请求 ID 中间件

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
