//! 认证授权模块
//!
//! 身份由上游认证网关完成校验，并通过请求头转发：
//!
//! | 请求头 | 内容 |
//! |--------|------|
//! | `X-User-Id` | 用户 ID (整数) |
//! | `X-User-Role` | `admin` \| `manager` \| `waiter` \| `cook` |
//!
//! - [`CurrentUser`] - 当前用户上下文
//! - [`require_auth`] - 认证中间件
//! - [`require_permission`] - 权限检查中间件

pub mod extractor;
pub mod identity;
pub mod middleware;
pub mod permissions;

pub use identity::{CurrentUser, Role, USER_ID_HEADER, USER_ROLE_HEADER};
pub use middleware::{CurrentUserExt, require_auth, require_permission};
