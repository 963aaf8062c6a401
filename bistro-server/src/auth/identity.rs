//! Gateway-forwarded identity

use std::fmt;
use std::str::FromStr;

use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::auth::permissions;
use crate::utils::{AppError, ErrorCode};

/// 用户 ID 请求头
pub const USER_ID_HEADER: &str = "x-user-id";
/// 用户角色请求头
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Staff role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Waiter,
    Cook,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Waiter => "waiter",
            Role::Cook => "cook",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "waiter" => Ok(Role::Waiter),
            "cook" => Ok(Role::Cook),
            other => Err(AppError::with_message(
                ErrorCode::IdentityInvalid,
                format!("Unknown role: {other}"),
            )),
        }
    }
}

/// 当前用户上下文 (由认证中间件注入请求扩展)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    /// 用户 ID
    pub id: i64,
    /// 角色
    pub role: Role,
}

impl CurrentUser {
    /// 从网关转发的请求头解析身份
    ///
    /// 缺少任一请求头返回 `NotAuthenticated`，内容无法解析返回 `IdentityInvalid`
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let id = header_str(headers, USER_ID_HEADER)?;
        let role = header_str(headers, USER_ROLE_HEADER)?;

        let id = id.trim().parse::<i64>().map_err(|_| {
            AppError::with_message(ErrorCode::IdentityInvalid, format!("Invalid user id: {id}"))
        })?;
        let role = role.parse::<Role>()?;

        Ok(Self { id, role })
    }

    /// 检查是否拥有某项权限 (`all` 匹配一切)
    pub fn has_permission(&self, permission: &str) -> bool {
        permissions::role_permissions(self.role)
            .iter()
            .any(|p| *p == "all" || *p == permission)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    let value = headers.get(name).ok_or_else(AppError::not_authenticated)?;
    value.to_str().map_err(|_| {
        AppError::with_message(ErrorCode::IdentityInvalid, format!("Malformed {name} header"))
    })
}
