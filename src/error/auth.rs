//! 认证与授权相关的预期结果。
//!
//! 这些错误都可以在边界层被转换为重定向或提示信息，不属于系统故障。

use thiserror::Error;

/// 认证与授权错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("用户未登录")]
    NotAuthenticated,

    #[error("用户已登录")]
    AlreadyAuthenticated,

    #[error("权限不足: 缺少 {code}")]
    PermissionDenied { code: String },

    /// 文案由锁定策略决定，不暴露是 IP 还是用户名触发了锁定
    #[error("{message}")]
    AccountLocked { message: String },

    /// 登录失败；`attempts` 携带锁定计数给出的剩余次数提示
    #[error("用户名或密码错误")]
    InvalidCredentials { attempts: Option<String> },

    #[error("该用户已被禁用，请联系管理员启用")]
    AccountDisabled,

    #[error("验证码错误")]
    CaptchaMismatch,

    #[error("用户不存在")]
    UserNotFound,

    #[error("角色不存在")]
    RoleNotFound,
}

impl AuthError {
    /// 登录/登出状态类错误只需要边界层重定向
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::AlreadyAuthenticated)
    }
}

/// 权限校验结果，作为值返回而不是通过错误控制流程
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied { code: String },
}

impl PermissionDecision {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// 转换为 `Result`，拒绝时得到 `AuthError::PermissionDenied`
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Granted => Ok(()),
            Self::Denied { code } => Err(AuthError::PermissionDenied { code }),
        }
    }
}
