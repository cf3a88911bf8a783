use thiserror::Error;

/// 系统设置校验错误，在任何持久化写入之前返回
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("密码最小长度({min})不能大于最大长度({max})")]
    InvalidRange { min: i32, max: i32 },

    #[error("{field} 取值 {value} 超出允许范围 [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },

    #[error("未知的登录失败锁定策略: {0}")]
    UnknownLockPolicy(i32),
}

/// 密码长度不满足当前设置
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("密码长度不能少于 {min} 位")]
    TooShort { min: usize },

    #[error("密码长度不能超过 {max} 位")]
    TooLong { max: usize },

    /// bcrypt 只使用前 72 个字节，更长的输入无法被完整校验
    #[error("密码编码后不能超过 {max} 个字节")]
    TooManyBytes { max: usize },
}
