//! # 错误处理测试

use crate::error::{
    AuthError, Context, ErrorCategory, PasswordPolicyError, PermissionDecision, PortalError,
    SettingsError,
};
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = PortalError::config("测试配置错误");
    assert!(matches!(err, PortalError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
    assert_eq!(err.category(), ErrorCategory::Server);
}

#[test]
fn test_cache_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "拒绝连接");
    let err = PortalError::cache_with_source("Redis不可用", io_err);

    assert!(err.to_string().contains("缓存错误: Redis不可用"));
    assert!(err.source().is_some());
    assert!(!err.is_policy());
}

#[test]
fn test_policy_errors_are_client_category() {
    let auth: PortalError = AuthError::NotAuthenticated.into();
    let settings: PortalError = SettingsError::InvalidRange { min: 10, max: 8 }.into();
    let password: PortalError = PasswordPolicyError::TooShort { min: 8 }.into();

    for err in [&auth, &settings, &password] {
        assert_eq!(err.category(), ErrorCategory::Client);
        assert!(err.is_policy());
    }
    assert_eq!(auth.to_string(), "用户未登录");
}

#[test]
fn test_context_preserves_category() {
    let result: Result<(), AuthError> = Err(AuthError::AccountDisabled);
    let err = result.context("登录失败").unwrap_err();

    assert!(matches!(err, PortalError::Context { .. }));
    assert_eq!(err.to_string(), "登录失败: 该用户已被禁用，请联系管理员启用");
    assert!(err.is_policy());
    assert_eq!(err.as_auth(), Some(&AuthError::AccountDisabled));
}

#[test]
fn test_with_context_is_lazy() {
    let result: Result<u8, std::io::Error> = Ok(1);
    let value = result
        .with_context(|| -> String { panic!("成功时不应构造上下文") })
        .unwrap();
    assert_eq!(value, 1);
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: PortalError = toml_err.into();

    assert!(matches!(err, PortalError::Config { .. }));
    assert!(err.to_string().contains("TOML解析失败"));
}

#[test]
fn test_auto_conversion_from_db_error() {
    let err: PortalError = sea_orm::DbErr::Custom("boom".to_string()).into();
    assert!(matches!(err, PortalError::Database { .. }));
    assert_eq!(err.category(), ErrorCategory::Server);
}

#[test]
fn test_permission_decision_into_result() {
    assert!(PermissionDecision::Granted.into_result().is_ok());

    let denied = PermissionDecision::Denied {
        code: "user_del".to_string(),
    };
    assert!(!denied.is_granted());
    assert_eq!(
        denied.into_result(),
        Err(AuthError::PermissionDenied {
            code: "user_del".to_string()
        })
    );
}

#[test]
fn test_redirect_errors() {
    assert!(AuthError::NotAuthenticated.is_redirect());
    assert!(AuthError::AlreadyAuthenticated.is_redirect());
    assert!(!AuthError::CaptchaMismatch.is_redirect());
}

#[test]
fn test_invalid_range_message() {
    let err = SettingsError::InvalidRange { min: 10, max: 8 };
    assert_eq!(err.to_string(), "密码最小长度(10)不能大于最大长度(8)");
}
