//! # 实体定义测试
//!
//! 测试所有 Sea-ORM 实体定义的正确性

#[cfg(test)]
mod tests {
    use crate::{menu_permissions, roles, system_settings, user_role_rel, users};
    use sea_orm::Set;

    #[tokio::test]
    async fn test_user_creation() {
        let user = users::ActiveModel {
            username: Set("test_user".to_string()),
            hashed_psw: Set("$2b$04$hash".to_string()),
            can_use: Set(true),
            ..Default::default()
        };

        assert_eq!(user.username.as_ref(), "test_user");
        assert_eq!(user.can_use.as_ref(), &true);
    }

    #[tokio::test]
    async fn test_role_and_permission_creation() {
        let role = roles::ActiveModel {
            name: Set("运维".to_string()),
            description: Set(Some("运维人员".to_string())),
            ..Default::default()
        };
        let permission = menu_permissions::ActiveModel {
            name: Set("用户管理".to_string()),
            code: Set("admin.user_list".to_string()),
            parent_id: Set(None),
            ..Default::default()
        };

        assert_eq!(role.name.as_ref(), "运维");
        assert_eq!(permission.code.as_ref(), "admin.user_list");
        assert_eq!(permission.parent_id.as_ref(), &None);
    }

    #[tokio::test]
    async fn test_user_role_link_creation() {
        let link = user_role_rel::ActiveModel {
            user_id: Set(1),
            role_id: Set(2),
            ..Default::default()
        };

        assert_eq!(link.user_id.as_ref(), &1);
        assert_eq!(link.role_id.as_ref(), &2);
    }

    #[test]
    fn test_hashed_password_not_serialized() {
        let now = chrono::Utc::now().naive_utc();
        let user = users::Model {
            id: 1,
            username: "qrj".to_string(),
            hashed_psw: "secret-hash".to_string(),
            description: None,
            can_use: true,
            psw_last_modified_datetime: now,
            last_login_ip: None,
            last_login_dt: None,
            create_datetime: now,
            info_last_modified_datetime: None,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn test_settings_model_fields() {
        let settings = system_settings::ActiveModel {
            min_psw_length: Set(8),
            max_psw_length: Set(16),
            login_failed_lock_policy: Set(1),
            ..Default::default()
        };

        assert_eq!(settings.min_psw_length.as_ref(), &8);
        assert_eq!(settings.login_failed_lock_policy.as_ref(), &1);
    }
}
