//! # 权限解析集成测试
//!
//! SQLite 存储 + 内存缓存，验证关系写入提交后读到的权限集合与数据库一致

mod common;

use common::Suite;
use portal_auth::AuthError;
use portal_auth::cache::{CacheKeyBuilder, CacheStore};
use portal_auth::repository::NewMenuPermission;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn set(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(ToString::to_string).collect()
}

fn codes(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

async fn create_permissions(suite: &Suite, values: &[&str]) {
    for code in values {
        suite
            .core
            .permissions()
            .create_menu_permission(NewMenuPermission {
                name: code.to_uppercase(),
                code: (*code).to_string(),
                parent_id: None,
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_updates_are_visible_after_commit() {
    let suite = Suite::setup().await;
    let permissions = suite.core.permissions();
    create_permissions(&suite, &["user_view", "user_add", "role_edit"]).await;

    let editor = permissions.create_role("editor", None).await.unwrap();
    let viewer = permissions.create_role("viewer", Some("只读")).await.unwrap();
    permissions
        .update_role_permissions(editor.id, codes(&["user_view", "user_add"]))
        .await
        .unwrap();
    permissions
        .update_role_permissions(viewer.id, codes(&["user_view"]))
        .await
        .unwrap();

    let user = suite
        .core
        .users()
        .create_user("alice", "Passw0rd", None)
        .await
        .unwrap();
    permissions
        .update_user_roles(user.id, vec![editor.id])
        .await
        .unwrap();

    assert_eq!(
        permissions.get_user_permissions(user.id).await.unwrap(),
        set(&["user_add", "user_view"])
    );

    // 缓存已热，更新后必须读到新集合
    permissions
        .update_role_permissions(editor.id, codes(&["role_edit"]))
        .await
        .unwrap();
    assert_eq!(
        permissions.get_user_permissions(user.id).await.unwrap(),
        set(&["role_edit"])
    );

    permissions
        .update_user_roles(user.id, vec![editor.id, viewer.id])
        .await
        .unwrap();
    assert_eq!(
        permissions.get_user_permissions(user.id).await.unwrap(),
        set(&["role_edit", "user_view"])
    );
    assert!(permissions.check_permission(user.id, "user_view").await.unwrap());
    assert!(!permissions.check_permission(user.id, "user_add").await.unwrap());
}

#[tokio::test]
async fn test_unknown_codes_are_ignored() {
    let suite = Suite::setup().await;
    let permissions = suite.core.permissions();
    create_permissions(&suite, &["user_view"]).await;

    let role = permissions.create_role("ops", None).await.unwrap();
    permissions
        .update_role_permissions(role.id, codes(&["user_view", "does_not_exist"]))
        .await
        .unwrap();

    let user = suite
        .core
        .users()
        .create_user("bob", "Passw0rd", None)
        .await
        .unwrap();
    permissions
        .update_user_roles(user.id, vec![role.id, 9999])
        .await
        .unwrap();

    assert_eq!(permissions.get_user_roles(user.id).await.unwrap(), vec![role.id]);
    assert_eq!(
        permissions.get_user_permissions(user.id).await.unwrap(),
        set(&["user_view"])
    );
}

#[tokio::test]
async fn test_role_deletion_clears_cache_and_permissions() {
    let suite = Suite::setup().await;
    let permissions = suite.core.permissions();
    create_permissions(&suite, &["user_view"]).await;

    let role = permissions.create_role("temp", None).await.unwrap();
    permissions
        .update_role_permissions(role.id, codes(&["user_view"]))
        .await
        .unwrap();
    let user = suite
        .core
        .users()
        .create_user("carol", "Passw0rd", None)
        .await
        .unwrap();
    permissions
        .update_user_roles(user.id, vec![role.id])
        .await
        .unwrap();

    assert_eq!(
        permissions.get_user_permissions(user.id).await.unwrap(),
        set(&["user_view"])
    );
    let role_key = CacheKeyBuilder::role_menu_permissions(role.id).build();
    assert!(suite.cache.get(&role_key).await.unwrap().is_some());

    assert_eq!(permissions.delete_roles(&[role.id]).await.unwrap(), 1);
    assert!(suite.cache.get(&role_key).await.unwrap().is_none());

    // 用户角色缓存里仍有已删除的角色 id，解析时跳过
    assert!(permissions.get_user_permissions(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_deletion_clears_roles_cache() {
    let suite = Suite::setup().await;
    let permissions = suite.core.permissions();
    let role = permissions.create_role("staff", None).await.unwrap();
    let user = suite
        .core
        .users()
        .create_user("dave", "Passw0rd", None)
        .await
        .unwrap();
    permissions
        .update_user_roles(user.id, vec![role.id])
        .await
        .unwrap();
    assert_eq!(permissions.get_user_roles(user.id).await.unwrap(), vec![role.id]);

    assert_eq!(suite.core.users().delete_users(&[user.id]).await.unwrap(), 1);
    let key = CacheKeyBuilder::user_roles(user.id).build();
    assert!(suite.cache.get(&key).await.unwrap().is_none());
    assert!(permissions.get_user_roles(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_roles_for_missing_user() {
    let suite = Suite::setup().await;
    let err = suite
        .core
        .permissions()
        .update_user_roles(404, vec![])
        .await
        .unwrap_err();
    assert_eq!(err.as_auth(), Some(&AuthError::UserNotFound));
}

#[tokio::test]
async fn test_menu_tree_is_invalidated_on_create() {
    let suite = Suite::setup().await;
    let permissions = suite.core.permissions();

    let system = permissions
        .create_menu_permission(NewMenuPermission {
            name: "系统管理".to_string(),
            code: "system".to_string(),
            parent_id: None,
        })
        .await
        .unwrap();
    let tree = permissions.get_menu_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree[0].children.is_empty());

    permissions
        .create_menu_permission(NewMenuPermission {
            name: "用户管理".to_string(),
            code: "user_manage".to_string(),
            parent_id: Some(system.id),
        })
        .await
        .unwrap();

    let tree = permissions.get_menu_tree().await.unwrap();
    assert_eq!(tree[0].codes(), vec!["system", "user_manage"]);
}

#[tokio::test]
async fn test_reads_during_update_never_leave_stale_cache() {
    let suite = Suite::setup().await;
    let permissions = suite.core.permissions();
    create_permissions(&suite, &["user_view", "role_edit"]).await;

    let role = permissions.create_role("auditor", None).await.unwrap();
    permissions
        .update_role_permissions(role.id, codes(&["user_view"]))
        .await
        .unwrap();
    let user = suite
        .core
        .users()
        .create_user("erin", "Passw0rd", None)
        .await
        .unwrap();
    permissions
        .update_user_roles(user.id, vec![role.id])
        .await
        .unwrap();

    let old = set(&["user_view"]);
    let new = set(&["role_edit"]);
    let readers = async {
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(permissions.get_user_permissions(user.id).await.unwrap());
            tokio::task::yield_now().await;
        }
        seen
    };
    let (updated, seen) = tokio::join!(
        permissions.update_role_permissions(role.id, codes(&["role_edit"])),
        readers,
    );
    updated.unwrap();

    for permissions_seen in &seen {
        assert!(
            *permissions_seen == old || *permissions_seen == new,
            "读到了既非旧值也非新值的集合: {permissions_seen:?}"
        );
    }
    assert_eq!(permissions.get_user_permissions(user.id).await.unwrap(), new);

    let role_key = CacheKeyBuilder::role_menu_permissions(role.id).build();
    let cached = suite.cache.get(&role_key).await.unwrap().unwrap();
    let cached: Vec<String> = serde_json::from_slice(&cached).unwrap();
    assert_eq!(cached, codes(&["role_edit"]));
}

#[tokio::test]
async fn test_update_permissions_for_missing_role() {
    let suite = Suite::setup().await;
    let err = suite
        .core
        .permissions()
        .update_role_permissions(404, codes(&["user_view"]))
        .await
        .unwrap_err();
    assert_eq!(err.as_auth(), Some(&AuthError::RoleNotFound));
}
