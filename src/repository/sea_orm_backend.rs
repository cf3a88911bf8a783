//! # Sea-ORM 存储实现

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use entity::{
    menu_permissions, role_menu_permission, roles, system_settings, user_role_rel, users,
    MenuPermissions, RoleMenuPermission, Roles, SystemSettings, UserRoleRel, Users,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use std::collections::HashSet;

use super::{
    AuthRepository, MenuNode, MenuPermissionRecord, NewMenuPermission, NewUser, RoleRecord,
    UserRecord,
};
use crate::error::{AuthError, Result};
use crate::settings::{LoginFailLockPolicy, SettingsPatch, SettingsSnapshot};
use crate::{ldebug, linfo, lwarn, logging::{LogComponent, LogStage}};

/// 基于 Sea-ORM 的存储实现
#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 底层数据库连接
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn snapshot_from_model(model: &system_settings::Model) -> Result<SettingsSnapshot> {
    Ok(SettingsSnapshot {
        min_psw_length: model.min_psw_length,
        max_psw_length: model.max_psw_length,
        psw_change_max_age_enable: model.psw_change_max_age_enable,
        psw_change_max_age: model.psw_change_max_age,
        session_idle_logout_max_age: model.session_idle_logout_max_age,
        login_failed_lock_policy: LoginFailLockPolicy::try_from(model.login_failed_lock_policy)?,
        login_failed_lock_number: model.login_failed_lock_number,
        login_failed_lock_max_age: model.login_failed_lock_max_age,
    })
}

fn apply_snapshot(active: &mut system_settings::ActiveModel, settings: &SettingsSnapshot) {
    active.min_psw_length = Set(settings.min_psw_length);
    active.max_psw_length = Set(settings.max_psw_length);
    active.psw_change_max_age_enable = Set(settings.psw_change_max_age_enable);
    active.psw_change_max_age = Set(settings.psw_change_max_age);
    active.session_idle_logout_max_age = Set(settings.session_idle_logout_max_age);
    active.login_failed_lock_policy = Set(settings.login_failed_lock_policy.as_i32());
    active.login_failed_lock_number = Set(settings.login_failed_lock_number);
    active.login_failed_lock_max_age = Set(settings.login_failed_lock_max_age);
}

#[async_trait]
impl AuthRepository for SeaOrmRepository {
    async fn find_user(&self, user_id: i32) -> Result<Option<UserRecord>> {
        Ok(Users::find_by_id(user_id).one(&self.db).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    async fn find_role_ids_for_user(&self, user_id: i32) -> Result<Vec<i32>> {
        let role_ids: Vec<i32> = UserRoleRel::find()
            .select_only()
            .column(user_role_rel::Column::RoleId)
            .filter(user_role_rel::Column::UserId.eq(user_id))
            .order_by_asc(user_role_rel::Column::RoleId)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(role_ids)
    }

    async fn find_permission_codes_for_role(&self, role_id: i32) -> Result<Option<Vec<String>>> {
        let Some(role) = Roles::find_by_id(role_id).one(&self.db).await? else {
            return Ok(None);
        };

        let codes: Vec<String> = role
            .find_related(MenuPermissions)
            .select_only()
            .column(menu_permissions::Column::Code)
            .order_by_asc(menu_permissions::Column::Code)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(Some(codes))
    }

    async fn load_menu_tree(&self) -> Result<Vec<MenuNode>> {
        let records = MenuPermissions::find()
            .order_by_asc(menu_permissions::Column::Id)
            .all(&self.db)
            .await?;
        Ok(MenuNode::build_tree(&records))
    }

    async fn load_or_init_settings(&self, defaults: &SettingsSnapshot) -> Result<SettingsSnapshot> {
        let txn = self.db.begin().await?;

        let existing = SystemSettings::find()
            .order_by_asc(system_settings::Column::Id)
            .one(&txn)
            .await?;

        let snapshot = if let Some(model) = existing {
            snapshot_from_model(&model)?
        } else {
            let timestamp = now();
            let mut active = system_settings::ActiveModel {
                create_datetime: Set(timestamp),
                modify_datetime: Set(timestamp),
                ..Default::default()
            };
            apply_snapshot(&mut active, defaults);
            let model = active.insert(&txn).await?;

            linfo!(
                "system",
                LogStage::Settings,
                LogComponent::Database,
                "init_settings",
                &format!("系统设置不存在，已按默认值创建: id={}", model.id)
            );
            snapshot_from_model(&model)?
        };

        txn.commit().await?;
        Ok(snapshot)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord> {
        let timestamp = now();
        let active = users::ActiveModel {
            username: Set(new_user.username),
            hashed_psw: Set(new_user.hashed_psw),
            description: Set(new_user.description),
            can_use: Set(new_user.can_use),
            psw_last_modified_datetime: Set(timestamp),
            create_datetime: Set(timestamp),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    async fn update_user_credential(
        &self,
        user_id: i32,
        hashed_psw: String,
        changed_at: NaiveDateTime,
    ) -> Result<()> {
        let result = Users::update_many()
            .col_expr(users::Column::HashedPsw, Expr::value(hashed_psw))
            .col_expr(users::Column::PswLastModifiedDatetime, Expr::value(changed_at))
            .col_expr(users::Column::InfoLastModifiedDatetime, Expr::value(changed_at))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AuthError::UserNotFound.into());
        }
        Ok(())
    }

    async fn update_user_enabled(&self, user_id: i32, can_use: bool) -> Result<()> {
        let result = Users::update_many()
            .col_expr(users::Column::CanUse, Expr::value(can_use))
            .col_expr(users::Column::InfoLastModifiedDatetime, Expr::value(now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AuthError::UserNotFound.into());
        }
        Ok(())
    }

    async fn record_login(&self, user_id: i32, ip: String, at: NaiveDateTime) -> Result<()> {
        Users::update_many()
            .col_expr(users::Column::LastLoginIp, Expr::value(Some(ip)))
            .col_expr(users::Column::LastLoginDt, Expr::value(Some(at)))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_users(&self, user_ids: Vec<i32>) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        UserRoleRel::delete_many()
            .filter(user_role_rel::Column::UserId.is_in(user_ids.clone()))
            .exec(&txn)
            .await?;
        let deleted = Users::delete_many()
            .filter(users::Column::Id.is_in(user_ids))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(deleted.rows_affected)
    }

    async fn create_role(&self, name: String, description: Option<String>) -> Result<RoleRecord> {
        let timestamp = now();
        let active = roles::ActiveModel {
            name: Set(name),
            description: Set(description),
            create_datetime: Set(timestamp),
            modify_datetime: Set(timestamp),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    async fn delete_roles(&self, role_ids: Vec<i32>) -> Result<u64> {
        if role_ids.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        RoleMenuPermission::delete_many()
            .filter(role_menu_permission::Column::RoleId.is_in(role_ids.clone()))
            .exec(&txn)
            .await?;
        UserRoleRel::delete_many()
            .filter(user_role_rel::Column::RoleId.is_in(role_ids.clone()))
            .exec(&txn)
            .await?;
        let deleted = Roles::delete_many()
            .filter(roles::Column::Id.is_in(role_ids))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(deleted.rows_affected)
    }

    async fn create_menu_permission(
        &self,
        permission: NewMenuPermission,
    ) -> Result<MenuPermissionRecord> {
        let active = menu_permissions::ActiveModel {
            name: Set(permission.name),
            code: Set(permission.code),
            parent_id: Set(permission.parent_id),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    async fn replace_user_roles(&self, user_id: i32, role_ids: Vec<i32>) -> Result<()> {
        let txn = self.db.begin().await?;

        if Users::find_by_id(user_id).one(&txn).await?.is_none() {
            return Err(AuthError::UserNotFound.into());
        }

        let wanted: HashSet<i32> = role_ids.into_iter().collect();
        let existing: Vec<i32> = Roles::find()
            .select_only()
            .column(roles::Column::Id)
            .filter(roles::Column::Id.is_in(wanted.iter().copied()))
            .into_tuple()
            .all(&txn)
            .await?;
        if existing.len() != wanted.len() {
            lwarn!(
                "system",
                LogStage::Database,
                LogComponent::Permission,
                "unknown_roles_ignored",
                &format!(
                    "用户 {user_id} 的角色更新中有 {} 个角色不存在，已忽略",
                    wanted.len() - existing.len()
                )
            );
        }

        UserRoleRel::delete_many()
            .filter(user_role_rel::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if !existing.is_empty() {
            let join_datetime = now();
            let links = existing.into_iter().map(|role_id| user_role_rel::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(role_id),
                join_datetime: Set(join_datetime),
                ..Default::default()
            });
            UserRoleRel::insert_many(links).exec(&txn).await?;
        }

        txn.commit().await?;
        ldebug!(
            "system",
            LogStage::Database,
            LogComponent::Permission,
            "user_roles_replaced",
            &format!("用户 {user_id} 的角色关联已替换")
        );
        Ok(())
    }

    async fn replace_role_permissions(&self, role_id: i32, codes: Vec<String>) -> Result<()> {
        let txn = self.db.begin().await?;

        let Some(role) = Roles::find_by_id(role_id).one(&txn).await? else {
            return Err(AuthError::RoleNotFound.into());
        };

        let wanted: HashSet<String> = codes.into_iter().collect();
        let permission_ids: Vec<i32> = MenuPermissions::find()
            .select_only()
            .column(menu_permissions::Column::Id)
            .filter(menu_permissions::Column::Code.is_in(wanted.iter().cloned()))
            .into_tuple()
            .all(&txn)
            .await?;
        if permission_ids.len() != wanted.len() {
            lwarn!(
                "system",
                LogStage::Database,
                LogComponent::Permission,
                "unknown_codes_ignored",
                &format!(
                    "角色 {} 的权限更新中有 {} 个权限代码不存在，已忽略",
                    role.name,
                    wanted.len() - permission_ids.len()
                )
            );
        }

        RoleMenuPermission::delete_many()
            .filter(role_menu_permission::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;

        if !permission_ids.is_empty() {
            let links = permission_ids
                .into_iter()
                .map(|menu_permission_id| role_menu_permission::ActiveModel {
                    role_id: Set(role_id),
                    menu_permission_id: Set(menu_permission_id),
                    ..Default::default()
                });
            RoleMenuPermission::insert_many(links).exec(&txn).await?;
        }

        let mut active: roles::ActiveModel = role.into();
        active.modify_datetime = Set(now());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn apply_settings_patch(
        &self,
        patch: &SettingsPatch,
        defaults: &SettingsSnapshot,
    ) -> Result<SettingsSnapshot> {
        let txn = self.db.begin().await?;

        let existing = SystemSettings::find()
            .order_by_asc(system_settings::Column::Id)
            .lock_exclusive()
            .one(&txn)
            .await?;

        let base = match &existing {
            Some(model) => snapshot_from_model(model)?,
            None => defaults.clone(),
        };
        let merged = patch.apply_to(&base);
        merged.validate()?;

        let timestamp = now();
        let model = match existing {
            Some(model) => {
                let mut active: system_settings::ActiveModel = model.into();
                apply_snapshot(&mut active, &merged);
                active.modify_datetime = Set(timestamp);
                active.update(&txn).await?
            }
            None => {
                let mut active = system_settings::ActiveModel {
                    create_datetime: Set(timestamp),
                    modify_datetime: Set(timestamp),
                    ..Default::default()
                };
                apply_snapshot(&mut active, &merged);
                active.insert(&txn).await?
            }
        };

        txn.commit().await?;
        snapshot_from_model(&model)
    }
}
