use super::SeaOrmStorage;
use crate::entity::lectures::{Column as LectureColumn, Entity as Lectures};
use crate::entity::roles::{Column as RoleColumn, Entity as Roles};
use crate::errors::{GraderError, Result};
use crate::models::lectures::entities::{Lecture, LecturePermission, Role, RoleScope};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::warn;

impl SeaOrmStorage {
    /// 通过课程代码获取课程
    pub async fn get_lecture_by_code_impl(&self, code: &str) -> Result<Option<Lecture>> {
        let result = Lectures::find()
            .filter(LectureColumn::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_lecture()))
    }

    /// 通过 ID 获取课程
    pub async fn get_lecture_by_id_impl(&self, id: i64) -> Result<Option<Lecture>> {
        let result = Lectures::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_lecture()))
    }

    /// 获取用户在课程中的角色
    pub async fn get_role_impl(&self, user_id: i64, lecture_id: i64) -> Result<Option<Role>> {
        let result = Roles::find()
            .filter(RoleColumn::UserId.eq(user_id))
            .filter(RoleColumn::LectureId.eq(lecture_id))
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询课程角色失败: {e}")))?;

        let Some(model) = result else {
            return Ok(None);
        };
        let raw = model.role.clone();
        let role = model.into_role();
        if role.is_none() {
            warn!(
                "Unknown role '{}' for user {} in lecture {}",
                raw, user_id, lecture_id
            );
        }
        Ok(role)
    }

    /// 列出用户在各课程中的角色
    pub async fn list_user_permissions_impl(&self, user_id: i64) -> Result<Vec<LecturePermission>> {
        let rows = Roles::find()
            .filter(RoleColumn::UserId.eq(user_id))
            .find_also_related(Lectures)
            .order_by_asc(RoleColumn::LectureId)
            .all(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询用户权限失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(role, lecture)| {
                let lecture = lecture?;
                let scope = role.role.parse::<RoleScope>().ok()?;
                Some(LecturePermission {
                    lecture_code: lecture.code,
                    scope,
                })
            })
            .collect())
    }
}
