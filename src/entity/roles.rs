//! 课程角色实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub lecture_id: i64,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::lectures::Entity",
        from = "Column::LectureId",
        to = "super::lectures::Column::Id"
    )]
    Lecture,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::lectures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecture.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 角色字符串无法识别时返回 None，调用方按无权限处理
    pub fn into_role(self) -> Option<crate::models::lectures::entities::Role> {
        use crate::models::lectures::entities::{Role, RoleScope};

        let scope = self.role.parse::<RoleScope>().ok()?;
        Some(Role {
            user_id: self.user_id,
            lecture_id: self.lecture_id,
            scope,
        })
    }
}
