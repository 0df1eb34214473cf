use super::SeaOrmStorage;
use crate::entity::assignments::Entity as Assignments;
use crate::errors::{GraderError, Result};
use crate::models::assignments::entities::Assignment;
use sea_orm::EntityTrait;

impl SeaOrmStorage {
    /// 通过 ID 获取作业，设置 JSON 无法解析时返回错误
    pub async fn get_assignment_by_id_impl(&self, id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| GraderError::database_operation(format!("查询作业失败: {e}")))?;

        result.map(|m| m.into_assignment()).transpose()
    }
}
