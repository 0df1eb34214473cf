use serde::{Deserialize, Serialize};

// 课程实体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lecture {
    pub id: i64,
    pub code: String, // 课程代码，即 git 路径的第一段
    pub name: String,
}

// 用户在课程中的角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    Student,    // 学生
    Tutor,      // 助教
    Instructor, // 教师
    Admin,      // 管理员
}

impl RoleScope {
    pub const STUDENT: &'static str = "student";
    pub const TUTOR: &'static str = "tutor";
    pub const INSTRUCTOR: &'static str = "instructor";
    pub const ADMIN: &'static str = "admin";

    /// 可以管理课程内容的角色
    pub fn is_staff(&self) -> bool {
        !matches!(self, RoleScope::Student)
    }

    pub fn staff_roles() -> &'static [RoleScope] {
        &[RoleScope::Tutor, RoleScope::Instructor, RoleScope::Admin]
    }
}

impl<'de> Deserialize<'de> for RoleScope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<RoleScope>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的课程角色: '{s}'. 支持的角色: student, tutor, instructor, admin"
            ))
        })
    }
}

impl std::fmt::Display for RoleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleScope::Student => write!(f, "{}", RoleScope::STUDENT),
            RoleScope::Tutor => write!(f, "{}", RoleScope::TUTOR),
            RoleScope::Instructor => write!(f, "{}", RoleScope::INSTRUCTOR),
            RoleScope::Admin => write!(f, "{}", RoleScope::ADMIN),
        }
    }
}

impl std::str::FromStr for RoleScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            RoleScope::STUDENT => Ok(RoleScope::Student),
            RoleScope::TUTOR => Ok(RoleScope::Tutor),
            RoleScope::INSTRUCTOR => Ok(RoleScope::Instructor),
            RoleScope::ADMIN => Ok(RoleScope::Admin),
            _ => Err(format!("Invalid role scope: {s}")),
        }
    }
}

// 课程角色
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub user_id: i64,
    pub lecture_id: i64,
    pub scope: RoleScope,
}

// 权限列表项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LecturePermission {
    pub lecture_code: String,
    pub scope: RoleScope,
}
