//! 测试用内存存储

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::Storage;
use crate::errors::{GraderError, Result};
use crate::models::{
    assignments::entities::Assignment,
    lectures::entities::{Lecture, LecturePermission, Role},
    submissions::entities::{Submission, SubmissionResultUpdate},
    users::entities::User,
};

#[derive(Default)]
pub struct MemoryStorage {
    pub users: Mutex<HashMap<i64, User>>,
    pub lectures: Mutex<HashMap<i64, Lecture>>,
    pub roles: Mutex<Vec<Role>>,
    pub assignments: Mutex<HashMap<i64, Assignment>>,
    pub submissions: Mutex<HashMap<i64, Submission>>,
    /// 每次 save_submission_result 的调用记录
    pub saved: Mutex<Vec<(i64, SubmissionResultUpdate)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: i64, username: &str) {
        let now = chrono::Utc::now();
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                username: username.to_string(),
                display_name: None,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn add_lecture(&self, id: i64, code: &str) {
        self.lectures.lock().unwrap().insert(
            id,
            Lecture {
                id,
                code: code.to_string(),
                name: code.to_string(),
            },
        );
    }

    pub fn add_role(&self, role: Role) {
        self.roles.lock().unwrap().push(role);
    }

    pub fn add_assignment(&self, assignment: Assignment) {
        self.assignments
            .lock()
            .unwrap()
            .insert(assignment.id, assignment);
    }

    pub fn add_submission(&self, submission: Submission) {
        self.submissions
            .lock()
            .unwrap()
            .insert(submission.id, submission);
    }

    pub fn saved_updates(&self) -> Vec<(i64, SubmissionResultUpdate)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_lecture_by_code(&self, code: &str) -> Result<Option<Lecture>> {
        Ok(self
            .lectures
            .lock()
            .unwrap()
            .values()
            .find(|l| l.code == code)
            .cloned())
    }

    async fn get_lecture_by_id(&self, id: i64) -> Result<Option<Lecture>> {
        Ok(self.lectures.lock().unwrap().get(&id).cloned())
    }

    async fn get_role(&self, user_id: i64, lecture_id: i64) -> Result<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.lecture_id == lecture_id)
            .cloned())
    }

    async fn list_user_permissions(&self, user_id: i64) -> Result<Vec<LecturePermission>> {
        let lectures = self.lectures.lock().unwrap();
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                lectures.get(&r.lecture_id).map(|l| LecturePermission {
                    lecture_code: l.code.clone(),
                    scope: r.scope,
                })
            })
            .collect())
    }

    async fn get_assignment_by_id(&self, id: i64) -> Result<Option<Assignment>> {
        Ok(self.assignments.lock().unwrap().get(&id).cloned())
    }

    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>> {
        Ok(self.submissions.lock().unwrap().get(&id).cloned())
    }

    async fn save_submission_result(
        &self,
        submission_id: i64,
        update: SubmissionResultUpdate,
    ) -> Result<()> {
        let mut submissions = self.submissions.lock().unwrap();
        let submission = submissions
            .get_mut(&submission_id)
            .ok_or_else(|| GraderError::not_found(format!("Submission {submission_id} not found")))?;

        if let Some(status) = update.auto_status {
            submission.auto_status = status;
        }
        if let Some(status) = update.feedback_status {
            submission.feedback_status = status;
        }
        if let Some(logs) = &update.grading_logs {
            submission.grading_logs = Some(logs.clone());
        }
        if let Some(score) = update.score {
            submission.score = Some(score);
        }
        if let Some(grading_score) = update.grading_score {
            submission.grading_score = Some(grading_score);
        }
        if let Some(properties) = &update.properties {
            submission.properties = Some(properties.clone());
        }
        self.saved.lock().unwrap().push((submission_id, update));
        Ok(())
    }
}
