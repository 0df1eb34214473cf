//! Git Smart-HTTP 网关
//!
//! 每个请求依次经过：路径解析 → 课程/作业查询 → 权限判断 → 按需创建裸仓库
//! → 调用 `git upload-pack` / `git receive-pack`。git 的输出会完整缓冲，
//! 进程失败时返回 500 与 stderr，不会产生半截响应。

pub mod info_refs;
pub mod lookup;
pub mod rpc;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::config::GitConfig;
use crate::errors::{GraderError, Result};
use crate::storage::Storage;

pub use info_refs::InfoRefsQuery;

pub struct GitService {
    storage: Option<Arc<dyn Storage>>,
}

impl GitService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Result<Arc<dyn Storage>> {
        if let Some(storage) = &self.storage {
            return Ok(storage.clone());
        }
        request
            .app_data::<web::Data<Arc<dyn Storage>>>()
            .map(|data| data.get_ref().clone())
            .ok_or_else(|| GraderError::configuration("Storage not found in app data"))
    }

    pub(crate) fn get_git_config(&self, request: &HttpRequest) -> Result<web::Data<GitConfig>> {
        request
            .app_data::<web::Data<GitConfig>>()
            .cloned()
            .ok_or_else(|| GraderError::configuration("Git configuration not found in app data"))
    }

    // GET .../info/refs?service=...
    pub async fn info_refs(
        &self,
        request: &HttpRequest,
        tail: &str,
        query: InfoRefsQuery,
    ) -> Result<HttpResponse> {
        info_refs::info_refs(self, request, tail, query).await
    }

    // POST .../git-upload-pack 与 .../git-receive-pack
    pub async fn service_rpc(
        &self,
        request: &HttpRequest,
        tail: &str,
        payload: web::Payload,
    ) -> Result<HttpResponse> {
        rpc::service_rpc(self, request, tail, payload).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use std::io::Write;

    use actix_web::{App, http::StatusCode, http::header, test, web};
    use flate2::{Compression, write::GzEncoder};
    use tempfile::TempDir;

    use crate::config::{GitConfig, JwtConfig, LimitConfig};
    use crate::git::protocol::service_advertisement;
    use crate::git::{GitCli, GitOperation, command::is_bare_repo};
    use crate::models::assignments::entities::{Assignment, AssignmentSettings};
    use crate::models::lectures::entities::{Role, RoleScope};
    use crate::models::submissions::entities::{
        AutoStatus, FeedbackStatus, ManualStatus, Submission,
    };
    use crate::routes::configure_git_routes;
    use crate::storage::{Storage, memory::MemoryStorage};
    use crate::utils::jwt::JwtUtils;

    const SECRET: &str = "gateway-secret";

    pub(crate) struct Gateway {
        pub tmp: TempDir,
        pub storage: Arc<MemoryStorage>,
    }

    impl Gateway {
        /// 课程 lec(10)，作业 5；alice(1)、bob(2) 为学生，tina(3) 为助教；
        /// 提交 100 属于 bob
        pub(crate) fn new() -> Self {
            let storage = Arc::new(MemoryStorage::new());
            storage.add_user(1, "alice");
            storage.add_user(2, "bob");
            storage.add_user(3, "tina");
            storage.add_user(4, "outsider");
            storage.add_lecture(10, "lec");
            for (user_id, scope) in [
                (1, RoleScope::Student),
                (2, RoleScope::Student),
                (3, RoleScope::Tutor),
            ] {
                storage.add_role(Role {
                    user_id,
                    lecture_id: 10,
                    scope,
                });
            }
            storage.add_assignment(Assignment {
                id: 5,
                lecture_id: 10,
                name: "a1".to_string(),
                settings: AssignmentSettings::default(),
            });
            storage.add_submission(Submission {
                id: 100,
                assignment_id: 5,
                user_id: 2,
                commit_hash: "abc123".to_string(),
                auto_status: AutoStatus::NotGraded,
                feedback_status: FeedbackStatus::NotGenerated,
                manual_status: ManualStatus::NotGraded,
                score: None,
                grading_score: None,
                score_scaling: 1.0,
                grading_logs: None,
                properties: None,
                edited: false,
                submitted_at: chrono::Utc::now(),
            });
            Self {
                tmp: TempDir::new().unwrap(),
                storage,
            }
        }

        pub(crate) fn git_root(&self) -> std::path::PathBuf {
            self.tmp.path().join("git")
        }

        pub(crate) fn git_config(&self) -> GitConfig {
            GitConfig {
                root: self.git_root().to_string_lossy().into_owned(),
                executable: "git".to_string(),
                committer_name: "Grader".to_string(),
                committer_email: "grader@example.com".to_string(),
            }
        }
    }

    pub(crate) fn bearer(user_id: i64) -> (header::HeaderName, String) {
        let token =
            JwtUtils::generate_token(user_id, SECRET, chrono::Duration::minutes(5)).unwrap();
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    macro_rules! gateway_app {
        ($gateway:expr) => {{
            let storage: Arc<dyn Storage> = $gateway.storage.clone();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(storage))
                    .app_data(web::Data::new(JwtConfig {
                        secret: SECRET.to_string(),
                    }))
                    .app_data(web::Data::new($gateway.git_config()))
                    .app_data(web::Data::new(LimitConfig {
                        max_payload_size: 1024 * 1024,
                    }))
                    .configure(configure_git_routes),
            )
            .await
        }};
    }

    async fn status_of(gateway: &Gateway, user_id: i64, method: &str, uri: &str) -> StatusCode {
        let app = gateway_app!(gateway);
        let req = match method {
            "POST" => test::TestRequest::post(),
            _ => test::TestRequest::get(),
        }
        .uri(uri)
        .insert_header(bearer(user_id))
        .to_request();
        test::call_service(&app, req).await.status()
    }

    const UPLOAD: &str = "info/refs?service=git-upload-pack";
    const RECEIVE: &str = "info/refs?service=git-receive-pack";

    #[actix_web::test]
    async fn test_missing_lecture_and_assignment() {
        let gw = Gateway::new();
        let uri = format!("/git/nope/5/release/{UPLOAD}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::NOT_FOUND);
        let uri = format!("/git/lec/6/release/{UPLOAD}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_caller_without_role_is_forbidden() {
        let gw = Gateway::new();
        let uri = format!("/git/lec/5/release/{UPLOAD}");
        assert_eq!(status_of(&gw, 4, "GET", &uri).await, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_unauthenticated_request() {
        let gw = Gateway::new();
        let app = gateway_app!(gw);
        let req = test::TestRequest::get()
            .uri(&format!("/git/lec/5/release/{UPLOAD}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[actix_web::test]
    async fn test_student_cannot_read_other_autograde() {
        let gw = Gateway::new();
        // 提交存在但属于 bob
        let uri = format!("/git/lec/5/autograde/100/{UPLOAD}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::FORBIDDEN);
        // 提交不存在
        let uri = format!("/git/lec/5/autograde/999/{UPLOAD}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::FORBIDDEN);
        // 非法 ID
        let uri = format!("/git/lec/5/feedback/abc/{UPLOAD}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::FORBIDDEN);
        assert!(!gw.git_root().join("lec/5/autograde").exists());
    }

    #[actix_web::test]
    async fn test_owner_and_staff_read_autograde() {
        let gw = Gateway::new();
        let repo = gw.git_root().join("lec/5/autograde/bob");
        let uri = format!("/git/lec/5/autograde/100/{UPLOAD}");
        // 执行器尚未推送结果
        assert_eq!(status_of(&gw, 2, "GET", &uri).await, StatusCode::NOT_FOUND);
        assert!(!repo.exists());

        GitCli::new("git").ensure_bare_repo(&repo).await.unwrap();
        assert_eq!(status_of(&gw, 2, "GET", &uri).await, StatusCode::OK);
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::OK);

        // 助教访问不存在的提交
        let uri = format!("/git/lec/5/autograde/999/{UPLOAD}");
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_autograde_never_writable_over_http() {
        let gw = Gateway::new();
        let uri = format!("/git/lec/5/autograde/100/{RECEIVE}");
        assert_eq!(status_of(&gw, 2, "GET", &uri).await, StatusCode::FORBIDDEN);
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_user_repo_defaults_to_caller() {
        let gw = Gateway::new();
        let app = gateway_app!(gw);
        let req = test::TestRequest::get()
            .uri(&format!("/git/lec/5/user/{RECEIVE}"))
            .insert_header(bearer(1))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-git-receive-pack-advertisement"
        );
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-cache");
        let body = test::read_body(resp).await;
        let prefix = service_advertisement(GitOperation::ReceivePack);
        assert!(body.starts_with(&prefix));
        assert!(body.len() > prefix.len());
        assert!(is_bare_repo(&gw.git_root().join("lec/5/user/alice")));

        // 写别人的仓库
        let uri = format!("/git/lec/5/user/bob/{RECEIVE}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::FORBIDDEN);
        // 助教只读
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::FORBIDDEN);
        let uri = format!("/git/lec/5/user/alice/{UPLOAD}");
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_read_never_creates_repository() {
        let gw = Gateway::new();
        let uri = format!("/git/lec/5/user/nobody/{UPLOAD}");
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::NOT_FOUND);
        assert!(!gw.git_root().join("lec/5/user/nobody").exists());

        let uri = format!("/git/lec/5/release/{UPLOAD}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::NOT_FOUND);
        let uri = "/git/lec/5/release/git-upload-pack";
        assert_eq!(status_of(&gw, 1, "POST", uri).await, StatusCode::NOT_FOUND);
        assert!(!gw.git_root().join("lec/5/release").exists());
    }

    #[actix_web::test]
    async fn test_invalid_paths() {
        let gw = Gateway::new();
        // source / release 不接受额外段
        let uri = format!("/git/lec/5/release/extra/{UPLOAD}");
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::BAD_REQUEST);
        let uri = format!("/git/lec/5/user/../{UPLOAD}");
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::BAD_REQUEST);
        let uri = format!("/git/lec/5/unknown/{UPLOAD}");
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::BAD_REQUEST);
        // 缺少 service 参数
        let uri = "/git/lec/5/release/info/refs";
        assert_eq!(status_of(&gw, 3, "GET", uri).await, StatusCode::BAD_REQUEST);
        // 方法与端点不匹配
        let uri = "/git/lec/5/release/git-upload-pack";
        assert_eq!(status_of(&gw, 3, "GET", uri).await, StatusCode::NOT_FOUND);
        let uri = "/git/lec/5/release/info/refs";
        assert_eq!(status_of(&gw, 3, "POST", uri).await, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_edit_repo_staff_only() {
        let gw = Gateway::new();
        let uri = format!("/git/lec/5/edit/100/{RECEIVE}");
        assert_eq!(status_of(&gw, 2, "GET", &uri).await, StatusCode::FORBIDDEN);
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::OK);
        assert!(is_bare_repo(&gw.git_root().join("lec/5/edit/100")));
        let uri = format!("/git/lec/5/edit/999/{RECEIVE}");
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_source_repo_hidden_from_students() {
        let gw = Gateway::new();
        let uri = format!("/git/lec/5/source/{UPLOAD}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::FORBIDDEN);
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::NOT_FOUND);
        let push = format!("/git/lec/5/source/{RECEIVE}");
        assert_eq!(status_of(&gw, 3, "GET", &push).await, StatusCode::OK);
        assert!(is_bare_repo(&gw.git_root().join("lec/5/source")));
        assert_eq!(status_of(&gw, 3, "GET", &uri).await, StatusCode::OK);
        let uri = format!("/git/lec/5/release/{RECEIVE}");
        assert_eq!(status_of(&gw, 1, "GET", &uri).await, StatusCode::FORBIDDEN);
    }

    async fn post_rpc(
        gateway: &Gateway,
        user_id: i64,
        uri: &str,
        body: Vec<u8>,
        gzip: bool,
    ) -> (StatusCode, Option<String>, web::Bytes) {
        let app = gateway_app!(gateway);
        let mut req = test::TestRequest::post()
            .uri(uri)
            .insert_header(bearer(user_id))
            .insert_header((header::CONTENT_TYPE, "application/x-git-upload-pack-request"));
        if gzip {
            req = req.insert_header((header::CONTENT_ENCODING, "gzip"));
        }
        let resp = test::call_service(&app, req.set_payload(body).to_request()).await;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (status, content_type, test::read_body(resp).await)
    }

    #[actix_web::test]
    async fn test_upload_pack_flush_only_request() {
        let gw = Gateway::new();
        GitCli::new("git")
            .ensure_bare_repo(&gw.git_root().join("lec/5/source"))
            .await
            .unwrap();

        let uri = "/git/lec/5/source/git-upload-pack";
        let (status, content_type, body) = post_rpc(&gw, 3, uri, b"0000".to_vec(), false).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            content_type.as_deref(),
            Some("application/x-git-upload-pack-result")
        );
        assert!(body.is_empty());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"0000").unwrap();
        let gzipped = encoder.finish().unwrap();
        let (status, _, _) = post_rpc(&gw, 3, uri, gzipped, true).await;
        assert_eq!(status, StatusCode::OK);

        // 学生不能读 source
        let (status, _, _) = post_rpc(&gw, 1, uri, b"0000".to_vec(), false).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_receive_pack_on_broken_repository() {
        let gw = Gateway::new();
        let repo = gw.git_root().join("lec/5/source");
        GitCli::new("git").ensure_bare_repo(&repo).await.unwrap();
        // 仓库结构仍在，但配置文件无法解析
        std::fs::write(repo.join("config"), "[core\n\tbare = ???\n").unwrap();

        let uri = "/git/lec/5/source/git-receive-pack";
        let (status, _, body) = post_rpc(&gw, 3, uri, b"0000".to_vec(), false).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // 响应体带上 git 的 stderr
        assert!(!body.is_empty());
    }

    #[actix_web::test]
    async fn test_first_push_creates_user_repository() {
        let gw = Gateway::new();
        let uri = "/git/lec/5/user/git-receive-pack";
        let (status, content_type, _) = post_rpc(&gw, 1, uri, b"0000".to_vec(), false).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            content_type.as_deref(),
            Some("application/x-git-receive-pack-result")
        );
        assert!(is_bare_repo(&gw.git_root().join("lec/5/user/alice")));
    }

    #[actix_web::test]
    async fn test_receive_pack_rejected_for_autograde() {
        let gw = Gateway::new();
        let repo = gw.git_root().join("lec/5/autograde/bob");
        GitCli::new("git").ensure_bare_repo(&repo).await.unwrap();

        let uri = "/git/lec/5/autograde/100/git-receive-pack";
        for user_id in [2, 3] {
            let (status, _, _) = post_rpc(&gw, user_id, uri, b"0000".to_vec(), false).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
        let (status, _, _) = post_rpc(
            &gw,
            2,
            "/git/lec/5/autograde/100/git-upload-pack",
            b"0000".to_vec(),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
