//! Grader Service - 课程作业平台的 git 网关与评分流水线
//!
//! 基于 Actix Web 构建。学生、助教通过 git Smart-HTTP 推拉作业仓库，
//! 后台 worker 拉取提交、调用 notebook 转换器评分并推送结果。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `git`: 仓库路径、访问控制、Smart-HTTP 协议与工作区
//! - `middlewares`: 令牌认证中间件
//! - `models`: 数据模型定义
//! - `routes`: HTTP 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: git 网关、评分执行器与系统接口
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod config;
pub mod entity;
pub mod errors;
pub mod git;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
