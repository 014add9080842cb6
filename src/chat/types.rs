//! 聊天网关 HTTP 类型定义

use serde::{Deserialize, Serialize};

use crate::provider::{ProviderKind, Turn};

// === 错误响应 ===

/// API 错误响应，形如 `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// 创建认证错误响应
    pub fn authentication_error() -> Self {
        Self::new("Invalid API key")
    }
}

// === 对话端点类型 ===

/// 对话请求体
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<Turn>,
    /// 从上传文件或图片中提取的文本
    #[serde(default)]
    pub study_material: Option<String>,
    /// base64 图片，可带 data URL 前缀
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub user_data: Option<UserData>,
    #[serde(default)]
    pub stream: bool,
}

/// 用户账户信息，字段均可缺省
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    pub display_name: String,
    pub username: String,
    pub coins: i64,
    pub rank: Option<u32>,
    pub login_streak: u32,
    pub total_quizzes_taken: u32,
    pub badges: Vec<String>,
    pub quiz_streaks: QuizStreaks,
    pub perfect_days: u32,
}

/// 各分类的连续答题天数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuizStreaks {
    pub ds_algo: u32,
    pub database: u32,
    pub os: u32,
    pub networks: u32,
}

// === 提示端点类型 ===

/// 答题提示请求
#[derive(Debug, Deserialize)]
pub struct HintRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// 单段文本响应
#[derive(Debug, Serialize)]
pub struct HintResponse {
    pub response: String,
}

// === 测验生成 ===

/// 测验生成请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    /// 用于出题的学习资料文本
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_question_count")]
    pub number_of_questions: usize,
}

fn default_question_count() -> usize {
    5
}

/// 题目难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
}

/// 一道选择题，`correct_answer` 为选项下标
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub category: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub difficulty: Difficulty,
    pub points: u32,
}

/// 生成的测验
#[derive(Debug, Serialize)]
pub struct GeneratedQuiz {
    pub topic: String,
    pub questions: Vec<QuizQuestion>,
    pub category: String,
}

// === 状态与模型 ===

/// 服务状态响应
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub available: bool,
    pub provider: ProviderKind,
}

/// 本地模型列表响应
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}
