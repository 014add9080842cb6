//! 客户端请求到 provider 对话的转换
//!
//! 负责拼接系统提示词、清理图片数据

use std::fmt::Write;

use super::types::{ChatRequest, HintRequest, UserData};
use crate::provider::Conversation;

pub(super) const BASE_PROMPT: &str = "You are a helpful study assistant for StudiFy. Answer questions clearly and concisely. You have access to the user's account details if provided.";

const ACCOUNT_USAGE: &str = "Use this information to answer personal questions about their progress, coins, streaks, and achievements. Be encouraging and reference their stats when relevant.";

const QUIZ_CREATION: &str = r#"[CONVERSATIONAL QUIZ CREATION]:
If a user asks to create a quiz (e.g., "Create a quiz on Python"), follow this process:
1. Ask them for the number of questions and the difficulty level (Easy, Medium, or Hard).
2. Once they provide those, generate the quiz.
3. IMPORTANT: When you are ready to provide the final quiz, you MUST wrap the quiz data in a JSON block like this:
```json
{
  "type": "quiz_data",
  "title": "Python Basics Quiz",
  "questions": [
    {
      "question": "What is Python?",
      "options": ["Language", "Snake", "Car", "Food"],
      "correctAnswer": 0,
      "difficulty": "easy",
      "points": 5
    }
  ]
}
```
The user will then see a "Save & Publish" button to save it. Do not just list the questions; provide this JSON block at the end of your response."#;

/// 构建对话
pub fn build_conversation(request: ChatRequest) -> Conversation {
    let image = request
        .image_data
        .as_deref()
        .map(clean_image_data)
        .filter(|data| !data.is_empty())
        .map(str::to_string);

    let system = system_prompt(
        request.user_data.as_ref(),
        request.study_material.as_deref(),
        image.is_some(),
    );

    let conversation = Conversation::new(system, request.message).with_history(request.history);
    match image {
        Some(image) => conversation.with_image(image),
        None => conversation,
    }
}

/// 构建答题提示对话，不带历史和附件
pub fn hint_conversation(request: &HintRequest) -> Conversation {
    let message = format!(
        "Provide a subtle hint for this quiz question. Help me think through it without giving the answer.\n\nQuestion: {}\nOptions: {}\n\nProvide a one-sentence subtle hint.",
        request.question,
        request.options.join(", ")
    );
    Conversation::new(BASE_PROMPT, message)
}

/// 去掉 data URL 前缀（第一个逗号及之前的部分）
pub fn clean_image_data(data: &str) -> &str {
    match data.split_once(',') {
        Some((_, base64)) => base64,
        None => data,
    }
}

/// 拼接系统提示词
pub fn system_prompt(user: Option<&UserData>, material: Option<&str>, has_image: bool) -> String {
    let mut prompt = String::from(BASE_PROMPT);

    if let Some(user) = user {
        push_account_details(&mut prompt, user);
    }

    if let Some(material) = material.filter(|m| !m.trim().is_empty()) {
        let (kind, noun) = if has_image {
            ("IMAGE (OCR & Visual)", "image")
        } else {
            ("DOCUMENT", "file")
        };
        let _ = write!(
            prompt,
            "\n\n[ATTACHED {kind} CONTENT]:\n{material}\n\nUSER NOTE: The user has uploaded an {noun}. The text above is the content extracted from it."
        );
        if has_image {
            prompt.push_str(" The OCR might be imperfect or fragmented if the image is a complex diagram. Use the context to reconstruct missing words if needed. Additionally, the raw image data has been sent to your vision module for visual analysis.");
        }
        let _ = write!(
            prompt,
            " Do NOT claim you cannot see or access the {noun}. Answer the user's request based on the provided content."
        );
    }

    prompt
}

fn push_account_details(prompt: &mut String, user: &UserData) {
    let rank = user
        .rank
        .map(|r| r.to_string())
        .unwrap_or_else(|| "Unranked".to_string());
    let badges = if user.badges.is_empty() {
        "None".to_string()
    } else {
        user.badges.join(", ")
    };
    let streaks = &user.quiz_streaks;

    let _ = write!(
        prompt,
        "\n\n[USER ACCOUNT DETAILS]:\n\
         - Name: {} (@{})\n\
         - Coins: {}\n\
         - Rank: {}\n\
         - Login Streak: {} days\n\
         - Total Quizzes Taken: {}\n\
         - Badges: {}\n\
         - Quiz Streaks: DS/Algo: {}, DB: {}, OS: {}, Networks: {}\n\
         - Perfect Days: {}\n\n{}\n\n{}",
        user.display_name,
        user.username,
        user.coins,
        rank,
        user.login_streak,
        user.total_quizzes_taken,
        badges,
        streaks.ds_algo,
        streaks.database,
        streaks.os,
        streaks.networks,
        user.perfect_days,
        ACCOUNT_USAGE,
        QUIZ_CREATION,
    );
}
