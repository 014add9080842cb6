//! 根据学习资料生成选择题
//!
//! 模型按下面的格式输出，这里逐行解析成结构化题目，
//! 再限制选项数量并打乱选项顺序：
//!
//! ```text
//! 1. Question text?
//! a) First option
//! b) Second option
//! c) Third option
//! d) Fourth option
//! Answer: b
//! ```

use fastrand::Rng;

use super::converter::BASE_PROMPT;
use super::types::{Difficulty, GeneratedQuiz, QuizQuestion};
use crate::provider::Conversation;

/// 资料最短字符数（去掉首尾空白后）
pub const MIN_CONTENT_CHARS: usize = 20;

/// 写入提示词的资料最大字符数
pub const MAX_CONTENT_CHARS: usize = 3000;

/// 单次最多生成的题目数
pub const MAX_QUESTIONS: usize = 20;

/// 每题最多保留的选项数
const MAX_OPTIONS: usize = 4;

const DEFAULT_POINTS: u32 = 5;
const DEFAULT_TOPIC: &str = "Study Material";
const QUIZ_CATEGORY: &str = "custom";

/// 检查资料是否足以出题，不足时返回给客户端的错误信息
pub fn check_content(content: &str) -> Result<(), &'static str> {
    let content = content.trim();
    if content.is_empty() {
        return Err("Content is required");
    }
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err("Content is too short to generate quiz questions");
    }
    Ok(())
}

/// 构建出题提示词，资料按字符截断
pub fn quiz_prompt(content: &str, topic: Option<&str>, count: usize) -> String {
    let topic = topic
        .map(|t| format!(" The topic is: {t}."))
        .unwrap_or_default();
    let content = match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((end, _)) => &content[..end],
        None => content,
    };
    format!(
        "Generate exactly {count} multiple choice quiz questions based on the following content.{topic}\n\
         IMPORTANT: Ensure the correct answers are distributed across options (a, b, c, and d) randomly. Do not always make the first option the correct one.\n\n\
         Format each question like this:\n\
         1. Question text?\n\
         a) First option\n\
         b) Second option\n\
         c) Third option\n\
         d) Fourth option\n\
         Answer: b\n\n\
         Content:\n{content}"
    )
}

/// 出题对话，不带历史和附件
pub fn quiz_conversation(content: &str, topic: Option<&str>, count: usize) -> Conversation {
    Conversation::new(BASE_PROMPT, quiz_prompt(content, topic, count))
}

/// 解析中的题目
struct Draft {
    question: String,
    options: Vec<String>,
    answer: usize,
}

impl Draft {
    fn into_question(self, number: usize) -> Option<QuizQuestion> {
        if self.question.is_empty() || self.options.is_empty() {
            return None;
        }
        Some(QuizQuestion {
            id: format!("q{number}"),
            category: QUIZ_CATEGORY.to_string(),
            question: self.question,
            options: self.options,
            correct_answer: self.answer,
            difficulty: Difficulty::Medium,
            points: DEFAULT_POINTS,
        })
    }
}

/// 解析模型输出
///
/// 以 `N. ` 开头的行开始一道新题，`a) ` 到 `d) ` 为选项，
/// `Answer:`（不区分大小写）后的第一个字母为正确选项。其它行忽略。
/// 没有选项的题目丢弃；一道题都没解析出来时返回一道占位题。
pub fn parse_quiz_response(text: &str) -> Vec<QuizQuestion> {
    let mut questions = Vec::new();
    let mut current: Option<Draft> = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(question) = strip_question_number(line) {
            push_draft(&mut questions, current.take());
            current = Some(Draft {
                question: question.to_string(),
                options: Vec::new(),
                answer: 0,
            });
        } else if let Some(option) = strip_option_label(line) {
            if let Some(draft) = current.as_mut() {
                draft.options.push(option.to_string());
            }
        } else if let Some(rest) = strip_answer_prefix(line) {
            if let (Some(draft), Some(index)) = (current.as_mut(), answer_index(rest)) {
                draft.answer = index;
            }
        }
    }
    push_draft(&mut questions, current);

    if questions.is_empty() {
        tracing::warn!("模型输出中没有可解析的题目，使用占位题");
        questions.push(placeholder_question());
    }
    questions
}

fn push_draft(questions: &mut Vec<QuizQuestion>, draft: Option<Draft>) {
    if let Some(question) = draft.and_then(|d| d.into_question(questions.len() + 1)) {
        questions.push(question);
    }
}

/// `12. text` → `text`
fn strip_question_number(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return None;
    }
    let rest = rest.strip_prefix('.')?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

/// `b) text` → `text`
fn strip_option_label(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    if !matches!(chars.next(), Some('a'..='d')) {
        return None;
    }
    let rest = chars.as_str().strip_prefix(')')?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim())
}

fn strip_answer_prefix(line: &str) -> Option<&str> {
    const PREFIX: &str = "answer:";
    let head = line.get(..PREFIX.len())?;
    head.eq_ignore_ascii_case(PREFIX)
        .then(|| &line[PREFIX.len()..])
}

/// `Answer:` 之后第一个字母，限 a-d
fn answer_index(rest: &str) -> Option<usize> {
    let letter = rest.chars().find(char::is_ascii_alphabetic)?;
    match letter.to_ascii_lowercase() {
        c @ 'a'..='d' => Some(c as usize - 'a' as usize),
        _ => None,
    }
}

fn placeholder_question() -> QuizQuestion {
    QuizQuestion {
        id: "q1".to_string(),
        category: QUIZ_CATEGORY.to_string(),
        question: "What is the main topic of the uploaded material?".to_string(),
        options: vec![
            "Not enough data to generate questions".to_string(),
            "Please upload a document".to_string(),
            "Try again".to_string(),
            "Other".to_string(),
        ],
        correct_answer: 0,
        difficulty: Difficulty::Easy,
        points: DEFAULT_POINTS,
    }
}

/// 重新编号，最多保留 4 个选项，正确答案限制在选项范围内
pub fn validate_quiz_questions(questions: Vec<QuizQuestion>) -> Vec<QuizQuestion> {
    questions
        .into_iter()
        .enumerate()
        .map(|(index, mut question)| {
            question.id = format!("q{}", index + 1);
            question.options.truncate(MAX_OPTIONS);
            question.correct_answer = question
                .correct_answer
                .min(question.options.len().saturating_sub(1));
            if question.points == 0 {
                question.points = DEFAULT_POINTS;
            }
            question
        })
        .collect()
}

/// 打乱选项顺序，正确答案跟随原选项移动
pub fn shuffle_options(question: &mut QuizQuestion, rng: &mut Rng) {
    let mut order: Vec<usize> = (0..question.options.len()).collect();
    rng.shuffle(&mut order);

    let options = order.iter().map(|&i| question.options[i].clone()).collect();
    question.correct_answer = order
        .iter()
        .position(|&i| i == question.correct_answer)
        .unwrap_or(0);
    question.options = options;
}

/// 从模型输出组装测验：解析、校验、截取前 `count` 题并打乱选项
pub fn build_quiz(
    response: &str,
    topic: Option<&str>,
    count: usize,
    rng: &mut Rng,
) -> GeneratedQuiz {
    let mut questions = validate_quiz_questions(parse_quiz_response(response));
    questions.truncate(count);
    for question in &mut questions {
        shuffle_options(question, rng);
    }

    GeneratedQuiz {
        topic: topic.unwrap_or(DEFAULT_TOPIC).to_string(),
        questions,
        category: QUIZ_CATEGORY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = "Here are your questions:\n\
        \n\
        1. Which structure is LIFO?\n\
        a) Queue\n\
        b) Stack\n\
        c) Heap\n\
        d) Tree\n\
        Answer: b\n\
        \n\
        2. What does TCP guarantee?\n\
        a) Ordered delivery\n\
        b) Low latency\n\
        c) Broadcast\n\
        d) Encryption\n\
        ANSWER: (A)\n";

    fn question(options: &[&str], correct_answer: usize) -> QuizQuestion {
        QuizQuestion {
            id: "x".to_string(),
            category: QUIZ_CATEGORY.to_string(),
            question: "?".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
            difficulty: Difficulty::Medium,
            points: 0,
        }
    }

    #[test]
    fn test_parse_numbered_questions() {
        let questions = parse_quiz_response(TWO_QUESTIONS);
        assert_eq!(questions.len(), 2);

        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[0].question, "Which structure is LIFO?");
        assert_eq!(questions[0].options, vec!["Queue", "Stack", "Heap", "Tree"]);
        assert_eq!(questions[0].correct_answer, 1);
        assert_eq!(questions[0].difficulty, Difficulty::Medium);
        assert_eq!(questions[0].points, 5);

        assert_eq!(questions[1].id, "q2");
        assert_eq!(questions[1].correct_answer, 0);
    }

    #[test]
    fn test_answer_letter_is_read_after_prefix() {
        let text = "1. Pick one\na) x\nb) y\nc) z\nd) w\nAnswer: d";
        assert_eq!(parse_quiz_response(text)[0].correct_answer, 3);
    }

    #[test]
    fn test_unreadable_answer_keeps_first_option() {
        let text = "1. Pick one\na) x\nb) y\nAnswer: none of these";
        assert_eq!(parse_quiz_response(text)[0].correct_answer, 0);
    }

    #[test]
    fn test_question_without_options_is_dropped() {
        let text = "1. Orphan question\n2. Real question\na) yes\nb) no\nAnswer: a";
        let questions = parse_quiz_response(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[0].question, "Real question");
    }

    #[test]
    fn test_lines_that_only_look_like_markers_are_ignored() {
        let text = "1.5 is a number\n1. Real\ne) not an option\na)missing space\na) ok";
        let questions = parse_quiz_response(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec!["ok"]);
    }

    #[test]
    fn test_nothing_parsed_gives_placeholder() {
        let questions = parse_quiz_response("Sorry, I cannot help with that.");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "What is the main topic of the uploaded material?");
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[0].difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_validate_clamps_options_and_answer() {
        let questions = validate_quiz_questions(vec![
            question(&["a", "b", "c", "d", "e", "f"], 5),
            question(&["a", "b"], 1),
        ]);
        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[0].correct_answer, 3);
        assert_eq!(questions[0].points, 5);
        assert_eq!(questions[1].id, "q2");
        assert_eq!(questions[1].correct_answer, 1);
    }

    #[test]
    fn test_shuffle_keeps_correct_option() {
        let mut rng = Rng::with_seed(7);
        for seed_round in 0..50 {
            let mut q = question(&["Queue", "Stack", "Heap", "Tree"], 1);
            shuffle_options(&mut q, &mut rng);
            let mut sorted = q.options.clone();
            sorted.sort();
            assert_eq!(sorted, vec!["Heap", "Queue", "Stack", "Tree"], "round {seed_round}");
            assert_eq!(q.options[q.correct_answer], "Stack", "round {seed_round}");
        }
    }

    #[test]
    fn test_check_content() {
        assert_eq!(check_content("   "), Err("Content is required"));
        assert_eq!(
            check_content("  too short  "),
            Err("Content is too short to generate quiz questions")
        );
        assert!(check_content("Binary search halves the range each step.").is_ok());
    }

    #[test]
    fn test_prompt_truncates_content() {
        let content = "字".repeat(MAX_CONTENT_CHARS + 10);
        let prompt = quiz_prompt(&content, Some("Trees"), 3);
        assert!(prompt.starts_with("Generate exactly 3 multiple choice quiz questions"));
        assert!(prompt.contains(" The topic is: Trees."));
        let tail = prompt.split("Content:\n").nth(1).unwrap();
        assert_eq!(tail.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_prompt_without_topic() {
        let prompt = quiz_prompt("some content", None, 5);
        assert!(!prompt.contains("The topic is"));
        assert!(prompt.contains("Answer: b\n\nContent:\nsome content"));
    }

    #[test]
    fn test_build_quiz_limits_count() {
        let quiz = build_quiz(TWO_QUESTIONS, None, 1, &mut Rng::with_seed(1));
        assert_eq!(quiz.topic, "Study Material");
        assert_eq!(quiz.category, "custom");
        assert_eq!(quiz.questions.len(), 1);
        let q = &quiz.questions[0];
        assert_eq!(q.options[q.correct_answer], "Stack");
    }
}
