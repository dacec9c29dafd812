/// Titles for a store seeded with a few past conversations, oldest first.
pub fn history_titles() -> Vec<&'static str> {
    return vec!["AI助手使用指南", "JavaScript学习计划", "项目需求分析"];
}

/// A prompt that hits every keyword group at once, used to pin down which
/// reply wins.
pub fn mixed_keyword_prompt() -> &'static str {
    return "你好，我想学习编程，顺便开发一个项目";
}

/// Prompts that match no keyword and fall through to the random replies.
pub fn plain_prompts() -> Vec<&'static str> {
    return vec!["今天天气怎么样？", "What is Rust?", "   ", "HELLO"];
}
