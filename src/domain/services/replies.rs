#[cfg(test)]
#[path = "replies_test.rs"]
mod tests;

use std::sync::Mutex;
use std::sync::PoisonError;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;

use crate::domain::models::Replier;

pub const PROGRAMMING_REPLY: &str = "关于编程问题，我可以帮你分析代码、提供示例或解释概念。你能具体说明你遇到的编程问题吗？";
pub const LEARNING_REPLY: &str = "学习新技能是一个很好的想法！我可以为你制定学习计划、推荐资源或解释复杂概念。你想学习什么具体内容？";
pub const PROJECT_REPLY: &str = "项目开发涉及多个阶段，包括需求分析、设计、实现和测试。我可以协助你进行项目规划、技术选型或问题排查。";
pub const GREETING_REPLY: &str = "你好！很高兴与你交流。我是DeepSeek AI助手，可以回答你的问题、协助解决问题或进行有意义的对话。今天有什么我可以帮助你的吗？";

pub const FALLBACK_REPLIES: [&str; 5] = [
    "这是一个很好的问题！让我详细解释一下...",
    "根据我的理解，这个问题涉及多个方面。首先...",
    "感谢你的提问！关于这个问题，我可以提供以下信息...",
    "我明白你的疑问。让我从几个角度来分析这个问题...",
    "这是一个常见的问题。简单来说，主要涉及以下几个方面...",
];

/// Keyword groups in priority order. The first group with any keyword
/// contained in the prompt wins.
const KEYWORD_REPLIES: [(&[&str], &str); 4] = [
    (&["代码", "编程"], PROGRAMMING_REPLY),
    (&["学习", "教程"], LEARNING_REPLY),
    (&["项目", "开发"], PROJECT_REPLY),
    (&["你好", "嗨"], GREETING_REPLY),
];

/// Returns the reply for the first matching keyword group, or a uniformly
/// random fallback when nothing matches. Matching is case-sensitive.
pub fn derive_reply<R: Rng + ?Sized>(prompt: &str, rng: &mut R) -> String {
    for (keywords, reply) in KEYWORD_REPLIES {
        if keywords.iter().any(|keyword| return prompt.contains(keyword)) {
            return reply.to_string();
        }
    }

    return FALLBACK_REPLIES
        .choose(rng)
        .unwrap_or(&FALLBACK_REPLIES[0])
        .to_string();
}

/// The default replier, answering from fixed keyword rules.
pub struct KeywordReplier {
    rng: Mutex<StdRng>,
}

impl Default for KeywordReplier {
    fn default() -> KeywordReplier {
        return KeywordReplier {
            rng: Mutex::new(StdRng::from_entropy()),
        };
    }
}

impl KeywordReplier {
    pub fn with_seed(seed: u64) -> KeywordReplier {
        return KeywordReplier {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        };
    }
}

impl Replier for KeywordReplier {
    fn name(&self) -> &str {
        return "keyword";
    }

    fn get_reply(&self, prompt: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        return derive_reply(prompt, &mut *rng);
    }
}
