//! LLM prompt engineering for splitting and describing
//!
//! The builder is pure string templating: identical inputs always give
//! identical prompts, which is what the tests rely on.

use crate::config::SegmentPolicy;
use storyboard_llm::ChatRequest;

/// Line printed after every storyboard block in describe output
pub const STORYBOARD_DELIMITER: &str = "------";

/// Which instruction set to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMode {
    /// Cut the source document into numbered lines
    Split,

    /// Annotate numbered lines with image and video descriptions
    Describe {
        /// Free-text character sheet, keyed informally by character name
        characters: String,
        /// Style flags appended to every image description (e.g. `--ar 9:16`)
        style_suffix: String,
    },
}

/// Builds the instruction prompt and the request for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    mode: PromptMode,
    policy: SegmentPolicy,
}

impl PromptBuilder {
    /// Create a builder for the given mode
    pub fn new(mode: PromptMode, policy: SegmentPolicy) -> Self {
        Self { mode, policy }
    }

    /// Builder for the split step
    pub fn split(policy: SegmentPolicy) -> Self {
        Self::new(PromptMode::Split, policy)
    }

    /// Builder for the describe step
    pub fn describe(
        characters: impl Into<String>,
        style_suffix: impl Into<String>,
        policy: SegmentPolicy,
    ) -> Self {
        Self::new(
            PromptMode::Describe {
                characters: characters.into(),
                style_suffix: style_suffix.into(),
            },
            policy,
        )
    }

    /// The mode this builder renders
    pub fn mode(&self) -> &PromptMode {
        &self.mode
    }

    /// Render the instruction prompt sent with the system role
    pub fn build_system(&self) -> String {
        match &self.mode {
            PromptMode::Split => self.split_instructions(),
            PromptMode::Describe {
                characters,
                style_suffix,
            } => self.describe_instructions(characters, style_suffix),
        }
    }

    /// Build the request for one call; `body` becomes the user message as-is
    pub fn request(&self, body: &str, temperature: f32) -> ChatRequest {
        ChatRequest::new(self.build_system(), body, temperature)
    }

    fn split_instructions(&self) -> String {
        let max = self.policy.max_line_chars;
        let mut prompt = String::new();

        prompt.push_str(SPLIT_ROLE);
        prompt.push_str("\n\n严格规则：\n");
        prompt.push_str("1. 原文一字不改：严禁删减、改写或添加任何字符（包括标点），所有行按顺序拼接后必须与原文完全一致。\n");
        prompt.push_str(&format!(
            "2. 字数上限：每一行不得超过{}个字（不含行首编号）。超过时必须在标点或语义停顿处拆分成多行。\n",
            max
        ));
        prompt.push_str("3. 切换即换行：说话人、场景或动作发生变化时，必须另起一行。\n");
        prompt.push_str("4. 行首编号：每一行以阿拉伯数字加英文句点开头（1. 2. 3. ……），编号从1开始严格递增，不得跳号或重复。\n");
        if self.policy.merge_short_lines {
            prompt.push_str(&format!(
                "5. 合并短句：相邻的短句如果属于同一说话人、同一场景和同一动作，可以合并为一行，但合并后仍不得超过{}个字。\n",
                max
            ));
        } else {
            prompt.push_str("5. 保持原子：每个句子单独成行，不要把相邻的句子合并到同一行。\n");
        }
        prompt.push_str("6. 只输出编号行：不要输出标题、解释、总结或任何编号行以外的内容。\n\n");
        prompt.push_str("输出格式示例：\n1. 第一行文案\n2. 第二行文案");

        prompt
    }

    fn describe_instructions(&self, characters: &str, style_suffix: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str(DESCRIBE_ROLE);
        prompt.push_str("\n\n人物设定：\n");
        let characters = characters.trim();
        if characters.is_empty() {
            prompt.push_str("（未提供人物设定，请根据文案自行设计人物外观，并在所有分镜中保持一致）\n");
        } else {
            prompt.push_str(characters);
            prompt.push('\n');
        }

        prompt.push_str("\n严格规则：\n");
        prompt.push_str("1. 逐行处理：对每一行输入输出一个分镜块，顺序与编号保持不变，不得遗漏、合并或新增分镜。\n");
        prompt.push_str("2. 原文照抄：分镜块第一行原样输出该行文案（包括行首编号），一字不改。\n");
        prompt.push_str("3. 画面描述（静态）：描述场景、环境、光线、景别与视角（特写/近景/中景/全景）；出现的人物必须完整复述人物设定中的外观、发型与服饰，不得简写为“同上”；只描述静止画面，禁止使用任何动作动词。");
        let style_suffix = style_suffix.trim();
        if !style_suffix.is_empty() {
            prompt.push_str(&format!("画面描述末尾追加风格参数：{}", style_suffix));
        }
        prompt.push('\n');
        prompt.push_str(&format!(
            "4. 视频描述（动态）：描述人物动作、神态变化以及镜头运动（推、拉、摇、移、跟），内容必须能在约{}秒内完成。\n",
            self.policy.shot_seconds
        ));
        prompt.push_str(&format!(
            "5. 分隔：每个分镜块之后单独输出一行 {}\n",
            STORYBOARD_DELIMITER
        ));
        prompt.push_str("6. 除分镜块外不要输出任何解释或总结。\n\n");
        prompt.push_str(&format!(
            "输出格式示例：\n1. 原文文案\n画面描述：……\n视频描述：……\n{}",
            STORYBOARD_DELIMITER
        ));

        prompt
    }
}

const SPLIT_ROLE: &str = "你是一名专业的短剧分镜师。你的任务是把用户提供的文案切分成一行一行的分镜文案，每一行对应一个镜头。";

const DESCRIBE_ROLE: &str = "你是一名专业的漫剧导演和AI绘画/视频提示词专家。用户会提供若干行已编号的分镜文案，请为每一行生成画面描述和视频描述。";
