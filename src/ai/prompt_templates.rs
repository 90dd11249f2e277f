//! 视觉分析提示词模板
//!
//! 评分类别名称必须与 `tools::scorecard` 中的关键字表保持一致，
//! 否则评分提取会漏检。

/// 设计分析的五个评分类别
pub const SCORE_CATEGORIES: &[&str] = &[
    "Visual Harmony",
    "Clarity",
    "User Friendliness",
    "Interactivity",
    "Creativity",
];

/// 图片设计分析提示词
pub fn design_analysis_prompt() -> &'static str {
    "You are a professional UI/UX design expert.\n\
     Analyze the given design image in these 5 categories:\n\n\
     1. **Visual Harmony** (colors, typography, layout consistency)\n\
     2. **Clarity** (how clearly information is communicated)\n\
     3. **User Friendliness** (ease of use, intuitive flow)\n\
     4. **Interactivity** (navigation, button clarity, interaction cues)\n\
     5. **Creativity** (originality and design uniqueness)\n\n\
     For each category:\n\
     - Give a score out of 10 in the exact form `Category: X/10`\n\
     - Provide a brief explanation\n\n\
     Finally, give an overall score (average of the 5 categories)."
}

/// PDF 演示文稿分析提示词，按分析类型选择侧重点
pub fn presentation_analysis_prompt(analysis_type: &str) -> String {
    let focus = match analysis_type {
        "design" => "Focus only on the visual design of the slides: layout, \
                     typography, color usage, and visual consistency across pages.",
        "content" => "Focus only on the content of the presentation: structure, \
                      argument flow, information density, and message clarity.",
        // "full" 以及其他值走完整分析
        _ => "Evaluate both the visual design and the content of the presentation.",
    };

    format!(
        "You are a professional presentation design expert.\n\
         The attached document is a slide deck exported as PDF.\n\
         {}\n\n\
         Score the deck in these 5 categories, each in the exact form `Category: X/10`:\n\n\
         1. **Visual Harmony**\n\
         2. **Clarity**\n\
         3. **User Friendliness**\n\
         4. **Interactivity**\n\
         5. **Creativity**\n\n\
         Provide a brief explanation per category, then an overall score \
         (average of the 5 categories).",
        focus
    )
}
