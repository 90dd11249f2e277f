use chrono::Utc;
use image::{ImageBuffer, Rgb, RgbImage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::VisionConfig;
use crate::errors::{MCPError, Result};

/// 类别关键字表，顺序即评分卡上的条目顺序
///
/// 关键字全部小写，匹配前会先将模型输出行转为小写并去掉 markdown 标点。
static CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Visual Harmony", &["visual harmony"]),
    ("Clarity", &["clarity"]),
    ("User Friendliness", &["user friendliness", "user-friendliness"]),
    ("Interactivity", &["interactivity"]),
    ("Creativity", &["creativity"]),
];

static SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*/\s*10").unwrap()
});

/// 从模型回答中提取出的评分
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    /// (类别, 分数)，按类别表顺序
    pub scores: Vec<(String, f32)>,
    /// 各类别平均分
    pub overall: Option<f32>,
}

impl ScoreReport {
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// 宽松的逐行评分提取
///
/// 每行最多命中一个类别（表中顺序优先），每个类别只取首次出现的分数；
/// 容忍 `**`、`#`、编号等 markdown 装饰。
pub fn extract_scores(analysis: &str) -> ScoreReport {
    let mut scores: Vec<(String, f32)> = Vec::new();

    for line in analysis.lines() {
        let normalized: String = line
            .to_lowercase()
            .chars()
            .map(|c| if c == '*' || c == '#' || c == '`' || c == '_' { ' ' } else { c })
            .collect();

        let category = CATEGORY_KEYWORDS.iter().find(|(name, keywords)| {
            keywords.iter().any(|k| normalized.contains(k))
                && !scores.iter().any(|(seen, _)| seen == name)
        });

        let Some((name, _)) = category else { continue };

        if let Some(caps) = SCORE_RE.captures(&normalized) {
            let raw = caps[1].replace(',', ".");
            if let Ok(value) = raw.parse::<f32>() {
                if (0.0..=10.0).contains(&value) {
                    scores.push((name.to_string(), value));
                }
            }
        }
    }

    let overall = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().map(|(_, v)| v).sum::<f32>() / scores.len() as f32)
    };

    ScoreReport { scores, overall }
}

const BAR_HEIGHT: u32 = 28;
const ROW_HEIGHT: u32 = 48;
const CARD_WIDTH: u32 = 640;
const MARGIN: u32 = 24;

fn bar_color(score: f32) -> Rgb<u8> {
    if score < 5.0 {
        Rgb([214, 69, 65]) // 红
    } else if score < 7.5 {
        Rgb([243, 156, 18]) // 橙
    } else {
        Rgb([39, 174, 96]) // 绿
    }
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..(y0 + h).min(img.height()) {
        for x in x0..(x0 + w).min(img.width()) {
            img.put_pixel(x, y, color);
        }
    }
}

/// 渲染评分条形卡：每个类别一条按分数填充的色条，外加浅灰满刻度底条
pub fn render_scorecard(report: &ScoreReport) -> Result<RgbImage> {
    if report.is_empty() {
        return Err(MCPError::RenderError("没有可渲染的评分".to_string()).into());
    }

    let rows = report.scores.len() as u32 + 1; // 末行为总分
    let height = rows * ROW_HEIGHT + MARGIN * 2;
    let mut img: RgbImage = ImageBuffer::from_pixel(CARD_WIDTH, height, Rgb([250, 250, 250]));

    let track_width = CARD_WIDTH - MARGIN * 2;

    for (i, (_, score)) in report.scores.iter().enumerate() {
        let y = MARGIN + i as u32 * ROW_HEIGHT + (ROW_HEIGHT - BAR_HEIGHT) / 2;
        fill_rect(&mut img, MARGIN, y, track_width, BAR_HEIGHT, Rgb([225, 225, 225]));
        let filled = ((score / 10.0) * track_width as f32).round() as u32;
        fill_rect(&mut img, MARGIN, y, filled, BAR_HEIGHT, bar_color(*score));
    }

    if let Some(overall) = report.overall {
        let y = MARGIN + report.scores.len() as u32 * ROW_HEIGHT + (ROW_HEIGHT - BAR_HEIGHT) / 2;
        fill_rect(&mut img, MARGIN, y, track_width, BAR_HEIGHT, Rgb([210, 210, 210]));
        let filled = ((overall / 10.0) * track_width as f32).round() as u32;
        fill_rect(&mut img, MARGIN, y, filled, BAR_HEIGHT, Rgb([41, 128, 185]));
    }

    Ok(img)
}

/// 编码为 PNG 字节流（用于上传）
pub fn png_bytes(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| MCPError::RenderError(format!("PNG 编码失败: {}", e)))?;
    Ok(buffer)
}

/// 将评分卡 PNG 和分析快照 JSON 写入本地目录
pub fn write_snapshot(
    dir: &Path,
    source_url: &str,
    analysis: &str,
    report: &ScoreReport,
    img: &RgbImage,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let png_path = dir.join(format!("scorecard_{}.png", stamp));
    img.save(&png_path)
        .map_err(|e| MCPError::RenderError(format!("保存 {} 失败: {}", png_path.display(), e)))?;

    let snapshot = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "source_url": source_url,
        "scores": report.scores.iter()
            .map(|(name, value)| json!({ "category": name, "score": value }))
            .collect::<Vec<_>>(),
        "overall": report.overall,
        "analysis": analysis,
    });
    let json_path = dir.join(format!("analysis_{}.json", stamp));
    std::fs::write(&json_path, serde_json::to_string_pretty(&snapshot)?)?;

    debug!("💾 分析快照已写入: {}", json_path.display());

    Ok(png_path)
}

/// 上传 PNG 到图床（imgbb 风格接口），返回外链地址
pub async fn upload_png(config: &VisionConfig, png: &[u8]) -> Result<String> {
    let key = config.upload_key.as_deref()
        .ok_or_else(|| MCPError::UploadError("未配置 IMGBB_API_KEY".to_string()))?;

    let encoded = super::fetch::encode_base64(png);
    let client = reqwest::Client::new();
    let response = client
        .post(&config.upload_endpoint)
        .form(&[("key", key), ("image", encoded.as_str())])
        .send()
        .await
        .map_err(|e| MCPError::UploadError(e.to_string()))?;

    if !response.status().is_success() {
        return Err(MCPError::UploadError(format!("HTTP {}", response.status())).into());
    }

    let body: serde_json::Value = response.json().await
        .map_err(|e| MCPError::UploadError(format!("响应解析失败: {}", e)))?;

    body.get("data")
        .and_then(|d| d.get("url"))
        .and_then(|u| u.as_str())
        .map(|u| u.to_string())
        .ok_or_else(|| MCPError::UploadError("响应中缺少图片地址".to_string()).into())
}

/// 评分卡副作用编排：提取 → 渲染 → 落盘 → 上传
///
/// 任何一步失败只记录警告并返回 None，分析文本照常返回给调用方。
pub async fn publish(config: &VisionConfig, source_url: &str, analysis: &str) -> Option<String> {
    let dir = config.scorecard_dir.as_ref()?;

    let report = extract_scores(analysis);
    if report.is_empty() {
        debug!("模型回答中未提取到评分，跳过评分卡");
        return None;
    }

    let img = match render_scorecard(&report) {
        Ok(img) => img,
        Err(e) => {
            warn!("⚠️ {}", e);
            return None;
        }
    };

    if let Err(e) = write_snapshot(dir, source_url, analysis, &report, &img) {
        warn!("⚠️ 评分卡落盘失败: {}", e);
    }

    if config.upload_key.is_none() {
        return None;
    }

    let png = match png_bytes(&img) {
        Ok(png) => png,
        Err(e) => {
            warn!("⚠️ {}", e);
            return None;
        }
    };

    match upload_png(config, &png).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("⚠️ {}", e);
            None
        }
    }
}
