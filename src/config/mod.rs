//! Scan Configuration
//!
//! Session settings stored in TOML format. Configuration is constructed
//! once at session start and stays immutable while capture runs; the
//! ranges below are clamped on load so a hand-edited file cannot push the
//! pipeline outside its calibrated bounds.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default extraction model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default batch size
pub const DEFAULT_MAX_FRAMES: usize = 5;

/// Default minimum spacing between gated captures
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 500;

/// Default sharpness gate, calibrated against the 320px analysis width
pub const DEFAULT_SHARPNESS_THRESHOLD: u32 = 20;

/// Allowed batch size range
pub const MAX_FRAMES_RANGE: (usize, usize) = (1, 20);

/// Allowed capture interval range in milliseconds
pub const CAPTURE_INTERVAL_RANGE: (u64, u64) = (100, 2000);

/// Default system prompt: strict JSON extraction with a `full_text` field
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a high-precision OCR engine.
1. Analyze the provided images.
2. Extract ALL visible text strictly as it appears.
3. Return the result in valid JSON format with a 'full_text' field containing the merged text.
4. If a part is illegible, mark it as [UNCLEAR].";

/// Named alternative system prompts selectable from the CLI
pub const PROMPT_PRESETS: &[(&str, &str)] = &[
    ("standard", DEFAULT_SYSTEM_PROMPT),
    (
        "text-only",
        "Extract the single most prominent line of text visible. Return ONLY the raw plain text string. Do not use Markdown or JSON.",
    ),
    (
        "code-only",
        "Extract only the main visible code, ID number, or price. Max 10 characters. Return ONLY the raw string. No markdown.",
    ),
    (
        "markdown",
        "Extract all text and preserve layout using Markdown headers, lists, and tables. Return raw Markdown.",
    ),
];

/// Look up a prompt preset by name
pub fn prompt_preset(name: &str) -> Option<&'static str> {
    PROMPT_PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, prompt)| *prompt)
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// API credential; may also come from the GEMINI_API_KEY environment
    pub api_key: String,
    /// Extraction model identifier
    pub model: String,
    /// Frames per batch, clamped to [1, 20]
    pub max_frames: usize,
    /// Minimum spacing between gated captures, clamped to [100, 2000] ms
    pub capture_interval_ms: u64,
    /// Sharpness gate; paired with the fixed analysis resolution
    pub sharpness_threshold: u32,
    /// System instruction sent with every batch
    pub system_prompt: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_frames: DEFAULT_MAX_FRAMES,
            capture_interval_ms: DEFAULT_CAPTURE_INTERVAL_MS,
            sharpness_threshold: DEFAULT_SHARPNESS_THRESHOLD,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl ScanConfig {
    /// Clamp out-of-range values into their allowed bounds
    pub fn clamped(mut self) -> Self {
        self.max_frames = self.max_frames.clamp(MAX_FRAMES_RANGE.0, MAX_FRAMES_RANGE.1);
        self.capture_interval_ms = self
            .capture_interval_ms
            .clamp(CAPTURE_INTERVAL_RANGE.0, CAPTURE_INTERVAL_RANGE.1);
        self
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ScanConfig = toml::from_str(&content)?;
    Ok(config.clamped())
}

/// Save configuration to file
pub fn save_config(config: &ScanConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
