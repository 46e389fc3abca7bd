use crate::error::{Result, RetroError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prompt styles accepted by the generation service. Serialized as
/// [`ModelStyle::identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum ModelStyle {
    #[default]
    Default,
    Retro,
    Simple,
    Detailed,
    GameAsset,
    Portrait,
    Texture,
    Ui,
    ItemSheet,
    CharacterTurnaround,
    OneBit,
    LowRes,
    McItem,
    McTexture,
    NoStyle,
}

impl ModelStyle {
    pub fn all() -> &'static [ModelStyle] {
        &[
            ModelStyle::Default,
            ModelStyle::Retro,
            ModelStyle::Simple,
            ModelStyle::Detailed,
            ModelStyle::GameAsset,
            ModelStyle::Portrait,
            ModelStyle::Texture,
            ModelStyle::Ui,
            ModelStyle::ItemSheet,
            ModelStyle::CharacterTurnaround,
            ModelStyle::OneBit,
            ModelStyle::LowRes,
            ModelStyle::McItem,
            ModelStyle::McTexture,
            ModelStyle::NoStyle,
        ]
    }

    /// Identifier sent as `prompt_style`.
    pub fn identifier(&self) -> &'static str {
        match self {
            ModelStyle::Default => "rd_fast__default",
            ModelStyle::Retro => "rd_fast__retro",
            ModelStyle::Simple => "rd_fast__simple",
            ModelStyle::Detailed => "rd_fast__detailed",
            ModelStyle::GameAsset => "rd_fast__game_asset",
            ModelStyle::Portrait => "rd_fast__portrait",
            ModelStyle::Texture => "rd_fast__texture",
            ModelStyle::Ui => "rd_fast__ui",
            ModelStyle::ItemSheet => "rd_fast__item_sheet",
            ModelStyle::CharacterTurnaround => "rd_fast__character_turnaround",
            ModelStyle::OneBit => "rd_fast__1_bit",
            ModelStyle::LowRes => "rd_fast__low_res",
            ModelStyle::McItem => "rd_fast__mc_item",
            ModelStyle::McTexture => "rd_fast__mc_texture",
            ModelStyle::NoStyle => "rd_fast__no_style",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelStyle::Default => "Default",
            ModelStyle::Retro => "Retro",
            ModelStyle::Simple => "Simple",
            ModelStyle::Detailed => "Detailed",
            ModelStyle::GameAsset => "Game Asset",
            ModelStyle::Portrait => "Portrait",
            ModelStyle::Texture => "Texture",
            ModelStyle::Ui => "UI Element",
            ModelStyle::ItemSheet => "Item Sheet",
            ModelStyle::CharacterTurnaround => "Character Turnaround",
            ModelStyle::OneBit => "1-Bit",
            ModelStyle::LowRes => "Low Res",
            ModelStyle::McItem => "Minecraft Item",
            ModelStyle::McTexture => "Minecraft Texture",
            ModelStyle::NoStyle => "No Style",
        }
    }
}

impl fmt::Display for ModelStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl From<ModelStyle> for &'static str {
    fn from(style: ModelStyle) -> Self {
        style.identifier()
    }
}

impl TryFrom<String> for ModelStyle {
    type Error = RetroError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for ModelStyle {
    type Err = RetroError;

    fn from_str(s: &str) -> Result<Self> {
        ModelStyle::all()
            .iter()
            .copied()
            .find(|style| style.identifier() == s)
            .ok_or_else(|| RetroError::InvalidRequest(format!("Unknown model style: {}", s)))
    }
}

/// One snapshot of the user's generation inputs.
///
/// A fresh value is produced on every edit; structural equality is what the
/// cost estimator uses to tell a stale response from a current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub prompt: String,
    pub style: ModelStyle,
    pub width: u32,
    pub height: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            style: ModelStyle::Default,
            width: 256,
            height: 256,
        }
    }
}

impl GenerationParameters {
    pub fn new(prompt: impl Into<String>, style: ModelStyle, width: u32, height: u32) -> Self {
        Self {
            prompt: prompt.into(),
            style,
            width,
            height,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_style(mut self, style: ModelStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RetroError::InvalidRequest(format!(
                "Image size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub amount: f64,
}

impl CostEstimate {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.3}", self.amount)
    }
}
