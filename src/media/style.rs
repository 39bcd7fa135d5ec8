use tracing::warn;

use crate::config::FfmpegConfig;

/// Screen position of burned subtitles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitlePosition {
    Bottom,
    Top,
    Center,
}

impl SubtitlePosition {
    /// Resolve a configured position name; anything unrecognized falls back to bottom
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "bottom" => Self::Bottom,
            "top" => Self::Top,
            "center" => Self::Center,
            other => {
                warn!("Unknown subtitle position '{}', falling back to bottom", other);
                Self::Bottom
            }
        }
    }

    /// ASS `Alignment` value understood by the subtitles filter
    pub fn alignment(&self) -> u32 {
        match self {
            Self::Bottom => 2,
            Self::Top => 8,
            Self::Center => 10,
        }
    }
}

/// Styling applied when subtitles are composited into the frames
#[derive(Debug, Clone)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    pub primary_colour: String,
    pub outline_colour: String,
    pub border_style: u32,
    pub outline: u32,
    pub shadow: u32,
    pub position: SubtitlePosition,
}

impl SubtitleStyle {
    /// Value of the subtitles filter's `force_style` option
    pub fn force_style(&self) -> String {
        format!(
            "FontName={},FontSize={},PrimaryColour={},OutlineColour={},BorderStyle={},Outline={},Shadow={},Alignment={}",
            self.font_name,
            self.font_size,
            self.primary_colour,
            self.outline_colour,
            self.border_style,
            self.outline,
            self.shadow,
            self.position.alignment()
        )
    }
}

/// Everything a burned-subtitle re-encode needs besides the file paths
#[derive(Debug, Clone)]
pub struct BurnOptions {
    pub style: SubtitleStyle,
    pub preset: String,
    pub crf: u32,
    pub pix_fmt: String,
}

impl From<&FfmpegConfig> for BurnOptions {
    fn from(config: &FfmpegConfig) -> Self {
        Self {
            style: SubtitleStyle {
                font_name: config.font_name.clone(),
                font_size: config.font_size,
                primary_colour: config.primary_colour.clone(),
                outline_colour: config.outline_colour.clone(),
                border_style: config.border_style,
                outline: config.outline,
                shadow: config.shadow,
                position: SubtitlePosition::from_name(&config.subtitle_position),
            },
            preset: config.preset.clone(),
            crf: config.crf,
            pix_fmt: config.pix_fmt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_alignment() {
        assert_eq!(SubtitlePosition::from_name("bottom").alignment(), 2);
        assert_eq!(SubtitlePosition::from_name("TOP").alignment(), 8);
        assert_eq!(SubtitlePosition::from_name(" center ").alignment(), 10);
    }

    #[test]
    fn test_unknown_position_falls_back_to_bottom() {
        assert_eq!(SubtitlePosition::from_name("left"), SubtitlePosition::Bottom);
        assert_eq!(SubtitlePosition::from_name(""), SubtitlePosition::Bottom);
    }

    #[test]
    fn test_force_style_from_config() {
        let mut config = FfmpegConfig::default();
        config.subtitle_position = "somewhere".to_string();
        config.font_name = "DejaVu Sans".to_string();

        let options = BurnOptions::from(&config);
        assert_eq!(
            options.style.force_style(),
            "FontName=DejaVu Sans,FontSize=24,PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,BorderStyle=1,Outline=2,Shadow=0,Alignment=2"
        );
        assert_eq!(options.crf, 23);
    }
}
