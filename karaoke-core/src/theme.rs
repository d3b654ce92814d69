//! Instance-scoped stylesheet and markup generation.
//!
//! Every selector and keyframe name is suffixed with the instance id, so
//! several widgets can share a page without their styles colliding.

use crate::config::ThemeConfig;
use crate::window::RenderedLine;

/// Embedded stylesheet template (compiled into the binary)
const THEME_TEMPLATE: &str = include_str!("../assets/theme.css");

/// Element ids for one widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIds {
    pub instance: String,
}

impl InstanceIds {
    #[must_use]
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    #[must_use]
    pub fn style(&self) -> String {
        format!("karaoke-styles-{}", self.instance)
    }

    #[must_use]
    pub fn player_slot(&self) -> String {
        format!("player-{}", self.instance)
    }

    #[must_use]
    pub fn karaoke_box(&self) -> String {
        format!("karaoke-box-{}", self.instance)
    }

    #[must_use]
    pub fn lyrics_container(&self) -> String {
        format!("lyrics-container-{}", self.instance)
    }
}

/// Render the stylesheet for `instance` with the given theme.
#[must_use]
pub fn render_stylesheet(instance: &str, theme: &ThemeConfig) -> String {
    let colors = &theme.colors;
    let font_query = theme.font.replace(' ', "+");
    let substitutions: [(&str, &str); 13] = [
        ("{{id}}", instance),
        ("{{font_query}}", font_query.as_str()),
        ("{{font}}", theme.font.as_str()),
        ("{{floating_symbol}}", theme.floating_symbol.as_str()),
        ("{{primary}}", colors.primary.as_str()),
        ("{{secondary}}", colors.secondary.as_str()),
        ("{{accent}}", colors.accent.as_str()),
        ("{{background}}", colors.background.as_str()),
        ("{{text}}", colors.text.as_str()),
        ("{{glow1}}", colors.glow1.as_str()),
        ("{{glow2}}", colors.glow2.as_str()),
        ("{{default_box_shadow}}", theme.shadows.default_box_shadow.as_str()),
        ("{{hover_box_shadow}}", theme.shadows.hover_box_shadow.as_str()),
    ];

    substitutions
        .iter()
        .fold(THEME_TEMPLATE.to_string(), |css, (placeholder, value)| {
            css.replace(placeholder, value)
        })
}

/// Render the widget skeleton: a player slot and the (collapsed) lyric box.
#[must_use]
pub fn render_markup(ids: &InstanceIds) -> String {
    format!(
        r#"<div id="{instance}">
  <div class="video-container">
    <div id="{slot}"></div>
  </div>
  <div class="karaoke" id="{karaoke_box}">
    <div class="lyrics-container" id="{lyrics}"></div>
  </div>
</div>"#,
        instance = ids.instance,
        slot = ids.player_slot(),
        karaoke_box = ids.karaoke_box(),
        lyrics = ids.lyrics_container(),
    )
}

/// Render a line element with the classes for its current status.
#[must_use]
pub fn render_line(line: &RenderedLine) -> String {
    let classes = match line.status.css_class() {
        Some(status) => format!("line {status}"),
        None => "line".to_string(),
    };
    format!(
        r#"<div class="{classes}" data-line="{id}">{text}</div>"#,
        id = line.id,
        text = line.line.text,
    )
}
