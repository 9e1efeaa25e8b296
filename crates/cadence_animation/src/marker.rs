//! Scroll markers
//!
//! A marker names a point on the trigger element and a point on the
//! viewport; the binding starts (or ends) at the scroll offset where the two
//! line up. `"top 80%"` fires when the element's top edge reaches 80% of the
//! way down the viewport. A single token applies to both sides, so
//! `"center"` is the same as `"center center"`.

use std::fmt;
use std::str::FromStr;

use crate::error::MotionError;
use crate::stage::Region;

/// Point along an element or the viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    /// `top`
    Start,
    /// `center`
    Center,
    /// `bottom`
    End,
    /// `NN%` of the length, stored as a fraction
    Percent(f32),
    /// `NNpx` or a bare number
    Pixels(f32),
}

impl Anchor {
    /// Offset from the leading edge for a span of `length`
    pub fn offset(&self, length: f32) -> f32 {
        match *self {
            Anchor::Start => 0.0,
            Anchor::Center => length / 2.0,
            Anchor::End => length,
            Anchor::Percent(fraction) => length * fraction,
            Anchor::Pixels(px) => px,
        }
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let number = |s: &str| {
            s.parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("`{token}` is not a number"))
        };
        match token {
            "top" => Ok(Anchor::Start),
            "center" => Ok(Anchor::Center),
            "bottom" => Ok(Anchor::End),
            _ => {
                if let Some(pct) = token.strip_suffix('%') {
                    number(pct).map(|v| Anchor::Percent(v / 100.0))
                } else if let Some(px) = token.strip_suffix("px") {
                    number(px).map(Anchor::Pixels)
                } else {
                    number(token).map(Anchor::Pixels)
                }
            }
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Start => f.write_str("top"),
            Anchor::Center => f.write_str("center"),
            Anchor::End => f.write_str("bottom"),
            Anchor::Percent(fraction) => write!(f, "{}%", fraction * 100.0),
            Anchor::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// Element anchor paired with a viewport anchor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollMarker {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl ScrollMarker {
    pub fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }

    /// Scroll offset at which the two anchors line up
    pub fn scroll_position(&self, trigger: Region, viewport_height: f32) -> f32 {
        trigger.top + self.element.offset(trigger.height) - self.viewport.offset(viewport_height)
    }
}

impl FromStr for ScrollMarker {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| MotionError::InvalidMarker {
            marker: s.to_string(),
            reason,
        };

        let tokens: Vec<&str> = s.split_whitespace().collect();
        match tokens.as_slice() {
            [single] => {
                let anchor = single.parse::<Anchor>().map_err(invalid)?;
                Ok(Self::new(anchor, anchor))
            }
            [element, viewport] => Ok(Self::new(
                element.parse().map_err(invalid)?,
                viewport.parse().map_err(invalid)?,
            )),
            [] => Err(invalid("marker is empty".into())),
            _ => Err(invalid(format!("expected 1 or 2 tokens, got {}", tokens.len()))),
        }
    }
}

impl fmt::Display for ScrollMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}
