//! Animation targets
//!
//! Views mount their animatable elements on the engine's stage and get a
//! [`TargetId`] back. The engine writes interpolated [`ElementState`]s into
//! the stage; the host reads them at render time.

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a mounted animation target
    pub struct TargetId;
}

/// Vertical extent of an element in document coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Region {
    /// Distance from the top of the document
    pub top: f32,
    /// Element height
    pub height: f32,
}

impl Region {
    pub fn new(top: f32, height: f32) -> Self {
        Self {
            top,
            height: height.max(0.0),
        }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Visual state of a target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementState {
    pub opacity: f32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
    /// Whether the host should promote the element to its own compositing layer
    pub force_3d: bool,
}

impl ElementState {
    /// Fully visible, untransformed
    pub const RESTING: Self = Self {
        opacity: 1.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
        rotation: 0.0,
        force_3d: false,
    };

    /// Interpolate the numeric channels; `force_3d` follows the destination
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            opacity: mix(self.opacity, other.opacity),
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            scale: mix(self.scale, other.scale),
            rotation: mix(self.rotation, other.rotation),
            force_3d: other.force_3d,
        }
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.opacity - other.opacity).abs() < epsilon
            && (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.scale - other.scale).abs() < epsilon
            && (self.rotation - other.rotation).abs() < epsilon
    }
}

impl Default for ElementState {
    fn default() -> Self {
        Self::RESTING
    }
}

/// Property endpoints of a tween
///
/// Unset channels keep the target's current value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Props {
    pub opacity: Option<f32>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub scale: Option<f32>,
    pub rotation: Option<f32>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opacity(mut self, value: f32) -> Self {
        self.opacity = Some(value);
        self
    }

    pub fn x(mut self, value: f32) -> Self {
        self.x = Some(value);
        self
    }

    pub fn y(mut self, value: f32) -> Self {
        self.y = Some(value);
        self
    }

    pub fn scale(mut self, value: f32) -> Self {
        self.scale = Some(value);
        self
    }

    pub fn rotation(mut self, value: f32) -> Self {
        self.rotation = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay these props on a base state
    pub fn apply_to(&self, base: ElementState) -> ElementState {
        ElementState {
            opacity: self.opacity.unwrap_or(base.opacity).clamp(0.0, 1.0),
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            scale: self.scale.unwrap_or(base.scale),
            rotation: self.rotation.unwrap_or(base.rotation),
            force_3d: base.force_3d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_overlay() {
        let base = ElementState {
            x: 10.0,
            ..ElementState::RESTING
        };
        let out = Props::new().opacity(0.0).y(40.0).apply_to(base);
        assert_eq!(out.opacity, 0.0);
        assert_eq!(out.y, 40.0);
        assert_eq!(out.x, 10.0);
        assert_eq!(out.scale, 1.0);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let out = Props::new().opacity(3.0).apply_to(ElementState::RESTING);
        assert_eq!(out.opacity, 1.0);
    }

    #[test]
    fn test_lerp() {
        let hidden = Props::new().opacity(0.0).y(80.0).apply_to(ElementState::RESTING);
        let mid = hidden.lerp(&ElementState::RESTING, 0.5);
        assert!((mid.opacity - 0.5).abs() < 1e-6);
        assert!((mid.y - 40.0).abs() < 1e-6);
        assert!(hidden.lerp(&ElementState::RESTING, 1.0).approx_eq(&ElementState::RESTING, 1e-6));
    }
}
