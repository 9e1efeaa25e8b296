//! Easing curves
//!
//! Power curves in the `powerN.{in,out,inOut}` family. `power1` is quadratic,
//! `power2` cubic, `power3` quartic. Curves are identified by name in
//! configuration files (`"power2.out"`), and a bare `"powerN"` means the
//! `out` variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Easing curve identifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    #[default]
    Linear,
    Power1In,
    Power1Out,
    Power1InOut,
    Power2In,
    Power2Out,
    Power2InOut,
    Power3In,
    Power3Out,
    Power3InOut,
}

impl Ease {
    /// Map linear progress `t` (0.0 to 1.0) onto the curve
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::Power1In => ease_in(t, 2),
            Ease::Power1Out => ease_out(t, 2),
            Ease::Power1InOut => ease_in_out(t, 2),
            Ease::Power2In => ease_in(t, 3),
            Ease::Power2Out => ease_out(t, 3),
            Ease::Power2InOut => ease_in_out(t, 3),
            Ease::Power3In => ease_in(t, 4),
            Ease::Power3Out => ease_out(t, 4),
            Ease::Power3InOut => ease_in_out(t, 4),
        }
    }

    /// Curve strength, 0 for linear up to 3 for the power3 family
    pub fn strength(&self) -> u8 {
        match self {
            Ease::Linear => 0,
            Ease::Power1In | Ease::Power1Out | Ease::Power1InOut => 1,
            Ease::Power2In | Ease::Power2Out | Ease::Power2InOut => 2,
            Ease::Power3In | Ease::Power3Out | Ease::Power3InOut => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ease::Linear => "none",
            Ease::Power1In => "power1.in",
            Ease::Power1Out => "power1.out",
            Ease::Power1InOut => "power1.inOut",
            Ease::Power2In => "power2.in",
            Ease::Power2Out => "power2.out",
            Ease::Power2InOut => "power2.inOut",
            Ease::Power3In => "power3.in",
            Ease::Power3Out => "power3.out",
            Ease::Power3InOut => "power3.inOut",
        }
    }
}

fn ease_in(t: f32, exp: i32) -> f32 {
    t.powi(exp)
}

fn ease_out(t: f32, exp: i32) -> f32 {
    1.0 - (1.0 - t).powi(exp)
}

fn ease_in_out(t: f32, exp: i32) -> f32 {
    if t < 0.5 {
        ease_in(t * 2.0, exp) / 2.0
    } else {
        1.0 - ease_in((1.0 - t) * 2.0, exp) / 2.0
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ease {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ease = match s.trim() {
            "none" | "linear" => Ease::Linear,
            "power1.in" => Ease::Power1In,
            "power1" | "power1.out" => Ease::Power1Out,
            "power1.inOut" => Ease::Power1InOut,
            "power2.in" => Ease::Power2In,
            "power2" | "power2.out" => Ease::Power2Out,
            "power2.inOut" => Ease::Power2InOut,
            "power3.in" => Ease::Power3In,
            "power3" | "power3.out" => Ease::Power3Out,
            "power3.inOut" => Ease::Power3InOut,
            other => return Err(MotionError::UnknownEase(other.to_string())),
        };
        Ok(ease)
    }
}

impl TryFrom<String> for Ease {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 10] = [
        Ease::Linear,
        Ease::Power1In,
        Ease::Power1Out,
        Ease::Power1InOut,
        Ease::Power2In,
        Ease::Power2Out,
        Ease::Power2InOut,
        Ease::Power3In,
        Ease::Power3Out,
        Ease::Power3InOut,
    ];

    #[test]
    fn test_endpoints() {
        for ease in ALL {
            assert!(ease.apply(0.0).abs() < 1e-6, "{ease}");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6, "{ease}");
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Ease::Power2Out.apply(-1.0), 0.0);
        assert_eq!(Ease::Power2Out.apply(2.0), 1.0);
    }

    #[test]
    fn test_stronger_out_curves_lead() {
        let t = 0.3;
        assert!(Ease::Power1Out.apply(t) > Ease::Linear.apply(t));
        assert!(Ease::Power2Out.apply(t) > Ease::Power1Out.apply(t));
        assert!(Ease::Power3Out.apply(t) > Ease::Power2Out.apply(t));
        assert!(Ease::Power3In.apply(t) < Ease::Power1In.apply(t));
    }

    #[test]
    fn test_in_out_midpoint() {
        assert!((Ease::Power2InOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_names() {
        for ease in ALL {
            assert_eq!(ease.name().parse::<Ease>().unwrap(), ease);
        }
        assert_eq!("power3".parse::<Ease>().unwrap(), Ease::Power3Out);
        assert_eq!("linear".parse::<Ease>().unwrap(), Ease::Linear);
        assert!(matches!(
            "elastic.out".parse::<Ease>(),
            Err(MotionError::UnknownEase(name)) if name == "elastic.out"
        ));
    }

    #[test]
    fn test_strength() {
        assert!(Ease::Power1Out.strength() < Ease::Power2Out.strength());
        assert!(Ease::Power2Out.strength() < Ease::Power3Out.strength());
    }
}
