use crate::math::{Color, Number, Vector3};

/// Ambient/diffuse/shininess description of a light.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightColor {
    pub ambient: Color,
    pub diffuse: Color,
    pub shininess: Number,
}

impl Default for LightColor {
    fn default() -> Self {
        Self {
            ambient: Color::ZERO,
            diffuse: Color::ONE,
            shininess: 0.0,
        }
    }
}

/// Point light. Data only; nothing in the engine shades with it.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Light {
    position: Vector3,
    color: LightColor,
}

impl Light {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    pub fn set_light(&mut self, ambient: Color, diffuse: Color, shininess: Number) {
        self.color = LightColor {
            ambient,
            diffuse,
            shininess,
        };
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn color(&self) -> LightColor {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_store_values() {
        let mut light = Light::new();
        light.set_position(Vector3::new(1.0, 2.0, 3.0));
        light.set_light(Color::splat(0.1), Color::new(1.0, 0.5, 0.25, 1.0), 32.0);

        assert_eq!(light.position(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(light.color().ambient, Color::splat(0.1));
        assert_eq!(light.color().diffuse, Color::new(1.0, 0.5, 0.25, 1.0));
        assert_eq!(light.color().shininess, 32.0);
    }
}
