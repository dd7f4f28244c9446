use crate::math::{Transform, Vector3};

/// Right-handed look-at camera.
///
/// The view transform is recomputed wholesale on every [`look_at`](Self::look_at);
/// there is no incremental update.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    position: Vector3,
    view: Transform,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            view: Transform::IDENTITY,
        }
    }
}

impl Camera {
    /// World up used by every look-at.
    pub const UP: Vector3 = Vector3::Y;

    pub fn new() -> Self {
        Self::default()
    }

    /// Points the camera from `eye` towards `target`.
    ///
    /// Degenerate when `eye`, `target` and [`Camera::UP`] are collinear.
    pub fn look_at(&mut self, eye: Vector3, target: Vector3) {
        self.view = Transform::look_at_rh(eye, target, Self::UP);
        self.position = eye;
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// World-to-view transform.
    pub fn view_matrix(&self) -> Transform {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn cam(eye: Vector3, target: Vector3) -> Camera {
        let mut c = Camera::new();
        c.look_at(eye, target);
        c
    }

    #[test]
    fn eye_maps_to_view_origin() {
        let eye = Vector3::new(1.0, 1.0, 1.0);
        let c = cam(eye, Vector3::ZERO);
        let p = c.view_matrix().transform_point3(eye);
        assert!(p.abs_diff_eq(Vector3::ZERO, EPS), "{p:?}");
    }

    #[test]
    fn inverse_view_maps_origin_to_eye() {
        let eye = Vector3::new(3.0, -2.0, 5.0);
        let c = cam(eye, Vector3::new(0.5, 0.0, 0.0));
        let p = c.view_matrix().inverse().transform_point3(Vector3::ZERO);
        assert!(p.abs_diff_eq(eye, EPS), "{p:?}");
    }

    #[test]
    fn target_lies_on_negative_z() {
        let eye = Vector3::new(0.0, 2.0, 4.0);
        let target = Vector3::new(1.0, 0.0, -1.0);
        let c = cam(eye, target);

        let p = c.view_matrix().transform_point3(target);
        let dist = (target - eye).length();
        assert!(p.abs_diff_eq(Vector3::new(0.0, 0.0, -dist), 1e-4), "{p:?}");
    }

    #[test]
    fn world_up_stays_in_upper_half() {
        let c = cam(Vector3::new(0.0, 0.0, 5.0), Vector3::ZERO);
        let up = c.view_matrix().transform_vector3(Vector3::Y);
        assert!(up.abs_diff_eq(Vector3::Y, EPS), "{up:?}");
    }

    #[test]
    fn look_at_replaces_previous_state() {
        let mut c = cam(Vector3::new(1.0, 0.0, 0.0), Vector3::ZERO);
        c.look_at(Vector3::new(0.0, 1.0, 3.0), Vector3::ZERO);

        assert_eq!(c.position(), Vector3::new(0.0, 1.0, 3.0));
        assert_eq!(
            c.view_matrix(),
            Transform::look_at_rh(Vector3::new(0.0, 1.0, 3.0), Vector3::ZERO, Vector3::Y)
        );
    }
}
