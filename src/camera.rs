use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

/// Viewer pose supplied by the rendering collaborator each frame.
///
/// Follows the right-handed convention: the camera looks down its local -Z
/// with +Y up, so [`Camera::orientation`] maps -Z onto the view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    target: Point3<f32>,
    up: Vector3<f32>,
    view: Isometry3<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new(Point3::new(0.0, 1.0, 4.0), Point3::new(0.0, 1.0, 0.0))
    }
}

impl Camera {
    pub fn new(position: Point3<f32>, target: Point3<f32>) -> Camera {
        let mut ret = Camera {
            position,
            target,
            up: Vector3::y(),
            view: Isometry3::identity(),
        };
        ret.update_view();
        ret
    }

    pub fn set_position(&mut self, pos: Point3<f32>) {
        self.position = pos;
        self.update_view();
    }

    pub fn set_target(&mut self, target: Point3<f32>) {
        self.target = target;
        self.update_view();
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Unit view direction. Falls back to -Z when target and position coincide.
    pub fn get_direction(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(1e-6)
            .unwrap_or(-Vector3::z())
    }

    /// Camera-to-world rotation.
    pub fn orientation(&self) -> UnitQuaternion<f32> {
        self.view.rotation.inverse()
    }

    /// Camera-to-world transform.
    pub fn pose(&self) -> Isometry3<f32> {
        self.view.inverse()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.orientation() * Vector3::x()
    }

    pub fn up_vector(&self) -> Vector3<f32> {
        self.orientation() * Vector3::y()
    }

    fn update_view(&mut self) {
        let direction = self.get_direction();
        // Looking straight up or down leaves Y useless as an up hint
        let up = if direction.cross(&self.up).norm_squared() < 1e-8 {
            Vector3::z()
        } else {
            self.up
        };
        let target = self.position + direction;
        self.view = Isometry3::look_at_rh(&self.position, &target, &up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_vec_eq(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        (a - b).norm() < EPSILON
    }

    #[test]
    fn test_camera_get_direction() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 5.0), Point3::origin());
        assert!(approx_vec_eq(&camera.get_direction(), &-Vector3::z()));
    }

    #[test]
    fn test_orientation_maps_forward_onto_direction() {
        let camera = Camera::new(Point3::new(2.0, 1.0, 0.0), Point3::new(2.0, 1.0, -3.0) + Vector3::new(3.0, 0.0, 0.0));
        let forward = camera.orientation() * -Vector3::z();
        assert!(approx_vec_eq(&forward, &camera.get_direction()), "Got {:?}", forward);
    }

    #[test]
    fn test_camera_basis_is_orthonormal() {
        let camera = Camera::new(Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.5, 0.0));
        let r = camera.right();
        let u = camera.up_vector();
        let d = camera.get_direction();
        assert!(r.dot(&u).abs() < EPSILON);
        assert!(r.dot(&d).abs() < EPSILON);
        assert!(u.y > 0.0, "Up should keep a positive Y component");
    }

    #[test]
    fn test_pose_translation_is_position() {
        let mut camera = Camera::default();
        camera.set_position(Point3::new(5.0, 10.0, 15.0));
        let t = camera.pose().translation.vector;
        assert!(approx_vec_eq(&t, &Vector3::new(5.0, 10.0, 15.0)));
    }

    #[test]
    fn test_looking_straight_down_is_finite() {
        let camera = Camera::new(Point3::new(0.0, 5.0, 0.0), Point3::origin());
        let q = camera.orientation();
        assert!(q.coords.iter().all(|c| c.is_finite()));
        assert!(approx_vec_eq(&(q * -Vector3::z()), &-Vector3::y()));
    }
}
