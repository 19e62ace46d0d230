//! Camera-side queries feeding LOD selection: frustum visibility and
//! projected screen coverage of an object's bounds.

use glam::{Mat4, Vec2, Vec3, Vec4};

const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Clip-space `w` below which a projected point is treated as at or behind the eye.
const MIN_CLIP_W: f32 = 1e-5;

/// A world-space axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box from a center and half-extents.
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size along each axis.
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Radius of the enclosing sphere.
    pub fn radius(&self) -> f32 {
        self.extents().length()
    }

    /// The same box moved by `offset`.
    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb::new(self.min + offset, self.max + offset)
    }
}

/// Six inward-facing clip planes of a view-projection matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes from a view-projection matrix with a `[0, 1]`
    /// depth range (Griggs-Hartmann).
    pub fn from_view_projection(view_proj: &Mat4) -> Self {
        let rows = [
            view_proj.row(0),
            view_proj.row(1),
            view_proj.row(2),
            view_proj.row(3),
        ];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[2];
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Whether any part of `aabb` may be inside the frustum.
    ///
    /// Tests the corner furthest along each plane normal. Boxes near the
    /// frustum's edges can pass while being fully outside; a visible box
    /// never fails.
    pub fn is_visible(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let p = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(p) + plane.w >= 0.0
        })
    }
}

/// A perspective camera as seen by the LOD system.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraView {
    view_proj: Mat4,
    viewport: Vec2,
    frustum: Frustum,
}

impl CameraView {
    /// Wrap a view-projection matrix and a viewport size in pixels.
    pub fn new(view_proj: Mat4, viewport: Vec2) -> Self {
        Self {
            frustum: Frustum::from_view_projection(&view_proj),
            view_proj,
            viewport,
        }
    }

    /// Right-handed camera at `eye` looking at `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        let proj = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self::new(proj * view, Vec2::new(width, height))
    }

    /// Combined view-projection matrix.
    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    /// Viewport size in pixels.
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Clip planes.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Pixel position of a world point, origin at the bottom-left.
    ///
    /// `None` when the point is at or behind the eye plane.
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * point.extend(1.0);
        if clip.w <= MIN_CLIP_W {
            return None;
        }
        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        Some((ndc * 0.5 + Vec2::splat(0.5)) * self.viewport)
    }

    /// Fraction of the screen covered by the spheres around `bounds`.
    ///
    /// Projects each sphere's six axis extremes, accumulates one screen
    /// rectangle and takes the larger of its width and height fractions,
    /// clamped to `[0, 1]`. A sphere crossing the eye plane covers the
    /// whole screen; spheres entirely behind it contribute nothing. No
    /// bounds in front of the eye or an empty viewport give 0.
    pub fn coverage_ratio(&self, bounds: &[Aabb]) -> f32 {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return 0.0;
        }

        // Clip-space w is affine in the world position, so over a sphere it
        // spans the center's w plus or minus radius times this gradient.
        let w_row = self.view_proj.row(3);
        let w_gradient = w_row.truncate().length();

        let mut lo = Vec2::splat(f32::INFINITY);
        let mut hi = Vec2::splat(f32::NEG_INFINITY);
        for aabb in bounds {
            let center = aabb.center();
            let radius = aabb.radius();
            let center_w = w_row.dot(center.extend(1.0));
            let spread = radius * w_gradient;
            if center_w + spread <= MIN_CLIP_W {
                continue;
            }
            if center_w - spread <= MIN_CLIP_W {
                return 1.0;
            }
            for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                for sign in [1.0, -1.0] {
                    let Some(screen) = self.world_to_screen(center + axis * (sign * radius))
                    else {
                        return 1.0;
                    };
                    lo = lo.min(screen);
                    hi = hi.max(screen);
                }
            }
        }

        if lo.x > hi.x {
            return 0.0;
        }
        let covered = (hi - lo) / self.viewport;
        covered.max_element().clamp(0.0, 1.0)
    }
}

/// What a managed object needs to know about the camera each update.
pub trait ViewProbe {
    /// Whether `aabb` may be on screen.
    fn is_visible(&self, aabb: &Aabb) -> bool;

    /// Screen coverage of the combined bounds, in `[0, 1]`.
    fn coverage_ratio(&self, bounds: &[Aabb]) -> f32;
}

impl ViewProbe for CameraView {
    fn is_visible(&self, aabb: &Aabb) -> bool {
        self.frustum.is_visible(aabb)
    }

    fn coverage_ratio(&self, bounds: &[Aabb]) -> f32 {
        CameraView::coverage_ratio(self, bounds)
    }
}

/// No camera: everything counts as visible and fills the screen.
impl ViewProbe for Option<CameraView> {
    fn is_visible(&self, aabb: &Aabb) -> bool {
        self.as_ref().is_none_or(|camera| camera.is_visible(aabb))
    }

    fn coverage_ratio(&self, bounds: &[Aabb]) -> f32 {
        self.as_ref()
            .map_or(1.0, |camera| camera.coverage_ratio(bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn square_camera() -> CameraView {
        CameraView::look_at(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::Y,
            FRAC_PI_2,
            100.0,
            100.0,
            0.1,
            1000.0,
        )
    }

    fn unit_box_at(z: f32) -> Aabb {
        Aabb::from_center_extents(Vec3::new(0.0, 0.0, z), Vec3::ONE)
    }

    #[test]
    fn test_aabb_center_extents_radius() {
        let aabb = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.center(), Vec3::ZERO);
        assert_eq!(aabb.extents(), Vec3::new(1.0, 2.0, 3.0));
        assert!((aabb.radius() - 14.0f32.sqrt()).abs() < 1e-6);
    }

    /// Boxes in front are visible, boxes behind or off to the side are not.
    #[test]
    fn test_frustum_visibility() {
        let camera = square_camera();
        assert!(camera.is_visible(&unit_box_at(-10.0)));
        assert!(!camera.is_visible(&unit_box_at(10.0)));
        assert!(!camera.is_visible(&Aabb::from_center_extents(
            Vec3::new(500.0, 0.0, -10.0),
            Vec3::ONE
        )));
        assert!(!camera.is_visible(&unit_box_at(-2000.0)));
    }

    /// A box straddling a frustum edge still counts as visible.
    #[test]
    fn test_partially_visible_box() {
        let camera = square_camera();
        let straddling = Aabb::from_center_extents(Vec3::new(10.0, 0.0, -10.0), Vec3::splat(1.5));
        assert!(camera.is_visible(&straddling));
    }

    /// With a 90 degree square view the sphere of a unit-extent box at
    /// distance 10 spans `2 * sqrt(3) / 20` of the screen.
    #[test]
    fn test_coverage_ratio_known_value() {
        let ratio = square_camera().coverage_ratio(&[unit_box_at(-10.0)]);
        assert!((ratio - 3.0f32.sqrt() / 10.0).abs() < 1e-3, "ratio {ratio}");
    }

    /// Farther objects cover less of the screen.
    #[test]
    fn test_coverage_shrinks_with_distance() {
        let camera = square_camera();
        let near = camera.coverage_ratio(&[unit_box_at(-5.0)]);
        let far = camera.coverage_ratio(&[unit_box_at(-50.0)]);
        assert!(near > far);
        assert!(far > 0.0);
    }

    /// Coverage never exceeds the whole screen, and a camera inside the sphere gets 1.
    #[test]
    fn test_coverage_clamped() {
        let camera = square_camera();
        assert_eq!(camera.coverage_ratio(&[unit_box_at(-1.5)]), 1.0);
        assert_eq!(camera.coverage_ratio(&[unit_box_at(0.0)]), 1.0);
    }

    /// Multiple bounds accumulate into one screen rectangle.
    #[test]
    fn test_coverage_merges_bounds() {
        let camera = square_camera();
        let left = Aabb::from_center_extents(Vec3::new(-2.0, 0.0, -20.0), Vec3::ONE);
        let right = Aabb::from_center_extents(Vec3::new(2.0, 0.0, -20.0), Vec3::ONE);
        let single = camera.coverage_ratio(&[left]);
        let both = camera.coverage_ratio(&[left, right]);
        assert!(both > single);
    }

    /// Spheres wholly behind the eye cover nothing; one crossing the eye plane covers everything.
    #[test]
    fn test_coverage_behind_eye() {
        let camera = square_camera();
        assert_eq!(camera.coverage_ratio(&[unit_box_at(200.0)]), 0.0);
        assert_eq!(camera.coverage_ratio(&[unit_box_at(1.5)]), 1.0);

        let ahead = camera.coverage_ratio(&[unit_box_at(-10.0)]);
        let with_behind = camera.coverage_ratio(&[unit_box_at(-10.0), unit_box_at(200.0)]);
        assert_eq!(with_behind, ahead);
    }

    #[test]
    fn test_coverage_without_bounds_is_zero() {
        assert_eq!(square_camera().coverage_ratio(&[]), 0.0);
    }

    /// Without a camera everything is visible at full coverage.
    #[test]
    fn test_no_camera_probe() {
        let probe: Option<CameraView> = None;
        assert!(probe.is_visible(&unit_box_at(10.0)));
        assert_eq!(probe.coverage_ratio(&[unit_box_at(-100.0)]), 1.0);

        let probe = Some(square_camera());
        assert!(!probe.is_visible(&unit_box_at(10.0)));
    }

    /// The screen center maps to the middle of the viewport.
    #[test]
    fn test_world_to_screen_center() {
        let camera = square_camera();
        let screen = camera.world_to_screen(Vec3::new(0.0, 0.0, -3.0)).unwrap();
        assert!((screen - Vec2::splat(50.0)).length() < 1e-3);
        assert!(camera.world_to_screen(Vec3::new(0.0, 0.0, 3.0)).is_none());
    }
}
