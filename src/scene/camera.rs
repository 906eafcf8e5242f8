//! Fly camera driven by yaw/pitch, mirrored to the kernel every frame.

use crate::geom::Ray;
use crate::gpu::CameraUniform;
use crate::util::{Mat4, Vec2, Vec3};

use super::input::{InputSource, PointerButton};

const LOOK_SENSITIVITY: f32 = 0.1;
const SCROLL_SPEED: f32 = 0.1;
const PITCH_LIMIT: f32 = 89.0;

/// Perspective camera with an orthonormal front/right/up basis.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Degrees, clamped to +-89.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    world_up: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    width: u32,
    height: u32,
    last_pointer: Option<Vec2>,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut cam = Self {
            position: Vec3::ZERO,
            yaw: -90.0,
            pitch: 0.0,
            fov_y: 45.0,
            world_up: Vec3::Y,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            width: width.max(1),
            height: height.max(1),
            last_pointer: None,
        };
        cam.update_vectors();
        cam
    }

    /// Place the camera and aim it by yaw/pitch (degrees).
    pub fn looking(mut self, position: Vec3, yaw: f32, pitch: f32) -> Self {
        self.position = position;
        self.yaw = yaw;
        self.pitch = pitch;
        self.update_vectors();
        self
    }

    /// Recompute the basis from yaw/pitch.
    pub fn update_vectors(&mut self) {
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        self.front = front.normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Apply pointer look and scroll dolly. Returns whether the camera moved.
    pub fn tick(&mut self, input: &impl InputSource) -> bool {
        let pointer = input.pointer_position();
        let delta = self.last_pointer.map_or(Vec2::ZERO, |last| pointer - last);
        self.last_pointer = Some(pointer);

        let mut moved = false;
        if input.button_state(PointerButton::Right) && delta != Vec2::ZERO {
            self.yaw += delta.x * LOOK_SENSITIVITY;
            self.pitch -= delta.y * LOOK_SENSITIVITY;
            self.update_vectors();
            moved = true;
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            self.position += self.front * scroll * SCROLL_SPEED;
            moved = true;
        }
        moved
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Primary ray through the centre of pixel `(x, y)`, y down.
    ///
    /// Same math as `camera_dir` in `trace.wgsl`.
    pub fn generate_ray(&self, x: f32, y: f32) -> Ray {
        let tan_half = (self.fov_y.to_radians() * 0.5).tan();
        let sx = (2.0 * (x + 0.5) / self.width as f32 - 1.0) * self.aspect() * tan_half;
        let sy = (1.0 - 2.0 * (y + 0.5) / self.height as f32) * tan_half;
        let dir = (self.front + self.right * sx + self.up * sy).normalize();
        Ray::new(self.position, dir)
    }

    pub fn to_uniform(&self, flags: u32) -> CameraUniform {
        CameraUniform {
            origin: self.position.to_array(),
            flags,
            front: self.front.to_array(),
            tan_half_fov: (self.fov_y.to_radians() * 0.5).tan(),
            right: self.right.to_array(),
            aspect: self.aspect(),
            up: self.up.to_array(),
            _pad: 0.0,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
