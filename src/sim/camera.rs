//! Trailing follow camera with drag-to-orbit

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::SIM_DT;
use crate::tuning::CameraTuning;

/// Pointer drag input for orbiting the camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DragEvent {
    Start(Vec2),
    Move(Vec2),
    End,
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    position: Vec3,
    target: Vec3,
    yaw: f32,
    pitch: f32,
    base_offset: Vec3,
    smoothing: f32,
    pitch_min: f32,
    pitch_max: f32,
    drag_speed: f32,
    /// Multiplier from player settings
    sensitivity: f32,
    invert_pitch: bool,
    /// Last pointer position while a drag is active
    drag: Option<Vec2>,
}

impl CameraRig {
    pub fn new(tuning: &CameraTuning, player_pos: Vec3) -> Self {
        let base_offset = Vec3::from(tuning.base_offset);
        Self {
            position: player_pos + base_offset,
            target: player_pos,
            yaw: 0.0,
            pitch: 0.0,
            base_offset,
            smoothing: tuning.smoothing,
            pitch_min: tuning.pitch_min,
            pitch_max: tuning.pitch_max,
            drag_speed: tuning.drag_speed,
            sensitivity: 1.0,
            invert_pitch: false,
            drag: None,
        }
    }

    pub fn set_preferences(&mut self, sensitivity: f32, invert_pitch: bool) {
        self.sensitivity = sensitivity.max(0.0);
        self.invert_pitch = invert_pitch;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn on_drag_start(&mut self, pointer: Vec2) {
        self.drag = Some(pointer);
    }

    /// Orbit by the pointer delta since the last drag event.
    ///
    /// The delta is scaled by `dt` relative to a 60 Hz frame so orbit speed
    /// does not depend on display rate.
    pub fn on_drag_move(&mut self, pointer: Vec2, dt: f32) {
        let Some(last) = self.drag else {
            return;
        };
        let delta = pointer - last;
        self.drag = Some(pointer);

        let speed = self.drag_speed * self.sensitivity * (dt / SIM_DT);
        let pitch_sign = if self.invert_pitch { -1.0 } else { 1.0 };
        self.yaw -= delta.x * speed;
        self.pitch = (self.pitch + delta.y * speed * pitch_sign).clamp(self.pitch_min, self.pitch_max);
    }

    pub fn on_drag_end(&mut self) {
        self.drag = None;
    }

    pub fn handle(&mut self, event: DragEvent, dt: f32) {
        match event {
            DragEvent::Start(p) => self.on_drag_start(p),
            DragEvent::Move(p) => self.on_drag_move(p, dt),
            DragEvent::End => self.on_drag_end(),
        }
    }

    /// Where the camera wants to be for the current orbit angles
    pub fn desired_position(&self, player_pos: Vec3) -> Vec3 {
        let rotation = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(-self.pitch);
        player_pos + rotation * self.base_offset
    }

    /// Ease toward the desired position and aim at the player
    pub fn update(&mut self, player_pos: Vec3) {
        let desired = self.desired_position(player_pos);
        self.position = self.position.lerp(desired, self.smoothing);
        self.target = player_pos;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Jump straight to the desired position, keeping the orbit angles
    pub fn snap_to(&mut self, player_pos: Vec3) {
        self.position = self.desired_position(player_pos);
        self.target = player_pos;
    }

    /// Snap behind the player with neutral angles
    pub fn reset(&mut self, player_pos: Vec3) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.drag = None;
        self.position = player_pos + self.base_offset;
        self.target = player_pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> CameraRig {
        CameraRig::new(&CameraTuning::default(), Vec3::ZERO)
    }

    #[test]
    fn test_update_lerps_instead_of_snapping() {
        let mut cam = rig();
        let player = Vec3::new(0.0, -10.0, 0.0);
        cam.update(player);

        // 10% of the way from y=6 toward y=-4
        assert!((cam.position().y - 5.0).abs() < 1e-4);
        assert_eq!(cam.target(), player);

        for _ in 0..200 {
            cam.update(player);
        }
        assert!((cam.position() - cam.desired_position(player)).length() < 1e-3);
    }

    #[test]
    fn test_drag_only_while_active() {
        let mut cam = rig();
        cam.on_drag_move(Vec2::new(100.0, 0.0), SIM_DT);
        assert_eq!(cam.yaw(), 0.0);

        cam.on_drag_start(Vec2::ZERO);
        cam.on_drag_move(Vec2::new(100.0, 0.0), SIM_DT);
        assert!((cam.yaw() + 0.5).abs() < 1e-5);

        cam.on_drag_end();
        cam.on_drag_move(Vec2::new(300.0, 0.0), SIM_DT);
        assert!((cam.yaw() + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_drag_speed_is_frame_rate_normalized() {
        let mut a = rig();
        a.on_drag_start(Vec2::ZERO);
        a.on_drag_move(Vec2::new(10.0, 0.0), SIM_DT);

        let mut b = rig();
        b.on_drag_start(Vec2::ZERO);
        b.on_drag_move(Vec2::new(10.0, 0.0), SIM_DT * 2.0);
        assert!((b.yaw() - 2.0 * a.yaw()).abs() < 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut cam = rig();
        cam.on_drag_start(Vec2::ZERO);
        cam.on_drag_move(Vec2::new(0.0, 10_000.0), SIM_DT);
        assert_eq!(cam.pitch(), 0.6);
        cam.on_drag_move(Vec2::new(0.0, -10_000.0), SIM_DT);
        assert_eq!(cam.pitch(), -0.35);
    }

    #[test]
    fn test_invert_pitch() {
        let mut cam = rig();
        cam.set_preferences(1.0, true);
        cam.on_drag_start(Vec2::ZERO);
        cam.on_drag_move(Vec2::new(0.0, 20.0), SIM_DT);
        assert!(cam.pitch() < 0.0);
    }

    #[test]
    fn test_reset_restores_neutral_view() {
        let mut cam = rig();
        cam.handle(DragEvent::Start(Vec2::ZERO), SIM_DT);
        cam.handle(DragEvent::Move(Vec2::new(50.0, 30.0)), SIM_DT);
        cam.update(Vec3::new(3.0, -40.0, 1.0));

        let spawn = Vec3::new(0.0, 200.0, 0.0);
        cam.reset(spawn);
        assert_eq!(cam.yaw(), 0.0);
        assert_eq!(cam.pitch(), 0.0);
        assert!(!cam.is_dragging());
        assert_eq!(cam.position(), spawn + Vec3::new(0.0, 6.0, 8.0));
    }

    #[test]
    fn test_view_looks_at_player() {
        let cam = rig();
        let view = cam.view_matrix();
        // Player lands on the view axis (-Z in view space)
        let p = view.transform_point3(Vec3::ZERO);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4 && p.z < 0.0);
    }
}
