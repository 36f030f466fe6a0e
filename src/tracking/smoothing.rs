use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::scene::{NodeHandle, Scene};

/// Upper bound on interpolation steps per update after a long stall.
const MAX_CATCH_UP_STEPS: u32 = 120;

/// Pose smoothing parameters. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Fraction of the remaining distance covered per step.
    pub lerp_position: f32,
    pub lerp_quaternion: f32,
    pub lerp_scale: f32,
    /// Fixed duration of one interpolation step.
    pub lerp_step_delay: f64,
    /// How long the marker must be seen before the object appears.
    pub min_visible_delay: f64,
    /// How long the marker must be missing before the object disappears.
    pub min_hidden_delay: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            lerp_position: 0.8,
            lerp_quaternion: 0.2,
            lerp_scale: 0.7,
            lerp_step_delay: 1.0 / 60.0,
            min_visible_delay: 0.0,
            min_hidden_delay: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingEvent {
    BecameVisible,
    BecameHidden,
}

/// Lag filter from a raw tracked node to a smoothed node.
///
/// Interpolation runs in fixed steps of `lerp_step_delay`, so the amount
/// of smoothing does not depend on the frame rate. Visibility follows the
/// target with hysteresis: the object snaps onto the target when it
/// appears and lingers for `min_hidden_delay` after the target is lost.
#[derive(Debug, Clone)]
pub struct SmoothedControls {
    params: SmoothingParams,
    last_step_at: Option<f64>,
    visible_since: Option<f64>,
    hidden_since: Option<f64>,
}

impl SmoothedControls {
    #[must_use]
    pub fn new(params: SmoothingParams) -> Self {
        Self {
            params,
            last_step_at: None,
            visible_since: None,
            hidden_since: None,
        }
    }

    #[must_use]
    pub fn params(&self) -> &SmoothingParams {
        &self.params
    }

    /// Moves `object` towards `target` for the time elapsed up to `now`.
    ///
    /// Returns an event when the object's visibility changed.
    pub fn update(
        &mut self,
        scene: &mut Scene,
        target: NodeHandle,
        object: NodeHandle,
        now: f64,
    ) -> Option<SmoothingEvent> {
        let (target_visible, position, rotation, scale) = {
            let t = scene.get_node(target)?;
            (
                t.visible,
                t.transform.position,
                t.transform.rotation,
                t.transform.scale,
            )
        };
        let params = &self.params;
        let node = scene.get_node_mut(object)?;
        let was_visible = node.visible;

        if target_visible {
            self.visible_since.get_or_insert(now);
            self.hidden_since = None;
        } else {
            self.hidden_since.get_or_insert(now);
            self.visible_since = None;
        }

        if was_visible {
            if let Some(since) = self.hidden_since
                && now - since >= params.min_hidden_delay
            {
                node.visible = false;
            }
        } else if let Some(since) = self.visible_since
            && now - since >= params.min_visible_delay
        {
            node.visible = true;
            node.transform.position = position;
            node.transform.rotation = rotation;
            node.transform.scale = scale;
        }

        let steps = match self.last_step_at {
            None => {
                self.last_step_at = Some(now);
                1
            }
            Some(last) if params.lerp_step_delay > 0.0 => {
                let due = ((now - last) / params.lerp_step_delay).floor().max(0.0);
                if due > f64::from(MAX_CATCH_UP_STEPS) {
                    self.last_step_at = Some(now);
                    MAX_CATCH_UP_STEPS
                } else {
                    let due = due as u32;
                    self.last_step_at = Some(last + f64::from(due) * params.lerp_step_delay);
                    due
                }
            }
            Some(_) => {
                self.last_step_at = Some(now);
                1
            }
        };

        for _ in 0..steps {
            step_towards(
                &mut node.transform.position,
                &mut node.transform.rotation,
                &mut node.transform.scale,
                (position, rotation, scale),
                params,
            );
        }

        match (was_visible, node.visible) {
            (false, true) => Some(SmoothingEvent::BecameVisible),
            (true, false) => Some(SmoothingEvent::BecameHidden),
            _ => None,
        }
    }
}

fn step_towards(
    position: &mut Vec3,
    rotation: &mut Quat,
    scale: &mut Vec3,
    (target_position, target_rotation, target_scale): (Vec3, Quat, Vec3),
    params: &SmoothingParams,
) {
    *position = position.lerp(target_position, params.lerp_position);
    *rotation = rotation.slerp(target_rotation, params.lerp_quaternion);
    *scale = scale.lerp(target_scale, params.lerp_scale);
}
