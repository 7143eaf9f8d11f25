//! Ball physics, wall bounces, scoring and paddle collision
//!
//! Velocities are expressed in playfield units per tick. A tick applies, in
//! order: integration, vertical wall bounce, goal check with reset, paddle
//! collision. Collision runs against the ball as it stands after a reset.

use serde::{Deserialize, Serialize};

/// Playfield width
pub const FIELD_WIDTH: f32 = 800.0;
/// Playfield height
pub const FIELD_HEIGHT: f32 = 600.0;
/// Highest paddle position a player may hold
pub const PADDLE_MAX_Y: f32 = 550.0;
/// Vertical reach of a paddle around its position
pub const PADDLE_REACH: f32 = 50.0;
/// Paddle position given to a freshly connected player
pub const PADDLE_START_Y: f32 = 300.0;
/// Ball x below which the left paddle can deflect it
pub const LEFT_PADDLE_X: f32 = 30.0;
/// Ball x above which the right paddle can deflect it
pub const RIGHT_PADDLE_X: f32 = 770.0;
/// Horizontal serve speed after a reset
pub const SERVE_VX: f32 = 5.0;
/// Vertical serve speed after a reset
pub const SERVE_VY: f32 = 3.0;

/// Clamp a requested paddle position into `[0, PADDLE_MAX_Y]`.
///
/// Returns `None` for NaN, which carries no usable position.
pub fn clamp_paddle(y: f32) -> Option<f32> {
    if y.is_nan() {
        None
    } else {
        Some(y.clamp(0.0, PADDLE_MAX_Y))
    }
}

/// The ball (authoritative)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl Default for Ball {
    fn default() -> Self {
        Self::serve(SERVE_VX)
    }
}

impl Ball {
    /// Ball at the center of the field moving with the given horizontal speed
    pub fn serve(vx: f32) -> Self {
        Self {
            x: FIELD_WIDTH / 2.0,
            y: FIELD_HEIGHT / 2.0,
            vx,
            vy: SERVE_VY,
        }
    }
}

/// Side of the field the ball left through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// `x < 0`
    Left,
    /// `x > FIELD_WIDTH`
    Right,
}

/// Physics system for advancing the ball
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance the ball by one tick against the given paddle positions.
    ///
    /// Returns the goal scored this tick, if any. The ball has already been
    /// re-served when a goal is returned.
    pub fn step(ball: &mut Ball, paddles: &[f32]) -> Option<Goal> {
        Self::integrate(ball);
        Self::bounce_walls(ball);
        let goal = Self::check_goal(ball);
        Self::collide_paddles(ball, paddles);
        goal
    }

    fn integrate(ball: &mut Ball) {
        ball.x += ball.vx;
        ball.y += ball.vy;
    }

    /// Flip vertical direction outside the field. Position is left as is,
    /// so the ball may sit out of bounds for a tick before coming back.
    fn bounce_walls(ball: &mut Ball) {
        if ball.y < 0.0 || ball.y > FIELD_HEIGHT {
            ball.vy = -ball.vy;
        }
    }

    fn check_goal(ball: &mut Ball) -> Option<Goal> {
        if ball.x < 0.0 {
            *ball = Ball::serve(SERVE_VX);
            Some(Goal::Left)
        } else if ball.x > FIELD_WIDTH {
            *ball = Ball::serve(-SERVE_VX);
            Some(Goal::Right)
        } else {
            None
        }
    }

    /// Every paddle is tested against both edges; two paddles in reach flip
    /// the ball twice.
    fn collide_paddles(ball: &mut Ball, paddles: &[f32]) {
        for &paddle_y in paddles {
            let in_reach = (ball.y - paddle_y).abs() < PADDLE_REACH;
            if ball.x < LEFT_PADDLE_X && in_reach {
                ball.vx = -ball.vx;
            }
            if ball.x > RIGHT_PADDLE_X && in_reach {
                ball.vx = -ball.vx;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(x: f32, y: f32, vx: f32, vy: f32) -> Ball {
        Ball { x, y, vx, vy }
    }

    #[test]
    fn test_clamp_paddle() {
        assert_eq!(clamp_paddle(-10.0), Some(0.0));
        assert_eq!(clamp_paddle(0.0), Some(0.0));
        assert_eq!(clamp_paddle(275.5), Some(275.5));
        assert_eq!(clamp_paddle(550.0), Some(550.0));
        assert_eq!(clamp_paddle(600.0), Some(550.0));
        assert_eq!(clamp_paddle(f32::INFINITY), Some(550.0));
        assert_eq!(clamp_paddle(f32::NEG_INFINITY), Some(0.0));
        assert_eq!(clamp_paddle(f32::NAN), None);
    }

    #[test]
    fn test_clamp_paddle_range_sweep() {
        let mut y = -2000.0_f32;
        while y < 2000.0 {
            let clamped = clamp_paddle(y).unwrap();
            assert!((0.0..=PADDLE_MAX_Y).contains(&clamped), "{y} -> {clamped}");
            y += 7.3;
        }
    }

    #[test]
    fn test_integrate_without_events() {
        let mut b = Ball::default();
        assert_eq!(PhysicsSystem::step(&mut b, &[]), None);
        assert_eq!(b, ball(405.0, 303.0, 5.0, 3.0));
    }

    #[test]
    fn test_wall_bounce_does_not_clamp() {
        let mut b = ball(100.0, 598.0, 1.0, 4.0);
        PhysicsSystem::step(&mut b, &[]);
        assert_eq!(b.y, 602.0);
        assert_eq!(b.vy, -4.0);

        let mut b = ball(100.0, 1.0, 1.0, -3.0);
        PhysicsSystem::step(&mut b, &[]);
        assert_eq!(b.y, -2.0);
        assert_eq!(b.vy, 3.0);
    }

    #[test]
    fn test_left_exit_resets_toward_right() {
        let mut b = ball(2.0, 100.0, -5.0, 3.0);
        assert_eq!(PhysicsSystem::step(&mut b, &[]), Some(Goal::Left));
        assert_eq!(b, ball(400.0, 300.0, 5.0, 3.0));
    }

    #[test]
    fn test_right_exit_resets_toward_left() {
        let mut b = ball(798.0, 100.0, 5.0, 3.0);
        assert_eq!(PhysicsSystem::step(&mut b, &[]), Some(Goal::Right));
        assert_eq!(b, ball(400.0, 300.0, -5.0, 3.0));
    }

    #[test]
    fn test_at_most_one_goal_per_tick() {
        // A huge velocity overshoots far past the right edge; still one goal.
        let mut b = ball(400.0, 300.0, 10_000.0, 0.5);
        assert_eq!(PhysicsSystem::step(&mut b, &[]), Some(Goal::Right));
        assert_eq!(b.x, 400.0);
    }

    #[test]
    fn test_left_paddle_deflects() {
        let mut b = ball(32.0, 300.0, -5.0, 0.5);
        PhysicsSystem::step(&mut b, &[290.0]);
        assert_eq!(b.vx, 5.0);
    }

    #[test]
    fn test_right_paddle_deflects() {
        let mut b = ball(768.0, 300.0, 5.0, 0.5);
        PhysicsSystem::step(&mut b, &[330.0]);
        assert_eq!(b.vx, -5.0);
    }

    #[test]
    fn test_paddle_out_of_reach() {
        let mut b = ball(32.0, 300.0, -5.0, 0.0);
        PhysicsSystem::step(&mut b, &[350.0]);
        assert_eq!(b.vx, -5.0);
    }

    #[test]
    fn test_two_paddles_in_reach_flip_twice() {
        let mut b = ball(32.0, 300.0, -5.0, 0.0);
        PhysicsSystem::step(&mut b, &[300.0, 310.0]);
        assert_eq!(b.vx, -5.0);
    }

    #[test]
    fn test_reset_ball_is_not_near_paddle_edges() {
        // The re-served ball sits at x = 400, outside both paddle zones.
        let mut b = ball(2.0, 300.0, -5.0, 0.0);
        PhysicsSystem::step(&mut b, &[300.0]);
        assert_eq!(b, Ball::serve(SERVE_VX));
    }

    #[test]
    fn test_velocity_nonzero_after_events() {
        let mut b = Ball::default();
        for _ in 0..10_000 {
            PhysicsSystem::step(&mut b, &[250.0, 300.0]);
            assert!(b.vx != 0.0 && b.vy != 0.0);
        }
    }

    #[test]
    fn test_step_is_deterministic() {
        let paddles = [120.0, 300.0, 480.0];
        let mut a = ball(37.0, 12.0, -7.0, 11.0);
        let mut b = a;
        for _ in 0..5_000 {
            let ga = PhysicsSystem::step(&mut a, &paddles);
            let gb = PhysicsSystem::step(&mut b, &paddles);
            assert_eq!(ga, gb);
            assert_eq!(a, b);
        }
    }
}
