//! Geometric trajectory replay.
//!
//! A `Trajectory` is a recorded, unit-normalized path that starts at the
//! origin and ends near one vertex of the answer polygon. A `Replayer`
//! plays it back with linear interpolation between samples; a
//! `PointTransform` remaps every sample into an arbitrary new start/end pair
//! by rotating into the target's sector and re-solving the affine
//! combination against a (possibly drifting) set of vertices. The two drift
//! updaters move that transform's center and target vertex over the course
//! of playback so the final sample lands exactly on the requested `end`.

#![deny(unsafe_code)]

use std::f64::consts::TAU;

use swarm_sim::Vec2;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("trajectory file is missing the blank line separating the header from its rows")]
    MissingHeaderSeparator,
    #[error("trajectory file has no rows")]
    Empty,
    #[error("malformed trajectory row: {0:?}")]
    MalformedRow(String),
    #[error("sector vertices are collinear with the origin")]
    SingularSector,
}

fn dot(a: Vec2, b: Vec2) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn add(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] + b[0], a[1] + b[1]]
}

fn scale(a: Vec2, s: f64) -> Vec2 {
    [a[0] * s, a[1] * s]
}

fn norm(a: Vec2) -> f64 {
    dot(a, a).sqrt()
}

fn rotate(p: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    [p[0] * cos - p[1] * sin, p[0] * sin + p[1] * cos]
}

fn lerp(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// Solves `[col_a col_b] * x = p` for `x`. `EncodingSingular`'s sibling here
/// is `SingularSector`, since a degenerate sector can arise the same way a
/// degenerate encode pair can.
fn solve2x2(col_a: Vec2, col_b: Vec2, p: Vec2) -> Result<Vec2, ReplayError> {
    let det = col_a[0] * col_b[1] - col_b[0] * col_a[1];
    if det.abs() < 1e-12 {
        return Err(ReplayError::SingularSector);
    }
    let x = (p[0] * col_b[1] - col_b[0] * p[1]) / det;
    let y = (col_a[0] * p[1] - p[0] * col_a[1]) / det;
    Ok([x, y])
}

/// Returns `(closest, second_closest)` vertex indices for `point`, where the
/// second-closest is whichever polygon neighbor (next or previous) of the
/// closest vertex is nearer.
fn calculate_sector(point: Vec2, vertices: &[Vec2]) -> (usize, usize) {
    let n = vertices.len();
    let dist_sq = |v: Vec2| {
        let d = sub(v, point);
        dot(d, d)
    };

    let closest = (0..n)
        .min_by(|&a, &b| dist_sq(vertices[a]).total_cmp(&dist_sq(vertices[b])))
        .expect("polygon has at least one vertex");

    let next = (closest + 1) % n;
    let previous = (closest + n - 1) % n;
    let second = if dist_sq(vertices[next]) < dist_sq(vertices[previous]) {
        next
    } else {
        previous
    };

    (closest, second)
}

// ============================================================================
// Trajectory
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub timestamp: f64,
    pub norm_position: Vec2,
}

/// A recorded, read-only path: strictly increasing timestamps starting at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub points: Vec<TrajectoryPoint>,
    pub original_target: usize,
}

impl Trajectory {
    /// Parses the text format: `original_target_vertex_index`, a blank line,
    /// then `t,x,y` rows with strictly increasing `t` starting at 0.
    pub fn from_csv_str(text: &str) -> Result<Self, ReplayError> {
        let text = text.trim();
        let (header, rows) = text
            .split_once("\n\n")
            .ok_or(ReplayError::MissingHeaderSeparator)?;

        let original_target: usize = header
            .trim()
            .parse()
            .map_err(|_| ReplayError::MalformedRow(header.to_string()))?;

        let points = rows
            .lines()
            .map(|line| {
                let mut fields = line.split(',');
                let timestamp: f64 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| ReplayError::MalformedRow(line.to_string()))?;
                let x: f64 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| ReplayError::MalformedRow(line.to_string()))?;
                let y: f64 = fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| ReplayError::MalformedRow(line.to_string()))?;
                Ok(TrajectoryPoint {
                    timestamp,
                    norm_position: [x, y],
                })
            })
            .collect::<Result<Vec<_>, ReplayError>>()?;

        if points.is_empty() {
            return Err(ReplayError::Empty);
        }

        Ok(Self {
            points,
            original_target,
        })
    }

    /// The wall-clock duration this trajectory was originally recorded over.
    pub fn duration(&self) -> f64 {
        self.points.last().unwrap().timestamp - self.points.first().unwrap().timestamp
    }
}

// ============================================================================
// PointTransform
// ============================================================================

/// Rotates a recorded point into a new sector, then re-solves its affine
/// position against a (possibly drifting) set of output vertices and center.
#[derive(Debug, Clone)]
pub struct PointTransform {
    pub angle: f64,
    pub actual_vertices: Vec<Vec2>,
    pub center_pos: Vec2,
    pub radius: f64,
    pub new_vertices: Vec<Vec2>,
}

impl PointTransform {
    pub fn new(angle: f64, actual_vertices: Vec<Vec2>, center_pos: Vec2, radius: f64) -> Self {
        let new_vertices = actual_vertices.clone();
        Self {
            angle,
            actual_vertices,
            center_pos,
            radius,
            new_vertices,
        }
    }

    /// Builds the rotation that carries `original_target` onto `target_idx`
    /// around an `N`-gon.
    pub fn from_vertex_target(
        target_idx: usize,
        original_target: usize,
        actual_vertices: Vec<Vec2>,
        center_pos: Vec2,
        radius: f64,
    ) -> Self {
        let n = actual_vertices.len() as f64;
        let sector_angle = TAU / n;
        let angle = (target_idx as f64 - original_target as f64) * sector_angle;
        Self::new(angle, actual_vertices, center_pos, radius)
    }

    /// Applies the rotation + sector affine remap to one recorded point.
    pub fn apply(&self, point: Vec2) -> Result<Vec2, ReplayError> {
        let rotated = scale(rotate(point, self.angle), self.radius);

        let (a, b) = calculate_sector(rotated, &self.actual_vertices);
        let proportions = solve2x2(self.actual_vertices[a], self.actual_vertices[b], rotated)?;

        let new_basis_a = sub(self.new_vertices[a], self.center_pos);
        let new_basis_b = sub(self.new_vertices[b], self.center_pos);
        let transformed = add(
            add(scale(new_basis_a, proportions[0]), scale(new_basis_b, proportions[1])),
            self.center_pos,
        );
        Ok(transformed)
    }
}

// ============================================================================
// Replayer
// ============================================================================

/// Time-indexed playback of one `Trajectory` through one `PointTransform`.
pub struct Replayer {
    trajectory: Trajectory,
    pub transform: PointTransform,
    time_multiplier: f64,
    idx: usize,
    elapsed: f64,
}

impl Replayer {
    pub fn new(trajectory: Trajectory, transform: PointTransform, time_multiplier: f64) -> Self {
        Self {
            trajectory,
            transform,
            time_multiplier,
            idx: 0,
            elapsed: 0.0,
        }
    }

    fn current_point(&self) -> &TrajectoryPoint {
        &self.trajectory.points[self.idx]
    }

    fn next_point(&self) -> &TrajectoryPoint {
        &self.trajectory.points[self.idx + 1]
    }

    pub fn has_finished(&self) -> bool {
        self.idx == self.trajectory.points.len() - 1
    }

    /// The total time this replayer will take to finish, accounting for
    /// `time_multiplier`.
    pub fn duration(&self) -> f64 {
        self.trajectory.points.last().unwrap().timestamp / self.time_multiplier
    }

    /// Advances time by `delta` and returns the transformed sample.
    pub fn step(&mut self, delta: f64) -> Result<Vec2, ReplayError> {
        while !self.has_finished() && self.elapsed >= self.next_point().timestamp {
            self.idx += 1;
        }

        if self.has_finished() {
            return self.transform.apply(self.current_point().norm_position);
        }

        let current_timestamp = self.current_point().timestamp;
        let segment_duration = self.next_point().timestamp - current_timestamp;
        let time_spent = self.elapsed - current_timestamp;

        self.elapsed += delta * self.time_multiplier;

        let from = self.transform.apply(self.current_point().norm_position)?;
        let to = self.transform.apply(self.next_point().norm_position)?;
        Ok(lerp(from, to, time_spent / segment_duration))
    }
}

// ============================================================================
// Drift transform updaters
// ============================================================================

/// Mutates a `PointTransform` once per `step(delta)`.
pub trait PointTransformUpdater {
    fn update(&mut self, transform: &mut PointTransform, delta: f64);
}

/// Moves `center_pos` toward the true origin at a constant speed, clamping
/// on arrival.
pub struct MoveCenterTowardsOrigin {
    pub speed: f64,
}

impl PointTransformUpdater for MoveCenterTowardsOrigin {
    fn update(&mut self, transform: &mut PointTransform, delta: f64) {
        let mag = norm(transform.center_pos);
        if mag > self.speed * delta {
            let direction = scale(transform.center_pos, -1.0 / mag);
            transform.center_pos = add(transform.center_pos, scale(direction, self.speed * delta));
        } else {
            transform.center_pos = [0.0, 0.0];
        }
    }
}

/// Moves one of `new_vertices` toward `target` at a constant speed.
///
/// The original implementation computes the post-step position before
/// deciding whether to clamp, which can overshoot by one step's distance on
/// the clamping frame; here the displacement is computed, clamped, and only
/// then written, so the vertex never overshoots `target`.
pub struct MoveVertexTowardsTarget {
    pub speed: f64,
    pub target: Vec2,
    pub moving_vertex_idx: usize,
}

impl PointTransformUpdater for MoveVertexTowardsTarget {
    fn update(&mut self, transform: &mut PointTransform, delta: f64) {
        let current = transform.new_vertices[self.moving_vertex_idx];
        let disp = sub(self.target, current);
        let mag = norm(disp);

        transform.new_vertices[self.moving_vertex_idx] = if mag > self.speed * delta {
            let direction = scale(disp, 1.0 / mag);
            add(current, scale(direction, self.speed * delta))
        } else {
            self.target
        };
    }
}

// ============================================================================
// TrajectoryGenerator
// ============================================================================

/// Generates a trajectory between two arbitrary points inside the polygon
/// from a recorded trajectory that starts at the origin and ends near one
/// vertex.
pub struct TrajectoryGenerator {
    radius: f64,
    vertices_pos: Vec<Vec2>,
    replayer: Option<Replayer>,
    transform_updaters: Vec<Box<dyn PointTransformUpdater>>,
}

impl TrajectoryGenerator {
    pub fn new(radius: f64, vertices_pos: Vec<Vec2>) -> Self {
        Self {
            radius,
            vertices_pos,
            replayer: None,
            transform_updaters: Vec::new(),
        }
    }

    /// Starts replaying `trajectory` so it runs from `start` to `end`.
    ///
    /// `time_multiplier` scales overall playback speed; `origin_speed_multiplier`
    /// and `target_speed_multiplier` scale the two drift speeds independently
    /// of each other and of `replayer_duration` (the supplemental "Configurable
    /// speed scaling" carried from the original `TrajectoryGenerator`), so the
    /// center and target drifts can finish at different fractions of total
    /// playback.
    pub fn set_trajectory(
        &mut self,
        start: Vec2,
        end: Vec2,
        trajectory: Trajectory,
        time_multiplier: f64,
        origin_speed_multiplier: f64,
        target_speed_multiplier: f64,
    ) {
        let (closest_vertex, _) = calculate_sector(end, &self.vertices_pos);
        let transform = PointTransform::from_vertex_target(
            closest_vertex,
            trajectory.original_target,
            self.vertices_pos.clone(),
            start,
            self.radius,
        );

        let replayer = Replayer::new(trajectory, transform, time_multiplier);
        let replayer_duration = replayer.duration();

        let towards_origin_speed = if replayer_duration > 0.0 {
            origin_speed_multiplier * norm(start) / replayer_duration
        } else {
            0.0
        };
        let towards_target_speed = if replayer_duration > 0.0 {
            target_speed_multiplier * norm(sub(end, self.vertices_pos[closest_vertex])) / replayer_duration
        } else {
            0.0
        };

        self.transform_updaters = vec![
            Box::new(MoveCenterTowardsOrigin {
                speed: towards_origin_speed,
            }),
            Box::new(MoveVertexTowardsTarget {
                speed: towards_target_speed,
                target: end,
                moving_vertex_idx: closest_vertex,
            }),
        ];
        self.replayer = Some(replayer);
    }

    pub fn step(&mut self, delta: f64) -> Result<Vec2, ReplayError> {
        let replayer = self.replayer.as_mut().expect("set_trajectory was not called");
        let point = replayer.step(delta)?;
        for updater in &mut self.transform_updaters {
            updater.update(&mut replayer.transform, delta);
        }
        Ok(point)
    }

    pub fn current_trajectory(&self) -> Option<&Trajectory> {
        self.replayer.as_ref().map(|r| &r.trajectory)
    }

    pub fn has_finished(&self) -> bool {
        self.replayer.as_ref().is_some_and(Replayer::has_finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexagon() -> Vec<Vec2> {
        swarm_sim::polygon_vertices(6, 430.0)
    }

    fn straight_line_trajectory() -> Trajectory {
        Trajectory {
            original_target: 0,
            points: vec![
                TrajectoryPoint {
                    timestamp: 0.0,
                    norm_position: [0.0, 0.0],
                },
                TrajectoryPoint {
                    timestamp: 1.0,
                    norm_position: [0.0, 1.0],
                },
            ],
        }
    }

    #[test]
    fn parses_csv_trajectory_format() {
        let text = "2\n\n0,0,0\n0.5,0.1,0.2\n1,0,1\n";
        let traj = Trajectory::from_csv_str(text).unwrap();
        assert_eq!(traj.original_target, 2);
        assert_eq!(traj.points.len(), 3);
        assert_eq!(traj.points[1].norm_position, [0.1, 0.2]);
        assert!((traj.duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_missing_separator() {
        let err = Trajectory::from_csv_str("2\n0,0,0\n1,0,1\n").unwrap_err();
        assert!(matches!(err, ReplayError::MissingHeaderSeparator));
    }

    #[test]
    fn replayer_endpoints_match_start_and_end() {
        let vertices = hexagon();
        let start: Vec2 = [10.0, -5.0];
        let end: Vec2 = [-20.0, 12.0];

        let mut generator = TrajectoryGenerator::new(430.0, vertices.clone());
        generator.set_trajectory(start, end, straight_line_trajectory(), 1.0, 1.0, 1.0);

        let first = generator.step(0.0).unwrap();
        assert!((first[0] - start[0]).abs() < 1e-6);
        assert!((first[1] - start[1]).abs() < 1e-6);

        let total_duration = generator.replayer.as_ref().unwrap().duration();
        let steps = 200;
        let dt = total_duration / steps as f64;
        let mut last = first;
        for _ in 0..steps {
            last = generator.step(dt).unwrap();
        }

        assert!((last[0] - end[0]).abs() < 1e-6, "x: {} vs {}", last[0], end[0]);
        assert!((last[1] - end[1]).abs() < 1e-6, "y: {} vs {}", last[1], end[1]);
        assert!(generator.has_finished());
    }

    #[test]
    fn replayer_duration_matches_requested_speed() {
        let vertices = hexagon();
        let mut generator = TrajectoryGenerator::new(430.0, vertices);
        generator.set_trajectory([0.0, 0.0], [0.0, -430.0], straight_line_trajectory(), 2.0, 1.0, 1.0);
        // Recorded duration is 1.0s, time_multiplier=2 halves it.
        let duration = generator.replayer.as_ref().unwrap().duration();
        assert!((duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn move_vertex_towards_target_never_overshoots() {
        let mut transform = PointTransform::new(0.0, hexagon(), [0.0, 0.0], 430.0);
        let mut updater = MoveVertexTowardsTarget {
            speed: 1000.0,
            target: [50.0, 50.0],
            moving_vertex_idx: 0,
        };
        updater.update(&mut transform, 1.0);
        assert_eq!(transform.new_vertices[0], [50.0, 50.0]);
    }

    #[test]
    fn calculate_sector_picks_nearer_neighbor() {
        let vertices = hexagon();
        // Slightly off from vertex 0 towards vertex 1.
        let point = [vertices[0][0] * 0.9 + vertices[1][0] * 0.1, vertices[0][1] * 0.9 + vertices[1][1] * 0.1];
        let (closest, second) = calculate_sector(point, &vertices);
        assert_eq!(closest, 0);
        assert_eq!(second, 1);
    }
}
