//! Position Codec: represent a point as a convex combination of the two
//! hexagon (or general N-gon) vertices nearest to it.

use crate::error::SimError;

/// A 2D point or vector.
pub type Vec2 = [f64; 2];

fn dist_sq(a: Vec2, b: Vec2) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Solve `[a b] * [alpha beta]^T = p` for a 2x2 system. Returns `None` when
/// the matrix is singular (columns collinear with the origin).
fn solve2x2(a: Vec2, b: Vec2, p: Vec2) -> Option<(f64, f64)> {
    let det = a[0] * b[1] - b[0] * a[1];
    if det.abs() < 1e-12 {
        return None;
    }
    let alpha = (p[0] * b[1] - b[0] * p[1]) / det;
    let beta = (a[0] * p[1] - p[0] * a[1]) / det;
    Some((alpha, beta))
}

/// Encodes/decodes points against a fixed set of polygon vertices.
///
/// Stateless after construction: the vertex list never changes for the
/// lifetime of a round.
#[derive(Debug, Clone)]
pub struct PositionCodec {
    vertices: Vec<Vec2>,
}

impl PositionCodec {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        assert!(vertices.len() >= 2, "codec needs at least two vertices");
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Indices of the two vertices nearest to `p`, closest first. Ties are
    /// broken by lower index, which is an intentional, documented pick among
    /// several equally valid options.
    fn two_nearest(&self, p: Vec2) -> (usize, usize) {
        let mut order: Vec<usize> = (0..self.vertices.len()).collect();
        order.sort_by(|&i, &j| {
            dist_sq(self.vertices[i], p)
                .partial_cmp(&dist_sq(self.vertices[j], p))
                .unwrap()
                .then(i.cmp(&j))
        });
        (order[0], order[1])
    }

    /// Encodes `p` as a length-N vector with at most two nonzero entries.
    pub fn encode(&self, p: Vec2) -> Result<Vec<f64>, SimError> {
        let (i, j) = self.two_nearest(p);
        let (alpha, beta) =
            solve2x2(self.vertices[i], self.vertices[j], p).ok_or(SimError::EncodingSingular)?;

        let mut out = vec![0.0; self.vertices.len()];
        out[i] = alpha;
        out[j] = beta;
        Ok(out)
    }

    /// Decodes an encoded vector back into a point: `sum(e_k * v_k)`.
    pub fn decode(&self, e: &[f64]) -> Vec2 {
        let mut p = [0.0, 0.0];
        for (k, &coeff) in e.iter().enumerate() {
            if coeff == 0.0 {
                continue;
            }
            p[0] += coeff * self.vertices[k][0];
            p[1] += coeff * self.vertices[k][1];
        }
        p
    }
}

/// Computes the `N` vertices of a regular polygon of radius `r`: equally
/// spaced starting at angle `-pi/2`, increasing clockwise (screen-y down),
/// each coordinate truncated toward zero.
pub fn polygon_vertices(n: usize, radius: f64) -> Vec<Vec2> {
    (0..n)
        .map(|k| {
            let theta = -std::f64::consts::FRAC_PI_2 + 2.0 * std::f64::consts::PI * k as f64 / n as f64;
            [
                (radius * theta.cos()).trunc(),
                (radius * theta.sin()).trunc(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec2, b: Vec2, eps: f64) {
        assert!((a[0] - b[0]).abs() < eps, "{:?} vs {:?}", a, b);
        assert!((a[1] - b[1]).abs() < eps, "{:?} vs {:?}", a, b);
    }

    #[test]
    fn hexagon_vertex_layout() {
        let verts = polygon_vertices(6, 430.0);
        assert_eq!(verts.len(), 6);
        approx_eq(verts[0], [0.0, -430.0], 1.0);
    }

    #[test]
    fn encode_exact_vertex() {
        let verts = polygon_vertices(6, 430.0);
        let codec = PositionCodec::new(verts.clone());
        let e = codec.encode(verts[0]).unwrap();
        assert_eq!(e, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn encode_midpoint_is_half_half() {
        let verts = polygon_vertices(6, 430.0);
        let codec = PositionCodec::new(verts.clone());
        let mid = [
            (verts[0][0] + verts[1][0]) / 2.0,
            (verts[0][1] + verts[1][1]) / 2.0,
        ];
        let e = codec.encode(mid).unwrap();
        assert!((e[0] - 0.5).abs() < 1e-9);
        assert!((e[1] - 0.5).abs() < 1e-9);
        for &v in &e[2..] {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn decode_is_linear_combination() {
        let verts = polygon_vertices(6, 430.0);
        let codec = PositionCodec::new(verts.clone());
        let e = vec![0.25, 0.25, 0.25, 0.25, 0.0, 0.0];
        let p = codec.decode(&e);
        let expected = [
            (verts[0][0] + verts[1][0] + verts[2][0] + verts[3][0]) / 4.0,
            (verts[0][1] + verts[1][1] + verts[2][1] + verts[3][1]) / 4.0,
        ];
        approx_eq(p, expected, 1e-9);
    }

    #[test]
    fn round_trip_inside_hull() {
        let verts = polygon_vertices(6, 430.0);
        let codec = PositionCodec::new(verts);
        let p = [10.0, -50.0];
        let e = codec.encode(p).unwrap();
        let sparse_count = e.iter().filter(|&&v| v != 0.0).count();
        assert!(sparse_count <= 2);
        let back = codec.decode(&e);
        approx_eq(back, p, 1e-6);
    }

    #[test]
    fn encode_rejects_collinear_pair() {
        // two antipodal points through the origin form a singular system
        let verts = vec![[100.0, 0.0], [-100.0, 0.0]];
        let codec = PositionCodec::new(verts);
        let err = codec.encode([50.0, 0.0]);
        assert!(matches!(err, Err(SimError::EncodingSingular)));
    }
}
