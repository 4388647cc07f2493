use nalgebra::{Matrix3, Point3, Vector3};

/// A rigid-body transform: `x' = rotation * x + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Superposition {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    #[inline]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Optimal rotation and translation moving `mobile` onto `target` (Kabsch).
///
/// Returns `None` when the sets differ in size or are empty. The rotation is
/// proper; reflections are corrected through the sign of the determinant.
pub fn kabsch(mobile: &[Point3<f64>], target: &[Point3<f64>]) -> Option<Superposition> {
    if mobile.len() != target.len() || mobile.is_empty() {
        return None;
    }
    let mobile_center = centroid(mobile)?;
    let target_center = centroid(target)?;

    let mut covariance = Matrix3::zeros();
    for (m, t) in mobile.iter().zip(target) {
        covariance += (m - mobile_center) * (t - target_center).transpose();
    }

    let svd = covariance.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut correction = Matrix3::identity();
    if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }
    let rotation = v_t.transpose() * correction * u.transpose();
    let translation = target_center.coords - rotation * mobile_center.coords;

    Some(Superposition {
        rotation,
        translation,
    })
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Dihedral angle p0-p1-p2-p3 in degrees, in `(-180, 180]`.
pub fn dihedral(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
) -> f64 {
    let b0 = p0 - p1;
    let b1 = p2 - p1;
    let b2 = p3 - p2;

    let b1_norm = b1.normalize();
    let v = b0 - b1_norm * b0.dot(&b1_norm);
    let w = b2 - b1_norm * b2.dot(&b1_norm);

    let x = v.dot(&w);
    let y = b1_norm.cross(&v).dot(&w);
    y.atan2(x).to_degrees()
}
