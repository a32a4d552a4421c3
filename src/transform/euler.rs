use nalgebra::Matrix3;

/// Threshold below which the tilt is treated as gimbal locked
const GIMBAL_EPSILON: f64 = f64::EPSILON * 4.0;

/// Static Z-Y-Z Euler angles (radians) of a rotation matrix.
///
/// Inverse of [`euler_matrix`]. At tilt 0 or 180° only the sum of the first
/// and third angle is defined; the third is then reported as zero.
pub fn euler_from_matrix(m: &Matrix3<f64>) -> [f64; 3] {
    let sy = (m[(2, 1)] * m[(2, 1)] + m[(2, 0)] * m[(2, 0)]).sqrt();

    let (ax, ay, az) = if sy > GIMBAL_EPSILON {
        (
            m[(2, 1)].atan2(m[(2, 0)]),
            sy.atan2(m[(2, 2)]),
            m[(1, 2)].atan2(-m[(0, 2)]),
        )
    } else {
        ((-m[(1, 0)]).atan2(m[(1, 1)]), sy.atan2(m[(2, 2)]), 0.0)
    };

    [-ax, -ay, -az]
}

/// Rotation matrix from static Z-Y-Z Euler angles (radians)
pub fn euler_matrix(angles: [f64; 3]) -> Matrix3<f64> {
    let [ai, aj, ak] = angles.map(|a| -a);
    let (si, sj, sk) = (ai.sin(), aj.sin(), ak.sin());
    let (ci, cj, ck) = (ai.cos(), aj.cos(), ak.cos());
    let (cc, cs) = (ci * ck, ci * sk);
    let (sc, ss) = (si * ck, si * sk);

    let mut m = Matrix3::zeros();
    m[(2, 2)] = cj;
    m[(2, 1)] = sj * si;
    m[(2, 0)] = sj * ci;
    m[(1, 2)] = sj * sk;
    m[(1, 1)] = -cj * ss + cc;
    m[(1, 0)] = -cj * cs - sc;
    m[(0, 2)] = -sj * ck;
    m[(0, 1)] = cj * sc + cs;
    m[(0, 0)] = cj * cc - ss;
    m
}

/// [`euler_from_matrix`] in degrees
pub fn euler_degrees_from_matrix(m: &Matrix3<f64>) -> [f64; 3] {
    euler_from_matrix(m).map(f64::to_degrees)
}

/// [`euler_matrix`] from angles in degrees
pub fn euler_matrix_degrees(angles: [f64; 3]) -> Matrix3<f64> {
    euler_matrix(angles.map(f64::to_radians))
}
