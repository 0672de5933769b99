//! Small vector helpers shared by the field and frame tables.
use nalgebra::Vector3;

#[inline(always)]
pub fn dot(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b)
}

#[inline(always)]
pub fn cross(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.cross(b)
}

#[inline(always)]
pub fn magnitude(a: &Vector3<f64>) -> f64 {
    a.norm()
}

/// Volume of the parallelepiped spanned by `a`, `b` and `c`: |a . (b x c)|
pub fn parallelepiped_volume(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    dot(a, &cross(b, c)).abs()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::*;

    #[test]
    fn volume_ignores_axis_labeling() {
        let a = Vector3::new(0.3, 0.01, 0.0);
        let b = Vector3::new(0.05, 0.25, 0.02);
        let c = Vector3::new(0.0, -0.03, 0.4);

        let reference = parallelepiped_volume(&a, &b, &c);
        for (u, v, w) in [(&a, &c, &b), (&b, &a, &c), (&b, &c, &a), (&c, &a, &b), (&c, &b, &a)] {
            assert_relative_eq!(parallelepiped_volume(u, v, w), reference, epsilon = 1e-14);
        }
    }

    #[test]
    fn orthogonal_cell_volume() {
        let volume = parallelepiped_volume(
            &Vector3::new(0.32, 0.0, 0.0),
            &Vector3::new(0.0, 0.32, 0.0),
            &Vector3::new(0.0, 0.0, 0.32),
        );
        assert_relative_eq!(volume, 0.32f64.powi(3), epsilon = 1e-15);
    }
}
