use serde::Deserialize;

use crate::{expr::Axis, field::FieldParams};

/// Grid parameters: a cube from `rmin` to `rmax` with `nr` points per axis,
/// optionally overridden per axis.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFieldParams {
    rmin: f64,
    rmax: f64,
    nr: usize,
    #[serde(default)]
    x: Option<ConfigAxis>,
    #[serde(default)]
    y: Option<ConfigAxis>,
    #[serde(default)]
    z: Option<ConfigAxis>,
    #[serde(default = "one")]
    nrfps: usize,
    #[serde(default)]
    frame: usize,
    #[serde(default)]
    label: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigAxis {
    min: f64,
    max: f64,
    n: usize,
}

fn one() -> usize {
    1
}

impl From<ConfigFieldParams> for FieldParams {
    fn from(value: ConfigFieldParams) -> Self {
        let mut params = FieldParams::cube(value.rmin, value.rmax, value.nr).with_copies(value.nrfps);
        for (axis, config) in Axis::ALL.into_iter().zip([value.x, value.y, value.z]) {
            if let Some(ConfigAxis { min, max, n }) = config {
                params = params.with_axis(axis, min, max, n);
            }
        }

        Self {
            frame: value.frame,
            label: value.label,
            ..params
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_override_the_cube() {
        let config: ConfigFieldParams =
            serde_json::from_str(r#"{"rmin": -5, "rmax": 5, "nr": 11, "z": {"min": 0, "max": 2, "n": 4}}"#)
                .unwrap();
        let params = FieldParams::from(config);

        assert_eq!(params.axes[0], (-5.0, 5.0, 11));
        assert_eq!(params.axes[2], (0.0, 2.0, 4));
        assert_eq!(params.nrfps, 1);
        assert_eq!(params.geometry().unwrap().point_count(), 11 * 11 * 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let config = serde_json::from_str::<ConfigFieldParams>(r#"{"rmin": 0, "rmax": 1, "nr": 2, "nx": 3}"#);
        assert!(config.is_err());
    }
}
