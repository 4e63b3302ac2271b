use evac_models::MapScale;

/// Converts a pixel distance between two points into meters using the
/// floor's map scale, falling back to raw pixel distance when the scale is
/// absent or any of its four dimensions is non-positive (the "incomplete"
/// case from the distance scaler spec). Division by zero is guarded by that
/// completeness check, so this function has no failure mode.
pub fn distance_meters(ax: f64, ay: f64, bx: f64, by: f64, scale: Option<&MapScale>) -> f64 {
    let pixel_distance = euclidean(ax, ay, bx, by);

    match scale {
        Some(s) if scale_is_complete(s) => {
            let average_scale =
                (s.width_pixels / s.width_meters + s.height_pixels / s.height_meters) / 2.0;
            pixel_distance / average_scale
        }
        _ => pixel_distance,
    }
}

fn scale_is_complete(s: &MapScale) -> bool {
    s.width_pixels > 0.0 && s.height_pixels > 0.0 && s.width_meters > 0.0 && s.height_meters > 0.0
}

fn euclidean(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_pixel_distance_without_scale() {
        let d = distance_meters(0.0, 0.0, 3.0, 4.0, None);
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_when_scale_incomplete() {
        let scale = MapScale {
            width_pixels: 100.0,
            height_pixels: 0.0,
            width_meters: 10.0,
            height_meters: 10.0,
        };
        let d = distance_meters(0.0, 0.0, 3.0, 4.0, Some(&scale));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn applies_average_scale_when_complete() {
        // 100px : 10m on both axes -> average_scale = 10 px/m
        let scale = MapScale {
            width_pixels: 100.0,
            height_pixels: 100.0,
            width_meters: 10.0,
            height_meters: 10.0,
        };
        let d = distance_meters(0.0, 0.0, 100.0, 0.0, Some(&scale));
        assert!((d - 10.0).abs() < 1e-9);
    }
}
