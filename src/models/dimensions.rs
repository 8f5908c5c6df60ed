use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Physical size of a precast element, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub thickness_mm: f64,
    pub length_mm: f64,
    pub height_mm: f64,
}

impl Dimensions {
    pub fn new(thickness_mm: f64, length_mm: f64, height_mm: f64) -> Self {
        Self {
            thickness_mm,
            length_mm,
            height_mm,
        }
    }

    /// Volume in cubic metres.
    pub fn volume_m3(&self) -> f64 {
        (self.thickness_mm / 1000.0) * (self.length_mm / 1000.0) * (self.height_mm / 1000.0)
    }

    /// Weight for a material of `density` (kg/m³).
    pub fn weight(&self, density: f64) -> f64 {
        self.volume_m3() * density
    }

    /// Legacy display form, e.g. `Thickness: 200.00mm, Length: 3000.00mm, Height: 120.00mm`.
    pub fn display(&self) -> String {
        format!(
            "Thickness: {:.2}mm, Length: {:.2}mm, Height: {:.2}mm",
            self.thickness_mm, self.length_mm, self.height_mm
        )
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_legacy_display_string() {
        let dims = Dimensions::new(200.0, 3000.0, 120.0);
        assert_eq!(
            dims.to_string(),
            "Thickness: 200.00mm, Length: 3000.00mm, Height: 120.00mm"
        );
    }

    #[test]
    fn weight_is_volume_times_density() {
        // 0.25m x 2m x 0.5m = 0.25 m³
        let dims = Dimensions::new(250.0, 2000.0, 500.0);
        assert_eq!(dims.volume_m3(), 0.25);
        assert_eq!(dims.weight(2400.0), 600.0);
    }
}
