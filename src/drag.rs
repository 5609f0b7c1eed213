//! Drag coefficient lookup from standard G1/G7 drag tables
use once_cell::sync::Lazy;

use crate::constants::CUSTOM_DRAG_COEFFICIENT;
use crate::DragModel;

/// Drag table data structure
#[derive(Debug, Clone)]
pub struct DragTable {
    pub mach_values: Vec<f64>,
    pub cd_values: Vec<f64>,
}

impl DragTable {
    /// Create a new drag table from mach and cd arrays
    pub fn new(mach_values: Vec<f64>, cd_values: Vec<f64>) -> Self {
        debug_assert_eq!(mach_values.len(), cd_values.len());
        Self { mach_values, cd_values }
    }

    /// Build a table from (mach, cd) pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let mach_values = pairs.iter().map(|(m, _)| *m).collect();
        let cd_values = pairs.iter().map(|(_, cd)| *cd).collect();
        Self::new(mach_values, cd_values)
    }

    /// Interpolate drag coefficient for given Mach number.
    ///
    /// Values outside the table are clamped to the boundary entries.
    pub fn interpolate(&self, mach: f64) -> f64 {
        let n = self.mach_values.len();

        if n == 0 {
            return CUSTOM_DRAG_COEFFICIENT;
        }

        // NaN fails both comparisons below
        if mach.is_nan() || mach <= self.mach_values[0] {
            return self.cd_values[0];
        }

        if mach >= self.mach_values[n - 1] {
            return self.cd_values[n - 1];
        }

        // First entry strictly above mach; the bracket is [idx - 1, idx]
        let idx = self.mach_values.partition_point(|&m| m <= mach);
        self.linear_interpolate(mach, idx - 1)
    }

    /// Linear interpolation between two points
    pub fn linear_interpolate(&self, mach: f64, idx: usize) -> f64 {
        if idx + 1 >= self.mach_values.len() {
            return self.cd_values.get(idx).copied().unwrap_or(CUSTOM_DRAG_COEFFICIENT);
        }

        let x0 = self.mach_values[idx];
        let x1 = self.mach_values[idx + 1];
        let y0 = self.cd_values[idx];
        let y1 = self.cd_values[idx + 1];

        if (x1 - x0).abs() < f64::EPSILON {
            return y0;
        }

        y0 + (y1 - y0) * (mach - x0) / (x1 - x0)
    }

    pub fn min_mach(&self) -> Option<f64> {
        self.mach_values.first().copied()
    }

    pub fn max_mach(&self) -> Option<f64> {
        self.mach_values.last().copied()
    }
}

/// G1 standard drag table
static G1_DRAG_TABLE: Lazy<DragTable> = Lazy::new(|| {
    DragTable::from_pairs(&[
        (0.00, 0.2629), (0.05, 0.2558), (0.10, 0.2487), (0.15, 0.2413),
        (0.20, 0.2344), (0.25, 0.2278), (0.30, 0.2214), (0.35, 0.2155),
        (0.40, 0.2104), (0.45, 0.2061), (0.50, 0.2032), (0.55, 0.2020),
        (0.60, 0.2034), (0.65, 0.2165), (0.70, 0.2230), (0.75, 0.2313),
        (0.80, 0.2417), (0.85, 0.2546), (0.90, 0.2706), (0.95, 0.2901),
        (1.00, 0.3136), (1.05, 0.3415), (1.10, 0.3734), (1.15, 0.4084),
        (1.20, 0.4448), (1.25, 0.4805), (1.30, 0.5136), (1.35, 0.5427),
        (1.40, 0.5677), (1.45, 0.5883), (1.50, 0.6053), (1.55, 0.6191),
        (1.60, 0.6393), (1.65, 0.6518), (1.70, 0.6589), (1.75, 0.6621),
        (1.80, 0.6625), (1.85, 0.6607), (1.90, 0.6573), (1.95, 0.6528),
        (2.00, 0.6474), (2.05, 0.6413), (2.10, 0.6347), (2.15, 0.6280),
        (2.20, 0.6210), (2.25, 0.6141), (2.30, 0.6072), (2.35, 0.6003),
        (2.40, 0.5934), (2.45, 0.5867), (2.50, 0.5804), (2.60, 0.5680),
        (2.70, 0.5571), (2.80, 0.5479), (2.90, 0.5402), (3.00, 0.5337),
        (3.20, 0.5240), (3.40, 0.5178), (3.60, 0.5135), (3.80, 0.5101),
        (4.00, 0.5076), (4.20, 0.5055), (4.40, 0.5040), (4.60, 0.5030),
        (4.80, 0.5022), (5.00, 0.5016),
    ])
});

/// G7 standard drag table
static G7_DRAG_TABLE: Lazy<DragTable> = Lazy::new(|| {
    DragTable::from_pairs(&[
        (0.00, 0.1198), (0.05, 0.1197), (0.10, 0.1196), (0.15, 0.1194),
        (0.20, 0.1193), (0.25, 0.1194), (0.30, 0.1194), (0.35, 0.1194),
        (0.40, 0.1193), (0.45, 0.1193), (0.50, 0.1194), (0.55, 0.1193),
        (0.60, 0.1196), (0.65, 0.1197), (0.70, 0.1205), (0.75, 0.1230),
        (0.80, 0.1290), (0.85, 0.1380), (0.90, 0.1510), (0.95, 0.1705),
        (1.00, 0.2000), (1.05, 0.2380), (1.10, 0.2830), (1.15, 0.3315),
        (1.20, 0.3803), (1.25, 0.4262), (1.30, 0.4680), (1.35, 0.5050),
        (1.40, 0.5365), (1.45, 0.5620), (1.50, 0.5820), (1.55, 0.5980),
        (1.60, 0.6110), (1.65, 0.6210), (1.70, 0.6290), (1.75, 0.6350),
        (1.80, 0.6390), (1.85, 0.6420), (1.90, 0.6440), (1.95, 0.6450),
        (2.00, 0.6450), (2.05, 0.6447), (2.10, 0.6440), (2.15, 0.6430),
        (2.20, 0.6420), (2.25, 0.6410), (2.30, 0.6395), (2.35, 0.6380),
        (2.40, 0.6360), (2.45, 0.6340), (2.50, 0.6315), (2.60, 0.6265),
        (2.70, 0.6210), (2.80, 0.6155), (2.90, 0.6095), (3.00, 0.6035),
        (3.20, 0.5910), (3.40, 0.5790), (3.60, 0.5680), (3.80, 0.5570),
        (4.00, 0.5470), (4.20, 0.5375), (4.40, 0.5285), (4.60, 0.5200),
        (4.80, 0.5120), (5.00, 0.5040),
    ])
});

/// Read-only view over the built-in drag tables.
///
/// Copying the interpolator is free; every copy shares the same lazily
/// built static tables.
#[derive(Debug, Clone, Copy)]
pub struct DragTableInterpolator {
    g1: &'static DragTable,
    g7: &'static DragTable,
}

impl Default for DragTableInterpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl DragTableInterpolator {
    pub fn new() -> Self {
        Self {
            g1: &G1_DRAG_TABLE,
            g7: &G7_DRAG_TABLE,
        }
    }

    /// Table backing a drag model, `None` for Custom
    pub fn table(&self, drag_model: DragModel) -> Option<&'static DragTable> {
        match drag_model {
            DragModel::G1 => Some(self.g1),
            DragModel::G7 => Some(self.g7),
            DragModel::Custom => None,
        }
    }

    /// Get drag coefficient for given Mach number and drag model
    pub fn coefficient(&self, mach: f64, drag_model: DragModel) -> f64 {
        match self.table(drag_model) {
            Some(table) => table.interpolate(mach),
            None => CUSTOM_DRAG_COEFFICIENT,
        }
    }
}
