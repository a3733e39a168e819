/// Minimum, mean and maximum of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl Summary {
    pub const ZERO: Self = Self {
        min: 0.0,
        mean: 0.0,
        max: 0.0,
    };

    /// Summarizes `values`, or returns `None` for an empty sample.
    ///
    /// NaN values propagate into every field, as they would through numpy reductions.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut saw_nan = false;
        for value in values {
            count += 1;
            sum += value;
            saw_nan |= value.is_nan();
            min = min.min(value);
            max = max.max(value);
        }
        if count == 0 {
            return None;
        }
        if saw_nan {
            return Some(Self {
                min: f64::NAN,
                mean: f64::NAN,
                max: f64::NAN,
            });
        }
        Some(Self {
            min,
            mean: sum / count as f64,
            max,
        })
    }
}
