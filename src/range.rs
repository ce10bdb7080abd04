#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Default for Range {
    fn default() -> Self {
        Range { min: 0.0, max: 1.0 }
    }
}

impl Range {
    // an inverted range collapses onto `min`
    pub fn new(min: f64, max: f64) -> Self {
        Range {
            min,
            max: max.max(min),
        }
    }

    pub fn distance(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_point(&self) -> bool {
        self.distance() <= 0.0
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    pub fn percent_from_value(&self, value: f64) -> f64 {
        if self.is_point() {
            return 0.0;
        }
        (self.clamp(value) - self.min) / self.distance()
    }

    pub fn value_from_percent(&self, percent: f64) -> f64 {
        (self.distance() * percent.clamp(0.0, 1.0)) + self.min
    }

    pub fn map_value_from_range(&self, range: Range, value: f64) -> f64 {
        self.value_from_percent(range.percent_from_value(value))
    }
}
