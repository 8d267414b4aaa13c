/// Defines how energy travelling along a ray relates to time and distance.
pub trait PropagationModel {
    /// Time (s) needed to cover `distance` meters.
    fn time_of_flight(&self, distance: f64) -> f64;

    /// Energy multiplier after travelling `distance` meters from the source.
    fn spreading(&self, distance: f64) -> f64;
}

/// Distance below which spreading loss is not applied.
pub const REFERENCE_DISTANCE: f64 = 1.0;

/// Straight-line propagation at constant speed with inverse-square
/// spreading loss, clamped at [`REFERENCE_DISTANCE`].
#[derive(Debug, Clone, Copy)]
pub struct InverseSquare {
    pub speed_of_sound: f64,
}

impl InverseSquare {
    pub fn new(speed_of_sound: f64) -> Self {
        Self { speed_of_sound }
    }
}

impl PropagationModel for InverseSquare {
    fn time_of_flight(&self, distance: f64) -> f64 {
        distance / self.speed_of_sound
    }

    fn spreading(&self, distance: f64) -> f64 {
        let d = distance.max(REFERENCE_DISTANCE);
        1.0 / (d * d)
    }
}
