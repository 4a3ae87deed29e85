//! Scalar recording contract.

/// Receives named scalar metrics from stations.
///
/// `module` identifies the emitting component instance (for example
/// `node[3].receiver`); `name` is one of the stable metric names.
pub trait TelemetrySink {
    /// Records a single scalar value.
    fn record_scalar(&mut self, module: &str, name: &str, value: f64);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &mut T {
    fn record_scalar(&mut self, module: &str, name: &str, value: f64) {
        (**self).record_scalar(module, name, value);
    }
}
