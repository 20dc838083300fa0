//! Indicator trait definitions.

/// Left-pad a compact output so that index `i` lines up with input index `i`.
fn align<T>(input_len: usize, values: Vec<T>) -> Vec<Option<T>> {
    let pad = input_len.saturating_sub(values.len());
    std::iter::repeat_with(|| None)
        .take(pad)
        .chain(values.into_iter().map(Some))
        .collect()
}

/// Trait for single-output technical indicators.
///
/// `calculate` returns only the defined values: the output for the last
/// input is the last element, and the leading warm-up region is dropped.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Output>;

    /// Get the minimum data points required for one output.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Calculate values aligned 1:1 with `data`, `None` during warm-up.
    fn calculate_aligned(&self, data: &[f64]) -> Vec<Option<Self::Output>> {
        align(data.len(), self.calculate(data))
    }
}

/// Multi-output indicator (e.g., MACD line plus signal line).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple values.
    type Outputs;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Self::Outputs>;

    /// Get the minimum data points required for one output.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Calculate values aligned 1:1 with `data`, `None` during warm-up.
    fn calculate_aligned(&self, data: &[f64]) -> Vec<Option<Self::Outputs>> {
        align(data.len(), self.calculate(data))
    }
}
