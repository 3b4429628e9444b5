use ndarray::{Array1, ArrayView1, ArrayViewMut1};

#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Applies the logistic sigmoid element-wise, in place
pub fn sigmoid_inplace(values: &mut ArrayViewMut1<f32>) {
    values.mapv_inplace(sigmoid);
}

/// Applies tanh element-wise, in place
pub fn tanh_inplace(values: &mut ArrayViewMut1<f32>) {
    values.mapv_inplace(f32::tanh);
}

/// Index of the largest finite-or-infinite, non-NaN value.
///
/// Ties resolve to the lowest index; NaN entries are skipped. Returns `None`
/// for an empty slice or one holding only NaN.
pub fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            // strict comparison keeps the earliest index on ties
            Some((_, current)) if v <= current => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Largest non-NaN value, `-inf` when there is none
pub fn max_ignoring_nan(values: ArrayView1<f32>) -> f32 {
    values.fold(f32::NEG_INFINITY, |a, &b| if b.is_nan() { a } else { a.max(b) })
}

/// Softmax over a 1D view, accumulated sequentially.
///
/// NaN entries get probability zero. `+inf` entries share all of the mass.
/// If no entry is usable the result is uniform.
pub fn softmax_1d(values: ArrayView1<f32>) -> Array1<f32> {
    let max = max_ignoring_nan(values);

    if max == f32::INFINITY {
        let count = values.iter().filter(|&&v| v == f32::INFINITY).count() as f32;
        return values.mapv(|v| if v == f32::INFINITY { 1.0 / count } else { 0.0 });
    }
    if !max.is_finite() {
        let len = values.len().max(1) as f32;
        return Array1::from_elem(values.len(), 1.0 / len);
    }

    let mut probs = values.mapv(|v| if v.is_nan() { 0.0 } else { (v - max).exp() });
    let mut sum = 0.0f32;
    for &p in probs.iter() {
        sum += p;
    }
    probs.mapv_inplace(|p| p / sum);
    probs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_sigmoid_known_values() {
        assert_abs_diff_eq!(sigmoid(0.0), 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(sigmoid(2.0), 0.880_797, epsilon = 1e-6);
        assert!(sigmoid(-100.0) >= 0.0);
        assert_abs_diff_eq!(sigmoid(100.0), 1.0, epsilon = 1e-7);
    }

    #[test]
    fn test_inplace_activations() {
        let mut values = array![0.0f32, 1.0];
        tanh_inplace(&mut values.view_mut());
        assert_abs_diff_eq!(values[1], 1.0f32.tanh(), epsilon = 1e-7);

        sigmoid_inplace(&mut values.view_mut());
        assert_abs_diff_eq!(values[0], 0.5, epsilon = 1e-7);
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(array![1.0, 3.0, 3.0, 2.0].view()), Some(1));
        assert_eq!(argmax(array![0.0, 0.0].view()), Some(0));
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(argmax(array![f32::NAN, -1.0, f32::NAN].view()), Some(1));
        assert_eq!(argmax(array![f32::NAN].view()), None);
        assert_eq!(argmax(Array1::<f32>::zeros(0).view()), None);
    }

    #[test]
    fn test_argmax_infinities() {
        assert_eq!(argmax(array![f32::NEG_INFINITY, f32::INFINITY, 5.0].view()), Some(1));
        assert_eq!(argmax(array![f32::NEG_INFINITY, f32::NEG_INFINITY].view()), Some(0));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax_1d(array![1.0, 2.0, 3.0].view());
        assert_abs_diff_eq!(probs.sum(), 1.0, epsilon = 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_infinite_entries_take_all_mass() {
        let probs = softmax_1d(array![1.0, f32::INFINITY, -3.0, f32::INFINITY].view());
        assert_eq!(probs, array![0.0, 0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_softmax_degenerate_is_uniform() {
        let probs = softmax_1d(array![f32::NAN, f32::NAN].view());
        assert_abs_diff_eq!(probs[0], 0.5, epsilon = 1e-7);
    }
}
