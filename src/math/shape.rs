/// Spatial output extent of a sliding-window layer.
///
/// `in_dim` is the un-padded extent; `padding` is the zero border on each
/// side. Computes `floor((in_dim + 2·padding − kernel) / stride) + 1`, or
/// `None` when the kernel does not fit, `stride` is zero or the padded
/// extent overflows.
pub fn output_size(in_dim: usize, padding: usize, kernel: usize, stride: usize) -> Option<usize> {
    if stride == 0 || kernel == 0 {
        return None;
    }
    let padded = padding.checked_mul(2).and_then(|border| in_dim.checked_add(border))?;
    if kernel > padded {
        return None;
    }
    Some((padded - kernel) / stride + 1)
}
