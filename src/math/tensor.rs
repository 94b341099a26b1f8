use serde::{Deserialize, Serialize};

use crate::error::TensorError;

/// A (filter, row, column) tensor of `f32` with a zero border stored in the
/// same buffer.
///
/// `height` and `width` are the interior extent. Physically every channel
/// is `(height + 2·padding) × (width + 2·padding)`, row-major, channels
/// back to back. Coordinates passed to [`get`](Self::get) / [`set`](Self::set)
/// are physical; the `interior` accessors are offset by `padding`.
///
/// Indexing outside the physical extent panics: a correctly derived plan
/// never does it, so it is treated as a broken contract, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct PaddedTensor {
    channels: usize,
    height: usize,
    width: usize,
    padding: usize,
    data: Vec<f32>,
}

impl PaddedTensor {
    /// Allocates a tensor whose border and interior all read 0.0.
    ///
    /// This is the only constructor that sizes the buffer, so every tensor
    /// in the pipeline carries the border its consumer expects.
    pub fn zeros(channels: usize, height: usize, width: usize, padding: usize) -> PaddedTensor {
        let len = channels * (height + 2 * padding) * (width + 2 * padding);
        PaddedTensor { channels, height, width, padding, data: vec![0.0; len] }
    }

    /// Builds a tensor by evaluating `f(channel, row, col)` over the interior.
    pub fn from_fn<F>(channels: usize, height: usize, width: usize, padding: usize, mut f: F) -> PaddedTensor
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        let mut tensor = PaddedTensor::zeros(channels, height, width, padding);
        for c in 0..channels {
            for r in 0..height {
                for col in 0..width {
                    tensor.set_interior(c, r, col, f(c, r, col));
                }
            }
        }
        tensor
    }

    /// Builds a tensor from interior values in (channel, row, col) order.
    /// Returns `None` if `values` does not hold exactly `channels·height·width` elements.
    pub fn from_interior(
        channels: usize,
        height: usize,
        width: usize,
        padding: usize,
        values: &[f32],
    ) -> Option<PaddedTensor> {
        if values.len() != channels * height * width {
            return None;
        }
        let mut it = values.iter().copied();
        Some(PaddedTensor::from_fn(channels, height, width, padding, |_, _, _| {
            it.next().unwrap_or_default()
        }))
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn padded_height(&self) -> usize {
        self.height + 2 * self.padding
    }

    pub fn padded_width(&self) -> usize {
        self.width + 2 * self.padding
    }

    /// `(channels, height, width, padding)`.
    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (self.channels, self.height, self.width, self.padding)
    }

    #[inline]
    fn offset(&self, channel: usize, row: usize, col: usize) -> usize {
        let (ph, pw) = (self.padded_height(), self.padded_width());
        assert!(
            channel < self.channels && row < ph && col < pw,
            "tensor index ({channel}, {row}, {col}) outside ({}, {ph}, {pw})",
            self.channels
        );
        (channel * ph + row) * pw + col
    }

    /// Reads a cell by physical coordinates (border included).
    #[inline]
    pub fn get(&self, channel: usize, row: usize, col: usize) -> f32 {
        self.data[self.offset(channel, row, col)]
    }

    #[inline]
    pub fn set(&mut self, channel: usize, row: usize, col: usize, value: f32) {
        let i = self.offset(channel, row, col);
        self.data[i] = value;
    }

    #[inline]
    pub fn interior(&self, channel: usize, row: usize, col: usize) -> f32 {
        assert!(row < self.height && col < self.width, "interior index ({row}, {col}) out of range");
        self.get(channel, row + self.padding, col + self.padding)
    }

    #[inline]
    pub fn set_interior(&mut self, channel: usize, row: usize, col: usize, value: f32) {
        assert!(row < self.height && col < self.width, "interior index ({row}, {col}) out of range");
        self.set(channel, row + self.padding, col + self.padding, value);
    }

    /// One physical row of one channel, border cells included.
    #[inline]
    pub fn row(&self, channel: usize, row: usize) -> &[f32] {
        let start = self.offset(channel, row, 0);
        &self.data[start..start + self.padded_width()]
    }

    /// Writes 0.0 into every border cell, leaving the interior untouched.
    pub fn clear_border(&mut self) {
        if self.padding == 0 {
            return;
        }
        let (p, ph, pw) = (self.padding, self.padded_height(), self.padded_width());
        for plane in self.data.chunks_exact_mut(ph * pw) {
            for (r, line) in plane.chunks_exact_mut(pw).enumerate() {
                if r < p || r >= ph - p {
                    line.fill(0.0);
                } else {
                    line[..p].fill(0.0);
                    line[pw - p..].fill(0.0);
                }
            }
        }
    }

    /// True when every border cell reads exactly 0.0.
    pub fn border_is_zero(&self) -> bool {
        let (p, ph, pw) = (self.padding, self.padded_height(), self.padded_width());
        (0..self.channels).all(|c| {
            (0..ph).all(|r| {
                (0..pw).all(|col| {
                    let inside = r >= p && r < ph - p && col >= p && col < pw - p;
                    inside || self.get(c, r, col) == 0.0
                })
            })
        })
    }

    /// Interior values in filter-major, row-major, column-major order.
    pub fn interior_values(&self) -> impl Iterator<Item = f32> + '_ {
        let p = self.padding;
        (0..self.channels).flat_map(move |c| {
            (0..self.height).flat_map(move |r| self.row(c, r + p)[p..p + self.width].iter().copied())
        })
    }

    /// The raw buffer, border included.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Serialized form, checked before it becomes a [`PaddedTensor`].
#[derive(Deserialize)]
struct RawTensor {
    channels: usize,
    height: usize,
    width: usize,
    padding: usize,
    data: Vec<f32>,
}

impl TryFrom<RawTensor> for PaddedTensor {
    type Error = TensorError;

    fn try_from(raw: RawTensor) -> Result<PaddedTensor, TensorError> {
        let RawTensor { channels, height, width, padding, data } = raw;
        let expected = padded_len(channels, height, width, padding).ok_or(TensorError::Overflow)?;
        if data.len() != expected {
            return Err(TensorError::Length { expected, found: data.len() });
        }
        let tensor = PaddedTensor { channels, height, width, padding, data };
        if !tensor.border_is_zero() {
            return Err(TensorError::DirtyBorder);
        }
        Ok(tensor)
    }
}

fn padded_len(channels: usize, height: usize, width: usize, padding: usize) -> Option<usize> {
    let border = padding.checked_mul(2)?;
    channels.checked_mul(height.checked_add(border)?)?.checked_mul(width.checked_add(border)?)
}

#[cfg(test)]
mod tests {
    use super::PaddedTensor;

    #[test]
    fn zeros_reserves_border() {
        let t = PaddedTensor::zeros(2, 3, 4, 1);
        assert_eq!(t.padded_height(), 5);
        assert_eq!(t.padded_width(), 6);
        assert_eq!(t.as_slice().len(), 2 * 5 * 6);
        assert!(t.border_is_zero());
    }

    #[test]
    fn interior_is_offset_by_padding() {
        let mut t = PaddedTensor::zeros(1, 2, 2, 2);
        t.set_interior(0, 1, 0, 7.5);
        assert_eq!(t.get(0, 3, 2), 7.5);
        assert_eq!(t.interior(0, 1, 0), 7.5);
    }

    #[test]
    fn clear_border_keeps_interior() {
        let mut t = PaddedTensor::from_fn(1, 2, 2, 1, |_, r, c| (r * 2 + c + 1) as f32);
        for r in 0..4 {
            for c in 0..4 {
                if t.get(0, r, c) == 0.0 {
                    t.set(0, r, c, -3.0);
                }
            }
        }
        assert!(!t.border_is_zero());
        t.clear_border();
        assert!(t.border_is_zero());
        assert_eq!(t.interior_values().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn from_interior_checks_length() {
        assert!(PaddedTensor::from_interior(1, 2, 2, 0, &[1.0, 2.0, 3.0]).is_none());
        let t = PaddedTensor::from_interior(2, 1, 2, 1, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.interior(1, 0, 1), 4.0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_access_panics() {
        let t = PaddedTensor::zeros(1, 2, 2, 0);
        t.get(0, 2, 0);
    }

    #[test]
    fn deserialized_tensors_are_checked() {
        let short = r#"{"channels":1,"height":2,"width":2,"padding":1,"data":[1.0]}"#;
        let err = serde_json::from_str::<PaddedTensor>(short).unwrap_err();
        assert!(err.to_string().contains("need 16"), "{err}");

        let mut dirty = PaddedTensor::zeros(1, 2, 2, 1);
        dirty.set(0, 0, 0, 100.0);
        let json = serde_json::to_string(&dirty).unwrap();
        assert!(serde_json::from_str::<PaddedTensor>(&json).is_err());

        let clean = PaddedTensor::from_interior(1, 2, 2, 1, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let json = serde_json::to_string(&clean).unwrap();
        assert_eq!(serde_json::from_str::<PaddedTensor>(&json).unwrap(), clean);
    }
}
