use nalgebra_glm::{normalize, Number, RealNumber, TVec};

/// A single ray that starts at `pos` and goes into infinity along `dir`.
#[derive(Debug, Clone, Copy)]
pub struct Ray<T: Number, const D: usize> {
    /// The start position of the ray.
    pub pos: TVec<T, D>,

    /// The direction of the ray.
    pub dir: TVec<T, D>,
}

impl<T: Number, const D: usize> Ray<T, D> {
    /// Creates a new ray from its start position and direction. The direction
    /// is stored verbatim and does not need to be normalized for the
    /// intersection tests of this crate.
    ///
    /// # Arguments
    /// * `pos` - The start position of the ray.
    /// * `dir` - The direction of the ray.
    #[inline]
    pub fn new(pos: TVec<T, D>, dir: TVec<T, D>) -> Self {
        Self { pos, dir }
    }
}

impl<T: RealNumber, const D: usize> Ray<T, D> {
    /// Creates a new ray spanned by the two positions x0 and x1, with the
    /// direction normalized.
    ///
    /// # Arguments
    /// * `x0` - The start position of the ray.
    /// * `x1` - The next position along the line of the ray.
    pub fn from_pos(x0: &TVec<T, D>, x1: &TVec<T, D>) -> Self {
        Self {
            dir: normalize(&(x1 - x0)),
            pos: *x0,
        }
    }
}

#[cfg(test)]
mod test {
    use nalgebra_glm::vec3;

    use super::*;

    #[test]
    fn test_from_pos() {
        let ray = Ray::from_pos(&vec3(1f32, 0f32, 0f32), &vec3(5f32, 0f32, 0f32));

        assert_eq!(ray.pos, vec3(1f32, 0f32, 0f32));
        assert_eq!(ray.dir, vec3(1f32, 0f32, 0f32));
    }
}
