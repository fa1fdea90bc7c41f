//! Morton (Z-order) codes for sorting leaf volumes into a spatially
//! coherent order before the tree levels are merged up.

use nalgebra_glm::RealNumber;
use simba::scalar::SubsetOf;

use super::BoundingVolume;

/// Computes the permutation that sorts the given leaf volumes by the Morton
/// code of their centers. Entry `i` of the result is the index of the leaf
/// stored at tree position `i`.
///
/// # Arguments
/// * `leaves` - The leaf volumes in their original order.
pub(crate) fn morton_order<B, T, const D: usize>(leaves: &[B]) -> Vec<u32>
where
    B: BoundingVolume<T, D>,
    T: RealNumber + SubsetOf<f64>,
{
    assert!(D == 2 || D == 3, "Morton codes are defined for 2D and 3D");

    let centers: Vec<[f64; D]> = leaves
        .iter()
        .map(|leaf| {
            let center = leaf.center();
            std::array::from_fn(|i| to_f64(&center[i]))
        })
        .collect();

    // Quantize against the bounding box of all centers.
    let mut lo = [f64::INFINITY; D];
    let mut up = [f64::NEG_INFINITY; D];
    for center in centers.iter() {
        for i in 0..D {
            lo[i] = lo[i].min(center[i]);
            up[i] = up[i].max(center[i]);
        }
    }

    let codes: Vec<u64> = centers.iter().map(|c| morton_code(c, &lo, &up)).collect();

    let mut order: Vec<u32> = (0..leaves.len() as u32).collect();
    order.sort_unstable_by_key(|&i| (codes[i as usize], i));

    order
}

#[inline]
fn to_f64<T: SubsetOf<f64>>(value: &T) -> f64 {
    value.to_superset()
}

/// Quantizes a center against the scene bounds and interleaves the cell
/// coordinates into a single code. 31 bits per axis in 2D, 21 bits in 3D.
fn morton_code<const D: usize>(center: &[f64; D], lo: &[f64; D], up: &[f64; D]) -> u64 {
    let (bits, spread): (u32, fn(u64) -> u64) = if D == 2 { (31, spread2) } else { (21, spread3) };
    let cells = (1u64 << bits) - 1;

    let mut code = 0u64;
    for i in 0..D {
        let extent = up[i] - lo[i];
        let cell = if extent > 0f64 {
            (((center[i] - lo[i]) / extent) * cells as f64) as u64
        } else {
            0
        };

        code |= spread(cell.min(cells)) << i;
    }

    code
}

/// Spreads the lowest 32 bits of `x` so that two bit positions lie between
/// consecutive input bits.
fn spread2(x: u64) -> u64 {
    let mut x = x & 0xffff_ffff;
    x = (x | x << 16) & 0x0000_ffff_0000_ffff;
    x = (x | x << 8) & 0x00ff_00ff_00ff_00ff;
    x = (x | x << 4) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | x << 2) & 0x3333_3333_3333_3333;
    x = (x | x << 1) & 0x5555_5555_5555_5555;
    x
}

/// Spreads the lowest 21 bits of `x` so that three bit positions lie
/// between consecutive input bits.
fn spread3(x: u64) -> u64 {
    let mut x = x & 0x1f_ffff;
    x = (x | x << 32) & 0x001f_0000_0000_ffff;
    x = (x | x << 16) & 0x001f_0000_ff00_00ff;
    x = (x | x << 8) & 0x100f_00f0_0f00_f00f;
    x = (x | x << 4) & 0x10c3_0c30_c30c_30c3;
    x = (x | x << 2) & 0x1249_2492_4924_9249;
    x
}
