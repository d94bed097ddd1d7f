//! Narrow-integer matrix multiplication kernel.
//!
//! Inputs and output are `i8`, row-major. Products and sums wrap on
//! overflow: the kernel measures throughput, not numerical accuracy.

use rand::Rng;

use crate::kernel::{ComputeKernel, WorkItem};

/// Dimensions of `A (r1 × k) · B (k × c2) = R (r1 × c2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatMulDims {
    pub r1: usize,
    pub k: usize,
    pub c2: usize,
}

impl MatMulDims {
    pub fn new(r1: usize, k: usize, c2: usize) -> Self {
        Self { r1, k, c2 }
    }

    pub fn a_len(&self) -> usize {
        self.r1 * self.k
    }

    pub fn b_len(&self) -> usize {
        self.k * self.c2
    }

    /// Number of output cells, one per work-item.
    pub fn result_len(&self) -> usize {
        self.r1 * self.c2
    }

    /// Multiply-accumulate operations performed by one multiplication.
    pub fn mac_ops(&self) -> u64 {
        self.r1 as u64 * self.k as u64 * self.c2 as u64
    }
}

/// One work-item per output cell: `res[i] += A[row, j] * B[j, col]`.
#[derive(Debug, Clone, Copy)]
pub struct MatMulKernel<'a> {
    pub a: &'a [i8],
    pub b: &'a [i8],
    pub dims: MatMulDims,
}

impl<'a> MatMulKernel<'a> {
    pub fn new(a: &'a [i8], b: &'a [i8], dims: MatMulDims) -> Self {
        debug_assert_eq!(a.len(), dims.a_len());
        debug_assert_eq!(b.len(), dims.b_len());
        Self { a, b, dims }
    }
}

impl ComputeKernel for MatMulKernel<'_> {
    type Elem = i8;

    fn name(&self) -> &'static str {
        "matmul_i8"
    }

    fn domain_size(&self) -> usize {
        self.dims.result_len()
    }

    fn execute(&self, item: WorkItem, group_out: &mut [i8]) {
        let i = item.global_id;
        if i >= self.dims.result_len() {
            return;
        }
        let MatMulDims { k, c2, .. } = self.dims;
        let row = i / c2;
        let col = i % c2;
        let a_row = &self.a[row * k..(row + 1) * k];
        let mut acc = group_out[item.local_id];
        for (j, &a) in a_row.iter().enumerate() {
            acc = acc.wrapping_add(a.wrapping_mul(self.b[j * c2 + col]));
        }
        group_out[item.local_id] = acc;
    }
}

/// Single-threaded reference product used to check kernel output.
pub fn reference_matmul(a: &[i8], b: &[i8], dims: MatMulDims) -> Vec<i8> {
    let MatMulDims { r1, k, c2 } = dims;
    let mut res = vec![0i8; dims.result_len()];
    for row in 0..r1 {
        for col in 0..c2 {
            let mut acc = 0i8;
            for j in 0..k {
                acc = acc.wrapping_add(a[row * k + j].wrapping_mul(b[j * c2 + col]));
            }
            res[row * c2 + col] = acc;
        }
    }
    res
}

/// Seed both input matrices with random bytes.
///
/// The common prefix is filled in lock-step (`b[i]` mirrors `a[i]`), then the
/// tail of the longer buffer is filled on its own.
pub fn fill_matrices<R: Rng>(rng: &mut R, a: &mut [i8], b: &mut [i8]) {
    let shared = a.len().min(b.len());
    for i in 0..shared {
        a[i] = rng.random();
        b[i] = a[i];
    }
    rng.fill(&mut a[shared..]);
    rng.fill(&mut b[shared..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn run_serial(kernel: &MatMulKernel<'_>, total: usize, group: usize) -> Vec<i8> {
        let mut out = vec![0i8; kernel.domain_size()];
        for group_id in 0..total / group {
            let start = (group_id * group).min(out.len());
            let end = ((group_id + 1) * group).min(out.len());
            for local_id in 0..group {
                let item = WorkItem { global_id: group_id * group + local_id, local_id, group_id };
                kernel.execute(item, &mut out[start..end]);
            }
        }
        out
    }

    #[test]
    fn small_known_product() {
        // A = [[1, 2, 3], [4, 5, 6], [7, 8, 9], [1, 0, -1]] (4×3)
        // B = [[1, 2], [3, 4], [5, 6]] (3×2)
        let a = [1, 2, 3, 4, 5, 6, 7, 8, 9, 1, 0, -1];
        let b = [1, 2, 3, 4, 5, 6];
        let dims = MatMulDims::new(4, 3, 2);
        let kernel = MatMulKernel::new(&a, &b, dims);
        let out = run_serial(&kernel, 8, 4);
        assert_eq!(out, vec![22, 28, 49, 64, 76, 100, -4, -4]);
    }

    #[test]
    fn padding_items_do_not_write() {
        let a = [1i8; 6];
        let b = [1i8; 6];
        let dims = MatMulDims::new(3, 2, 3);
        let kernel = MatMulKernel::new(&a, &b, dims);
        // 9 cells on groups of 4: 12 work-items, 3 padding.
        let out = run_serial(&kernel, 12, 4);
        assert_eq!(out, vec![2i8; 9]);
    }

    #[test]
    fn overflow_wraps() {
        let a = [100i8, 100];
        let b = [100i8, 100];
        let dims = MatMulDims::new(1, 2, 1);
        let kernel = MatMulKernel::new(&a, &b, dims);
        let out = run_serial(&kernel, 1, 1);
        let expected = (100i8.wrapping_mul(100)).wrapping_add(100i8.wrapping_mul(100));
        assert_eq!(out, vec![expected]);
        assert_eq!(out, reference_matmul(&a, &b, dims));
    }

    #[test]
    fn matches_reference_on_random_input() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let dims = MatMulDims::new(5, 7, 3);
        let mut a = vec![0i8; dims.a_len()];
        let mut b = vec![0i8; dims.b_len()];
        fill_matrices(&mut rng, &mut a, &mut b);
        let kernel = MatMulKernel::new(&a, &b, dims);
        assert_eq!(run_serial(&kernel, 16, 8), reference_matmul(&a, &b, dims));
    }

    #[test]
    fn fill_mirrors_shared_prefix() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut a = vec![0i8; 4];
        let mut b = vec![0i8; 10];
        fill_matrices(&mut rng, &mut a, &mut b);
        assert_eq!(&a[..], &b[..4]);
    }

    #[test]
    fn fill_is_reproducible_for_a_seed() {
        let mut first = (vec![0i8; 12], vec![0i8; 6]);
        let mut second = (vec![0i8; 12], vec![0i8; 6]);
        fill_matrices(&mut ChaCha8Rng::seed_from_u64(99), &mut first.0, &mut first.1);
        fill_matrices(&mut ChaCha8Rng::seed_from_u64(99), &mut second.0, &mut second.1);
        assert_eq!(first, second);
    }

    #[test]
    fn dims_accounting() {
        let dims = MatMulDims::new(4, 3, 2);
        assert_eq!((dims.a_len(), dims.b_len(), dims.result_len()), (12, 6, 8));
        assert_eq!(dims.mac_ops(), 24);
    }
}
