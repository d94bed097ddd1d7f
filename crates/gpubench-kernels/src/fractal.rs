//! Escape-time Mandelbrot kernel.

use crate::kernel::{ComputeKernel, WorkItem};

/// Point in "seahorse valley" that deeper zoom levels converge on.
pub const DEFAULT_CENTER: (f64, f64) = (-0.743_643_887_037_151, 0.131_825_904_205_330);

/// Width of the complex-plane viewport at zoom 1.
const BASE_SPAN: f64 = 3.5;

/// One work-item per pixel; the output is the escape iteration count.
#[derive(Debug, Clone, Copy)]
pub struct MandelbrotKernel {
    pub width: usize,
    pub height: usize,
    pub center: (f64, f64),
    pub zoom: f64,
    pub max_iterations: u32,
}

impl MandelbrotKernel {
    pub fn new(width: usize, height: usize, zoom: f64, max_iterations: u32) -> Self {
        Self { width, height, center: DEFAULT_CENTER, zoom, max_iterations }
    }

    pub fn with_center(mut self, re: f64, im: f64) -> Self {
        self.center = (re, im);
        self
    }

    /// Complex coordinate sampled at the centre of pixel `(px, py)`.
    pub fn pixel_to_point(&self, px: usize, py: usize) -> (f64, f64) {
        let span_x = BASE_SPAN / self.zoom;
        let span_y = span_x * self.height as f64 / self.width as f64;
        let fx = (px as f64 + 0.5) / self.width as f64 - 0.5;
        let fy = (py as f64 + 0.5) / self.height as f64 - 0.5;
        (self.center.0 + fx * span_x, self.center.1 + fy * span_y)
    }

    /// Iterations until `|z| > 2`, capped at `max_iterations`.
    pub fn escape_time(&self, cx: f64, cy: f64) -> u32 {
        let (mut zx, mut zy) = (0.0f64, 0.0f64);
        let mut n = 0;
        while n < self.max_iterations && zx * zx + zy * zy <= 4.0 {
            let next_x = zx * zx - zy * zy + cx;
            zy = 2.0 * zx * zy + cy;
            zx = next_x;
            n += 1;
        }
        n
    }
}

impl ComputeKernel for MandelbrotKernel {
    type Elem = u32;

    fn name(&self) -> &'static str {
        "mandelbrot"
    }

    fn domain_size(&self) -> usize {
        self.width * self.height
    }

    fn execute(&self, item: WorkItem, group_out: &mut [u32]) {
        if item.global_id >= self.domain_size() {
            return;
        }
        let (cx, cy) = self.pixel_to_point(item.global_id % self.width, item.global_id / self.width);
        group_out[item.local_id] = self.escape_time(cx, cy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        let kernel = MandelbrotKernel::new(1, 1, 1.0, 50).with_center(0.0, 0.0);
        let mut out = [0u32];
        kernel.execute(WorkItem { global_id: 0, local_id: 0, group_id: 0 }, &mut out);
        assert_eq!(out[0], 50);
    }

    #[test]
    fn far_point_escapes_after_one_step() {
        let kernel = MandelbrotKernel::new(1, 1, 1.0, 50).with_center(2.0, 2.0);
        assert_eq!(kernel.escape_time(2.0, 2.0), 1);
    }

    #[test]
    fn zoom_narrows_the_viewport() {
        let wide = MandelbrotKernel::new(100, 100, 1.0, 10).with_center(0.0, 0.0);
        let narrow = MandelbrotKernel { zoom: 10.0, ..wide };
        let (wx, _) = wide.pixel_to_point(0, 50);
        let (nx, _) = narrow.pixel_to_point(0, 50);
        assert!(nx.abs() < wx.abs());
        assert!((wx.abs() / nx.abs() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn padding_pixel_is_ignored() {
        let kernel = MandelbrotKernel::new(2, 2, 1.0, 10);
        let mut out: [u32; 0] = [];
        kernel.execute(WorkItem { global_id: 4, local_id: 0, group_id: 1 }, &mut out);
    }

    #[test]
    fn default_center_is_seahorse_valley() {
        let kernel = MandelbrotKernel::new(8, 8, 1.0, 10);
        assert_eq!(kernel.center, DEFAULT_CENTER);
        assert_eq!(kernel.domain_size(), 64);
    }
}
