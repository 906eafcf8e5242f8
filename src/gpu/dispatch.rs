//! 2D dispatch grid sizing.

/// Workgroup size; must match `@workgroup_size` in `trace.wgsl`.
pub const WORKGROUP_SIZE: [u32; 2] = [16, 16];

#[inline]
pub fn div_up(a: u32, b: u32) -> u32 {
    a.div_ceil(b)
}

/// Image-sized compute dispatch, rounded up to whole workgroups.
///
/// Invocations past `width`/`height` exist and must be discarded by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGrid {
    pub width: u32,
    pub height: u32,
    pub local: [u32; 2],
}

impl DispatchGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, local: WORKGROUP_SIZE }
    }

    pub fn with_local(width: u32, height: u32, local: [u32; 2]) -> Self {
        Self { width, height, local: [local[0].max(1), local[1].max(1)] }
    }

    /// Workgroup counts per axis.
    pub fn workgroups(&self) -> [u32; 2] {
        [div_up(self.width, self.local[0]), div_up(self.height, self.local[1])]
    }

    /// Global invocation size per axis.
    pub fn global(&self) -> [u32; 2] {
        let [x, y] = self.workgroups();
        [x * self.local[0], y * self.local[1]]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
