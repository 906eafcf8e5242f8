//! Named kernel arguments.
//!
//! Each resource the trace kernel reads or writes has one [`KernelArg`] with a
//! fixed binding number. `trace.wgsl` declares the same bindings.

use std::fmt;

use crate::util::{Error, Result};

use super::layout::FrameParams;

/// Entry point of the trace kernel.
pub const KERNEL_ENTRY: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelArg {
    /// Primitive records in BVH leaf order (storage, read).
    Primitives,
    /// Image size, primitive count and frame flags (uniform).
    Params,
    /// Shared output image (storage image, write).
    Output,
    /// Camera mirror (uniform).
    Camera,
    /// Flattened BVH nodes (storage, read).
    Nodes,
}

/// What kind of value an argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    StorageBuffer,
    UniformBuffer,
    Scalars,
    Image,
}

impl KernelArg {
    pub const ALL: [KernelArg; 5] = [
        KernelArg::Primitives,
        KernelArg::Params,
        KernelArg::Output,
        KernelArg::Camera,
        KernelArg::Nodes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KernelArg::Primitives => "primitives",
            KernelArg::Params => "params",
            KernelArg::Output => "output",
            KernelArg::Camera => "camera",
            KernelArg::Nodes => "nodes",
        }
    }

    pub fn binding(self) -> u32 {
        match self {
            KernelArg::Primitives => 0,
            KernelArg::Params => 1,
            KernelArg::Output => 2,
            KernelArg::Camera => 3,
            KernelArg::Nodes => 4,
        }
    }

    pub fn kind(self) -> ArgKind {
        match self {
            KernelArg::Primitives | KernelArg::Nodes => ArgKind::StorageBuffer,
            KernelArg::Camera => ArgKind::UniformBuffer,
            KernelArg::Params => ArgKind::Scalars,
            KernelArg::Output => ArgKind::Image,
        }
    }

    fn slot(self) -> usize {
        self.binding() as usize
    }
}

impl fmt::Display for KernelArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name(), self.binding())
    }
}

impl ArgKind {
    pub fn name(self) -> &'static str {
        match self {
            ArgKind::StorageBuffer => "storage buffer",
            ArgKind::UniformBuffer => "uniform buffer",
            ArgKind::Scalars => "scalars",
            ArgKind::Image => "image",
        }
    }
}

/// Backend-issued buffer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Backend-issued image id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgValue {
    Storage(BufferHandle),
    Uniform(BufferHandle),
    Params(FrameParams),
    Image(ImageHandle),
}

impl ArgValue {
    pub fn kind(&self) -> ArgKind {
        match self {
            ArgValue::Storage(_) => ArgKind::StorageBuffer,
            ArgValue::Uniform(_) => ArgKind::UniformBuffer,
            ArgValue::Params(_) => ArgKind::Scalars,
            ArgValue::Image(_) => ArgKind::Image,
        }
    }
}

/// Argument table for one kernel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelArgs {
    slots: [Option<ArgValue>; KernelArg::ALL.len()],
}

impl KernelArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `arg`, rejecting values of the wrong kind.
    pub fn set(&mut self, arg: KernelArg, value: ArgValue) -> Result<()> {
        if value.kind() != arg.kind() {
            return Err(Error::KernelArgMismatch {
                arg: arg.name(),
                expected: arg.kind().name(),
                actual: value.kind().name(),
            });
        }
        self.slots[arg.slot()] = Some(value);
        Ok(())
    }

    pub fn get(&self, arg: KernelArg) -> Option<&ArgValue> {
        self.slots[arg.slot()].as_ref()
    }

    /// Every argument must be bound before dispatch.
    pub fn validate(&self) -> Result<()> {
        for arg in KernelArg::ALL {
            if self.get(arg).is_none() {
                return Err(Error::UnboundKernelArg(arg.name()));
            }
        }
        Ok(())
    }

    pub fn params(&self) -> Option<FrameParams> {
        match self.get(KernelArg::Params) {
            Some(ArgValue::Params(p)) => Some(*p),
            _ => None,
        }
    }

    /// Buffer bound to `arg` (storage or uniform).
    pub fn buffer(&self, arg: KernelArg) -> Result<BufferHandle> {
        match self.get(arg) {
            Some(ArgValue::Storage(h)) | Some(ArgValue::Uniform(h)) => Ok(*h),
            Some(other) => Err(Error::KernelArgMismatch {
                arg: arg.name(),
                expected: arg.kind().name(),
                actual: other.kind().name(),
            }),
            None => Err(Error::UnboundKernelArg(arg.name())),
        }
    }

    pub fn image(&self, arg: KernelArg) -> Result<ImageHandle> {
        match self.get(arg) {
            Some(ArgValue::Image(h)) => Ok(*h),
            Some(other) => Err(Error::KernelArgMismatch {
                arg: arg.name(),
                expected: arg.kind().name(),
                actual: other.kind().name(),
            }),
            None => Err(Error::UnboundKernelArg(arg.name())),
        }
    }
}
