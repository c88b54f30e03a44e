use crate::{Result, SolisError};
use bitflags::bitflags;
use parking_lot::Mutex;
use std::collections::HashMap;

pub type ResourceHandle = u64;

/// Handle to a buffer allocated on a [`Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(ResourceHandle);

impl BufferHandle {
    pub const fn raw(self) -> ResourceHandle {
        self.0
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const UNIFORM = 1 << 0;
        const STORAGE = 1 << 1;
        const COPY_DST = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDesc {
    pub name: &'static str,
    pub size: u64,
    pub usage: BufferUsage,
}

/// The device side of the engine: owns all device memory.
///
/// Allocation may block until the device has the memory available. Everything
/// allocated through a device must be returned with [`Device::destroy_buffer`].
pub trait Device: Send + Sync {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferHandle>;

    fn write_buffer(&self, handle: BufferHandle, offset: u64, data: &[u8]) -> Result<()>;

    fn destroy_buffer(&self, handle: BufferHandle);

    /// Bytes currently allocated on this device.
    fn allocated_bytes(&self) -> u64;
}

struct HostBuffer {
    name: &'static str,
    usage: BufferUsage,
    data: Vec<u8>,
}

#[derive(Default)]
struct HostDeviceState {
    buffers: HashMap<ResourceHandle, HostBuffer>,
    allocated: u64,
    next_handle: ResourceHandle,
}

/// A [`Device`] backed by host memory with an optional byte budget.
pub struct HostDevice {
    budget: Option<u64>,
    state: Mutex<HostDeviceState>,
}

impl HostDevice {
    pub fn new(budget: Option<u64>) -> Self {
        Self {
            budget,
            state: Mutex::new(HostDeviceState {
                next_handle: 1,
                ..Default::default()
            }),
        }
    }

    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    pub fn buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Copy of a buffer's current contents.
    pub fn read_buffer(&self, handle: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&handle.0).map(|b| b.data.clone())
    }

    pub fn buffer_usage(&self, handle: BufferHandle) -> Option<BufferUsage> {
        self.state.lock().buffers.get(&handle.0).map(|b| b.usage)
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Device for HostDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<BufferHandle> {
        let mut state = self.state.lock();
        if let Some(budget) = self.budget {
            let available = budget.saturating_sub(state.allocated);
            if desc.size > available {
                return Err(SolisError::OutOfMemory {
                    requested: desc.size,
                    available,
                });
            }
        }

        let size = usize::try_from(desc.size).map_err(|_| SolisError::OutOfMemory {
            requested: desc.size,
            available: usize::MAX as u64,
        })?;

        let handle = state.next_handle;
        state.next_handle += 1;
        state.allocated += desc.size;
        state.buffers.insert(
            handle,
            HostBuffer {
                name: desc.name,
                usage: desc.usage,
                data: vec![0; size],
            },
        );
        log::debug!("Allocated buffer '{}' ({} bytes) as #{}", desc.name, desc.size, handle);
        Ok(BufferHandle(handle))
    }

    fn write_buffer(&self, handle: BufferHandle, offset: u64, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        let buffer = state
            .buffers
            .get_mut(&handle.0)
            .ok_or_else(|| SolisError::ResourceNotFound(format!("buffer #{}", handle.0)))?;

        let range = usize::try_from(offset)
            .ok()
            .and_then(|start| Some(start..start.checked_add(data.len())?))
            .filter(|range| range.end <= buffer.data.len());
        let Some(range) = range else {
            return Err(SolisError::GpuDeviceError(format!(
                "write of {} bytes at offset {} overruns buffer '{}' ({} bytes)",
                data.len(),
                offset,
                buffer.name,
                buffer.data.len()
            )));
        };
        buffer.data[range].copy_from_slice(data);
        log::trace!("Wrote {} bytes to buffer '{}'", data.len(), buffer.name);
        Ok(())
    }

    fn destroy_buffer(&self, handle: BufferHandle) {
        let mut state = self.state.lock();
        if let Some(buffer) = state.buffers.remove(&handle.0) {
            state.allocated -= buffer.data.len() as u64;
            log::debug!("Destroyed buffer '{}' (#{})", buffer.name, handle.0);
        }
    }

    fn allocated_bytes(&self) -> u64 {
        self.state.lock().allocated
    }
}
