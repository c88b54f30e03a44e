use crate::builder::EnvironmentDesc;
use crate::environment::{Environment, EnvironmentUniforms};
use solis_core::{
    BufferDesc, BufferUsage, Device, EngineConfig, HostDevice, ResourceHandle, Result,
    SolisError,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Handle to an environment registered in an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvironmentHandle(ResourceHandle);

impl EnvironmentHandle {
    pub const fn raw(self) -> ResourceHandle {
        self.0
    }
}

/// Owns the device and every environment created on it.
pub struct Engine {
    config: EngineConfig,
    device: Arc<dyn Device>,
    environments: HashMap<ResourceHandle, Environment>,
    next_handle: ResourceHandle,
}

impl Engine {
    /// Creates an engine on a host-memory device sized by the config's budget.
    pub fn new(config: EngineConfig) -> Self {
        let device = Arc::new(HostDevice::new(config.device_memory_budget));
        Self::with_device(config, device)
    }

    pub fn with_device(config: EngineConfig, device: Arc<dyn Device>) -> Self {
        log::info!("Creating Solis engine");
        log::info!("  Device memory budget: {:?}", config.device_memory_budget);
        log::info!("  Rotation validation: {}", config.validate_rotation);
        Self {
            config,
            device,
            environments: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    /// Validates `desc`, allocates the environment's device resources and registers it.
    ///
    /// All or nothing: on failure no resources stay allocated and nothing is registered.
    pub fn create_environment(&mut self, desc: &EnvironmentDesc) -> Result<EnvironmentHandle> {
        let resolved = desc.resolve(&self.config)?;

        let buffer = self.device.create_buffer(&BufferDesc {
            name: "environment_uniforms",
            size: std::mem::size_of::<EnvironmentUniforms>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })?;

        let environment = Environment::new(resolved, buffer);
        if let Err(err) = self.upload(&environment) {
            self.device.destroy_buffer(buffer);
            return Err(err);
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        log::debug!(
            "Created environment #{} (flags: {:?}, intensity: {})",
            handle,
            environment.flags(),
            environment.intensity()
        );
        self.environments.insert(handle, environment);
        Ok(EnvironmentHandle(handle))
    }

    /// Releases an environment and its device resources. Returns `false` if the handle
    /// was already destroyed.
    pub fn destroy_environment(&mut self, handle: EnvironmentHandle) -> bool {
        match self.environments.remove(&handle.0) {
            Some(environment) => {
                self.device.destroy_buffer(environment.uniform_buffer());
                log::debug!("Destroyed environment #{}", handle.0);
                true
            }
            None => false,
        }
    }

    pub fn environment(&self, handle: EnvironmentHandle) -> Option<&Environment> {
        self.environments.get(&handle.0)
    }

    pub fn environment_mut(&mut self, handle: EnvironmentHandle) -> Option<&mut Environment> {
        self.environments.get_mut(&handle.0)
    }

    /// Like [`environment`](Self::environment), for callers that treat a stale handle
    /// as an error.
    pub fn get_environment(&self, handle: EnvironmentHandle) -> Result<&Environment> {
        self.environment(handle)
            .ok_or_else(|| SolisError::ResourceNotFound(format!("environment #{}", handle.0)))
    }

    pub fn is_alive(&self, handle: EnvironmentHandle) -> bool {
        self.environments.contains_key(&handle.0)
    }

    pub fn environment_count(&self) -> usize {
        self.environments.len()
    }

    /// Uploads the uniforms of every environment changed since the last call.
    pub fn prepare(&mut self) -> Result<()> {
        for environment in self.environments.values_mut().filter(|e| e.is_dirty()) {
            let uniforms = environment.uniforms();
            self.device
                .write_buffer(environment.uniform_buffer(), 0, bytemuck::bytes_of(&uniforms))?;
            environment.mark_clean();
        }
        Ok(())
    }

    fn upload(&self, environment: &Environment) -> Result<()> {
        let uniforms = environment.uniforms();
        self.device
            .write_buffer(environment.uniform_buffer(), 0, bytemuck::bytes_of(&uniforms))
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        for (handle, environment) in self.environments.drain() {
            log::warn!("Environment #{} was never destroyed, releasing it", handle);
            self.device.destroy_buffer(environment.uniform_buffer());
        }
    }
}
