//! Compute-shader back end for the particle integrator.
//!
//! Particles live in two storage buffers that swap roles every step. The
//! latest output is copied into a mappable buffer and read back
//! asynchronously, so [`GpuSimulator::latest`] lags the device by one frame.

use crate::config::SimParams;
use crate::error::{FluxError, Result};
use crate::kernel::{self, GpuAttractor, GpuParticle, SimUniforms};
use crate::particles::ParticleField;
use crate::sim::SimulationContext;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use wgpu::util::DeviceExt;

pub const ATTRACTOR_CAPACITY: usize = 16;

const READBACK_IDLE: u8 = 0;
const READBACK_PENDING: u8 = 1;
const READBACK_READY: u8 = 2;
const READBACK_FAILED: u8 = 3;

pub struct GpuSimulator {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_groups: [wgpu::BindGroup; 2],
    particles: [wgpu::Buffer; 2],
    uniforms: wgpu::Buffer,
    attractors: wgpu::Buffer,
    readback: wgpu::Buffer,
    readback_state: Arc<AtomicU8>,
    // Index of the buffer holding the most recent particle state.
    front: usize,
    particle_count: u32,
    workgroup_size: u32,
    latest: Vec<GpuParticle>,
}

impl GpuSimulator {
    pub async fn new(params: &SimParams, field: &ParticleField) -> Result<Self> {
        params.validate()?;
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(FluxError::NoAdapter)?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: Some("flux-sim"),
                },
                None,
            )
            .await
            .map_err(|e| FluxError::Device(format!("{:?}", e)))?;
        log::info!("[gpu] adapter: {:?}", adapter.get_info().name);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flux-integrator"),
            source: wgpu::ShaderSource::Wgsl(kernel::build_kernel(params).into()),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flux-sim-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage(1, true),
                storage(2, false),
                storage(3, true),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flux-sim-pipeline-layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("flux-sim-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let packed = kernel::pack_particles(field);
        let make_particles = |label| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&packed),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
            })
        };
        let particles = [make_particles("particles-a"), make_particles("particles-b")];
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sim-uniforms"),
            size: std::mem::size_of::<SimUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let attractors = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("attractors"),
            size: (ATTRACTOR_CAPACITY * std::mem::size_of::<GpuAttractor>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particles-readback"),
            size: (packed.len() * std::mem::size_of::<GpuParticle>()) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let make_bind_group = |src: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("flux-sim-bind-group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: particles[src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: particles[1 - src].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: attractors.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [make_bind_group(0), make_bind_group(1)];

        log::info!(
            "[gpu] integrator ready: {} particles, workgroup {}",
            packed.len(),
            params.workgroup_size
        );
        Ok(Self {
            device,
            queue,
            pipeline,
            bind_groups,
            particles,
            uniforms,
            attractors,
            readback,
            readback_state: Arc::new(AtomicU8::new(READBACK_IDLE)),
            front: 0,
            particle_count: packed.len() as u32,
            workgroup_size: params.workgroup_size,
            latest: packed,
        })
    }

    /// Overwrite device particle state, e.g. after a host-side snap home.
    pub fn upload(&mut self, field: &ParticleField) {
        let packed = kernel::pack_particles(field);
        self.queue
            .write_buffer(&self.particles[self.front], 0, bytemuck::cast_slice(&packed));
    }

    /// Dispatch one integration step using the context's attractors, audio
    /// level and reset factor. Does not block.
    pub fn step(&mut self, params: &SimParams, ctx: &SimulationContext, dt: f32) {
        if ctx.attractors.len() > ATTRACTOR_CAPACITY {
            log::warn!(
                "[gpu] {} attractors, only {} uploaded",
                ctx.attractors.len(),
                ATTRACTOR_CAPACITY
            );
        }
        let gpu_attractors: Vec<GpuAttractor> = ctx
            .attractors
            .iter()
            .take(ATTRACTOR_CAPACITY)
            .map(GpuAttractor::from)
            .collect();
        let mut u = kernel::uniforms(params, ctx, dt);
        u.particle_count = self.particle_count;
        u.attractor_count = gpu_attractors.len() as u32;
        self.queue
            .write_buffer(&self.uniforms, 0, bytemuck::bytes_of(&u));
        if !gpu_attractors.is_empty() {
            self.queue
                .write_buffer(&self.attractors, 0, bytemuck::cast_slice(&gpu_attractors));
        }

        let back = 1 - self.front;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("flux-sim-step"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("flux-sim-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.front], &[]);
            pass.dispatch_workgroups(self.particle_count.div_ceil(self.workgroup_size), 1, 1);
        }

        let start_readback = self.readback_state.load(Ordering::Acquire) == READBACK_IDLE;
        if start_readback {
            encoder.copy_buffer_to_buffer(
                &self.particles[back],
                0,
                &self.readback,
                0,
                self.readback.size(),
            );
        }
        self.queue.submit(Some(encoder.finish()));
        self.front = back;

        if start_readback {
            self.readback_state
                .store(READBACK_PENDING, Ordering::Release);
            let state = Arc::clone(&self.readback_state);
            self.readback
                .slice(..)
                .map_async(wgpu::MapMode::Read, move |res| {
                    let next = if res.is_ok() {
                        READBACK_READY
                    } else {
                        READBACK_FAILED
                    };
                    state.store(next, Ordering::Release);
                });
        }
    }

    /// Collect a finished readback if one is available. Returns true when
    /// [`latest`](Self::latest) changed.
    pub fn poll(&mut self) -> Result<bool> {
        let _ = self.device.poll(wgpu::Maintain::Poll);
        self.collect()
    }

    /// Block until the in-flight readback lands. Native only; the browser
    /// resolves mappings from its own event loop.
    pub fn wait(&mut self) -> Result<bool> {
        let _ = self.device.poll(wgpu::Maintain::Wait);
        self.collect()
    }

    fn collect(&mut self) -> Result<bool> {
        match self.readback_state.load(Ordering::Acquire) {
            READBACK_READY => {
                {
                    let view = self.readback.slice(..).get_mapped_range();
                    self.latest.clear();
                    self.latest.extend_from_slice(bytemuck::cast_slice(&view));
                }
                self.readback.unmap();
                self.readback_state.store(READBACK_IDLE, Ordering::Release);
                Ok(true)
            }
            READBACK_FAILED => {
                self.readback_state.store(READBACK_IDLE, Ordering::Release);
                Err(FluxError::Readback("particle buffer map failed".into()))
            }
            _ => Ok(false),
        }
    }

    /// Most recently read-back particle state.
    pub fn latest(&self) -> &[GpuParticle] {
        &self.latest
    }

    /// Copy the latest readback into a CPU field.
    pub fn sync_to(&self, field: &mut ParticleField) {
        kernel::unpack_particles(&self.latest, field);
    }

    pub fn write_positions(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.latest.len() * 3);
        for p in &self.latest {
            out.extend_from_slice(&p.position[..3]);
        }
    }
}
