//! Shader Binding Tests
//!
//! Tests for:
//! - Binding-set layout deduplication (resources ignored, order observed)
//! - Pool sizing: per-kind count × max concurrent allocation slots
//! - Instance lifecycle: update-before-bind, single-frame frame bounds,
//!   multi-frame explicit free, ring reclamation on frame advance
//! - Write coalescing reaching the backend as batched writes

use std::sync::Arc;
use std::sync::atomic::Ordering;

use glint_rhi::{
    BindingLifetime, BindingResource, BufferHandle, CommandStream, HeadlessBackend,
    PipelineStateInfo, RhiRegistry, RhiSettings, SamplerHandle, ShaderBinding,
    ShaderBindingArray, ShaderBindingKind, ShaderHandle, StageFlags, TextureHandle,
};

fn registry_with(settings: RhiSettings) -> (Arc<HeadlessBackend>, RhiRegistry) {
    let backend = Arc::new(HeadlessBackend::new());
    let registry = RhiRegistry::new(backend.clone(), settings);
    (backend, registry)
}

fn registry() -> (Arc<HeadlessBackend>, RhiRegistry) {
    registry_with(RhiSettings::default())
}

fn ubo_tex_array() -> ShaderBindingArray {
    [
        ShaderBinding::layout_only(0, ShaderBindingKind::UniformBuffer, StageFlags::VERTEX),
        ShaderBinding::layout_only(1, ShaderBindingKind::SampledTexture, StageFlags::FRAGMENT),
    ]
    .into_iter()
    .collect()
}

fn bound_ubo_tex_array() -> ShaderBindingArray {
    [
        ShaderBinding::with_resource(
            0,
            ShaderBindingKind::UniformBuffer,
            StageFlags::VERTEX,
            BindingResource::Buffer {
                buffer: BufferHandle(10),
                offset: 0,
                size: None,
            },
        ),
        ShaderBinding::with_resource(
            1,
            ShaderBindingKind::SampledTexture,
            StageFlags::FRAGMENT,
            BindingResource::Texture {
                texture: TextureHandle(20),
                sampler: Some(SamplerHandle(21)),
            },
        ),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// Layout Deduplication & Sizing
// ============================================================================

#[test]
fn layouts_dedup_regardless_of_bound_resources() {
    let (backend, registry) = registry();

    let bare = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();
    let bound = registry
        .shader_bindings_layout(&bound_ubo_tex_array())
        .unwrap();

    assert!(Arc::ptr_eq(&bare, &bound));
    assert_eq!(backend.counters().binding_layouts.load(Ordering::Relaxed), 1);
}

#[test]
fn binding_order_produces_distinct_layouts() {
    let (_, registry) = registry();

    let reversed: ShaderBindingArray = [
        ShaderBinding::layout_only(1, ShaderBindingKind::SampledTexture, StageFlags::FRAGMENT),
        ShaderBinding::layout_only(0, ShaderBindingKind::UniformBuffer, StageFlags::VERTEX),
    ]
    .into_iter()
    .collect();

    let forward = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();
    let backward = registry.shader_bindings_layout(&reversed).unwrap();
    assert!(!Arc::ptr_eq(&forward, &backward));
}

#[test]
fn pool_is_sized_per_kind_times_concurrent_slots() {
    let (_, registry) = registry_with(RhiSettings {
        frames_in_flight: 2,
        max_concurrent_binding_sets: 32,
    });

    let layout = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();
    let sizes = layout.pool_sizes();

    // One uniform-buffer and one sampled-texture descriptor per slot.
    assert_eq!(sizes.count_per_set(ShaderBindingKind::UniformBuffer), 1);
    assert_eq!(sizes.count_per_set(ShaderBindingKind::SampledTexture), 1);
    assert_eq!(sizes.count(ShaderBindingKind::UniformBuffer), 32);
    assert_eq!(sizes.count(ShaderBindingKind::SampledTexture), 32);
    assert_eq!(sizes.count(ShaderBindingKind::StorageImage), 0);
}

#[test]
fn empty_binding_arrays_are_rejected_before_the_backend() {
    let (backend, registry) = registry();

    assert!(registry
        .shader_bindings_layout(&ShaderBindingArray::new())
        .is_err());
    assert_eq!(backend.counters().binding_layouts.load(Ordering::Relaxed), 0);
}

// ============================================================================
// Instance Lifecycle
// ============================================================================

#[test]
fn instance_update_coalesces_writes() {
    let (backend, registry) = registry();
    let layout = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();

    let mut instance = registry
        .create_binding_instance(&layout, BindingLifetime::SingleFrame)
        .unwrap();
    let batches = instance
        .update(registry.backend().as_ref(), &bound_ubo_tex_array())
        .unwrap();

    // Two kinds at slots 0 and 1 → two write batches.
    assert_eq!(batches, 2);
    assert_eq!(backend.counters().binding_writes.load(Ordering::Relaxed), 2);
    assert!(instance.is_written());
}

#[test]
fn binding_an_unwritten_instance_is_a_lifecycle_violation() {
    let (_, registry) = registry();
    let layout = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();
    let pipeline = registry
        .pipeline_state(PipelineStateInfo::compute(
            "lifecycle",
            ShaderHandle(1),
            [Arc::clone(&layout)],
            [],
        ))
        .unwrap();

    let instance = registry
        .create_binding_instance(&layout, BindingLifetime::MultiFrame)
        .unwrap();

    let mut ctx = registry.begin_recording(CommandStream(1));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        ctx.bind_bindings(&pipeline, 0, &instance)
    }));
    // Debug builds assert; release builds surface the typed error.
    match result {
        Ok(bound) => assert!(bound.is_err()),
        Err(_) => {} // debug_assert fired
    }
}

#[test]
fn single_frame_instance_is_invalid_after_frame_advance() {
    let (_, registry) = registry();
    let layout = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();
    let pipeline = registry
        .pipeline_state(PipelineStateInfo::compute(
            "frame-bound",
            ShaderHandle(1),
            [Arc::clone(&layout)],
            [],
        ))
        .unwrap();

    let mut instance = registry
        .create_binding_instance(&layout, BindingLifetime::SingleFrame)
        .unwrap();
    instance
        .update(registry.backend().as_ref(), &bound_ubo_tex_array())
        .unwrap();

    registry.begin_frame();

    let mut ctx = registry.begin_recording(CommandStream(1));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        ctx.bind_bindings(&pipeline, 0, &instance)
    }));
    match result {
        Ok(bound) => assert!(bound.is_err()),
        Err(_) => {} // debug_assert fired
    }
}

#[test]
fn frame_ring_reclaims_single_frame_sets() {
    let (backend, registry) = registry_with(RhiSettings {
        frames_in_flight: 2,
        max_concurrent_binding_sets: 16,
    });
    let layout = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();

    for _ in 0..3 {
        registry
            .create_binding_instance(&layout, BindingLifetime::SingleFrame)
            .unwrap();
    }
    assert_eq!(
        backend.counters().binding_sets_freed.load(Ordering::Relaxed),
        0
    );

    // After cycling through the whole ring, the frame-0 slot is reclaimed.
    registry.begin_frame();
    registry.begin_frame();
    assert_eq!(
        backend.counters().binding_sets_freed.load(Ordering::Relaxed),
        3
    );
}

#[test]
fn multi_frame_instances_survive_frames_and_free_explicitly() {
    let (backend, registry) = registry();
    let layout = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();

    let instance = registry
        .create_binding_instance(&layout, BindingLifetime::MultiFrame)
        .unwrap();
    assert_eq!(registry.stats().persistent_binding_sets, 1);

    registry.begin_frame();
    registry.begin_frame();
    registry.begin_frame();
    assert_eq!(
        backend.counters().binding_sets_freed.load(Ordering::Relaxed),
        0,
        "frame advance must not reclaim multi-frame sets"
    );

    registry.free_binding_instance(instance).unwrap();
    assert_eq!(
        backend.counters().binding_sets_freed.load(Ordering::Relaxed),
        1
    );
    assert_eq!(registry.stats().persistent_binding_sets, 0);
}

#[test]
fn update_rejects_an_incompatible_array() {
    let (_, registry) = registry();
    let layout = registry.shader_bindings_layout(&ubo_tex_array()).unwrap();

    let mut instance = registry
        .create_binding_instance(&layout, BindingLifetime::MultiFrame)
        .unwrap();

    // Wrong kind at slot 0.
    let wrong: ShaderBindingArray = [ShaderBinding::with_resource(
        0,
        ShaderBindingKind::StorageBuffer,
        StageFlags::VERTEX,
        BindingResource::Buffer {
            buffer: BufferHandle(10),
            offset: 0,
            size: None,
        },
    )]
    .into_iter()
    .collect();

    assert!(instance.update(registry.backend().as_ref(), &wrong).is_err());
    assert!(!instance.is_written());
}
