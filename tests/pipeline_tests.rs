//! Pipeline & Render Pass Composition Tests
//!
//! Tests for:
//! - Full pipeline hash: changes iff an aggregated component changes
//! - CullMode scenario: BACK vs FRONT → two distinct cached pipelines
//! - Render-pass dedup: identical attachment lists → same cached object
//! - Release-by-hash → fresh pipeline construction
//! - Recording: strict begin/end pairing, redundant-bind elimination

use std::sync::Arc;
use std::sync::atomic::Ordering;

use glint_rhi::{
    Attachment, BlendState, CommandStream, CullMode, DepthStencilState, FrontFace, GpuRenderPass,
    HeadlessBackend, MultisampleState, PipelineStateFixedInfo, PipelineStateInfo, PolygonMode,
    RasterizationState, RenderTargetHandle, RhiRegistry, RhiSettings, Scissor, ShaderBinding,
    ShaderBindingArray, ShaderBindingKind, ShaderBindingsLayout, ShaderHandle, StageFlags,
    TextureFormat, VertexAttribute, VertexBufferBinding, VertexFormat, VertexLayout,
    VertexStepMode, Viewport,
};

fn registry() -> (Arc<HeadlessBackend>, RhiRegistry) {
    let backend = Arc::new(HeadlessBackend::new());
    let registry = RhiRegistry::new(backend.clone(), RhiSettings::default());
    (backend, registry)
}

fn color_pass(registry: &RhiRegistry) -> Arc<GpuRenderPass> {
    registry
        .get_or_create_render_pass(
            [Attachment::color(
                RenderTargetHandle(1),
                TextureFormat::Bgra8UnormSrgb,
                [0.0; 4],
            )],
            (0, 0),
            (1280, 720),
        )
        .unwrap()
}

fn mesh_vertex_layout() -> VertexLayout {
    VertexLayout {
        buffers: [VertexBufferBinding {
            binding: 0,
            stride: 32,
            step_mode: VertexStepMode::Vertex,
            attributes: [
                VertexAttribute {
                    location: 0,
                    format: VertexFormat::Float32x3,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    format: VertexFormat::Float32x3,
                    offset: 12,
                },
                VertexAttribute {
                    location: 2,
                    format: VertexFormat::Float32x2,
                    offset: 24,
                },
            ]
            .into_iter()
            .collect(),
        }]
        .into_iter()
        .collect(),
    }
}

fn object_layout(registry: &RhiRegistry) -> Arc<ShaderBindingsLayout> {
    let array: ShaderBindingArray = [
        ShaderBinding::layout_only(0, ShaderBindingKind::UniformBuffer, StageFlags::ALL_GRAPHICS),
        ShaderBinding::layout_only(1, ShaderBindingKind::SampledTexture, StageFlags::FRAGMENT),
    ]
    .into_iter()
    .collect();
    registry.shader_bindings_layout(&array).unwrap()
}

fn fixed_with_cull(cull: CullMode) -> PipelineStateFixedInfo {
    PipelineStateFixedInfo::new(
        RasterizationState::preset(PolygonMode::Fill, cull, FrontFace::Ccw),
        MultisampleState::default(),
        DepthStencilState::default(),
        BlendState::default(),
        [Viewport::of_extent(1280.0, 720.0)],
        [Scissor::of_extent(1280, 720)],
        false,
    )
}

fn graphics_info(
    registry: &RhiRegistry,
    label: &str,
    cull: CullMode,
    shader: ShaderHandle,
) -> PipelineStateInfo {
    PipelineStateInfo::graphics(
        label,
        fixed_with_cull(cull),
        shader,
        mesh_vertex_layout(),
        color_pass(registry),
        0,
        [object_layout(registry)],
        [],
    )
}

// ============================================================================
// Hash Composition
// ============================================================================

#[test]
fn identical_compositions_hash_equal() {
    let (_, registry) = registry();
    let a = graphics_info(&registry, "a", CullMode::Back, ShaderHandle(7));
    let b = graphics_info(&registry, "b", CullMode::Back, ShaderHandle(7));

    // Debug labels do not participate in identity.
    assert_eq!(a.content_hash(), b.content_hash());
}

#[test]
fn hash_changes_when_any_component_changes() {
    let (_, registry) = registry();
    let base = graphics_info(&registry, "base", CullMode::Back, ShaderHandle(7));

    // Shader.
    let other_shader = graphics_info(&registry, "s", CullMode::Back, ShaderHandle(8));
    assert_ne!(base.content_hash(), other_shader.content_hash());

    // Fixed-function state.
    let other_cull = graphics_info(&registry, "c", CullMode::Front, ShaderHandle(7));
    assert_ne!(base.content_hash(), other_cull.content_hash());

    // Vertex layout.
    let positions_only = VertexLayout {
        buffers: [VertexBufferBinding {
            binding: 0,
            stride: 12,
            step_mode: VertexStepMode::Vertex,
            attributes: [VertexAttribute {
                location: 0,
                format: VertexFormat::Float32x3,
                offset: 0,
            }]
            .into_iter()
            .collect(),
        }]
        .into_iter()
        .collect(),
    };
    let other_vertices = PipelineStateInfo::graphics(
        "v",
        fixed_with_cull(CullMode::Back),
        ShaderHandle(7),
        positions_only,
        color_pass(&registry),
        0,
        [object_layout(&registry)],
        [],
    );
    assert_ne!(base.content_hash(), other_vertices.content_hash());

    // Render pass.
    let hdr_pass = registry
        .get_or_create_render_pass(
            [Attachment::color(
                RenderTargetHandle(1),
                TextureFormat::Rgba16Float,
                [0.0; 4],
            )],
            (0, 0),
            (1280, 720),
        )
        .unwrap();
    let other_pass = PipelineStateInfo::graphics(
        "p",
        fixed_with_cull(CullMode::Back),
        ShaderHandle(7),
        mesh_vertex_layout(),
        hdr_pass,
        0,
        [object_layout(&registry)],
        [],
    );
    assert_ne!(base.content_hash(), other_pass.content_hash());

    // Binding layouts.
    let texture_only: ShaderBindingArray = [ShaderBinding::layout_only(
        0,
        ShaderBindingKind::SampledTexture,
        StageFlags::FRAGMENT,
    )]
    .into_iter()
    .collect();
    let other_bindings = PipelineStateInfo::graphics(
        "b",
        fixed_with_cull(CullMode::Back),
        ShaderHandle(7),
        mesh_vertex_layout(),
        color_pass(&registry),
        0,
        [registry.shader_bindings_layout(&texture_only).unwrap()],
        [],
    );
    assert_ne!(base.content_hash(), other_bindings.content_hash());

    // Subpass index.
    let other_subpass = PipelineStateInfo::graphics(
        "sp",
        fixed_with_cull(CullMode::Back),
        ShaderHandle(7),
        mesh_vertex_layout(),
        color_pass(&registry),
        1,
        [object_layout(&registry)],
        [],
    );
    assert_ne!(base.content_hash(), other_subpass.content_hash());
}

// ============================================================================
// Pipeline Cache Scenarios
// ============================================================================

#[test]
fn cull_mode_variants_produce_two_cached_pipelines() {
    let (backend, registry) = registry();

    let back = registry
        .pipeline_state(graphics_info(&registry, "back", CullMode::Back, ShaderHandle(7)))
        .unwrap();
    let front = registry
        .pipeline_state(graphics_info(&registry, "front", CullMode::Front, ShaderHandle(7)))
        .unwrap();

    assert!(!Arc::ptr_eq(&back, &front));
    assert_ne!(back.content_hash(), front.content_hash());
    assert_eq!(
        backend.counters().graphics_pipelines.load(Ordering::Relaxed),
        2
    );
}

#[test]
fn identical_pipeline_requests_construct_once() {
    let (backend, registry) = registry();

    let a = registry
        .pipeline_state(graphics_info(&registry, "a", CullMode::Back, ShaderHandle(7)))
        .unwrap();
    let b = registry
        .pipeline_state(graphics_info(&registry, "b", CullMode::Back, ShaderHandle(7)))
        .unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(
        backend.counters().graphics_pipelines.load(Ordering::Relaxed),
        1
    );
    assert_eq!(
        backend.counters().pipeline_layouts.load(Ordering::Relaxed),
        1
    );
}

#[test]
fn released_pipeline_is_rebuilt_on_next_request() {
    let (backend, registry) = registry();

    let first = registry
        .pipeline_state(graphics_info(&registry, "x", CullMode::Back, ShaderHandle(7)))
        .unwrap();
    let detached = registry.release_pipeline(first.content_hash()).unwrap();
    assert!(Arc::ptr_eq(&first, &detached));

    let second = registry
        .pipeline_state(graphics_info(&registry, "x", CullMode::Back, ShaderHandle(7)))
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(
        backend.counters().graphics_pipelines.load(Ordering::Relaxed),
        2
    );
}

#[test]
fn compute_pipelines_dedup_independently() {
    let (backend, registry) = registry();
    let layout = object_layout(&registry);

    let a = registry
        .pipeline_state(PipelineStateInfo::compute(
            "brdf-lut",
            ShaderHandle(40),
            [Arc::clone(&layout)],
            [],
        ))
        .unwrap();
    let b = registry
        .pipeline_state(PipelineStateInfo::compute(
            "brdf-lut",
            ShaderHandle(40),
            [Arc::clone(&layout)],
            [],
        ))
        .unwrap();
    let c = registry
        .pipeline_state(PipelineStateInfo::compute(
            "ibl-filter",
            ShaderHandle(41),
            [layout],
            [],
        ))
        .unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(
        backend.counters().compute_pipelines.load(Ordering::Relaxed),
        2
    );
}

// ============================================================================
// Render Pass Scenarios
// ============================================================================

#[test]
fn identical_attachment_lists_return_the_same_render_pass() {
    let (backend, registry) = registry();

    let a = color_pass(&registry);
    let b = color_pass(&registry);

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(backend.counters().render_passes.load(Ordering::Relaxed), 1);
}

#[test]
fn load_op_and_clear_value_change_render_pass_identity() {
    let (_, registry) = registry();

    let cleared = color_pass(&registry);
    let red = registry
        .get_or_create_render_pass(
            [Attachment::color(
                RenderTargetHandle(1),
                TextureFormat::Bgra8UnormSrgb,
                [1.0, 0.0, 0.0, 1.0],
            )],
            (0, 0),
            (1280, 720),
        )
        .unwrap();
    assert!(!Arc::ptr_eq(&cleared, &red));
}

#[test]
fn depth_variant_is_a_distinct_render_pass() {
    let (_, registry) = registry();

    let color_only = color_pass(&registry);
    let with_depth = registry
        .get_or_create_render_pass_with_depth(
            [Attachment::color(
                RenderTargetHandle(1),
                TextureFormat::Bgra8UnormSrgb,
                [0.0; 4],
            )],
            Attachment::depth(RenderTargetHandle(2), TextureFormat::Depth32Float),
            (0, 0),
            (1280, 720),
        )
        .unwrap();
    assert!(!Arc::ptr_eq(&color_only, &with_depth));
}

// ============================================================================
// Recording Discipline
// ============================================================================

#[test]
fn begin_end_pairing_is_enforced() {
    let (backend, registry) = registry();
    let pass = color_pass(&registry);

    let mut ctx = registry.begin_recording(CommandStream(1));
    ctx.begin_render_pass(&pass).unwrap();
    ctx.end_render_pass().unwrap();
    ctx.finish().unwrap();

    assert_eq!(backend.counters().passes_begun.load(Ordering::Relaxed), 1);
    assert_eq!(backend.counters().passes_ended.load(Ordering::Relaxed), 1);

    // A stray end is rejected (debug builds assert).
    let mut ctx = registry.begin_recording(CommandStream(1));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ctx.end_render_pass()));
    match result {
        Ok(ended) => assert!(ended.is_err()),
        Err(_) => {} // debug_assert fired
    }
}

#[test]
fn redundant_pipeline_binds_are_elided() {
    let (backend, registry) = registry();
    let pipeline = registry
        .pipeline_state(graphics_info(&registry, "main", CullMode::Back, ShaderHandle(7)))
        .unwrap();

    let mut ctx = registry.begin_recording(CommandStream(1));
    ctx.bind_pipeline(&pipeline);
    ctx.bind_pipeline(&pipeline);
    ctx.bind_pipeline(&pipeline);

    assert_eq!(backend.counters().pipeline_binds.load(Ordering::Relaxed), 1);
}
