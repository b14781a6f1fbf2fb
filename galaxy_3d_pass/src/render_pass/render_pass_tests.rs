//! Unit tests for render_pass.rs
//!
//! Drives the whole encode through the mock graphics device and checks the
//! recorded call sequence.

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{
    resident_view, MockPipeline, MockSampler, MockSetup, MockTexture,
};
use crate::graphics_device::{ClearValue, CommandEncoder, Context, ImageLayout, IndexType, Texture};
use crate::render_pass::{
    Attachment, ColorAttachment, Command, DepthAttachment, RenderPass, RenderPassState,
    RenderTarget, SampledImageSlot, ShaderUniformSlot, StencilAttachment, VertexBuffer,
};
use glam::Vec4;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

fn red_target() -> RenderTarget {
    let mut target = RenderTarget::new();
    target.set_color_attachment(
        0,
        ColorAttachment::new(
            Attachment::new(MockTexture::color("color", 800, 600)),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
        ),
    ).unwrap();
    target
}

fn triangle() -> Command {
    let mut command = Command::new(MockPipeline::new("solid"));
    command.bind_vertices(VertexBuffer {
        vertex_buffer: resident_view("vbo", 36),
        index_buffer: resident_view("ibo", 6),
        index_count: 3,
        index_type: IndexType::U16,
    });
    command
}

fn new_pass(setup: &MockSetup, target: RenderTarget) -> RenderPass {
    RenderPass::new(&setup.context(), target, setup.weak_encoder())
}

// ============================================================================
// CONSTRUCTION TESTS
// ============================================================================

#[test]
fn test_new_creates_render_pass_object() {
    let setup = MockSetup::new();
    let pass = new_pass(&setup, red_target());

    assert!(pass.is_valid());
    assert_eq!(pass.state(), RenderPassState::Ready);
    assert_eq!(setup.device.calls(), vec!["create_render_pass attachments=1"]);
}

#[test]
fn test_render_pass_object_failure_makes_pass_invalid() {
    let setup = MockSetup::new();
    setup.context.fail_create_render_pass.store(true, Ordering::SeqCst);

    let mut pass = new_pass(&setup, red_target());

    assert!(!pass.is_valid());
    assert_eq!(pass.state(), RenderPassState::Invalid);
    assert!(matches!(pass.encode(), Err(Error::PreconditionFailed(_))));
    assert!(pass.add_command(triangle()).is_err());
    assert_eq!(pass.state(), RenderPassState::Invalid);
    assert!(setup.device.calls().is_empty());
}

// ============================================================================
// ENCODE SCENARIOS
// ============================================================================

#[test]
fn test_single_draw_scenario() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    pass.add_command(triangle()).unwrap();
    setup.device.clear();

    pass.encode().unwrap();

    assert_eq!(pass.state(), RenderPassState::Encoded);
    assert_eq!(setup.device.matching("draw_indexed"), vec!["draw_indexed 3 1 0 0 0"]);
    let clears = setup.encoder.cmd_buffer.clear_values.lock().unwrap().clone();
    assert_eq!(clears, vec![vec![ClearValue::Color([1.0, 0.0, 0.0, 1.0])]]);
    assert_eq!(
        setup.device.calls(),
        vec![
            "barrier color Undefined->ColorAttachment",
            "track texture color",
            "create_framebuffer 800x600x1 [color]",
            "track framebuffer",
            "track render_pass",
            "begin_render_pass 800x600 clears=1",
            "allocate_descriptor_set set#0",
            "update_descriptor_set []",
            "bind_descriptor_set 0 set#0",
            "bind_pipeline solid",
            "set_viewport 0 600 800 -600 0..1",
            "set_scissor 0 0 800 600",
            "set_stencil_reference FrontAndBack 0",
            "track buffer vbo",
            "track buffer ibo",
            "bind_vertex_buffer 0 vbo 0",
            "bind_index_buffer ibo 0 U16",
            "draw_indexed 3 1 0 0 0",
            "end_render_pass",
        ]
    );
}

#[test]
fn test_resolve_scenario() {
    let setup = MockSetup::new();
    let mut target = RenderTarget::new();
    target.set_color_attachment(
        0,
        ColorAttachment::new(
            Attachment::new(MockTexture::multisampled("msaa", 64, 64))
                .with_resolve(MockTexture::color("resolve", 64, 64)),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
        ),
    ).unwrap();
    let mut pass = new_pass(&setup, target);
    pass.add_command(triangle()).unwrap();

    pass.encode().unwrap();

    assert_eq!(setup.device.matching("create_render_pass"), vec!["create_render_pass attachments=2"]);
    assert_eq!(setup.device.matching("create_framebuffer"), vec!["create_framebuffer 64x64x1 [msaa, resolve]"]);
    let clears = setup.encoder.cmd_buffer.clear_values.lock().unwrap().clone();
    assert_eq!(
        clears,
        vec![vec![ClearValue::Color([0.0, 1.0, 0.0, 1.0]), ClearValue::Color([0.0, 1.0, 0.0, 1.0])]]
    );
}

#[test]
fn test_depth_and_stencil_share_one_slot() {
    let setup = MockSetup::new();
    let stencil = MockTexture::stencil("stencil", 800, 600);
    let mut target = red_target();
    target
        .set_depth_attachment(DepthAttachment::new(Attachment::new(MockTexture::depth("depth", 800, 600)), 1.0))
        .set_stencil_attachment(StencilAttachment::new(Attachment::new(stencil.clone()), 0));
    let mut pass = new_pass(&setup, target);
    pass.add_command(triangle()).unwrap();

    pass.encode().unwrap();

    assert_eq!(setup.device.matching("create_framebuffer"), vec!["create_framebuffer 800x600x1 [color, depth]"]);
    assert_eq!(setup.device.matching("begin_render_pass"), vec!["begin_render_pass 800x600 clears=2"]);
    // Stencil is still transitioned and kept alive
    assert_eq!(stencil.layout(), ImageLayout::StencilAttachment);
    assert_eq!(setup.device.count("track texture stencil"), 1);
}

#[test]
fn test_empty_command_list_only_transitions() {
    let setup = MockSetup::new();
    let depth = MockTexture::depth("depth", 800, 600);
    let mut target = red_target();
    target.set_depth_attachment(DepthAttachment::new(Attachment::new(depth.clone()), 1.0));
    let mut pass = new_pass(&setup, target);
    setup.device.clear();

    pass.encode().unwrap();

    assert_eq!(pass.state(), RenderPassState::Encoded);
    assert_eq!(depth.layout(), ImageLayout::DepthAttachment);
    assert_eq!(setup.device.count("barrier"), 2);
    assert_eq!(setup.device.count("create_framebuffer"), 0);
    assert_eq!(setup.device.count("begin_render_pass"), 0);
    assert_eq!(setup.device.count("end_render_pass"), 0);
}

#[test]
fn test_commands_without_pipeline_are_skipped() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    let mut no_pipeline = triangle();
    no_pipeline.pipeline = None;
    pass.add_command(no_pipeline).unwrap();
    pass.add_command(triangle()).unwrap();

    pass.encode().unwrap();

    assert_eq!(setup.device.count("draw_indexed"), 1);
    assert_eq!(setup.device.count("allocate_descriptor_set"), 1);
}

#[test]
fn test_zero_count_command_issues_nothing_inside_pass() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    let mut empty = triangle();
    empty.instance_count = 0;
    pass.add_command(empty).unwrap();

    pass.encode().unwrap();

    assert_eq!(setup.device.count("draw_indexed"), 0);
    assert_eq!(setup.device.count("allocate_descriptor_set"), 0);
    assert_eq!(setup.device.count("begin_render_pass"), 1);
    assert_eq!(setup.device.count("end_render_pass"), 1);
}

#[test]
fn test_binding_transitions_precede_attachment_transitions() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    let mut command = triangle();
    command
        .fragment_bindings
        .bind_texture(0, SampledImageSlot::new("albedo", 1), MockTexture::color("albedo", 8, 8))
        .bind_sampler(0, SampledImageSlot::new("albedo", 1), MockSampler::new("linear"));
    pass.add_command(command).unwrap();

    pass.encode().unwrap();

    let albedo = setup.device.position("barrier albedo").unwrap();
    let color = setup.device.position("barrier color").unwrap();
    let begin = setup.device.position("begin_render_pass").unwrap();
    assert!(albedo < color);
    assert!(color < begin);
}

#[test]
fn test_no_barrier_inside_render_pass() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    for i in 0..3 {
        let mut command = triangle();
        command
            .fragment_bindings
            .bind_texture(0, SampledImageSlot::new("tex", 1), MockTexture::color(&format!("tex{}", i), 8, 8))
            .bind_sampler(0, SampledImageSlot::new("tex", 1), MockSampler::new("linear"));
        pass.add_command(command).unwrap();
    }

    pass.encode().unwrap();

    assert_eq!(setup.device.count("barrier"), 4);
    assert_eq!(setup.encoder.cmd_buffer.barriers_inside_pass.load(Ordering::SeqCst), 0);
    let last_barrier = setup.device.calls().iter().rposition(|c| c.starts_with("barrier")).unwrap();
    assert!(last_barrier < setup.device.position("begin_render_pass").unwrap());
}

#[test]
fn test_encoding_twice_is_deterministic() {
    let run = || {
        let setup = MockSetup::new();
        let mut pass = new_pass(&setup, red_target());
        let mut command = triangle();
        command
            .fragment_bindings
            .bind_buffer(2, ShaderUniformSlot::new("B", 4), resident_view("b", 16))
            .bind_buffer(1, ShaderUniformSlot::new("A", 1), resident_view("a", 16))
            .bind_texture(0, SampledImageSlot::new("t", 2), MockTexture::color("t", 8, 8))
            .bind_sampler(0, SampledImageSlot::new("t", 2), MockSampler::new("s"));
        pass.add_command(command).unwrap();
        pass.encode().unwrap();
        setup.device.calls()
    };

    assert_eq!(run(), run());
}

// ============================================================================
// FAILURE TESTS
// ============================================================================

#[test]
fn test_missing_color_zero_fails() {
    let setup = MockSetup::new();
    let mut target = RenderTarget::new();
    target.set_color_attachment(
        1,
        ColorAttachment::new(Attachment::new(MockTexture::color("c1", 8, 8)), Vec4::ZERO),
    ).unwrap();
    let mut pass = new_pass(&setup, target);
    setup.device.clear();

    assert!(matches!(pass.encode(), Err(Error::PreconditionFailed(_))));
    assert_eq!(pass.state(), RenderPassState::Failed);
    assert!(setup.device.calls().is_empty());
}

#[test]
fn test_dead_encoder_fails_without_calls() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    pass.add_command(triangle()).unwrap();
    setup.device.clear();

    let weak: Weak<dyn CommandEncoder> = setup.weak_encoder();
    drop(setup.encoder);
    assert!(weak.upgrade().is_none());

    assert!(matches!(pass.encode(), Err(Error::PreconditionFailed(_))));
    assert_eq!(pass.state(), RenderPassState::Failed);
    assert!(setup.device.calls().is_empty());
}

#[test]
fn test_framebuffer_failure_fails_encode() {
    let setup = MockSetup::new();
    setup.context.fail_create_framebuffer.store(true, Ordering::SeqCst);
    let mut pass = new_pass(&setup, red_target());
    pass.add_command(triangle()).unwrap();

    assert!(pass.encode().is_err());
    assert_eq!(pass.state(), RenderPassState::Failed);
    assert_eq!(setup.device.count("begin_render_pass"), 0);
}

#[test]
fn test_failed_command_still_ends_render_pass() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    let mut broken = triangle();
    broken.label = "broken".to_string();
    broken
        .fragment_bindings
        .bind_sampler(0, SampledImageSlot::new("orphan", 0), MockSampler::new("linear"));
    pass.add_command(triangle()).unwrap();
    pass.add_command(broken).unwrap();
    pass.add_command(triangle()).unwrap();

    assert!(pass.encode().is_err());

    assert_eq!(pass.state(), RenderPassState::Failed);
    assert_eq!(setup.device.count("draw_indexed"), 1);
    assert_eq!(setup.device.calls().last().map(String::as_str), Some("end_render_pass"));
    assert_eq!(setup.device.count("push_debug_group broken"), 1);
    assert_eq!(setup.device.count("pop_debug_group"), 1);
}

#[test]
fn test_encode_is_single_shot() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    pass.add_command(triangle()).unwrap();
    pass.encode().unwrap();
    let calls = setup.device.calls().len();

    assert!(pass.encode().is_err());
    assert!(pass.add_command(triangle()).is_err());
    assert!(pass.set_label("late").is_err());
    assert_eq!(pass.state(), RenderPassState::Encoded);
    assert_eq!(setup.device.calls().len(), calls);
}

// ============================================================================
// LABEL TESTS
// ============================================================================

#[test]
fn test_label_names_object_and_brackets_pass() {
    let setup = MockSetup::new();
    let mut pass = new_pass(&setup, red_target());
    pass.set_label("main").unwrap();
    pass.add_command(triangle()).unwrap();

    pass.encode().unwrap();

    assert_eq!(pass.label(), "main");
    let calls = setup.device.calls();
    assert_eq!(calls[1], "set_debug_name main");
    assert_eq!(calls[2], "push_debug_group main");
    assert_eq!(calls.last().map(String::as_str), Some("pop_debug_group"));

    assert_eq!(setup.context.render_pass_descs.lock().unwrap().len(), 1);
}

#[test]
fn test_label_requires_live_context() {
    let device_setup = MockSetup::new();
    let context: Arc<dyn Context> = device_setup.context.clone();
    let mut pass = RenderPass::new(&context, red_target(), device_setup.weak_encoder());
    let render_pass_count = device_setup.context.render_pass_descs.lock().unwrap().len();
    assert_eq!(render_pass_count, 1);

    drop(context);
    drop(device_setup.context);

    assert!(matches!(pass.set_label("orphan"), Err(Error::PreconditionFailed(_))));
    assert_eq!(pass.label(), "");
}
