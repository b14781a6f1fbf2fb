//! Unit tests for attachments.rs
//!
//! Attachment order, reference tables and clear values.

use crate::graphics_device::mock_graphics_device::MockTexture;
use crate::graphics_device::{
    AttachmentKind, ClearValue, ImageLayout, PipelineBindPoint, SampleCount, TextureFormat,
    ATTACHMENT_UNUSED,
};
use crate::render_pass::attachments::{attachment_slots, clear_values};
use crate::render_pass::{
    Attachment, AttachmentLayout, ColorAttachment, DepthAttachment, RenderTarget,
    StencilAttachment,
};
use glam::Vec4;

fn color(name: &str) -> ColorAttachment {
    ColorAttachment::new(Attachment::new(MockTexture::color(name, 64, 64)), Vec4::new(1.0, 0.0, 0.0, 1.0))
}

fn resolved_color(name: &str) -> ColorAttachment {
    let attachment = Attachment::new(MockTexture::multisampled(name, 64, 64))
        .with_resolve(MockTexture::color(&format!("{}_resolve", name), 64, 64));
    ColorAttachment::new(attachment, Vec4::new(0.0, 0.0, 1.0, 1.0))
}

fn depth() -> DepthAttachment {
    DepthAttachment::new(Attachment::new(MockTexture::depth("depth", 64, 64)), 1.0)
}

fn stencil() -> StencilAttachment {
    StencilAttachment::new(Attachment::new(MockTexture::stencil("stencil", 64, 64)), 7)
}

fn slot_names(target: &RenderTarget) -> Vec<String> {
    attachment_slots(target)
        .iter()
        .map(|slot| {
            slot.texture()
                .as_any()
                .downcast_ref::<MockTexture>()
                .unwrap()
                .name
                .clone()
        })
        .collect()
}

// ============================================================================
// ATTACHMENT LAYOUT TESTS
// ============================================================================

#[test]
fn test_empty_target_yields_empty_layout() {
    let layout = AttachmentLayout::new(&RenderTarget::new());
    assert!(layout.attachments.is_empty());
    assert!(layout.color_refs.is_empty());
    assert!(layout.resolve_refs.is_empty());
    assert!(layout.depth_stencil_ref.is_unused());
}

#[test]
fn test_single_color() {
    let mut target = RenderTarget::new();
    target.set_color_attachment(0, color("c0")).unwrap();

    let layout = AttachmentLayout::new(&target);

    assert_eq!(layout.attachments.len(), 1);
    assert_eq!(layout.attachments[0].kind, AttachmentKind::Color);
    assert_eq!(layout.attachments[0].format, TextureFormat::R8G8B8A8_UNORM);
    assert_eq!(layout.color_refs.len(), 1);
    assert_eq!(layout.color_refs[0].attachment, 0);
    assert_eq!(layout.color_refs[0].layout, ImageLayout::ColorAttachment);
    assert!(layout.resolve_refs[0].is_unused());
    assert!(layout.depth_stencil_ref.is_unused());
}

#[test]
fn test_sparse_indices_leave_unused_references() {
    let mut target = RenderTarget::new();
    target
        .set_color_attachment(0, color("c0")).unwrap()
        .set_color_attachment(3, color("c3")).unwrap();

    let layout = AttachmentLayout::new(&target);

    assert_eq!(layout.color_refs.len(), 4);
    assert_eq!(layout.resolve_refs.len(), 4);
    assert_eq!(layout.color_refs[0].attachment, 0);
    assert_eq!(layout.color_refs[1].attachment, ATTACHMENT_UNUSED);
    assert_eq!(layout.color_refs[2].attachment, ATTACHMENT_UNUSED);
    assert_eq!(layout.color_refs[3].attachment, 1);
    assert!(layout.resolve_refs.iter().all(|r| r.is_unused()));
}

#[test]
fn test_resolve_follows_its_color() {
    let mut target = RenderTarget::new();
    target
        .set_color_attachment(0, resolved_color("c0")).unwrap()
        .set_color_attachment(1, color("c1")).unwrap();

    let layout = AttachmentLayout::new(&target);

    assert_eq!(layout.attachments.len(), 3);
    assert_eq!(layout.attachments[0].sample_count, SampleCount::S4);
    assert_eq!(layout.attachments[1].sample_count, SampleCount::S1);
    assert_eq!(layout.color_refs[0].attachment, 0);
    assert_eq!(layout.resolve_refs[0].attachment, 1);
    assert_eq!(layout.color_refs[1].attachment, 2);
    assert!(layout.resolve_refs[1].is_unused());
    assert_eq!(slot_names(&target), vec!["c0", "c0_resolve", "c1"]);
}

#[test]
fn test_depth_after_colors() {
    let mut target = RenderTarget::new();
    target.set_color_attachment(0, color("c0")).unwrap().set_depth_attachment(depth());

    let layout = AttachmentLayout::new(&target);

    assert_eq!(layout.attachments.len(), 2);
    assert_eq!(layout.attachments[1].kind, AttachmentKind::Depth);
    assert_eq!(layout.depth_stencil_ref.attachment, 1);
    assert_eq!(layout.depth_stencil_ref.layout, ImageLayout::DepthStencilAttachment);
}

#[test]
fn test_stencil_used_when_no_depth() {
    let mut target = RenderTarget::new();
    target.set_color_attachment(0, color("c0")).unwrap().set_stencil_attachment(stencil());

    let layout = AttachmentLayout::new(&target);

    assert_eq!(layout.attachments.len(), 2);
    assert_eq!(layout.attachments[1].kind, AttachmentKind::Stencil);
    assert_eq!(layout.depth_stencil_ref.attachment, 1);
}

#[test]
fn test_depth_takes_precedence_over_stencil() {
    let mut target = RenderTarget::new();
    target
        .set_color_attachment(0, color("c0")).unwrap()
        .set_depth_attachment(depth())
        .set_stencil_attachment(stencil());

    let layout = AttachmentLayout::new(&target);

    assert_eq!(layout.attachments.len(), 2);
    assert_eq!(layout.attachments[1].kind, AttachmentKind::Depth);
    assert_eq!(slot_names(&target), vec!["c0", "depth"]);
    assert_eq!(clear_values(&target).len(), 2);
}

#[test]
fn test_attachment_count_formula() {
    // N colors, R of them resolved, plus one depth/stencil slot
    for colors in 0..4usize {
        for resolved in 0..=colors {
            let mut target = RenderTarget::new();
            for i in 0..colors {
                let attachment = if i < resolved { resolved_color("c") } else { color("c") };
                target.set_color_attachment(i, attachment).unwrap();
            }
            target.set_depth_attachment(depth());

            let layout = AttachmentLayout::new(&target);
            assert_eq!(layout.attachments.len(), colors + resolved + 1);
            assert_eq!(slot_names(&target).len(), layout.attachments.len());
            assert_eq!(clear_values(&target).len(), layout.attachments.len());
        }
    }
}

#[test]
fn test_render_pass_desc_has_one_graphics_subpass() {
    let mut target = RenderTarget::new();
    target.set_color_attachment(0, color("c0")).unwrap();

    let desc = AttachmentLayout::new(&target).into_render_pass_desc();

    assert_eq!(desc.subpass.bind_point, PipelineBindPoint::Graphics);
    assert_eq!(desc.attachments.len(), 1);
    assert_eq!(desc.subpass.color_refs.len(), desc.subpass.resolve_refs.len());
}

// ============================================================================
// CLEAR VALUE TESTS
// ============================================================================

#[test]
fn test_clear_values_follow_attachment_order() {
    let mut target = RenderTarget::new();
    target
        .set_color_attachment(0, resolved_color("c0")).unwrap()
        .set_color_attachment(2, color("c2")).unwrap()
        .set_depth_attachment(depth());

    let clears = clear_values(&target);

    assert_eq!(
        clears,
        vec![
            ClearValue::Color([0.0, 0.0, 1.0, 1.0]),
            ClearValue::Color([0.0, 0.0, 1.0, 1.0]),
            ClearValue::Color([1.0, 0.0, 0.0, 1.0]),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ]
    );
}

#[test]
fn test_stencil_clear_value() {
    let mut target = RenderTarget::new();
    target.set_color_attachment(0, color("c0")).unwrap().set_stencil_attachment(stencil());

    let clears = clear_values(&target);
    assert_eq!(clears[1], ClearValue::DepthStencil { depth: 0.0, stencil: 7 });
}
