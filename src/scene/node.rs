use crate::sprite::Sprite;
use crate::transform::AffineTransform;
use crate::types::{Point, Size};

use super::sheet::SpriteSheet;
use super::NodeId;

/// Transform and visibility state shared by every node kind.
///
/// Setters are crate-internal: changing geometry through [`Scene`] also
/// runs the dirty hooks of batched sprites.
///
/// [`Scene`]: super::Scene
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    position: Point,
    /// Degrees, clockwise-positive
    rotation: f32,
    scale_x: f32,
    scale_y: f32,
    /// Normalized anchor (0..1 of the content size)
    anchor_point: Point,
    anchor_point_in_pixels: Point,
    content_size: Size,
    vertex_z: f32,
    visible: bool,
    z_order: i32,
    tag: Option<i32>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            anchor_point: Point::ZERO,
            anchor_point_in_pixels: Point::ZERO,
            content_size: Size::zero(),
            vertex_z: 0.0,
            visible: true,
            z_order: 0,
            tag: None,
        }
    }
}

impl NodeState {
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Uniform scale.
    ///
    /// # Panics
    ///
    /// Panics if the two axes are scaled differently.
    pub fn scale(&self) -> f32 {
        assert!(
            self.scale_x == self.scale_y,
            "scale is not uniform ({} x {}), use scale_x and scale_y",
            self.scale_x,
            self.scale_y
        );
        self.scale_x
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn anchor_point(&self) -> Point {
        self.anchor_point
    }

    pub fn anchor_point_in_pixels(&self) -> Point {
        self.anchor_point_in_pixels
    }

    pub fn content_size(&self) -> Size {
        self.content_size
    }

    pub fn vertex_z(&self) -> f32 {
        self.vertex_z
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    pub fn tag(&self) -> Option<i32> {
        self.tag
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
    }

    pub(crate) fn set_scale(&mut self, scale: f32) {
        self.scale_x = scale;
        self.scale_y = scale;
    }

    pub(crate) fn set_scale_x(&mut self, scale_x: f32) {
        self.scale_x = scale_x;
    }

    pub(crate) fn set_scale_y(&mut self, scale_y: f32) {
        self.scale_y = scale_y;
    }

    pub(crate) fn set_anchor_point(&mut self, anchor: Point) {
        self.anchor_point = anchor;
        self.update_anchor_in_pixels();
    }

    pub(crate) fn set_content_size(&mut self, size: Size) {
        self.content_size = size;
        self.update_anchor_in_pixels();
    }

    pub(crate) fn set_vertex_z(&mut self, z: f32) {
        self.vertex_z = z;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_z_order(&mut self, z: i32) {
        self.z_order = z;
    }

    pub(crate) fn set_tag(&mut self, tag: Option<i32>) {
        self.tag = tag;
    }

    fn update_anchor_in_pixels(&mut self) {
        self.anchor_point_in_pixels = Point::new(
            self.content_size.width * self.anchor_point.x,
            self.content_size.height * self.anchor_point.y,
        );
    }

    /// Matrix mapping this node's local space into its parent's:
    /// translate, rotate, scale, then move the anchor to the origin.
    pub fn node_to_parent_transform(&self) -> AffineTransform {
        AffineTransform::translate(self.position.x, self.position.y)
            .then(&AffineTransform::rotate_node_degrees(self.rotation))
            .scaled(self.scale_x, self.scale_y)
            .translated(
                -self.anchor_point_in_pixels.x,
                -self.anchor_point_in_pixels.y,
            )
    }
}

/// What a node is, beyond its transform state.
#[derive(Debug)]
pub enum NodeKind {
    /// A plain grouping node
    Node,
    Sprite(Box<Sprite>),
    Sheet(SpriteSheet),
}

impl NodeKind {
    pub fn as_sprite(&self) -> Option<&Sprite> {
        match self {
            NodeKind::Sprite(sprite) => Some(&**sprite),
            _ => None,
        }
    }

    pub(crate) fn as_sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self {
            NodeKind::Sprite(sprite) => Some(&mut **sprite),
            _ => None,
        }
    }

    pub fn as_sheet(&self) -> Option<&SpriteSheet> {
        match self {
            NodeKind::Sheet(sheet) => Some(sheet),
            _ => None,
        }
    }

    pub(crate) fn as_sheet_mut(&mut self) -> Option<&mut SpriteSheet> {
        match self {
            NodeKind::Sheet(sheet) => Some(sheet),
            _ => None,
        }
    }
}

/// A node in the scene arena.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) state: NodeState,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    /// Sorted by z order; equal z keeps insertion order
    pub(crate) children: Vec<NodeId>,
    /// Back-pointer to sparse array index (for swap-remove fixup)
    pub(crate) sparse_index: u32,
}
