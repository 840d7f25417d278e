// THEORY:
// A `Cluster` is the output unit of the comparison engine: one connected group of
// differing pixels, reduced to a bounding box and a size.
//
// Key architectural principles:
// 1.  **Sealed on Construction**: The only way to obtain a `Cluster` is to seal a
//     finished list of members. The bounding box and size are computed once, at
//     that moment, and there are no setters. An empty member list cannot be
//     sealed, so every cluster has at least one pixel.
// 2.  **Image Geometry**: The bounding box is expressed the way a drawing routine
//     wants it: `top`/`bottom` are the smallest and largest `y`, `left`/`right` the
//     smallest and largest `x`.
// 3.  **Membership Is Kept**: The members are retained in traversal order for
//     callers that want more than the rectangle.

use std::fmt;

/// A position on the image grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// The inclusive rectangle enclosing every member of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    /// Smallest `y` of any member.
    pub top: u32,
    /// Largest `y` of any member.
    pub bottom: u32,
    /// Smallest `x` of any member.
    pub left: u32,
    /// Largest `x` of any member.
    pub right: u32,
}

impl BoundingBox {
    /// Width in pixels, both edges included.
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    /// Height in pixels, both edges included.
    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.left..=self.right).contains(&point.x) && (self.top..=self.bottom).contains(&point.y)
    }
}

/// One connected group of differing pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    members: Vec<Point>,
    bounding_box: BoundingBox,
}

impl Cluster {
    /// Finalizes a traversal's members into a cluster.
    /// Returns `None` when there are no members.
    pub fn seal(members: Vec<Point>) -> Option<Self> {
        let first = *members.first()?;
        let mut bounding_box = BoundingBox {
            top: first.y,
            bottom: first.y,
            left: first.x,
            right: first.x,
        };

        for point in &members[1..] {
            bounding_box.top = bounding_box.top.min(point.y);
            bounding_box.bottom = bounding_box.bottom.max(point.y);
            bounding_box.left = bounding_box.left.min(point.x);
            bounding_box.right = bounding_box.right.max(point.x);
        }

        Some(Self {
            members,
            bounding_box,
        })
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Number of pixels in the cluster.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Every member, in the order the traversal reached them.
    pub fn members(&self) -> &[Point] {
        &self.members
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bb = &self.bounding_box;
        write!(
            f,
            "top: {}, bottom: {}, left: {}, right: {}, size: {}",
            bb.top,
            bb.bottom,
            bb.left,
            bb.right,
            self.size()
        )
    }
}
