// THEORY:
// The `spot` module holds the plain data containers of the detection layer.
//
// Key architectural principles:
// 1.  **Spot As A Position**: A `Spot` is only the integer midpoint of a
//     component's bounding box. It is not a pixel-weighted centroid and it does
//     not remember the area that let it through the size filter.
// 2.  **Groups Are Never Empty**: A `SpotGroup` can only be created around an
//     anchor spot and only ever grows, so the derived centroid and radius are
//     always defined.
// 3.  **Derived, Not Stored**: Centroid, radius and the tabular `GroupSummary`
//     are computed on demand from the members. Nothing here is cached.
// 4.  **Local Coordinates**: Every position is relative to the matrix that was
//     analysed. Mapping into full-image coordinates is the job of `Region`.

#[cfg(feature = "serde")]
use crate::error::SpotError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned box with inclusive pixel bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl BoundingBox {
    /// A box covering the single pixel at (`x`, `y`).
    pub fn at(x: usize, y: usize) -> Self {
        Self {
            x_min: x,
            x_max: x,
            y_min: y,
            y_max: y,
        }
    }

    pub fn expand_to_include(&mut self, x: usize, y: usize) {
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    pub fn width(&self) -> usize {
        self.x_max - self.x_min + 1
    }

    pub fn height(&self) -> usize {
        self.y_max - self.y_min + 1
    }

    /// Integer midpoint of the box.
    ///
    /// Computed over the half-open span `[min, max + 1)` with floor division,
    /// so a box two pixels wide starting at 0 has its midpoint at 1.
    pub fn midpoint(&self) -> (usize, usize) {
        (
            (self.x_min + self.x_max + 1) / 2,
            (self.y_min + self.y_max + 1) / 2,
        )
    }
}

/// A detected dark feature, located at its bounding-box midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spot {
    pub x: usize,
    pub y: usize,
}

impl Spot {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn from_bounding_box(bounding_box: &BoundingBox) -> Self {
        let (x, y) = bounding_box.midpoint();
        Self { x, y }
    }

    /// Euclidean distance between two spots.
    pub fn distance_to(&self, other: &Spot) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx.hypot(dy)
    }
}

/// An ordered, non-empty cluster of spots produced by one grouping pass.
/// The first member is always the anchor that seeded the group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSpotGroup"))]
pub struct SpotGroup {
    members: Vec<Spot>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSpotGroup {
    members: Vec<Spot>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSpotGroup> for SpotGroup {
    type Error = SpotError;

    fn try_from(raw: RawSpotGroup) -> Result<Self, SpotError> {
        if raw.members.is_empty() {
            return Err(SpotError::EmptyGroup);
        }
        Ok(Self { members: raw.members })
    }
}

impl SpotGroup {
    /// Starts a new group seeded by `anchor`.
    pub fn anchored_at(anchor: Spot) -> Self {
        Self {
            members: vec![anchor],
        }
    }

    pub(crate) fn push(&mut self, spot: Spot) {
        self.members.push(spot);
    }

    pub fn anchor(&self) -> Spot {
        self.members[0]
    }

    pub fn members(&self) -> &[Spot] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Mean position of the members.
    pub fn centroid(&self) -> (f64, f64) {
        debug_assert!(!self.members.is_empty(), "spot groups are never empty");
        let count = self.members.len() as f64;
        let (sum_x, sum_y) = self
            .members
            .iter()
            .fold((0.0, 0.0), |(sx, sy), spot| (sx + spot.x as f64, sy + spot.y as f64));
        (sum_x / count, sum_y / count)
    }

    /// Largest distance from the centroid to any member; 0 for a singleton.
    pub fn radius(&self) -> f64 {
        let (cx, cy) = self.centroid();
        self.members
            .iter()
            .map(|spot| (spot.x as f64 - cx).hypot(spot.y as f64 - cy))
            .fold(0.0, f64::max)
    }

    pub fn summary(&self, index: usize) -> GroupSummary {
        let (mean_x, mean_y) = self.centroid();
        GroupSummary {
            index,
            member_count: self.members.len(),
            mean_x,
            mean_y,
        }
    }
}

/// One row of the tabular group export.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupSummary {
    /// 1-based position of the group in clustering order.
    pub index: usize,
    pub member_count: usize,
    pub mean_x: f64,
    pub mean_y: f64,
}

/// Summary rows for every group, numbered from 1 in clustering order.
pub fn summarize_groups(groups: &[SpotGroup]) -> Vec<GroupSummary> {
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| group.summary(i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn midpoint_follows_half_open_span() {
        let square = BoundingBox { x_min: 0, x_max: 2, y_min: 7, y_max: 9 };
        assert_eq!(square.midpoint(), (1, 8));

        let two_wide = BoundingBox { x_min: 0, x_max: 1, y_min: 4, y_max: 4 };
        assert_eq!(two_wide.midpoint(), (1, 4));
        assert_eq!(two_wide.width(), 2);
        assert_eq!(two_wide.height(), 1);
    }

    #[test]
    fn expanding_a_box() {
        let mut bbox = BoundingBox::at(5, 5);
        bbox.expand_to_include(2, 9);
        bbox.expand_to_include(7, 6);
        assert_eq!(bbox, BoundingBox { x_min: 2, x_max: 7, y_min: 5, y_max: 9 });
    }

    #[test]
    fn distance_is_euclidean() {
        assert_relative_eq!(Spot::new(1, 1).distance_to(&Spot::new(4, 5)), 5.0);
        assert_relative_eq!(Spot::new(8, 8).distance_to(&Spot::new(1, 1)), 98f64.sqrt());
    }

    #[test]
    fn singleton_group_geometry() {
        let group = SpotGroup::anchored_at(Spot::new(3, 4));
        assert_eq!(group.anchor(), Spot::new(3, 4));
        assert_eq!(group.centroid(), (3.0, 4.0));
        assert_eq!(group.radius(), 0.0);
    }

    #[test]
    fn centroid_and_radius_of_a_group() {
        let mut group = SpotGroup::anchored_at(Spot::new(0, 0));
        group.push(Spot::new(4, 0));
        group.push(Spot::new(2, 6));

        let (cx, cy) = group.centroid();
        assert_relative_eq!(cx, 2.0);
        assert_relative_eq!(cy, 2.0);
        assert_relative_eq!(group.radius(), 4.0);
        assert_eq!(group.member_count(), 3);
    }

    #[test]
    fn summaries_are_numbered_from_one() {
        let mut first = SpotGroup::anchored_at(Spot::new(10, 20));
        first.push(Spot::new(12, 22));
        let second = SpotGroup::anchored_at(Spot::new(50, 50));

        let rows = summarize_groups(&[first, second]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], GroupSummary { index: 1, member_count: 2, mean_x: 11.0, mean_y: 21.0 });
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].member_count, 1);
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn group_without_members_is_rejected() {
        let err = serde_json::from_str::<SpotGroup>(r#"{"members":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no members"));
    }

    #[test]
    fn group_keeps_its_anchor_through_json() {
        let mut group = SpotGroup::anchored_at(Spot::new(4, 9));
        group.push(Spot::new(6, 9));

        let json = serde_json::to_string(&group).expect("group serializes");
        let restored: SpotGroup = serde_json::from_str(&json).expect("non-empty group deserializes");

        assert_eq!(restored, group);
        assert_eq!(restored.anchor(), Spot::new(4, 9));
    }
}
