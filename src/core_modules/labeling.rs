// THEORY:
// The `labeling` module is the connected-component labeler behind spot
// extraction. It groups adjacent foreground pixels of a mask into components,
// gives each one an integer id and records its bounding box and pixel count.
//
// Key architectural principles:
// 1.  **4-Connectivity, Fixed**: Only horizontal and vertical neighbours join a
//     component. Two pixels touching at a corner are two components. This is a
//     fixed choice; it decides which pixel groups become one spot versus two.
// 2.  **Two Passes With Union-Find**: The first raster pass hands out provisional
//     labels and records equivalences when a pixel bridges two of them. The
//     second pass resolves every provisional label to its root and renumbers the
//     roots consecutively.
// 3.  **Deterministic Ids**: Final ids start at 1 (0 is background) and follow
//     the raster order of each component's first pixel. Spot extraction and the
//     order-dependent grouping rule both inherit this order.

use crate::core_modules::spot::BoundingBox;
use ndarray::{Array2, ArrayView2};

/// One connected region of foreground pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Label id, starting at 1.
    pub id: usize,
    /// Smallest box enclosing every pixel carrying this id.
    pub bounding_box: BoundingBox,
    /// Exact number of pixels carrying this id.
    pub pixel_count: usize,
}

/// Output of one labeling call: the label image plus per-id component records.
#[derive(Debug, Clone)]
pub struct LabeledMask {
    /// Same shape as the source mask; 0 for background, the component id otherwise.
    pub labels: Array2<usize>,
    /// Components ordered by id; `components[i].id == i + 1`.
    pub components: Vec<Component>,
}

impl LabeledMask {
    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

fn find_root(parents: &mut [usize], label: usize) -> usize {
    let mut current = label;
    while current != parents[current] {
        // Path halving.
        parents[current] = parents[parents[current]];
        current = parents[current];
    }
    current
}

fn union_labels(parents: &mut [usize], a: usize, b: usize) {
    let root_a = find_root(parents, a);
    let root_b = find_root(parents, b);
    // The smaller label stays the root so ids keep raster order.
    if root_a < root_b {
        parents[root_b] = root_a;
    } else if root_b < root_a {
        parents[root_a] = root_b;
    }
}

/// Labels the 4-connected foreground regions of `mask`.
pub fn label_components(mask: &ArrayView2<bool>) -> LabeledMask {
    let (height, width) = mask.dim();
    let mut labels = Array2::<usize>::zeros((height, width));
    // Index 0 is the background slot and is never used as a parent.
    let mut parents: Vec<usize> = vec![0];

    // --- First pass: provisional labels and equivalences ---
    for row in 0..height {
        for col in 0..width {
            if !mask[[row, col]] {
                continue;
            }

            let up = if row > 0 { labels[[row - 1, col]] } else { 0 };
            let left = if col > 0 { labels[[row, col - 1]] } else { 0 };

            let label = match (up, left) {
                (0, 0) => {
                    let fresh = parents.len();
                    parents.push(fresh);
                    fresh
                }
                (neighbour, 0) | (0, neighbour) => neighbour,
                (up, left) => {
                    union_labels(&mut parents, up, left);
                    up.min(left)
                }
            };
            labels[[row, col]] = label;
        }
    }

    // --- Resolve roots and renumber them consecutively ---
    let mut relabel = vec![0usize; parents.len()];
    let mut next_id = 1;
    for provisional in 1..parents.len() {
        let root = find_root(&mut parents, provisional);
        if relabel[root] == 0 {
            relabel[root] = next_id;
            next_id += 1;
        }
        relabel[provisional] = relabel[root];
    }

    // --- Second pass: final ids, bounding boxes and pixel counts ---
    let mut slots: Vec<Option<Component>> = vec![None; next_id - 1];
    for ((row, col), label) in labels.indexed_iter_mut() {
        if *label == 0 {
            continue;
        }
        let id = relabel[*label];
        *label = id;

        if let Some(component) = slots[id - 1].as_mut() {
            component.bounding_box.expand_to_include(col, row);
            component.pixel_count += 1;
            continue;
        }
        slots[id - 1] = Some(Component {
            id,
            bounding_box: BoundingBox::at(col, row),
            pixel_count: 1,
        });
    }

    LabeledMask {
        labels,
        components: slots.into_iter().flatten().collect(),
    }
}
