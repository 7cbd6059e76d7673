// THEORY:
// The `proximity_clusterer` is the grouping layer. It partitions a list of
// spots into `SpotGroup`s with a single anchor-distance rule:
//
// 1.  Walk the spots in the order given, remembering which were visited.
// 2.  The next unvisited spot becomes the anchor of a new group.
// 3.  Every later unvisited spot within `diameter / 2` of the *anchor* joins the
//     group and is marked visited. Distances to other members never matter.
// 4.  The group closes and the walk continues with the next unvisited spot.
//
// This is not single-linkage clustering and must not be turned into it:
// membership is not transitive, and the result depends on the input order
// (which comes from component label order). Every spot lands in exactly one
// group. A radius that is not positive leaves distinct spots as singletons.
//
// Cost is O(n²) in the number of spots.

use crate::core_modules::spot::{Spot, SpotGroup};

/// Groups `spots` around anchors using radius `diameter / 2`.
pub fn cluster_spots(spots: &[Spot], diameter: f64) -> Vec<SpotGroup> {
    let radius = diameter / 2.0;
    let mut visited = vec![false; spots.len()];
    let mut groups = Vec::new();

    for (anchor_index, anchor) in spots.iter().enumerate() {
        if visited[anchor_index] {
            continue;
        }
        visited[anchor_index] = true;
        let mut group = SpotGroup::anchored_at(*anchor);

        // Earlier spots are all visited already, so only later ones can join.
        for (candidate_index, candidate) in spots.iter().enumerate().skip(anchor_index + 1) {
            if visited[candidate_index] {
                continue;
            }
            if anchor.distance_to(candidate) <= radius {
                visited[candidate_index] = true;
                group.push(*candidate);
            }
        }

        groups.push(group);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn spots(points: &[(usize, usize)]) -> Vec<Spot> {
        points.iter().map(|&(x, y)| Spot::new(x, y)).collect()
    }

    #[test]
    fn membership_is_tested_against_the_anchor_only() {
        let input = spots(&[(0, 0), (5, 0), (9, 0)]);
        let groups = cluster_spots(&input, 12.0);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members(), &spots(&[(0, 0), (5, 0)])[..]);
        assert_eq!(groups[1].members(), &spots(&[(9, 0)])[..]);
    }

    #[test]
    fn members_may_be_farther_apart_than_the_radius() {
        // Both ends are 5 from the anchor but 10 from each other.
        let input = spots(&[(5, 5), (0, 5), (10, 5)]);
        let groups = cluster_spots(&input, 10.0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_count(), 3);
    }

    #[test]
    fn order_changes_the_result() {
        let forward = cluster_spots(&spots(&[(0, 0), (5, 0), (9, 0)]), 12.0);
        let middle_first = cluster_spots(&spots(&[(5, 0), (0, 0), (9, 0)]), 12.0);
        assert_eq!(forward.len(), 2);
        assert_eq!(middle_first.len(), 1);
        assert_eq!(middle_first[0].anchor(), Spot::new(5, 0));
    }

    #[test]
    fn distance_equal_to_radius_joins() {
        let groups = cluster_spots(&spots(&[(0, 0), (3, 4)]), 10.0);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn non_positive_diameter_gives_singletons() {
        let input = spots(&[(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(cluster_spots(&input, 0.0).len(), 4);
        assert_eq!(cluster_spots(&input, -3.0).len(), 4);
    }

    #[test]
    fn nan_diameter_gives_singletons() {
        let input = spots(&[(0, 0), (0, 0), (2, 2)]);
        assert_eq!(cluster_spots(&input, f64::NAN).len(), 3);
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(cluster_spots(&[], 60.0).is_empty());
    }

    #[test]
    fn groups_partition_the_input() {
        // A deterministic scatter with duplicates and near neighbours.
        let input: Vec<Spot> = (0..60usize)
            .map(|i| Spot::new((i * 37) % 23, (i * 11) % 17))
            .collect();

        for diameter in [-1.0, 0.0, 2.0, 5.5, 9.0, 30.0, 1000.0] {
            let groups = cluster_spots(&input, diameter);
            assert!(groups.iter().all(|g| g.member_count() > 0));

            let flattened: Vec<Spot> = groups.iter().flat_map(|g| g.members().iter().copied()).collect();
            assert_eq!(flattened.len(), input.len(), "diameter {diameter}");

            let mut expected: HashMap<Spot, usize> = HashMap::new();
            for spot in &input {
                *expected.entry(*spot).or_default() += 1;
            }
            let mut seen: HashMap<Spot, usize> = HashMap::new();
            for spot in &flattened {
                *seen.entry(*spot).or_default() += 1;
            }
            assert_eq!(expected, seen, "diameter {diameter}");
        }
    }

    #[test]
    fn far_apart_spots_stay_alone() {
        let groups = cluster_spots(&spots(&[(1, 1), (8, 8)]), 2.0);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.member_count() == 1));
    }
}
