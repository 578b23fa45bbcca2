//! Pair culling: sort boxes along the axis where they spread most, then
//! only test boxes whose intervals on that axis intersect

use super::Aabb;
use glam::Vec3;

/// A solver body and its (margin-inflated) world box
#[derive(Debug, Clone, Copy)]
pub struct BroadPhaseEntry {
    pub slot: usize,
    pub aabb: Aabb,
}

/// Overlapping entry pairs as `(low, high)` indices into `entries`, sorted
pub fn sweep_and_prune(entries: &[BroadPhaseEntry]) -> Vec<(usize, usize)> {
    if entries.len() < 2 {
        return Vec::new();
    }

    let axis = spread_axis(entries);
    let lo = |i: usize| entries[i].aabb.min[axis];
    let hi = |i: usize| entries[i].aabb.max[axis];

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| lo(a).total_cmp(&lo(b)));

    let mut pairs = Vec::new();
    for (n, &i) in order.iter().enumerate() {
        for &j in &order[n + 1..] {
            if lo(j) > hi(i) {
                break;
            }
            if entries[i].aabb.overlaps(&entries[j].aabb) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Index of the axis along which box centers vary most
fn spread_axis(entries: &[BroadPhaseEntry]) -> usize {
    let count = entries.len() as f32;
    let mean = entries.iter().map(|e| e.aabb.center()).sum::<Vec3>() / count;
    let variance = entries
        .iter()
        .map(|e| {
            let d = e.aabb.center() - mean;
            d * d
        })
        .sum::<Vec3>();

    if variance.x >= variance.y && variance.x >= variance.z {
        0
    } else if variance.y >= variance.z {
        1
    } else {
        2
    }
}
