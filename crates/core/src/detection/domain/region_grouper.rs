use crate::shared::region::Region;

/// Candidates overlapping by more than this IoU support the same face.
pub const DEFAULT_GROUP_IOU: f64 = 0.3;

/// Clusters overlapping candidate windows into faces.
///
/// A cluster becomes a face only when at least `min_neighbors` candidates
/// fall into it; the reported box is the cluster average. Output follows
/// the order in which each cluster's first candidate was seen.
#[derive(Clone, Debug)]
pub struct RegionGrouper {
    min_neighbors: usize,
    iou_threshold: f64,
}

impl RegionGrouper {
    pub fn new(min_neighbors: usize) -> Self {
        Self {
            min_neighbors: min_neighbors.max(1),
            iou_threshold: DEFAULT_GROUP_IOU,
        }
    }

    pub fn with_iou_threshold(mut self, iou_threshold: f64) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn group(&self, candidates: &[Region]) -> Vec<Region> {
        let n = candidates.len();
        let mut parent: Vec<usize> = (0..n).collect();
        for i in 0..n {
            for j in (i + 1)..n {
                if candidates[i].iou(&candidates[j]) > self.iou_threshold {
                    union(&mut parent, i, j);
                }
            }
        }

        // (root, members) in first-seen order
        let mut clusters: Vec<(usize, Vec<usize>)> = Vec::new();
        for i in 0..n {
            let root = find(&mut parent, i);
            match clusters.iter_mut().find(|(r, _)| *r == root) {
                Some((_, members)) => members.push(i),
                None => clusters.push((root, vec![i])),
            }
        }

        clusters
            .into_iter()
            .filter(|(_, members)| members.len() >= self.min_neighbors)
            .map(|(_, members)| average(candidates, &members))
            .collect()
    }
}

fn average(candidates: &[Region], members: &[usize]) -> Region {
    let k = members.len() as f64;
    let mean = |f: fn(&Region) -> i32| {
        (members.iter().map(|&i| f(&candidates[i]) as f64).sum::<f64>() / k).round() as i32
    };
    Region {
        x: mean(|r| r.x),
        y: mean(|r| r.y),
        width: mean(|r| r.width),
        height: mean(|r| r.height),
    }
}

/// Find root of element `i` with path halving.
fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}
