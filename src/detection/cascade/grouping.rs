use crate::models::BoundingBox;
use imageproc::union_find::DisjointSetForest;

/// Two rectangles belong to the same object when every edge moves by at most
/// `eps` times their mean smaller side
fn similar(a: &BoundingBox, b: &BoundingBox, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    let close = |p: u32, q: u32| (p as f64 - q as f64).abs() <= delta;
    close(a.x, b.x) && close(a.y, b.y) && close(a.right(), b.right()) && close(a.bottom(), b.bottom())
}

/// Cluster raw hits and keep the averaged rectangle of every cluster with more
/// than `min_neighbors` members. Clusters lying inside a stronger cluster are
/// dropped. With `min_neighbors == 0` the hits are returned unchanged.
pub fn group_rectangles(rects: &[BoundingBox], min_neighbors: u32, eps: f64) -> Vec<BoundingBox> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let mut forest = DisjointSetForest::new(rects.len());
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                forest.union(i, j);
            }
        }
    }

    // class ids in order of first appearance
    let mut roots: Vec<usize> = Vec::new();
    let mut sums: Vec<([u64; 4], u32)> = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        let root = forest.root(i);
        let class = match roots.iter().position(|&c| c == root) {
            Some(c) => c,
            None => {
                roots.push(root);
                sums.push(([0; 4], 0));
                roots.len() - 1
            }
        };
        let (acc, count) = &mut sums[class];
        acc[0] += r.x as u64;
        acc[1] += r.y as u64;
        acc[2] += r.width as u64;
        acc[3] += r.height as u64;
        *count += 1;
    }

    let clusters: Vec<(BoundingBox, u32)> = sums
        .iter()
        .map(|(acc, count)| {
            let n = *count as f64;
            let avg = |v: u64| (v as f64 / n).round() as u32;
            (BoundingBox::new(avg(acc[0]), avg(acc[1]), avg(acc[2]), avg(acc[3])), *count)
        })
        .collect();

    let mut grouped = Vec::new();
    for (i, (r1, n1)) in clusters.iter().enumerate() {
        if *n1 <= min_neighbors {
            continue;
        }
        let nested = clusters.iter().enumerate().any(|(j, (r2, n2))| {
            if i == j || *n2 <= min_neighbors {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i64;
            let dy = (r2.height as f64 * eps).round() as i64;
            let inside = r1.x as i64 >= r2.x as i64 - dx
                && r1.y as i64 >= r2.y as i64 - dy
                && r1.right() as i64 <= r2.right() as i64 + dx
                && r1.bottom() as i64 <= r2.bottom() as i64 + dy;
            inside && (*n2 > (*n1).max(3) || *n1 < 3)
        });
        if !nested {
            grouped.push(*r1);
        }
    }

    grouped
}
